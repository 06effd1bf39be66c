#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Flow Recipe
//!
//! > **A Recipe for actors and cancellable pipelines in Rust.**
//!
//! This crate demonstrates two message-passing patterns on Tokio and how they
//! fit together: a single-owner **actor** that serializes access to its state,
//! and a **pipeline** of transform stages with fan-out, fan-in and
//! cooperative cancellation.
//!
//! ## 🏗️ Design Philosophy
//!
//! Both components replace shared memory with channels:
//!
//! - **Actor**: one task owns the state; everybody else talks to it through a
//!   bounded mailbox. No locks around the state, ever.
//! - **Pipeline**: each stage owns what it is working on and hands results
//!   downstream. One token cancels every stage at once.
//!
//! ## 🗺️ Module Tour
//!
//! ### 1. The Engine ([`framework`])
//! The generic pieces: [`Actor`](framework::Actor) and
//! [`ActorState`](framework::ActorState), [`Pipeline`](framework::Pipeline),
//! [`Drain`](framework::Drain), [`CancelToken`](framework::CancelToken) and
//! the [`mock`](framework::mock) test helpers.
//!
//! ### 2. The Application ([`sample`])
//! A ledger actor behind a typed [`LedgerClient`](sample::clients::LedgerClient),
//! squaring and directory-digest pipelines, and the
//! [`FlowSystem`](sample::lifecycle::FlowSystem) that starts and stops them.
//!
//! ## 🚀 Quick Start
//!
//! ```bash
//! # Run the demo with info logs, digesting ./src
//! RUST_LOG=info cargo run -p flow-sample -- src
//!
//! # Run all tests
//! cargo test --workspace
//! ```

pub use flow_framework as framework;
pub use flow_sample as sample;
