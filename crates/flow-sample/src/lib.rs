//! # Flow Sample Library
//!
//! A small application built on `flow-framework`, exposed as a library so the
//! integration tests can drive it:
//!
//! - [`ledger_actor`] and [`clients`] - account balances behind an actor
//! - [`squares`] and [`digest`] - fan-out/fan-in pipelines
//! - [`lifecycle`] - [`FlowSystem`](lifecycle::FlowSystem), which starts and stops it all
//! - [`config`] - [`AppConfig`](config::AppConfig) from `FLOW_*` variables

pub mod clients;
pub mod config;
pub mod digest;
pub mod ledger_actor;
pub mod lifecycle;
pub mod model;
pub mod squares;
