//! # Observability & Tracing
//!
//! The framework logs through the `tracing` crate with structured fields:
//!
//! - **Actors**: `actor = <name>` on every line. Start and shutdown (with
//!   event/request/exec/failure counts) at `info`, each message at `debug`,
//!   swallowed handler failures at `warn`.
//! - **Pipelines**: `stage = <name>` on every line. Stage start/close and
//!   per-stage processed/failed counts at `debug`, cancellation at `info`.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run               # lifecycle only
//! RUST_LOG=debug cargo run              # every message and stage event
//! RUST_LOG=flow_framework=debug cargo run
//! ```

/// Installs a compact `fmt` subscriber filtered by `RUST_LOG`.
///
/// Call once at start-up; a second call panics because a global subscriber
/// is already set.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // actor/stage fields already say where a line came from
        .compact()
        .init();
}
