//! Smoke probes for externally running services.
//!
//! Two websocket subscribers (`/updates` and `/api/updates`) connect, send one
//! subscription frame, and print every frame they receive. The partner prober
//! walks the partner HTTP API through register, login, and an authenticated
//! get, printing each raw response body. All probes fail fast: there is no
//! retry, reconnect, or recovery.

pub mod cli;
pub mod config;
pub mod error;
pub mod partner;
pub mod protocol;
pub mod subscriber;
pub mod telemetry;

pub use error::ProbeError;
