//! Lodestar Telemetry - logging setup for hosts embedding the loader.
//!
//! Every Lodestar crate logs through `tracing`; this crate installs the
//! global subscriber.
//!
//! # Example
//!
//! ```rust,no_run
//! use lodestar_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), lodestar_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_loader_trace();
//!
//! setup_logging(&config)?;
//! tracing::info!("Host starting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LOADER_TRACE_DIRECTIVE, LogConfig, LogFormat, LogTarget,
    setup_default_logging, setup_logging,
};
