//! wpkg Telemetry - logging for the widget package toolkit.
//!
//! Builds the global `tracing` subscriber from a [`LogConfig`]: a level
//! filter with extra directives, one of four layouts, and stderr, stdout or
//! rolling files (via `tracing-appender`) as destination.
//!
//! # Example
//!
//! ```rust,no_run
//! use wpkg_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), wpkg_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("wpkg_package=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileRotation, LOG_FILE_PREFIX, LogConfig, LogFormat, LogTarget, file_appender, setup_logging,
};
