//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the crawler crates:
//! - Logging and tracing infrastructure
//! - Run configuration with fail-fast validation
//!
//! ## Overview
//!
//! Logging is built as an explicit [`tracing::Dispatch`] that the binary
//! creates once and hands to each component, rather than a process-wide
//! subscriber that components pick up implicitly.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{FetchConfig, FetchConfigBuilder};
pub use error::{Error, Result};
pub use logging::{build_dispatch, LogFormat, LoggingConfig};
