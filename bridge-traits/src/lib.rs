//! # Host Bridge Traits
//!
//! Capability traits the crawler needs from its host but does not implement
//! itself.
//!
//! ## Overview
//!
//! The lyrics providers talk to the network only through [`HttpClient`], and
//! the logging layer can mirror events into a host pipeline through
//! [`LoggerSink`]. Keeping both behind traits lets the core crates run
//! against recording fakes in tests and against `bridge-desktop` in the
//! shipped binary.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with timeouts
//! - [`LoggerSink`](logging::LoggerSink) - Forward structured logs to a host sink
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type.
//! Implementations should convert platform-specific errors into it and keep
//! the message actionable (include the URL or path involved).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! behind an `Arc` by every provider.
//!
//! ## Examples
//!
//! ### Implementing HttpClient
//!
//! ```ignore
//! use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct MyHttpClient {
//!     client: reqwest::Client,
//! }
//!
//! #[async_trait]
//! impl HttpClient for MyHttpClient {
//!     async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
//!         // Implementation
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod logging;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use logging::{LogEntry, LogLevel, LoggerSink};
