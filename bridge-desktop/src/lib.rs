//! # Desktop Bridge Implementations
//!
//! Desktop implementations of the bridge traits (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpClient` using `reqwest` with rustls
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let http_client = Arc::new(ReqwestHttpClient::with_timeout(Duration::from_secs(30))?);
//! let lyrics = LyricsService::new(http_client);
//! ```

mod http;

pub use http::ReqwestHttpClient;
