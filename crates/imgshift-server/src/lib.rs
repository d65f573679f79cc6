//! imgshift Server - HTTP bindings for imgshift
//!
//! This crate exposes the imgshift-core pipeline over HTTP.
//!
//! # Module Structure
//!
//! - `config` - Command-line / environment configuration
//! - `error` - API error type and JSON error bodies
//! - `handlers` - Route handlers (base64, binary, health)
//! - `router` - Router assembly with body limit, timeout and tracing layers
//! - `types` - Request and response bodies
//!
//! # Usage
//!
//! ```text
//! POST /process-base64  { "base64": "...", "options": {...}, "noise": 8 }
//!   -> 200 { "processedBase64": "..." }
//! POST /process-binary  (same body)
//!   -> 200 image/jpeg | image/png, Content-Disposition attachment
//! GET  /health
//!   -> 200 { "status": "ok", "version": "..." }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod types;

pub use config::{ServerConfig, DEFAULT_LOG_FILTER};
pub use error::ApiError;
pub use router::router;

/// Get the version of the server crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
