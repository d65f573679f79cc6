//! Process-level configuration from command-line flags and environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;

/// Log filter used when neither `--log-filter` nor `RUST_LOG` is set.
pub const DEFAULT_LOG_FILTER: &str = "imgshift_core=info,imgshift_server=info,tower_http=info";

#[derive(Debug, Clone, Parser)]
#[command(name = "imgshift-server")]
#[command(version, about = "HTTP service that perturbs images through a fixed filter pipeline", long_about = None)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Maximum request body size in MiB
    #[arg(long, env = "BODY_LIMIT_MB", value_name = "MIB", default_value_t = 50)]
    pub body_limit_mb: usize,

    /// Abort requests that take longer than this many seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", value_name = "SECS")]
    pub request_timeout_secs: Option<u64>,

    /// tracing-subscriber filter directive
    #[arg(long, env = "RUST_LOG", value_name = "FILTER")]
    pub log_filter: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            body_limit_mb: 50,
            request_timeout_secs: None,
            log_filter: None,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb.saturating_mul(1024 * 1024)
    }

    /// `None` or zero disables the timeout.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
