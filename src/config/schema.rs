//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::net::{Ipv6Addr, SocketAddr};
use std::time::Duration;

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// HTTP front end listener.
    pub listener: ListenerConfig,

    /// Backend processing server address.
    pub backend: BackendConfig,

    /// Cache directory and its public URL mapping.
    pub cache: CacheConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Size limits on backend exchanges.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8080").
    pub bind_address: String,

    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_body_size: 64 * 1024,
        }
    }
}

/// Backend server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Hostname or IP of the processing server.
    pub host: String,

    /// TCP port of the processing server.
    pub port: u16,
}

impl BackendConfig {
    /// `host:port`, suitable for address resolution. IPv6 literals are
    /// bracketed.
    pub fn authority(&self) -> String {
        match self.host.parse::<Ipv6Addr>() {
            Ok(ip) => SocketAddr::from((ip, self.port)).to_string(),
            Err(_) => format!("{}:{}", self.host, self.port),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1996,
        }
    }
}

/// How cache paths in backend replies become public URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RewriteStrategy {
    /// Strip the cache directory as a leading path prefix and join the
    /// remaining components onto the public prefix.
    #[default]
    Prefix,
    /// Replace every occurrence of the cache directory string.
    Substring,
}

/// Cache directory mapping.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Absolute directory the backend writes produced files into.
    pub directory_path: String,

    /// Public URL prefix serving the same directory.
    pub public_url_prefix: String,

    /// Rewrite strategy.
    pub rewrite_strategy: RewriteStrategy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory_path: "/var/cache/vt_server".to_string(),
            public_url_prefix: "vt_server_audio".to_string(),
            rewrite_strategy: RewriteStrategy::Prefix,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Backend read timeout in milliseconds.
    pub read_ms: u64,

    /// Front end request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }

    pub fn read(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 5_000,
            read_ms: 5_000,
            request_secs: 30,
        }
    }
}

/// Size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Size of the single read performed on the backend reply.
    /// Longer replies are truncated.
    pub response_buffer_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            response_buffer_bytes: 2048,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_brackets_ipv6_literals() {
        let backend = |host: &str| BackendConfig {
            host: host.to_string(),
            port: 1996,
        };
        assert_eq!(backend("::1").authority(), "[::1]:1996");
        assert_eq!(backend("fe80::2").authority(), "[fe80::2]:1996");
        assert_eq!(backend("10.0.0.5").authority(), "10.0.0.5:1996");
        assert_eq!(backend("vt-backend.internal").authority(), "vt-backend.internal:1996");
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config: RelayConfig = toml::from_str("").unwrap();
        assert_eq!(config.backend.port, 1996);
        assert_eq!(config.cache.directory_path, "/var/cache/vt_server");
        assert_eq!(config.limits.response_buffer_bytes, 2048);
        assert_eq!(config.timeouts.read(), Duration::from_secs(5));
        assert_eq!(config.cache.rewrite_strategy, RewriteStrategy::Prefix);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: RelayConfig = toml::from_str(
            r#"
            [backend]
            port = 2001

            [cache]
            public_url_prefix = "audio"
            rewrite_strategy = "substring"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend.host, "127.0.0.1");
        assert_eq!(config.backend.authority(), "127.0.0.1:2001");
        assert_eq!(config.cache.public_url_prefix, "audio");
        assert_eq!(config.cache.directory_path, "/var/cache/vt_server");
        assert_eq!(config.cache.rewrite_strategy, RewriteStrategy::Substring);
    }
}
