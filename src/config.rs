//! Proxy configuration: loaded once at start and shared (read-only) by every
//! component for the lifetime of the process.

use std::net::IpAddr;
use std::path::PathBuf;

use rama_error::{ErrorContext, OpaqueError};
use serde::{Deserialize, Serialize};

/// Verbosity levels for the tracing subscriber installed in `main`.
///
/// `0` silences everything, `4` (the default) is the most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LogLevel(u8);

impl LogLevel {
    pub const SILENT: Self = Self(0);
    pub const ERROR: Self = Self(1);
    pub const WARNING: Self = Self(2);
    pub const NOTICE: Self = Self(3);
    pub const INFO: Self = Self(4);

    /// The `tracing_subscriber::filter::LevelFilter` this level maps onto.
    #[must_use]
    pub fn as_level_filter(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;
        match self.0 {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            // rama (like its upstream `tracing`) has no dedicated "notice"
            // level; we fold it into INFO, same as level 4.
            _ => LevelFilter::INFO,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::INFO
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = OpaqueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value > 4 {
            return Err(rama_error::error!(
                "log level must be in 0..=4, got {value}"
            ));
        }
        Ok(Self(value))
    }
}

impl From<LogLevel> for u8 {
    fn from(value: LogLevel) -> Self {
        value.0
    }
}

/// Proxy-wide configuration, supplied once at start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address the main listener binds to.
    pub bind_addr: IpAddr,
    /// Port of the main listener (forward-HTTP and CONNECT entry point).
    pub port: u16,
    /// Port of the dynamic SNI-multiplexed TLS server used to terminate
    /// intercepted tunnels.
    pub tls_port: u16,
    /// When set, the main listener itself speaks TLS (using the
    /// proxy-self leaf) instead of plaintext HTTP.
    pub use_tls: bool,
    /// DNS names the proxy-self leaf certificate is valid for.
    pub proxy_domains: Vec<String>,
    /// IP addresses the proxy-self leaf certificate is valid for.
    pub proxy_ips: Vec<IpAddr>,
    /// Root directory holding the CA and per-host leaf certificate material.
    pub cert_dir: PathBuf,
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::from([127, 0, 0, 1]),
            port: 12345,
            tls_port: 12346,
            use_tls: false,
            proxy_domains: vec!["localhost".to_owned()],
            proxy_ips: vec![IpAddr::from([127, 0, 0, 1])],
            cert_dir: PathBuf::from("./Violentcert"),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for any
    /// field the file omits.
    pub fn from_file(path: &std::path::Path) -> Result<Self, OpaqueError> {
        let data = std::fs::read(path)
            .with_context(|| format!("read config file at {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("parse config file at {}", path.display()))
            .map_err(Into::into)
    }

    /// The host name used as the key for the proxy-self leaf, i.e. the first
    /// of the configured `proxy_domains`, or `localhost` if none were given.
    #[must_use]
    pub fn self_host(&self) -> &str {
        self.proxy_domains
            .first()
            .map(String::as_str)
            .unwrap_or("localhost")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_plaintext_on_loopback() {
        let cfg = Config::default();
        assert!(!cfg.use_tls);
        assert_eq!(cfg.port, 12345);
        assert_eq!(cfg.tls_port, 12346);
    }

    #[test]
    fn log_level_rejects_out_of_range_values() {
        assert!(LogLevel::try_from(5).is_err());
        assert!(LogLevel::try_from(4).is_ok());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let json = r#"{"port": 9999}"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.port, 9999);
        assert_eq!(cfg.tls_port, 12346);
    }
}
