use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_millis(500);
pub const DEFAULT_FINGERPRINT_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("server name must not be empty")]
    EmptyServerName,
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Settings for one scan run.
///
/// Built once from the command line and handed to the probes by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Hostname presented as TLS SNI and `Host` header, and expected in the trace body.
    pub server_name: String,
    /// Autonomous system whose IPv4 ranges are scanned.
    pub asn: u32,
    /// Workers per pipeline stage.
    pub concurrency: usize,
    /// TCP port probed in both stages.
    pub port: u16,
    pub liveness_timeout: Duration,
    pub fingerprint_timeout: Duration,
}

impl Config {
    pub fn new(server_name: impl Into<String>, asn: u32) -> Self {
        Self {
            server_name: server_name.into(),
            asn,
            concurrency: DEFAULT_CONCURRENCY,
            port: DEFAULT_PORT,
            liveness_timeout: DEFAULT_LIVENESS_TIMEOUT,
            fingerprint_timeout: DEFAULT_FINGERPRINT_TIMEOUT,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server_name.trim().is_empty() {
            return Err(ConfigError::EmptyServerName);
        }
        if self.asn == 0 {
            return Err(ConfigError::Zero("asn"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Zero("concurrency"));
        }
        if self.port == 0 {
            return Err(ConfigError::Zero("port"));
        }
        if self.liveness_timeout.is_zero() {
            return Err(ConfigError::Zero("liveness timeout"));
        }
        if self.fingerprint_timeout.is_zero() {
            return Err(ConfigError::Zero("fingerprint timeout"));
        }
        Ok(())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
