//! Network configuration parameters
//!
//! Every fixed literal the network core relies on: join timing, HTTP read
//! timeout, and the setup access point. Defaults match the shipped
//! firmware; tests substitute short timings so the join loop runs without
//! real elapsed time.

use core::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Core network configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    // --- Join ---
    /// Total time to wait for a join before giving up (milliseconds)
    pub connect_timeout_ms: u32,
    /// Time between connection checks (milliseconds)
    pub connect_step_ms: u32,

    // --- HTTP ---
    /// Read timeout applied to outbound requests (milliseconds)
    pub read_timeout_ms: u32,

    // --- Setup access point ---
    /// SSID of the setup access point
    pub setup_ssid: heapless::String<32>,
    /// Address of the setup access point, also used as its gateway
    pub setup_ip: [u8; 4],
    /// Netmask of the setup access point
    pub setup_subnet: [u8; 4],
    /// Port the setup server listens on
    pub setup_port: u16,
    /// Wait between bringing up the access point and configuring its IP
    pub ap_settle_ms: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        let mut setup_ssid = heapless::String::new();
        let _ = setup_ssid.push_str("AccentSetup");

        Self {
            // Join
            connect_timeout_ms: 30 * 1000,
            connect_step_ms: 500,

            // HTTP
            read_timeout_ms: 30 * 1000,

            // Setup access point
            setup_ssid,
            setup_ip: [1, 2, 3, 4],
            setup_subnet: [255, 255, 255, 0],
            setup_port: 80,
            ap_settle_ms: 100,
        }
    }
}

impl NetworkConfig {
    pub fn setup_ip(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.setup_ip)
    }

    pub fn setup_subnet(&self) -> Ipv4Addr {
        Ipv4Addr::from(self.setup_subnet)
    }

    /// Number of connection checks that fit in the join window.
    pub fn max_connect_polls(&self) -> u32 {
        self.connect_timeout_ms / self.connect_step_ms.max(1)
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_step_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "connect_step_ms must be > 0",
            ));
        }
        if self.connect_step_ms > self.connect_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "connect_step_ms must not exceed connect_timeout_ms",
            ));
        }
        if self.read_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "read_timeout_ms must be > 0",
            ));
        }
        if self.setup_ssid.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "setup_ssid must not be empty",
            ));
        }
        Ok(())
    }
}

/// Errors from [`NetworkConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}
