//! Station-mode join with a bounded wait.
//!
//! [`ConnectionManager::connect`] loads the stored credentials, starts a
//! join and polls the radio every `connect_step_ms` until it reports a
//! connection or `connect_timeout_ms` has elapsed.  The wait is a plain
//! blocking loop: the firmware has nothing else to do while joining.
//!
//! ```text
//! Disconnected ──▶ Connecting ──┬──▶ Connected
//!                               └──▶ TimedOut  (caller restarts)
//! ```
//!
//! The manager never restarts the device itself.  A timeout is reported
//! as [`ConnectOutcome::TimedOut`] and the top-level service turns it into
//! an error signal plus restart.

use log::{debug, info, warn};

use crate::config::NetworkConfig;

use super::credentials;
use super::ports::{DelayPort, StoragePort, WifiMode, WifiPort};

/// Connection state, rebuilt on every boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    TimedOut,
}

/// Result of one [`ConnectionManager::connect`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// The device is online.
    Connected,
    /// No SSID is stored.  Nothing was attempted; run the setup portal.
    NoCredentials,
    /// The join window elapsed.  Terminal: the device must restart.
    TimedOut,
}

impl ConnectOutcome {
    pub fn is_online(self) -> bool {
        self == Self::Connected
    }
}

pub struct ConnectionManager {
    state: ConnectionState,
    step_ms: u32,
    max_polls: u32,
}

impl ConnectionManager {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            step_ms: config.connect_step_ms,
            max_polls: config.max_connect_polls(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Bring the station link up using the stored credentials.
    pub fn connect(
        &mut self,
        wifi: &mut impl WifiPort,
        storage: &impl StoragePort,
        delay: &mut impl DelayPort,
    ) -> ConnectOutcome {
        if wifi.is_connected() {
            info!("Connection: already connected");
            self.state = ConnectionState::Connected;
            return ConnectOutcome::Connected;
        }

        let creds = credentials::load(storage);
        if !creds.is_configured() {
            info!("Connection: no Wifi credentials");
            self.state = ConnectionState::Disconnected;
            return ConnectOutcome::NoCredentials;
        }

        info!("Connection: connecting to '{}'", creds.ssid);
        self.state = ConnectionState::Connecting;

        if let Err(e) = wifi.set_mode(WifiMode::Station) {
            warn!("Connection: station mode switch failed — {}", e);
        }
        // A rejected join still runs the full window; restart is the retry.
        if let Err(e) = wifi.join(&creds.ssid, creds.password()) {
            warn!("Connection: join request failed — {}", e);
        }

        if self.wait_for_link(wifi, delay) {
            self.state = ConnectionState::Connected;
            match wifi.local_address() {
                Some(ip) => info!("Connection: connected to '{}' as {}", creds.ssid, ip),
                None => info!("Connection: connected to '{}'", creds.ssid),
            }
            ConnectOutcome::Connected
        } else {
            warn!("Connection: timed out connecting");
            self.state = ConnectionState::TimedOut;
            ConnectOutcome::TimedOut
        }
    }

    /// Poll up to `max_polls` times, waiting one step before each re-check.
    fn wait_for_link(&self, wifi: &impl WifiPort, delay: &mut impl DelayPort) -> bool {
        for poll in 0..self.max_polls {
            if wifi.is_connected() {
                return true;
            }
            delay.delay_ms(self.step_ms);
            debug!("Connection: waiting ({}/{})", poll + 1, self.max_polls);
        }
        wifi.is_connected()
    }
}
