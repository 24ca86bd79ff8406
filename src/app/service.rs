//! Network service: the hexagonal core.
//!
//! [`NetworkService`] owns the connection manager, the setup portal and the
//! authenticated HTTP client.  The components below it report tagged
//! outcomes; this layer turns them into device behaviour: an error signal
//! and restart on a join timeout, a restart after the setup form is saved.
//!
//! ```text
//!   WifiPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//! StoragePort ──▶│        NetworkService         │
//!  ServerPort ◀─▶│ Connection · Portal · Client  │ ──▶ DisplayPort + PowerPort
//!                └──────────────────────────────┘
//! ```

use core::net::Ipv4Addr;

use log::{error, info, warn};

use crate::config::NetworkConfig;
use crate::error::{HttpGetError, PortalError};

use super::connection::{ConnectOutcome, ConnectionManager, ConnectionState};
use super::credentials;
use super::events::NetworkEvent;
use super::http_client::AuthenticatedHttpClient;
use super::portal::{PortalPoll, SetupPortal};
use super::ports::{
    DelayPort, DisplayPort, EventSink, HttpClientPort, HttpServerPort, PowerPort, StorageError,
    StoragePort, WifiPort,
};

// ───────────────────────────────────────────────────────────────
// NetworkService
// ───────────────────────────────────────────────────────────────

pub struct NetworkService<S> {
    config: NetworkConfig,
    connection: ConnectionManager,
    portal: SetupPortal<S>,
    http: AuthenticatedHttpClient,
}

impl<S: HttpServerPort> NetworkService<S> {
    pub fn new(config: NetworkConfig) -> Self {
        let connection = ConnectionManager::new(&config);
        let portal = SetupPortal::new(&config);
        let http = AuthenticatedHttpClient::new(&config);
        Self {
            config,
            connection,
            portal,
            http,
        }
    }

    // ── Station mode ──────────────────────────────────────────

    /// Join the stored network.
    ///
    /// Returns `true` once online and `false` when no credentials are
    /// stored.  A join timeout does not return: the error is shown on
    /// `device` and the device restarts.
    pub fn connect(
        &mut self,
        wifi: &mut impl WifiPort,
        storage: &impl StoragePort,
        delay: &mut impl DelayPort,
        device: &mut (impl DisplayPort + PowerPort),
        sink: &mut impl EventSink,
    ) -> bool {
        match self.connection.connect(wifi, storage, delay) {
            ConnectOutcome::Connected => {
                sink.emit(&NetworkEvent::Connected {
                    ip: wifi.local_address(),
                });
                true
            }
            ConnectOutcome::NoCredentials => {
                sink.emit(&NetworkEvent::NoCredentials);
                false
            }
            ConnectOutcome::TimedOut => {
                sink.emit(&NetworkEvent::TimedOut);
                error!("Wifi join timed out — restarting");
                device.show_error();
                device.restart()
            }
        }
    }

    /// Clear the stored credentials so the next boot runs the setup portal.
    pub fn reset_credentials(
        &mut self,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<(), StorageError> {
        info!("Resetting Wifi credentials");
        credentials::reset(storage)?;
        sink.emit(&NetworkEvent::CredentialsReset);
        Ok(())
    }

    // ── Setup portal ──────────────────────────────────────────

    /// Bring up the setup access point and serve the form on `server`.
    pub fn start_setup(
        &mut self,
        wifi: &mut impl WifiPort,
        delay: &mut impl DelayPort,
        server: S,
        sink: &mut impl EventSink,
    ) -> Result<Ipv4Addr, PortalError> {
        let ip = self.portal.start(wifi, delay, server)?;
        sink.emit(&NetworkEvent::PortalStarted { ip: Some(ip) });
        Ok(ip)
    }

    /// Service one pending setup request.
    ///
    /// Returns `false` if the portal is not running.  A submitted form
    /// restarts the device, whether or not the credentials were written.
    pub fn pump_setup(
        &mut self,
        storage: &mut impl StoragePort,
        power: &mut impl PowerPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let poll = self.portal.pump(storage);
        if let PortalPoll::CredentialsSubmitted(result) = poll {
            match result {
                Ok(()) => sink.emit(&NetworkEvent::CredentialsSaved),
                Err(e) => warn!("Credentials not saved ({}), restarting anyway", e),
            }
            info!("Setup complete — restarting");
            power.restart();
        }
        poll.is_running()
    }

    // ── Outbound requests ─────────────────────────────────────

    /// Authenticated GET; see [`AuthenticatedHttpClient::get`].
    pub fn get(
        &self,
        client: &mut impl HttpClientPort,
        wifi: &impl WifiPort,
        base_url: &str,
        parameters: &[&str],
    ) -> Result<(), HttpGetError> {
        self.http.get(client, wifi, base_url, parameters)
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_setup_running(&self) -> bool {
        self.portal.is_running()
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }
}
