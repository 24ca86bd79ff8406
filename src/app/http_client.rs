//! Authenticated outbound GET requests.
//!
//! Every request carries `Authorization: Basic base64(":" + device id)`,
//! where the device id is the radio's hardware address with separators
//! stripped.  The id is re-read for every request and never stored.
//!
//! On a 200 the connection stays open so the caller can read the body and
//! must call [`HttpClientPort::close`] itself.  Every other outcome leaves
//! the connection closed (or never opened).

use core::time::Duration;

use base64::prelude::*;
use log::{info, warn};

use crate::config::NetworkConfig;
use crate::error::HttpGetError;

use super::ports::{HttpClientPort, WifiPort};

const HTTP_OK: u16 = 200;

/// Separators removed from the hardware address.
const ID_SEPARATORS: [char; 2] = [':', '-'];

// ───────────────────────────────────────────────────────────────
// Device identity
// ───────────────────────────────────────────────────────────────

/// Hardware address without separators, e.g. `DEADBEEFCAFE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity(heapless::String<17>);

impl DeviceIdentity {
    pub fn from_hardware_identifier(raw: &str) -> Self {
        let mut id = heapless::String::new();
        for c in raw.chars().filter(|c| !ID_SEPARATORS.contains(c)) {
            // Longer than a MAC address: keep what fits.
            if id.push(c).is_err() {
                break;
            }
        }
        Self(id)
    }

    pub fn read(wifi: &impl WifiPort) -> Self {
        Self::from_hardware_identifier(&wifi.hardware_identifier())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Basic credential with an empty user name and the id as password.
    pub fn basic_token(&self) -> String {
        BASE64_STANDARD.encode(format!(":{}", self.0))
    }

    /// Full `Authorization` header value.
    pub fn authorization(&self) -> String {
        format!("Basic {}", self.basic_token())
    }
}

// ───────────────────────────────────────────────────────────────
// Request descriptor
// ───────────────────────────────────────────────────────────────

/// One outbound request, built per call and dropped afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestDescriptor {
    pub base_url: String,
    pub query: Vec<(String, String)>,
    pub auth_header: String,
}

impl HttpRequestDescriptor {
    /// Pair up a flat `[key, value, key, value, ...]` list.
    pub fn from_parameters(
        base_url: &str,
        parameters: &[&str],
        identity: &DeviceIdentity,
    ) -> Result<Self, HttpGetError> {
        if parameters.len() % 2 != 0 {
            return Err(HttpGetError::OddParameters(parameters.len()));
        }
        let query = parameters
            .chunks_exact(2)
            .map(|pair| (pair[0].to_string(), pair[1].to_string()))
            .collect();
        Ok(Self {
            base_url: base_url.to_string(),
            query,
            auth_header: identity.authorization(),
        })
    }

    /// Base URL with the query appended in order.  Keys and values are
    /// passed through as given, without percent-encoding.
    pub fn url(&self) -> String {
        let mut url = self.base_url.clone();
        for (i, (key, value)) in self.query.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }
}

// ───────────────────────────────────────────────────────────────
// Client
// ───────────────────────────────────────────────────────────────

pub struct AuthenticatedHttpClient {
    read_timeout: Duration,
}

impl AuthenticatedHttpClient {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            read_timeout: Duration::from_millis(u64::from(config.read_timeout_ms)),
        }
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// GET `base_url` with `parameters` appended as `key=value` pairs.
    ///
    /// `Ok(())` only on status 200, with the connection left open for the
    /// caller.
    pub fn get(
        &self,
        client: &mut impl HttpClientPort,
        wifi: &impl WifiPort,
        base_url: &str,
        parameters: &[&str],
    ) -> Result<(), HttpGetError> {
        let identity = DeviceIdentity::read(wifi);
        let request = HttpRequestDescriptor::from_parameters(base_url, parameters, &identity)
            .inspect_err(|_| warn!("HTTP: incomplete pairs of keys and values"))?;
        self.send(client, &request)
    }

    /// GET `url` with no query parameters.
    pub fn get_url(
        &self,
        client: &mut impl HttpClientPort,
        wifi: &impl WifiPort,
        url: &str,
    ) -> Result<(), HttpGetError> {
        self.get(client, wifi, url, &[])
    }

    fn send(
        &self,
        client: &mut impl HttpClientPort,
        request: &HttpRequestDescriptor,
    ) -> Result<(), HttpGetError> {
        let url = request.url();
        info!("HTTP: requesting URL {}", url);

        if let Err(e) = client.open(&url) {
            warn!("HTTP: failed to connect to server — {}", e);
            return Err(HttpGetError::ConnectFailed);
        }
        client.set_read_timeout(self.read_timeout);
        client.add_header("Authorization", &request.auth_header);

        match client.get() {
            Ok(HTTP_OK) => Ok(()),
            Ok(status) => {
                warn!("HTTP: status code: {}", status);
                client.close();
                Err(HttpGetError::Status(status))
            }
            Err(e) => {
                warn!("HTTP: request failed: {}", e);
                client.close();
                Err(HttpGetError::Transport(e))
            }
        }
    }
}
