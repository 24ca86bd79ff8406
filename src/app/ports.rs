//! Port traits: the hexagonal boundary between the network core and the
//! device it runs on.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ConnectionManager / SetupPortal / AuthenticatedHttpClient
//! ```
//!
//! Driven adapters (radio, NVS, HTTP server and client, display, power,
//! clock) implement these traits.  The core consumes them via generics
//! injected at call sites, so nothing in [`crate::app`] touches a global
//! device singleton and every collaborator can be replaced by a fake.
//!
//! All ports take `&mut self` where they change device state.  The
//! firmware runs a single cooperative loop, so no port needs to be `Sync`.

use core::fmt;
use core::net::Ipv4Addr;
use core::time::Duration;

use super::events::NetworkEvent;

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: core ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Namespaced string key-value storage.
///
/// Each call opens the namespace, performs the access, and closes it again;
/// reads open it read-only.  No handle outlives a call, which is all the
/// single-threaded firmware needs to serialise access.
pub trait StoragePort {
    /// Read a string.  `Ok(None)` when the key has never been written.
    fn get_str(&self, namespace: &str, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a string, replacing any previous value.
    fn set_str(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Wireless interface port (driven adapter: core ↔ radio)
// ───────────────────────────────────────────────────────────────

/// Operating mode of the radio.  The two modes are never active together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    /// Client of an existing network.
    Station,
    /// Host of the setup network.
    AccessPoint,
}

pub trait WifiPort {
    /// Switch the radio into `mode`.
    fn set_mode(&mut self, mode: WifiMode) -> Result<(), WifiError>;

    /// Start joining `ssid`.  Returns once the attempt is under way; poll
    /// [`is_connected`](Self::is_connected) for the result.
    fn join(&mut self, ssid: &str, password: Option<&str>) -> Result<(), WifiError>;

    fn is_connected(&self) -> bool;

    /// Bring up an open access point named `ssid`.
    fn start_access_point(&mut self, ssid: &str) -> Result<(), WifiError>;

    /// Apply a static address to the running access point.
    fn configure_access_point(
        &mut self,
        ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet: Ipv4Addr,
    ) -> Result<(), WifiError>;

    /// Hardware address as text, `AA:BB:CC:DD:EE:FF`.
    fn hardware_identifier(&self) -> heapless::String<17>;

    /// Address assigned in station mode, if any.
    fn local_address(&self) -> Option<Ipv4Addr>;

    /// Address of the access point, if one is running.
    fn access_point_address(&self) -> Option<Ipv4Addr>;
}

// ───────────────────────────────────────────────────────────────
// Embedded HTTP server port (driven adapter: core ↔ setup clients)
// ───────────────────────────────────────────────────────────────

/// Request method as seen by the setup server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Other,
}

impl HttpMethod {
    pub fn parse(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "POST" => Self::Post,
            _ => Self::Other,
        }
    }
}

/// One decoded request: method, path without query, and every argument
/// from the query string and form body, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub args: Vec<(String, String)>,
}

impl HttpRequest {
    /// First argument named `name`.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Option<&'static str>,
}

impl HttpResponse {
    /// A response with a status line and nothing else.
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: None,
        }
    }
}

/// Non-blocking request/response server.
///
/// The server never spawns work of its own: the owner calls
/// [`poll_request`](Self::poll_request) once per loop iteration and answers
/// what it gets with [`respond`](Self::respond) before polling again.
pub trait HttpServerPort {
    /// Start listening on `port`.
    fn begin(&mut self, port: u16) -> Result<(), ServerError>;

    /// Accept and decode at most one pending request.  `Ok(None)` when no
    /// client is waiting; never blocks for a new client.
    fn poll_request(&mut self) -> Result<Option<HttpRequest>, ServerError>;

    /// Answer the request returned by the last `poll_request`.
    fn respond(&mut self, response: &HttpResponse) -> Result<(), ServerError>;
}

// ───────────────────────────────────────────────────────────────
// HTTP client port (driven adapter: core → companion service)
// ───────────────────────────────────────────────────────────────

pub trait HttpClientPort {
    /// Prepare a connection to `url`.
    fn open(&mut self, url: &str) -> Result<(), TransportError>;

    fn set_read_timeout(&mut self, timeout: Duration);

    fn add_header(&mut self, name: &str, value: &str);

    /// Send a GET and return the status code.
    fn get(&mut self) -> Result<u16, TransportError>;

    /// Read response body bytes.  Returns 0 at end of body.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Release the connection.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Display, power and clock ports
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget visual error signal.
pub trait DisplayPort {
    fn show_error(&mut self);
}

pub trait PowerPort {
    /// Reset the device.
    fn restart(&mut self) -> !;
}

/// Blocking wait, injected so tests can run the join loop instantly.
pub trait DelayPort {
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The core emits structured [`NetworkEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &NetworkEvent);
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Namespace does not exist (never written).
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
    /// Key or value could not be represented (too long, interior NUL, not UTF-8).
    InvalidValue,
}

/// Errors from [`WifiPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiError {
    ModeSwitchFailed,
    JoinFailed,
    AccessPointFailed,
    IpConfigFailed,
}

/// Errors from [`HttpServerPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerError {
    /// Listening socket could not be created.
    BindFailed,
    /// Socket read or write failed.
    Io,
    /// Request could not be decoded.
    MalformedRequest,
    /// `respond` called without a request in flight.
    NoPendingRequest,
}

/// Transport-level failure of an outbound request.  `code` is the
/// collaborator's non-positive error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportError {
    pub code: i32,
}

impl TransportError {
    pub const CONNECTION_REFUSED: Self = Self { code: -1 };
    pub const SEND_HEADER_FAILED: Self = Self { code: -2 };
    pub const NOT_CONNECTED: Self = Self { code: -4 };
    pub const CONNECTION_LOST: Self = Self { code: -5 };
    pub const NO_HTTP_SERVER: Self = Self { code: -7 };
    pub const READ_TIMEOUT: Self = Self { code: -11 };
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "namespace not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
            Self::InvalidValue => write!(f, "invalid key or value"),
        }
    }
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModeSwitchFailed => write!(f, "mode switch failed"),
            Self::JoinFailed => write!(f, "join request rejected"),
            Self::AccessPointFailed => write!(f, "access point start failed"),
            Self::IpConfigFailed => write!(f, "access point IP config failed"),
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BindFailed => write!(f, "bind failed"),
            Self::Io => write!(f, "socket I/O error"),
            Self::MalformedRequest => write!(f, "malformed request"),
            Self::NoPendingRequest => write!(f, "no request in flight"),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self.code {
            -1 => "connection refused",
            -2 => "send header failed",
            -3 => "send payload failed",
            -4 => "not connected",
            -5 => "connection lost",
            -6 => "no stream",
            -7 => "no HTTP server",
            -8 => "too less RAM",
            -9 => "Transfer-Encoding not supported",
            -10 => "Stream write error",
            -11 => "read Timeout",
            _ => "unknown error",
        };
        write!(f, "{} ({})", text, self.code)
    }
}
