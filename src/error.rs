//! Unified error types for the Accent network core.
//!
//! Each subsystem reports a small `Copy` enum; everything converts into the
//! top-level [`Error`] so the boot loop can log failures uniformly.  None of
//! these ever triggers a restart on its own: the only restart paths are a
//! join timeout and a submitted setup form.

use core::fmt;

use crate::app::ports::{ServerError, StorageError, TransportError};
use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    Config(ConfigError),
    Storage(StorageError),
    Portal(PortalError),
    Http(HttpGetError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Portal(e) => write!(f, "portal: {e}"),
            Self::Http(e) => write!(f, "http: {e}"),
        }
    }
}

impl core::error::Error for Error {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Setup portal errors
// ---------------------------------------------------------------------------

/// Why [`SetupPortal::start`](crate::app::portal::SetupPortal::start) failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalError {
    /// The radio refused access-point mode or the access point itself.
    AccessPointFailed,
    /// The static address could not be applied.
    IpConfigFailed,
    /// The form server could not listen.
    ServerFailed(ServerError),
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessPointFailed => write!(f, "failed to start access point"),
            Self::IpConfigFailed => write!(f, "failed to apply access point config"),
            Self::ServerFailed(e) => write!(f, "setup server failed: {e}"),
        }
    }
}

impl From<PortalError> for Error {
    fn from(e: PortalError) -> Self {
        Self::Portal(e)
    }
}

// ---------------------------------------------------------------------------
// Outbound request errors
// ---------------------------------------------------------------------------

/// Why an authenticated GET did not produce a 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpGetError {
    /// The parameter list had an odd length; nothing was sent.
    OddParameters(usize),
    /// The connection could not be set up; nothing was sent.
    ConnectFailed,
    /// The request failed below HTTP.  The connection has been closed.
    Transport(TransportError),
    /// The server answered with something other than 200.  The connection
    /// has been closed.
    Status(u16),
}

impl fmt::Display for HttpGetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OddParameters(n) => {
                write!(f, "incomplete pairs of keys and values ({n} parameters)")
            }
            Self::ConnectFailed => write!(f, "failed to connect to server"),
            Self::Transport(e) => write!(f, "request failed: {e}"),
            Self::Status(code) => write!(f, "unexpected status {code}"),
        }
    }
}

impl From<HttpGetError> for Error {
    fn from(e: HttpGetError) -> Self {
        Self::Http(e)
    }
}
