//! Outbound network events.
//!
//! The [`NetworkService`](super::service::NetworkService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them.

use core::net::Ipv4Addr;

/// Structured events emitted by the network core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The device is online.
    Connected { ip: Option<Ipv4Addr> },

    /// No SSID is stored; the setup portal should run.
    NoCredentials,

    /// The join window elapsed without a connection.
    TimedOut,

    /// The setup access point and form server are up.
    PortalStarted { ip: Option<Ipv4Addr> },

    /// New credentials were written from the setup form.
    CredentialsSaved,

    /// Stored credentials were cleared.
    CredentialsReset,
}
