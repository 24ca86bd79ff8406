//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing network events to the ESP-IDF
//! logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::NetworkEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`NetworkEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &NetworkEvent) {
        match event {
            NetworkEvent::Connected { ip: Some(ip) } => info!("NET | online, ip={}", ip),
            NetworkEvent::Connected { ip: None } => info!("NET | online"),
            NetworkEvent::NoCredentials => info!("NET | no credentials, setup required"),
            NetworkEvent::TimedOut => warn!("NET | join timed out"),
            NetworkEvent::PortalStarted { ip } => match ip {
                Some(ip) => info!("SETUP | portal up at http://{}/go", ip),
                None => info!("SETUP | portal up"),
            },
            NetworkEvent::CredentialsSaved => info!("SETUP | credentials saved"),
            NetworkEvent::CredentialsReset => info!("NET | credentials cleared"),
        }
    }
}
