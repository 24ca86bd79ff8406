//! Stored Wifi credentials.
//!
//! One SSID and one optional password under the `"wifi"` namespace.  An
//! empty SSID means nothing is configured.  The setup portal is the only
//! writer; the connection manager is the only reader.

use log::{info, warn};

use super::ports::{StorageError, StoragePort};

/// NVS namespace holding the credentials.
pub const NAMESPACE: &str = "wifi";
/// Key of the network name.
pub const SSID_KEY: &str = "ssid";
/// Key of the network password.
pub const PASSWORD_KEY: &str = "password";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    /// `false` when no network has been configured.
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }

    /// The password, or `None` for an open network.
    pub fn password(&self) -> Option<&str> {
        if self.password.is_empty() {
            None
        } else {
            Some(self.password.as_str())
        }
    }
}

/// Load the stored credentials.  Missing keys and unreadable storage both
/// read as empty strings.
pub fn load(storage: &impl StoragePort) -> WifiCredentials {
    let ssid = read_or_default(storage, SSID_KEY);
    if ssid.is_empty() {
        return WifiCredentials::default();
    }
    let password = read_or_default(storage, PASSWORD_KEY);
    WifiCredentials { ssid, password }
}

/// Overwrite both keys.
pub fn save(storage: &mut impl StoragePort, creds: &WifiCredentials) -> Result<(), StorageError> {
    storage.set_str(NAMESPACE, SSID_KEY, &creds.ssid)?;
    storage.set_str(NAMESPACE, PASSWORD_KEY, &creds.password)?;
    info!("Credentials: saved (SSID='{}')", creds.ssid);
    Ok(())
}

/// Clear both keys so that the next boot has no credentials.
pub fn reset(storage: &mut impl StoragePort) -> Result<(), StorageError> {
    info!("Credentials: resetting");
    save(storage, &WifiCredentials::default())
}

fn read_or_default(storage: &impl StoragePort, key: &str) -> String {
    match storage.get_str(NAMESPACE, key) {
        Ok(value) => value.unwrap_or_default(),
        // A namespace that was never written is the first-boot case.
        Err(StorageError::NotFound) => String::new(),
        Err(e) => {
            warn!("Credentials: reading '{}' failed ({}), treating as empty", key, e);
            String::new()
        }
    }
}
