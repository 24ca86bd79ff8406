//! Captive setup portal.
//!
//! When no credentials are stored the device hosts its own open access
//! point and a two-route form server:
//!
//! | Route         | Method | Action                                  |
//! |---------------|--------|-----------------------------------------|
//! | `/go`         | GET    | serve the setup form                    |
//! | `/save`       | POST   | store `ssid` / `password`, then restart |
//! | anything else |        | 404                                     |
//!
//! A method mismatch on either route answers 400.  The portal has no exit
//! other than a restart: after a save the caller resets the device and the
//! next boot joins with the new credentials.

use core::net::Ipv4Addr;

use log::{info, warn};

use crate::config::NetworkConfig;
use crate::error::PortalError;

use super::credentials::{self, WifiCredentials};
use super::ports::{
    DelayPort, HttpMethod, HttpRequest, HttpResponse, HttpServerPort, StorageError, StoragePort,
    WifiMode, WifiPort,
};

/// Relative URL showing the setup form.
pub const SHOW_FORM_PATH: &str = "/go";
/// Relative URL saving the setup form.
pub const SAVE_FORM_PATH: &str = "/save";

const HTTP_OK: u16 = 200;
const HTTP_BAD_REQUEST: u16 = 400;
const HTTP_NOT_FOUND: u16 = 404;

/// The setup form, served verbatim.
pub const SETUP_FORM: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Accent Setup</title>
<style>
body { font-family: sans-serif; margin: 2em; }
label, input { display: block; width: 100%; max-width: 20em; }
input { margin: 0.3em 0 1em 0; padding: 0.4em; }
</style>
</head>
<body>
<h1>Wifi Setup</h1>
<form action="/save" method="post">
<label for="ssid">Network name</label>
<input type="text" id="ssid" name="ssid" autocapitalize="none" autocorrect="off" required>
<label for="password">Password</label>
<input type="password" id="password" name="password">
<input type="submit" value="Save">
</form>
</body>
</html>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    ShowForm,
    SaveForm,
}

const ROUTES: [(&str, Route); 2] = [
    (SHOW_FORM_PATH, Route::ShowForm),
    (SAVE_FORM_PATH, Route::SaveForm),
];

fn route(path: &str) -> Option<Route> {
    ROUTES
        .iter()
        .find(|(p, _)| *p == path)
        .map(|(_, route)| *route)
}

/// What one [`SetupPortal::pump`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalPoll {
    /// The portal was never started (or failed to start).
    NotStarted,
    /// No client was waiting.
    Idle,
    /// One request was answered.
    Served,
    /// The form was submitted.  The device must restart whether or not the
    /// write succeeded.
    CredentialsSubmitted(Result<(), StorageError>),
}

impl PortalPoll {
    /// `false` only when there is no portal to service.
    pub fn is_running(self) -> bool {
        self != Self::NotStarted
    }

    pub fn restart_required(self) -> bool {
        matches!(self, Self::CredentialsSubmitted(_))
    }
}

/// State of a running portal.  Exists only between a successful
/// [`SetupPortal::start`] and the restart that ends it.
pub struct SetupServerState<S> {
    server: S,
    access_point_address: Ipv4Addr,
}

impl<S> SetupServerState<S> {
    pub fn access_point_address(&self) -> Ipv4Addr {
        self.access_point_address
    }
}

pub struct SetupPortal<S> {
    state: Option<SetupServerState<S>>,
    ssid: heapless::String<32>,
    ip: Ipv4Addr,
    subnet: Ipv4Addr,
    port: u16,
    settle_ms: u32,
}

impl<S: HttpServerPort> SetupPortal<S> {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            state: None,
            ssid: config.setup_ssid.clone(),
            ip: config.setup_ip(),
            subnet: config.setup_subnet(),
            port: config.setup_port,
            settle_ms: config.ap_settle_ms,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state.is_some()
    }

    pub fn state(&self) -> Option<&SetupServerState<S>> {
        self.state.as_ref()
    }

    /// Bring up the access point and start serving the form on `server`.
    ///
    /// On failure nothing is retained: `server` is dropped and the portal
    /// reads as not started.
    pub fn start(
        &mut self,
        wifi: &mut impl WifiPort,
        delay: &mut impl DelayPort,
        mut server: S,
    ) -> Result<Ipv4Addr, PortalError> {
        info!("Portal: starting Wifi setup");
        self.state = None;

        wifi.set_mode(WifiMode::AccessPoint).map_err(|e| {
            warn!("Portal: access point mode switch failed — {}", e);
            PortalError::AccessPointFailed
        })?;
        wifi.start_access_point(&self.ssid).map_err(|e| {
            warn!("Portal: failed to start access point — {}", e);
            PortalError::AccessPointFailed
        })?;

        // The soft AP needs a moment before it accepts an address.
        delay.delay_ms(self.settle_ms);

        wifi.configure_access_point(self.ip, self.ip, self.subnet)
            .map_err(|e| {
                warn!("Portal: failed to apply access point config — {}", e);
                PortalError::IpConfigFailed
            })?;

        let address = wifi.access_point_address().unwrap_or(self.ip);
        info!("Portal: access point '{}' started at {}", self.ssid, address);

        server.begin(self.port).map_err(|e| {
            warn!("Portal: setup server failed to start — {}", e);
            PortalError::ServerFailed(e)
        })?;

        self.state = Some(SetupServerState {
            server,
            access_point_address: address,
        });
        Ok(address)
    }

    /// Service at most one pending request.  Never blocks waiting for a
    /// client; call once per loop iteration.
    pub fn pump(&mut self, storage: &mut impl StoragePort) -> PortalPoll {
        let Some(state) = self.state.as_mut() else {
            return PortalPoll::NotStarted;
        };

        let request = match state.server.poll_request() {
            Ok(Some(request)) => request,
            Ok(None) => return PortalPoll::Idle,
            Err(e) => {
                warn!("Portal: dropping request — {}", e);
                return PortalPoll::Idle;
            }
        };

        let (response, poll) = dispatch(&request, storage);
        if let Some(response) = response {
            if let Err(e) = state.server.respond(&response) {
                warn!("Portal: response to {} failed — {}", request.path, e);
            }
        }
        poll
    }
}

fn dispatch(
    request: &HttpRequest,
    storage: &mut impl StoragePort,
) -> (Option<HttpResponse>, PortalPoll) {
    match route(&request.path) {
        Some(Route::ShowForm) => (Some(show_form(request)), PortalPoll::Served),
        Some(Route::SaveForm) => {
            if request.method != HttpMethod::Post {
                return (
                    Some(HttpResponse::status(HTTP_BAD_REQUEST)),
                    PortalPoll::Served,
                );
            }
            // No reply: the restart that follows closes the connection.
            let result = save_form(request, storage);
            (None, PortalPoll::CredentialsSubmitted(result))
        }
        None => (Some(HttpResponse::status(HTTP_NOT_FOUND)), PortalPoll::Served),
    }
}

fn show_form(request: &HttpRequest) -> HttpResponse {
    if request.method != HttpMethod::Get {
        return HttpResponse::status(HTTP_BAD_REQUEST);
    }
    HttpResponse {
        status: HTTP_OK,
        content_type: Some("text/html"),
        body: Some(SETUP_FORM),
    }
}

/// Pick `ssid` and `password` out of the submitted arguments; every other
/// field is ignored.  A repeated field keeps its first value, query string
/// before form body.
pub fn credentials_from_request(request: &HttpRequest) -> WifiCredentials {
    WifiCredentials::new(
        request.arg(credentials::SSID_KEY).unwrap_or_default(),
        request.arg(credentials::PASSWORD_KEY).unwrap_or_default(),
    )
}

fn save_form(
    request: &HttpRequest,
    storage: &mut impl StoragePort,
) -> Result<(), StorageError> {
    let creds = credentials_from_request(request);
    info!("Portal: saving Wifi credentials");
    credentials::save(storage, &creds).inspect_err(|e| {
        warn!("Portal: saving credentials failed — {}", e);
    })
}
