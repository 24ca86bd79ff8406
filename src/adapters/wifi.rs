//! WiFi radio adapter.
//!
//! Implements [`WifiPort`], the hexagonal boundary for the radio.  Station
//! and access-point mode are exclusive: switching mode stops the driver,
//! and the next `join` / `start_access_point` applies a fresh
//! configuration and starts it again.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side tests.

use core::net::Ipv4Addr;
use log::{info, warn};

use crate::app::ports::{WifiError, WifiMode, WifiPort};

use super::device_id;

#[cfg(target_os = "espidf")]
use embedded_svc::wifi::{AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration};
#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    ipv4::{self, Mask, RouterConfiguration, Subnet},
    netif::{EspNetif, NetifConfiguration},
    wifi::EspWifi,
};

/// Channel the setup access point is pinned to.
#[cfg(target_os = "espidf")]
const AP_CHANNEL: u8 = 1;

/// Simulation: address handed out by the simulated network.
#[cfg(not(target_os = "espidf"))]
const SIM_STATION_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    mode: Option<WifiMode>,
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: SSID of the network joined, if any.
    #[cfg(not(target_os = "espidf"))]
    sim_joined: Option<heapless::String<32>>,
    /// Simulation: static address of the access point, once configured.
    #[cfg(not(target_os = "espidf"))]
    sim_ap_ip: Option<Ipv4Addr>,
}

impl WifiAdapter {
    #[cfg(target_os = "espidf")]
    pub fn new(wifi: EspWifi<'static>) -> Self {
        Self { mode: None, wifi }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            mode: None,
            sim_joined: None,
            sim_ap_ip: None,
        }
    }

    pub fn mode(&self) -> Option<WifiMode> {
        self.mode
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_stop(&mut self) -> Result<(), WifiError> {
        if self.wifi.is_started().unwrap_or(false) {
            self.wifi.stop().map_err(|e| {
                warn!("WiFi(espidf): stop failed — {}", e);
                WifiError::ModeSwitchFailed
            })?;
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_stop(&mut self) -> Result<(), WifiError> {
        self.sim_joined = None;
        self.sim_ap_ip = None;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_join(&mut self, ssid: &str, password: Option<&str>) -> Result<(), WifiError> {
        let auth_method = if password.is_some() {
            AuthMethod::WPAWPA2Personal
        } else {
            AuthMethod::None
        };
        let conf = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| WifiError::JoinFailed)?,
            password: password
                .unwrap_or_default()
                .try_into()
                .map_err(|_| WifiError::JoinFailed)?,
            auth_method,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&conf)
            .and_then(|()| self.wifi.start())
            .and_then(|()| self.wifi.connect())
            .map_err(|e| {
                warn!("WiFi(espidf): join failed — {}", e);
                WifiError::JoinFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_join(&mut self, ssid: &str, _password: Option<&str>) -> Result<(), WifiError> {
        let mut joined = heapless::String::new();
        joined.push_str(ssid).map_err(|()| WifiError::JoinFailed)?;
        self.sim_joined = Some(joined);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_up().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_joined.is_some()
    }

    #[cfg(target_os = "espidf")]
    fn platform_start_ap(&mut self, ssid: &str) -> Result<(), WifiError> {
        let conf = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: ssid.try_into().map_err(|_| WifiError::AccessPointFailed)?,
            auth_method: AuthMethod::None,
            channel: AP_CHANNEL,
            ..Default::default()
        });
        self.wifi
            .set_configuration(&conf)
            .and_then(|()| self.wifi.start())
            .map_err(|e| {
                warn!("WiFi(espidf): access point failed — {}", e);
                WifiError::AccessPointFailed
            })
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_start_ap(&mut self, _ssid: &str) -> Result<(), WifiError> {
        Ok(())
    }

    /// Replace the AP netif with one carrying the static address.  The
    /// driver is restarted around the swap.
    #[cfg(target_os = "espidf")]
    fn platform_configure_ap(&mut self, ip: Ipv4Addr, subnet: Ipv4Addr) -> Result<(), WifiError> {
        let mask = Mask::try_from(subnet).map_err(|_| WifiError::IpConfigFailed)?;
        let conf = NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
                subnet: Subnet { gateway: ip, mask },
                ..Default::default()
            })),
            ..NetifConfiguration::wifi_default_router()
        };
        let fail = |e: esp_idf_svc::sys::EspError| {
            warn!("WiFi(espidf): access point IP config failed — {}", e);
            WifiError::IpConfigFailed
        };
        let netif = EspNetif::new_with_conf(&conf).map_err(fail)?;
        self.wifi.stop().map_err(fail)?;
        self.wifi.swap_netif_ap(netif).map_err(fail)?;
        self.wifi.start().map_err(fail)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_configure_ap(&mut self, ip: Ipv4Addr, _subnet: Ipv4Addr) -> Result<(), WifiError> {
        self.sim_ap_ip = Some(ip);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn platform_local_address(&self) -> Option<Ipv4Addr> {
        self.wifi.sta_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_local_address(&self) -> Option<Ipv4Addr> {
        Some(SIM_STATION_IP)
    }

    #[cfg(target_os = "espidf")]
    fn platform_ap_address(&self) -> Option<Ipv4Addr> {
        self.wifi.ap_netif().get_ip_info().ok().map(|info| info.ip)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_ap_address(&self) -> Option<Ipv4Addr> {
        self.sim_ap_ip
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// WifiPort
// ───────────────────────────────────────────────────────────────

impl WifiPort for WifiAdapter {
    fn set_mode(&mut self, mode: WifiMode) -> Result<(), WifiError> {
        if self.mode == Some(mode) {
            return Ok(());
        }
        self.platform_stop()?;
        self.mode = Some(mode);
        info!("WiFi: mode {:?}", mode);
        Ok(())
    }

    fn join(&mut self, ssid: &str, password: Option<&str>) -> Result<(), WifiError> {
        if self.mode != Some(WifiMode::Station) {
            return Err(WifiError::ModeSwitchFailed);
        }
        info!("WiFi: joining '{}'", ssid);
        self.platform_join(ssid, password)
    }

    fn is_connected(&self) -> bool {
        self.mode == Some(WifiMode::Station) && self.platform_is_connected()
    }

    fn start_access_point(&mut self, ssid: &str) -> Result<(), WifiError> {
        if self.mode != Some(WifiMode::AccessPoint) {
            return Err(WifiError::ModeSwitchFailed);
        }
        self.platform_start_ap(ssid)?;
        info!("WiFi: access point '{}' up", ssid);
        Ok(())
    }

    fn configure_access_point(
        &mut self,
        ip: Ipv4Addr,
        gateway: Ipv4Addr,
        subnet: Ipv4Addr,
    ) -> Result<(), WifiError> {
        if self.mode != Some(WifiMode::AccessPoint) {
            return Err(WifiError::IpConfigFailed);
        }
        // The access point is its own gateway.
        if gateway != ip {
            warn!("WiFi: gateway {} ignored, access point routes via {}", gateway, ip);
        }
        self.platform_configure_ap(ip, subnet)
    }

    fn hardware_identifier(&self) -> heapless::String<17> {
        device_id::format_mac(&device_id::read_mac())
    }

    fn local_address(&self) -> Option<Ipv4Addr> {
        if self.is_connected() {
            self.platform_local_address()
        } else {
            None
        }
    }

    fn access_point_address(&self) -> Option<Ipv4Addr> {
        if self.mode == Some(WifiMode::AccessPoint) {
            self.platform_ap_address()
        } else {
            None
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
