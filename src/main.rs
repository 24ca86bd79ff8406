//! Accent Firmware: Main Entry Point
//!
//! Boot flow: join the stored network, or host the setup portal when no
//! credentials are stored.  Once online the device fetches its content
//! from the companion server.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  WifiAdapter   NvsAdapter   TcpFormServer   HttpClientAdapter│
//! │  (WifiPort)    (Storage)    (HttpServer)    (HttpClient)     │
//! │  LogDisplay    PowerAdapter Esp32TimeAdapter LogEventSink    │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │            NetworkService (pure logic)             │      │
//! │  │  ConnectionManager · SetupPortal · HTTP client     │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_hal::prelude::Peripherals;
use esp_idf_svc::wifi::EspWifi;
use log::{info, warn};

use accent::adapters::display::LogDisplay;
use accent::adapters::http_client::HttpClientAdapter;
use accent::adapters::http_server::TcpFormServer;
use accent::adapters::log_sink::LogEventSink;
use accent::adapters::nvs::NvsAdapter;
use accent::adapters::power::PowerAdapter;
use accent::adapters::time::Esp32TimeAdapter;
use accent::adapters::wifi::WifiAdapter;
use accent::app::ports::{DelayPort, DisplayPort, HttpClientPort, PowerPort};
use accent::app::service::NetworkService;
use accent::config::NetworkConfig;
use accent::error::Error;

/// Companion server endpoint, baked in at build time.
const SERVER_URL: &str = match option_env!("ACCENT_SERVER_URL") {
    Some(url) => url,
    None => "http://accent.local/next",
};

/// Delay between setup portal polls.
const PORTAL_POLL_MS: u32 = 10;

/// Delay between content refreshes once online.
const REFRESH_MS: u32 = 60 * 1000;

/// The device combines the error screen and the reset line.
struct Device {
    display: LogDisplay,
    power: PowerAdapter,
}

impl DisplayPort for Device {
    fn show_error(&mut self) {
        self.display.show_error();
    }
}

impl PowerPort for Device {
    fn restart(&mut self) -> ! {
        self.power.restart()
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Accent v{}                          ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration + storage ────────────────────────────
    let config = NetworkConfig::default();
    config.validate().map_err(Error::from)?;

    let mut nvs = NvsAdapter::new().map_err(Error::from)?;

    // ── 3. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop, None)?;
    let mut wifi = WifiAdapter::new(esp_wifi);

    let mut time = Esp32TimeAdapter::new();
    let mut sink = LogEventSink::new();
    let mut device = Device {
        display: LogDisplay::new(),
        power: PowerAdapter::new(),
    };

    let mut service: NetworkService<TcpFormServer> = NetworkService::new(config);

    // ── 4. Join, or run the setup portal ──────────────────────
    if !service.connect(&mut wifi, &nvs, &mut time, &mut device, &mut sink) {
        if let Err(e) =
            service.start_setup(&mut wifi, &mut time, TcpFormServer::new(), &mut sink)
        {
            warn!("Setup portal failed to start ({}), restarting", e);
            device.show_error();
            device.restart();
        }
        info!("Setup: waiting for credentials");
        // Only a restart leaves this loop.
        while service.pump_setup(&mut nvs, &mut device.power, &mut sink) {
            time.delay_ms(PORTAL_POLL_MS);
        }
        warn!("Setup portal stopped unexpectedly, restarting");
        device.show_error();
        device.restart();
    }

    // ── 5. Online: fetch content ──────────────────────────────
    info!("Online after {} ms", time.uptime_ms());
    let mut http = HttpClientAdapter::new();
    loop {
        match service.get(&mut http, &wifi, SERVER_URL, &[]) {
            Ok(()) => {
                let bytes = drain_body(&mut http);
                info!("Fetched {} bytes from {}", bytes, SERVER_URL);
            }
            Err(e) => warn!("Fetch failed: {}", Error::from(e)),
        }
        time.delay_ms(REFRESH_MS);
    }
}

/// Read and discard the response body, then release the connection.
fn drain_body(http: &mut impl HttpClientPort) -> usize {
    let mut buf = [0u8; 512];
    let mut total = 0;
    loop {
        match http.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(e) => {
                warn!("Body read failed: {}", e);
                break;
            }
        }
    }
    http.close();
    total
}
