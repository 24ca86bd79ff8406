//! Integration tests for the NetworkService boot flow: join, setup portal
//! and the restart paths between them.

use std::net::Ipv4Addr;

use accent::app::connection::ConnectionState;
use accent::app::events::NetworkEvent;
use accent::app::ports::HttpMethod;
use accent::app::service::NetworkService;
use accent::config::NetworkConfig;
use accent::error::PortalError;

use crate::mock_hw::{
    MockDelay, MockDevice, MockHttpClient, MockServer, MockStorage, MockWifi, RecordingSink,
    restarted,
};

fn service() -> NetworkService<MockServer> {
    NetworkService::new(NetworkConfig::default())
}

// ── Station mode ──────────────────────────────────────────────

#[test]
fn connect_online_emits_connected_with_address() {
    let mut svc = service();
    let mut wifi = MockWifi::new();
    let storage = MockStorage::with_credentials("HomeNet", "hunter22");
    let mut device = MockDevice::new();
    let mut sink = RecordingSink::new();

    let online = svc.connect(
        &mut wifi,
        &storage,
        &mut MockDelay::new(),
        &mut device,
        &mut sink,
    );

    assert!(online);
    assert_eq!(svc.connection_state(), ConnectionState::Connected);
    assert_eq!(
        sink.events,
        vec![NetworkEvent::Connected {
            ip: Some(Ipv4Addr::new(192, 168, 1, 50))
        }]
    );
    assert_eq!(device.restarts, 0);
}

#[test]
fn connect_without_credentials_returns_false() {
    let mut svc = service();
    let mut device = MockDevice::new();
    let mut sink = RecordingSink::new();

    let online = svc.connect(
        &mut MockWifi::new(),
        &MockStorage::new(),
        &mut MockDelay::new(),
        &mut device,
        &mut sink,
    );

    assert!(!online);
    assert_eq!(sink.events, vec![NetworkEvent::NoCredentials]);
    assert_eq!(device.errors_shown, 0);
}

#[test]
fn join_timeout_shows_error_then_restarts() {
    let mut svc = service();
    let mut wifi = MockWifi::unreachable();
    let storage = MockStorage::with_credentials("HomeNet", "hunter22");
    let mut delay = MockDelay::new();
    let mut device = MockDevice::new();
    let mut sink = RecordingSink::new();

    let did_restart = restarted(|| {
        svc.connect(&mut wifi, &storage, &mut delay, &mut device, &mut sink)
    });

    assert!(did_restart);
    assert_eq!(device.errors_shown, 1);
    assert_eq!(device.restarts, 1);
    assert_eq!(delay.total_ms(), 30_000);
    assert_eq!(sink.events, vec![NetworkEvent::TimedOut]);
}

#[test]
fn reset_clears_credentials() {
    let mut svc = service();
    let mut storage = MockStorage::with_credentials("HomeNet", "hunter22");
    let mut sink = RecordingSink::new();

    svc.reset_credentials(&mut storage, &mut sink).unwrap();

    assert_eq!(storage.value("ssid"), Some(""));
    assert_eq!(storage.value("password"), Some(""));
    assert_eq!(sink.events, vec![NetworkEvent::CredentialsReset]);

    let online = svc.connect(
        &mut MockWifi::new(),
        &storage,
        &mut MockDelay::new(),
        &mut MockDevice::new(),
        &mut sink,
    );
    assert!(!online, "next boot runs the setup portal");
}

// ── Setup portal ──────────────────────────────────────────────

#[test]
fn setup_start_emits_portal_address() {
    let mut svc = service();
    let mut sink = RecordingSink::new();

    let ip = svc
        .start_setup(
            &mut MockWifi::new(),
            &mut MockDelay::new(),
            MockServer::new(),
            &mut sink,
        )
        .unwrap();

    assert_eq!(ip, Ipv4Addr::new(1, 2, 3, 4));
    assert!(svc.is_setup_running());
    assert_eq!(
        sink.events,
        vec![NetworkEvent::PortalStarted { ip: Some(ip) }]
    );
}

#[test]
fn setup_start_failure_emits_nothing() {
    let mut svc = service();
    let mut wifi = MockWifi::new();
    wifi.fail_access_point = true;
    let mut sink = RecordingSink::new();

    let result = svc.start_setup(&mut wifi, &mut MockDelay::new(), MockServer::new(), &mut sink);

    assert_eq!(result, Err(PortalError::AccessPointFailed));
    assert!(!svc.is_setup_running());
    assert!(sink.events.is_empty());
}

#[test]
fn pump_without_portal_stops_the_loop() {
    let mut svc = service();
    let mut device = MockDevice::new();
    assert!(!svc.pump_setup(
        &mut MockStorage::new(),
        &mut device,
        &mut RecordingSink::new()
    ));
}

#[test]
fn saved_form_restarts_into_station_mode() {
    let mut svc = service();
    let server = MockServer::new();
    let mut sink = RecordingSink::new();
    svc.start_setup(
        &mut MockWifi::new(),
        &mut MockDelay::new(),
        server.clone(),
        &mut sink,
    )
    .unwrap();

    let mut storage = MockStorage::new();
    let mut device = MockDevice::new();

    // Browsing the form keeps the portal up.
    server.push(HttpMethod::Get, "/go", &[]);
    assert!(svc.pump_setup(&mut storage, &mut device, &mut sink));
    assert!(svc.pump_setup(&mut storage, &mut device, &mut sink));

    server.push(
        HttpMethod::Post,
        "/save",
        &[("ssid", "Foo"), ("password", "Bar")],
    );
    let did_restart = restarted(|| svc.pump_setup(&mut storage, &mut device, &mut sink));

    assert!(did_restart);
    assert_eq!(device.restarts, 1);
    assert_eq!(sink.events.last(), Some(&NetworkEvent::CredentialsSaved));

    // After the restart the stored credentials are used.
    let mut wifi = MockWifi::new();
    let online = NetworkService::<MockServer>::new(NetworkConfig::default()).connect(
        &mut wifi,
        &storage,
        &mut MockDelay::new(),
        &mut MockDevice::new(),
        &mut RecordingSink::new(),
    );
    assert!(online);
    assert_eq!(
        wifi.joins(),
        vec![("Foo".to_string(), Some("Bar".to_string()))]
    );
}

#[test]
fn failed_save_still_restarts() {
    let mut svc = service();
    let server = MockServer::new();
    let mut sink = RecordingSink::new();
    svc.start_setup(
        &mut MockWifi::new(),
        &mut MockDelay::new(),
        server.clone(),
        &mut sink,
    )
    .unwrap();

    let mut storage = MockStorage::new();
    storage.fail_writes = Some(accent::app::ports::StorageError::IoError);
    let mut device = MockDevice::new();
    server.push(HttpMethod::Post, "/save", &[("ssid", "Foo")]);

    assert!(restarted(|| svc.pump_setup(
        &mut storage,
        &mut device,
        &mut sink
    )));
    assert!(!sink.events.contains(&NetworkEvent::CredentialsSaved));
}

// ── Outbound requests ─────────────────────────────────────────

#[test]
fn service_get_uses_configured_timeout() {
    let svc = service();
    let mut http = MockHttpClient::new();

    svc.get(&mut http, &MockWifi::new(), "http://server/next", &["w", "640"])
        .unwrap();

    assert_eq!(http.opened, vec!["http://server/next?w=640".to_string()]);
    assert_eq!(
        http.timeout.map(|t| t.as_millis()),
        Some(u128::from(svc.config().read_timeout_ms))
    );
}
