//! Integration tests for the captive setup portal: access point bring-up,
//! routing and credential capture.

use std::net::Ipv4Addr;

use accent::app::portal::{PortalPoll, SETUP_FORM, SetupPortal};
use accent::app::ports::{HttpMethod, ServerError, StorageError, WifiMode};
use accent::config::NetworkConfig;
use accent::error::PortalError;

use crate::mock_hw::{MockDelay, MockServer, MockStorage, MockWifi, WifiCall};

const SETUP_IP: Ipv4Addr = Ipv4Addr::new(1, 2, 3, 4);

fn started() -> (SetupPortal<MockServer>, MockServer, MockWifi, MockDelay) {
    let mut portal = SetupPortal::new(&NetworkConfig::default());
    let server = MockServer::new();
    let mut wifi = MockWifi::new();
    let mut delay = MockDelay::new();
    let ip = portal
        .start(&mut wifi, &mut delay, server.clone())
        .expect("portal starts");
    assert_eq!(ip, SETUP_IP);
    (portal, server, wifi, delay)
}

// ── Start-up ──────────────────────────────────────────────────

#[test]
fn brings_up_open_access_point_with_static_address() {
    let (portal, server, wifi, delay) = started();

    assert!(portal.is_running());
    assert_eq!(wifi.mode(), Some(WifiMode::AccessPoint));
    assert_eq!(
        wifi.calls,
        vec![
            WifiCall::SetMode(WifiMode::AccessPoint),
            WifiCall::StartAccessPoint("AccentSetup".into()),
            WifiCall::ConfigureAccessPoint {
                ip: SETUP_IP,
                gateway: SETUP_IP,
                subnet: Ipv4Addr::new(255, 255, 255, 0),
            },
        ]
    );
    assert_eq!(delay.waits, vec![100], "settle delay before IP config");
    assert_eq!(server.begun_on(), Some(80));
    assert_eq!(
        portal.state().map(|s| s.access_point_address()),
        Some(SETUP_IP)
    );
}

#[test]
fn access_point_failure_leaves_portal_stopped() {
    let mut portal = SetupPortal::new(&NetworkConfig::default());
    let server = MockServer::new();
    let mut wifi = MockWifi::new();
    wifi.fail_access_point = true;

    let result = portal.start(&mut wifi, &mut MockDelay::new(), server.clone());

    assert_eq!(result, Err(PortalError::AccessPointFailed));
    assert!(!portal.is_running());
    assert_eq!(server.begun_on(), None, "server never started");
}

#[test]
fn ip_config_failure_is_reported() {
    let mut portal = SetupPortal::new(&NetworkConfig::default());
    let mut wifi = MockWifi::new();
    wifi.fail_ip_config = true;

    let result = portal.start(&mut wifi, &mut MockDelay::new(), MockServer::new());
    assert_eq!(result, Err(PortalError::IpConfigFailed));
    assert!(!portal.is_running());
}

#[test]
fn server_bind_failure_is_reported() {
    let mut portal = SetupPortal::new(&NetworkConfig::default());
    let result = portal.start(
        &mut MockWifi::new(),
        &mut MockDelay::new(),
        MockServer::failing(),
    );
    assert_eq!(
        result,
        Err(PortalError::ServerFailed(ServerError::BindFailed))
    );
    assert!(!portal.is_running());
}

#[test]
fn pump_before_start_is_not_started() {
    let mut portal: SetupPortal<MockServer> = SetupPortal::new(&NetworkConfig::default());
    assert_eq!(portal.pump(&mut MockStorage::new()), PortalPoll::NotStarted);
}

// ── Routing ───────────────────────────────────────────────────

#[test]
fn idle_when_no_client_waits() {
    let (mut portal, server, _, _) = started();
    assert_eq!(portal.pump(&mut MockStorage::new()), PortalPoll::Idle);
    assert!(server.responses().is_empty());
}

#[test]
fn get_go_serves_the_form() {
    let (mut portal, server, _, _) = started();
    server.push(HttpMethod::Get, "/go", &[]);

    assert_eq!(portal.pump(&mut MockStorage::new()), PortalPoll::Served);

    let responses = server.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status, 200);
    assert_eq!(responses[0].content_type, Some("text/html"));
    assert_eq!(responses[0].body, Some(SETUP_FORM));
}

#[test]
fn wrong_method_is_bad_request() {
    let (mut portal, server, _, _) = started();
    server.push(HttpMethod::Post, "/go", &[]);
    server.push(HttpMethod::Get, "/save", &[("ssid", "x")]);
    let mut storage = MockStorage::new();

    assert_eq!(portal.pump(&mut storage), PortalPoll::Served);
    assert_eq!(portal.pump(&mut storage), PortalPoll::Served);

    let statuses: Vec<u16> = server.responses().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![400, 400]);
    assert_eq!(storage.writes, 0, "GET /save must not store anything");
}

#[test]
fn unknown_path_is_not_found() {
    let (mut portal, server, _, _) = started();
    server.push(HttpMethod::Get, "/", &[]);
    server.push(HttpMethod::Get, "/generate_204", &[]);
    let mut storage = MockStorage::new();

    portal.pump(&mut storage);
    portal.pump(&mut storage);

    let statuses: Vec<u16> = server.responses().iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![404, 404]);
}

#[test]
fn malformed_request_is_dropped() {
    let (mut portal, server, _, _) = started();
    server.push_error(ServerError::MalformedRequest);
    assert_eq!(portal.pump(&mut MockStorage::new()), PortalPoll::Idle);
    assert!(portal.is_running());
}

// ── Saving ────────────────────────────────────────────────────

#[test]
fn post_save_stores_credentials_without_replying() {
    let (mut portal, server, _, _) = started();
    server.push(
        HttpMethod::Post,
        "/save",
        &[("ssid", "Foo"), ("password", "Bar")],
    );
    let mut storage = MockStorage::new();

    let poll = portal.pump(&mut storage);

    assert_eq!(poll, PortalPoll::CredentialsSubmitted(Ok(())));
    assert!(poll.restart_required());
    assert_eq!(storage.value("ssid"), Some("Foo"));
    assert_eq!(storage.value("password"), Some("Bar"));
    assert!(server.responses().is_empty());
}

#[test]
fn missing_password_is_stored_empty() {
    let (mut portal, server, _, _) = started();
    server.push(HttpMethod::Post, "/save", &[("ssid", "Cafe")]);
    let mut storage = MockStorage::with_credentials("Old", "oldpass");

    portal.pump(&mut storage);

    assert_eq!(storage.value("ssid"), Some("Cafe"));
    assert_eq!(storage.value("password"), Some(""));
}

#[test]
fn failed_write_still_requires_restart() {
    let (mut portal, server, _, _) = started();
    server.push(HttpMethod::Post, "/save", &[("ssid", "Foo")]);
    let mut storage = MockStorage::new();
    storage.fail_writes = Some(StorageError::Full);

    let poll = portal.pump(&mut storage);
    assert_eq!(
        poll,
        PortalPoll::CredentialsSubmitted(Err(StorageError::Full))
    );
    assert!(poll.restart_required());
}

#[test]
fn repeated_ssid_keeps_first_submitted_value() {
    let (mut portal, server, _, _) = started();
    // Query arguments precede body arguments in the decoded request.
    server.push(
        HttpMethod::Post,
        "/save",
        &[("ssid", "FromQuery"), ("ssid", "FromBody"), ("password", "pw")],
    );
    let mut storage = MockStorage::new();

    portal.pump(&mut storage);

    assert_eq!(storage.value("ssid"), Some("FromQuery"));
    assert_eq!(storage.value("password"), Some("pw"));
}
