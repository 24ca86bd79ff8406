//! Integration tests for station-mode join against mock radio + storage.

use accent::app::connection::{ConnectOutcome, ConnectionManager, ConnectionState};
use accent::app::ports::WifiMode;
use accent::config::NetworkConfig;

use crate::mock_hw::{MockDelay, MockStorage, MockWifi, WifiCall};

fn manager() -> ConnectionManager {
    ConnectionManager::new(&NetworkConfig::default())
}

#[test]
fn fresh_device_reports_no_credentials() {
    let mut wifi = MockWifi::new();
    let mut delay = MockDelay::new();
    let storage = MockStorage::new();

    let outcome = manager().connect(&mut wifi, &storage, &mut delay);

    assert_eq!(outcome, ConnectOutcome::NoCredentials);
    assert!(wifi.joins().is_empty(), "no join without an SSID");
    assert!(delay.waits.is_empty());
}

#[test]
fn empty_stored_ssid_counts_as_unconfigured() {
    let mut wifi = MockWifi::new();
    let mut delay = MockDelay::new();
    let storage = MockStorage::with_credentials("", "leftover");

    let outcome = manager().connect(&mut wifi, &storage, &mut delay);
    assert_eq!(outcome, ConnectOutcome::NoCredentials);
    assert!(wifi.joins().is_empty());
}

#[test]
fn joins_in_station_mode_with_stored_credentials() {
    let mut wifi = MockWifi::new();
    wifi.connect_after = Some(4);
    let mut delay = MockDelay::new();
    let storage = MockStorage::with_credentials("HomeNet", "hunter22");
    let mut mgr = manager();

    let outcome = mgr.connect(&mut wifi, &storage, &mut delay);

    assert_eq!(outcome, ConnectOutcome::Connected);
    assert_eq!(mgr.state(), ConnectionState::Connected);
    assert_eq!(wifi.mode(), Some(WifiMode::Station));
    assert_eq!(
        wifi.calls,
        vec![
            WifiCall::SetMode(WifiMode::Station),
            WifiCall::Join {
                ssid: "HomeNet".into(),
                password: Some("hunter22".into()),
            },
        ]
    );
    assert_eq!(delay.waits, vec![500; 4]);
}

#[test]
fn empty_password_joins_open_network() {
    let mut wifi = MockWifi::new();
    let mut delay = MockDelay::new();
    let storage = MockStorage::with_credentials("Cafe", "");

    manager().connect(&mut wifi, &storage, &mut delay);
    assert_eq!(wifi.joins(), vec![("Cafe".to_string(), None)]);
}

#[test]
fn unreachable_network_times_out_after_thirty_seconds() {
    let mut wifi = MockWifi::unreachable();
    let mut delay = MockDelay::new();
    let storage = MockStorage::with_credentials("HomeNet", "hunter22");
    let mut mgr = manager();

    let outcome = mgr.connect(&mut wifi, &storage, &mut delay);

    assert_eq!(outcome, ConnectOutcome::TimedOut);
    assert_eq!(mgr.state(), ConnectionState::TimedOut);
    assert_eq!(delay.waits.len(), 60);
    assert_eq!(delay.total_ms(), 30_000);
}

#[test]
fn shorter_window_from_config() {
    let config = NetworkConfig {
        connect_timeout_ms: 1_000,
        connect_step_ms: 100,
        ..Default::default()
    };
    let mut wifi = MockWifi::unreachable();
    let mut delay = MockDelay::new();
    let storage = MockStorage::with_credentials("HomeNet", "");

    let outcome = ConnectionManager::new(&config).connect(&mut wifi, &storage, &mut delay);
    assert_eq!(outcome, ConnectOutcome::TimedOut);
    assert_eq!(delay.waits, vec![100; 10]);
}

#[test]
fn already_online_skips_storage_and_join() {
    let mut wifi = MockWifi::new();
    wifi.already_connected = true;
    let mut delay = MockDelay::new();
    let storage = MockStorage::new();

    let outcome = manager().connect(&mut wifi, &storage, &mut delay);

    assert_eq!(outcome, ConnectOutcome::Connected);
    assert!(wifi.calls.is_empty());
    assert!(delay.waits.is_empty());
}

#[test]
fn link_on_last_check_still_counts() {
    let mut wifi = MockWifi::new();
    wifi.connect_after = Some(60);
    let mut delay = MockDelay::new();
    let storage = MockStorage::with_credentials("HomeNet", "hunter22");

    let outcome = manager().connect(&mut wifi, &storage, &mut delay);
    assert_eq!(outcome, ConnectOutcome::Connected);
    assert_eq!(delay.waits.len(), 60);
}
