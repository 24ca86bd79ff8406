//! Integration tests for authenticated GET requests.

use std::time::Duration;

use accent::app::http_client::AuthenticatedHttpClient;
use accent::app::ports::TransportError;
use accent::config::NetworkConfig;
use accent::error::HttpGetError;

use crate::mock_hw::{MockHttpClient, MockWifi};

fn client() -> AuthenticatedHttpClient {
    AuthenticatedHttpClient::new(&NetworkConfig::default())
}

#[test]
fn success_leaves_connection_open() {
    let mut http = MockHttpClient::new();
    let wifi = MockWifi::new();

    let result = client().get(&mut http, &wifi, "http://server/next", &["a", "1", "b", "2"]);

    assert_eq!(result, Ok(()));
    assert_eq!(http.opened, vec!["http://server/next?a=1&b=2".to_string()]);
    assert!(http.open, "caller reads the body, then closes");
    assert_eq!(http.closes, 0);
}

#[test]
fn sends_basic_auth_from_hardware_address() {
    let mut http = MockHttpClient::new();
    let wifi = MockWifi::new();

    client().get(&mut http, &wifi, "http://server/next", &[]).unwrap();

    // base64(":DEADBEEFCAFE")
    assert_eq!(http.header("Authorization"), Some("Basic OkRFQURCRUVGQ0FGRQ=="));
    assert_eq!(http.timeout, Some(Duration::from_secs(30)));
}

#[test]
fn identity_is_read_on_every_request() {
    let mut wifi = MockWifi::new();
    let c = client();

    let mut first = MockHttpClient::new();
    c.get(&mut first, &wifi, "http://s/", &[]).unwrap();

    wifi.mac = "00:11:22:33:44:55";
    let mut second = MockHttpClient::new();
    c.get(&mut second, &wifi, "http://s/", &[]).unwrap();

    assert_ne!(first.header("Authorization"), second.header("Authorization"));
    // base64(":001122334455")
    assert_eq!(
        second.header("Authorization"),
        Some("Basic OjAwMTEyMjMzNDQ1NQ==")
    );
}

#[test]
fn odd_parameter_list_is_rejected_before_any_io() {
    let mut http = MockHttpClient::new();
    let wifi = MockWifi::new();

    let result = client().get(&mut http, &wifi, "http://server/next", &["a", "1", "b"]);

    assert_eq!(result, Err(HttpGetError::OddParameters(3)));
    assert!(http.opened.is_empty());
    assert_eq!(http.gets, 0);
}

#[test]
fn non_200_status_closes_connection() {
    let mut http = MockHttpClient::responding(Ok(404));
    let wifi = MockWifi::new();

    let result = client().get(&mut http, &wifi, "http://server/next", &[]);

    assert_eq!(result, Err(HttpGetError::Status(404)));
    assert!(!http.open);
    assert_eq!(http.closes, 1);
}

#[test]
fn other_2xx_is_not_success() {
    let mut http = MockHttpClient::responding(Ok(204));
    let result = client().get(&mut http, &MockWifi::new(), "http://s/", &[]);
    assert_eq!(result, Err(HttpGetError::Status(204)));
    assert!(!http.open);
}

#[test]
fn transport_error_closes_connection() {
    let mut http = MockHttpClient::responding(Err(TransportError::READ_TIMEOUT));
    let wifi = MockWifi::new();

    let result = client().get(&mut http, &wifi, "http://server/next", &[]);

    assert_eq!(
        result,
        Err(HttpGetError::Transport(TransportError::READ_TIMEOUT))
    );
    assert!(!http.open);
}

#[test]
fn open_failure_is_connect_failed() {
    let mut http = MockHttpClient::new();
    http.fail_open = true;

    let result = client().get(&mut http, &MockWifi::new(), "http://server/next", &[]);

    assert_eq!(result, Err(HttpGetError::ConnectFailed));
    assert_eq!(http.gets, 0);
}

#[test]
fn get_url_sends_no_query() {
    let mut http = MockHttpClient::new();
    client()
        .get_url(&mut http, &MockWifi::new(), "http://server/epd")
        .unwrap();
    assert_eq!(http.opened, vec!["http://server/epd".to_string()]);
}

#[test]
fn parameters_are_not_percent_encoded() {
    let mut http = MockHttpClient::new();
    client()
        .get(&mut http, &MockWifi::new(), "http://s/p", &["q", "a b&c"])
        .unwrap();
    assert_eq!(http.opened, vec!["http://s/p?q=a b&c".to_string()]);
}
