//! Outbound HTTP client adapter.
//!
//! Implements [`HttpClientPort`].  On the device each request runs over a
//! fresh `EspHttpConnection` configured with the read timeout; the
//! connection lives until [`close`](HttpClientPort::close) so the caller can
//! stream the body after a 200.
//!
//! On the host the adapter answers every request with a canned response.

use core::time::Duration;
use log::debug;

use crate::app::ports::{HttpClientPort, TransportError};

#[cfg(target_os = "espidf")]
use embedded_svc::http::Method;
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration, EspHttpConnection};
#[cfg(target_os = "espidf")]
use log::warn;

pub struct HttpClientAdapter {
    url: Option<String>,
    timeout: Option<Duration>,
    headers: Vec<(String, String)>,
    #[cfg(target_os = "espidf")]
    connection: Option<EspHttpConnection>,
    /// Simulation: response returned by every `get`.
    #[cfg(not(target_os = "espidf"))]
    sim_response: Result<u16, TransportError>,
    #[cfg(not(target_os = "espidf"))]
    sim_body: Vec<u8>,
    /// Simulation: read cursor into `sim_body`, `None` while closed.
    #[cfg(not(target_os = "espidf"))]
    sim_cursor: Option<usize>,
}

impl Default for HttpClientAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientAdapter {
    pub fn new() -> Self {
        Self {
            url: None,
            timeout: None,
            headers: Vec::new(),
            #[cfg(target_os = "espidf")]
            connection: None,
            #[cfg(not(target_os = "espidf"))]
            sim_response: Ok(200),
            #[cfg(not(target_os = "espidf"))]
            sim_body: Vec::new(),
            #[cfg(not(target_os = "espidf"))]
            sim_cursor: None,
        }
    }

    /// Simulation: answer every request with `response` and `body`.
    #[cfg(not(target_os = "espidf"))]
    pub fn with_response(mut self, response: Result<u16, TransportError>, body: &[u8]) -> Self {
        self.sim_response = response;
        self.sim_body = body.to_vec();
        self
    }

    /// URL of the prepared request, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_get(&mut self, url: &str) -> Result<u16, TransportError> {
        let config = Configuration {
            timeout: self.timeout,
            crt_bundle_attach: url
                .starts_with("https://")
                .then_some(esp_idf_svc::sys::esp_crt_bundle_attach as _),
            ..Default::default()
        };
        let mut connection = EspHttpConnection::new(&config).map_err(|e| {
            warn!("HttpClient(espidf): connection setup failed — {}", e);
            TransportError::CONNECTION_REFUSED
        })?;
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        connection
            .initiate_request(Method::Get, url, &headers)
            .map_err(|e| map_esp_err(e.code()))?;
        connection
            .initiate_response()
            .map_err(|e| map_esp_err(e.code()))?;
        let status = connection.status();
        self.connection = Some(connection);
        Ok(status)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_get(&mut self, _url: &str) -> Result<u16, TransportError> {
        let status = self.sim_response?;
        self.sim_cursor = Some(0);
        Ok(status)
    }

    #[cfg(target_os = "espidf")]
    fn platform_read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let connection = self
            .connection
            .as_mut()
            .ok_or(TransportError::NOT_CONNECTED)?;
        connection.read(buf).map_err(|e| map_esp_err(e.code()))
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let cursor = self.sim_cursor.ok_or(TransportError::NOT_CONNECTED)?;
        let remaining = &self.sim_body[cursor..];
        let n = remaining.len().min(buf.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.sim_cursor = Some(cursor + n);
        Ok(n)
    }

    #[cfg(target_os = "espidf")]
    fn platform_close(&mut self) {
        self.connection = None;
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_close(&mut self) {
        self.sim_cursor = None;
    }
}

#[cfg(target_os = "espidf")]
fn map_esp_err(code: esp_idf_svc::sys::esp_err_t) -> TransportError {
    use esp_idf_svc::sys::{
        ESP_ERR_HTTP_CONNECT, ESP_ERR_HTTP_EAGAIN, ESP_ERR_HTTP_FETCH_HEADER,
        ESP_ERR_HTTP_WRITE_DATA,
    };
    match code {
        ESP_ERR_HTTP_CONNECT => TransportError::CONNECTION_REFUSED,
        ESP_ERR_HTTP_WRITE_DATA => TransportError::SEND_HEADER_FAILED,
        ESP_ERR_HTTP_FETCH_HEADER | ESP_ERR_HTTP_EAGAIN => TransportError::READ_TIMEOUT,
        _ => TransportError::CONNECTION_LOST,
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    rest.is_some_and(|host| !host.is_empty() && !host.starts_with('/'))
}

impl HttpClientPort for HttpClientAdapter {
    fn open(&mut self, url: &str) -> Result<(), TransportError> {
        self.close();
        if !is_http_url(url) {
            return Err(TransportError::CONNECTION_REFUSED);
        }
        self.url = Some(url.to_string());
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn get(&mut self) -> Result<u16, TransportError> {
        let url = self.url.clone().ok_or(TransportError::NOT_CONNECTED)?;
        debug!("HttpClient: GET {}", url);
        self.platform_get(&url)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        self.platform_read(buf)
    }

    fn close(&mut self) {
        self.platform_close();
        self.url = None;
        self.headers.clear();
    }
}
