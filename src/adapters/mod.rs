//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `display`      | DisplayPort        | Error screen / serial log    |
//! | `http_client`  | HttpClientPort     | ESP-IDF HTTP client          |
//! | `http_server`  | HttpServerPort     | lwIP / std TCP listener      |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `nvs`          | StoragePort        | NVS / in-memory store        |
//! | `power`        | PowerPort          | `esp_restart`                |
//! | `time`         | DelayPort          | ESP32 system timer           |
//! | `wifi`         | WifiPort           | ESP-IDF WiFi STA / soft AP   |
//!
//! `device_id` is a helper for `wifi`: it reads and formats the MAC.

pub mod device_id;
pub mod display;
pub mod http_client;
pub mod http_server;
pub mod log_sink;
pub mod nvs;
pub mod power;
pub mod time;
pub mod wifi;
