//! Application core: the network logic, zero direct I/O.
//!
//! Joining the stored network, the captive setup portal and authenticated
//! outbound requests.  All interaction with the radio, storage and sockets
//! happens through **port traits** defined in [`ports`], keeping this layer
//! testable without a device.

pub mod connection;
pub mod credentials;
pub mod events;
pub mod http_client;
pub mod portal;
pub mod ports;
pub mod service;
