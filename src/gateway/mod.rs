//! The persistent, authenticated WebSocket connection engine: heartbeat and
//! read loops, session resume, reconnect with backoff, and close-code
//! classification.

mod connection;
mod heartbeat;
pub mod message;

pub use connection::{GatewayConnection, GatewayOptions};

/// The gateway protocol version this crate speaks, appended to the gateway
/// URL's query string when the URL does not already carry one.
pub const GATEWAY_VERSION: u8 = 1;

/// How long the heartbeat loop waits for an initial HELLO before giving up
/// and asking the connection to reconnect.
pub const HELLO_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Floor of the bounded exponential reconnect backoff.
pub const RECONNECT_BACKOFF_FLOOR: std::time::Duration = std::time::Duration::from_secs(2);

/// Ceiling of the bounded exponential reconnect backoff.
pub const RECONNECT_BACKOFF_CAP: std::time::Duration = std::time::Duration::from_secs(30);
