//! Broker transport seam.
//!
//! The wire protocol (framing, handshake, heartbeat negotiation, receipts)
//! lives outside this crate. The manager only needs three operations from it:
//!
//! - [`Transport::dial`]: open a session to one [`Endpoint`]
//! - [`Connection::send`]: publish one message to a destination
//! - [`Connection::disconnect`]: close the session
//!
//! Implement these traits over your protocol client of choice and hand the
//! transport to [`BrokerManager`](crate::manager::BrokerManager).

use crate::dns::{Endpoint, ProtocolFamily};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use zeroize::Zeroizing;

/// Error type reported by transport implementations.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Heartbeat negotiation parameters passed to every dial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heartbeat {
    /// Interval at which the client promises to send heartbeats.
    pub send: Duration,
    /// Interval at which the client expects heartbeats from the broker.
    pub recv: Duration,
    /// Multiplier applied to `recv` before the connection is declared dead.
    pub grace_multiplier: f64,
}

impl Heartbeat {
    /// Builds heartbeat settings from millisecond intervals.
    ///
    /// A multiplier that is zero, negative, or not finite is treated as 1.
    pub fn from_millis(send_ms: u64, recv_ms: u64, grace_multiplier: f64) -> Self {
        let grace_multiplier = if grace_multiplier.is_finite() && grace_multiplier > 0.0 {
            grace_multiplier
        } else {
            1.0
        };
        Self {
            send: Duration::from_millis(send_ms),
            recv: Duration::from_millis(recv_ms),
            grace_multiplier,
        }
    }

    /// How long to wait for broker traffic before giving up on the session.
    ///
    /// Saturates at `Duration::MAX` for very large multipliers.
    pub fn read_timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.recv.as_secs_f64() * self.grace_multiplier)
            .unwrap_or(Duration::MAX)
    }
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::from_millis(0, 0, 1.0)
    }
}

/// Everything a transport needs to open a session.
#[derive(Clone)]
pub struct DialOptions {
    pub protocol: ProtocolFamily,
    pub login: String,
    /// Broker password (zeroized on drop)
    pub password: Zeroizing<String>,
    pub heartbeat: Heartbeat,
}

impl fmt::Debug for DialOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialOptions")
            .field("protocol", &self.protocol)
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("heartbeat", &self.heartbeat)
            .finish()
    }
}

/// Per-message options forwarded to the connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    headers: Vec<(String, String)>,
}

impl SendOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an extra header to the outgoing message.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// A single message handed to [`Connection::send`].
#[derive(Debug, Clone, Copy)]
pub struct Outgoing<'a> {
    pub destination: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
    pub headers: &'a [(String, String)],
}

/// A live session to one broker endpoint.
pub trait Connection: Send {
    /// Publish one message. An error means the session should be treated as broken.
    fn send<'a>(&'a mut self, message: Outgoing<'a>) -> BoxFuture<'a, Result<(), TransportError>>;

    /// Close the session.
    fn disconnect(&mut self) -> BoxFuture<'_, Result<(), TransportError>>;
}

/// Opens sessions to broker endpoints.
pub trait Transport: Send + Sync {
    type Conn: Connection;

    fn dial<'a>(
        &'a self,
        endpoint: Endpoint,
        options: &'a DialOptions,
    ) -> BoxFuture<'a, Result<Self::Conn, TransportError>>;
}

/// Blanket implementation for Arc-wrapped transports.
impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Conn = T::Conn;

    fn dial<'a>(
        &'a self,
        endpoint: Endpoint,
        options: &'a DialOptions,
    ) -> BoxFuture<'a, Result<Self::Conn, TransportError>> {
        (**self).dial(endpoint, options)
    }
}
