//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting IO and transport errors into context-rich `BrokerError` variants.

use crate::base::brokererror::BrokerError;
use crate::dns::Endpoint;
use crate::transport::TransportError;
use std::io;
use std::sync::Arc;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add DNS resolution context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use brokerpool::base::context::IoResultExt;
    ///
    /// let addrs = (host, 0).to_socket_addrs().dns_context(host)?;
    /// // Error: "Unable to resolve broker.example.com: no such host"
    /// ```
    fn dns_context(self, domain: &str) -> Result<T, BrokerError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn dns_context(self, domain: &str) -> Result<T, BrokerError> {
        self.map_err(|e| BrokerError::dns_failed(domain, e))
    }
}

/// Extension trait for attaching endpoint context to transport Results.
pub trait TransportResultExt<T> {
    /// Wrap a dial failure with the endpoint that was being dialed.
    fn dial_context(self, endpoint: &Endpoint) -> Result<T, BrokerError>;

    /// Wrap a transmission failure with destination and endpoint.
    fn send_context(self, destination: &str, endpoint: &Endpoint) -> Result<T, BrokerError>;
}

impl<T> TransportResultExt<T> for Result<T, TransportError> {
    fn dial_context(self, endpoint: &Endpoint) -> Result<T, BrokerError> {
        self.map_err(|e| BrokerError::DialFailed {
            endpoint: *endpoint,
            source: Arc::from(e),
        })
    }

    fn send_context(self, destination: &str, endpoint: &Endpoint) -> Result<T, BrokerError> {
        self.map_err(|e| BrokerError::SendFailed {
            destination: destination.to_string(),
            endpoint: *endpoint,
            source: Arc::from(e),
        })
    }
}
