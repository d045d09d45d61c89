use crate::dns::Endpoint;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

/// Shared, cloneable error source coming from a resolver or transport.
pub type ErrorSource = Arc<dyn StdError + Send + Sync>;

#[derive(Debug, Error, Clone)]
pub enum BrokerError {
    // Configuration Errors
    #[error("Unable to connect to broker, no {0} configured")]
    MissingConfig(&'static str),
    #[error("Invalid broker URI '{0}', expected host:port")]
    InvalidUri(String),

    // Resolution Errors
    #[error("Unable to resolve {domain}: {source}")]
    NameNotResolvedFor {
        domain: String,
        #[source]
        source: ErrorSource,
    },
    #[error("No usable {protocol} address found for {uri}")]
    NoAddress { uri: String, protocol: String },

    // Connection Errors
    #[error("Unable to connect to {endpoint}: {source}")]
    DialFailed {
        endpoint: Endpoint,
        #[source]
        source: ErrorSource,
    },
    #[error("No live connection to {endpoint}")]
    NotConnected { endpoint: Endpoint },

    // Transmission Errors
    #[error("Unable to send to {destination} via {endpoint}: {source}")]
    SendFailed {
        destination: String,
        endpoint: Endpoint,
        #[source]
        source: ErrorSource,
    },
}

impl BrokerError {
    pub fn dns_failed(domain: &str, source: impl StdError + Send + Sync + 'static) -> Self {
        BrokerError::NameNotResolvedFor {
            domain: domain.to_string(),
            source: Arc::new(source),
        }
    }

    /// Errors the send loop returns without a further attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BrokerError::MissingConfig(_) | BrokerError::InvalidUri(_))
    }

    /// Endpoint the error is attached to, if any.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        match self {
            BrokerError::DialFailed { endpoint, .. }
            | BrokerError::NotConnected { endpoint }
            | BrokerError::SendFailed { endpoint, .. } => Some(endpoint),
            _ => None,
        }
    }
}
