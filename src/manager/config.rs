//! Manager configuration.
//!
//! Field names deserialize from the camelCase keys producers already use in
//! their JSON service configs (`uri`, `login`, `sendTimeout`, ...).

use crate::base::brokererror::BrokerError;
use crate::dns::{BrokerUri, GaiResolver, HickoryResolver, ProtocolFamily, Resolve};
use crate::transport::{DialOptions, Heartbeat};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Login value that switches the manager into dry-run mode: addresses are
/// resolved but nothing is dialed or transmitted.
pub const TEST_LOGIN: &str = "test";

/// Which DNS resolver the manager uses for the broker host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsBackend {
    /// Operating system resolver (getaddrinfo).
    #[default]
    System,
    /// Async hickory-dns resolver.
    Hickory,
}

impl DnsBackend {
    /// Resolver for this backend. `family` only narrows hickory's query types;
    /// the system resolver always returns both families.
    pub fn resolver(&self, family: ProtocolFamily) -> Arc<dyn Resolve> {
        match self {
            DnsBackend::System => Arc::new(GaiResolver::new()),
            DnsBackend::Hickory => Arc::new(HickoryResolver::for_family(family)),
        }
    }
}

/// Configuration held by a [`BrokerManager`](super::BrokerManager).
#[derive(Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagerConfig {
    /// Broker address as `host:port`.
    pub uri: String,

    pub login: String,

    pub password: String,

    /// Queue or topic messages are sent to.
    #[serde(alias = "endpoint")]
    pub destination: String,

    /// Content-type tag attached to every message.
    pub content_type: String,

    /// Address family used when filtering resolved addresses (default: tcp4).
    pub protocol: ProtocolFamily,

    /// Send attempts per message, including the first.
    pub iterations: usize,

    /// Heartbeat send interval in milliseconds.
    #[serde(rename = "sendTimeout")]
    pub send_timeout_ms: u64,

    /// Heartbeat receive interval in milliseconds.
    #[serde(rename = "recvTimeout")]
    pub recv_timeout_ms: u64,

    /// Multiplier on the receive interval before a session is considered dead.
    /// Zero means 1.
    #[serde(rename = "heartBeatGracePeriod")]
    pub heartbeat_grace_multiplier: f64,

    /// Diagnostic verbosity; anything above 0 logs endpoints and sends.
    pub verbose: u8,

    pub retry_base_delay_ms: u64,

    pub retry_max_delay_ms: u64,

    pub dns: DnsBackend,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            uri: String::new(),
            login: String::new(),
            password: String::new(),
            destination: String::new(),
            content_type: String::new(),
            protocol: ProtocolFamily::Tcp4,
            iterations: 1,
            send_timeout_ms: 0,
            recv_timeout_ms: 0,
            heartbeat_grace_multiplier: 1.0,
            verbose: 0,
            retry_base_delay_ms: 0,
            retry_max_delay_ms: 5000,
            dns: DnsBackend::System,
        }
    }
}

impl std::fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("uri", &self.uri)
            .field("login", &self.login)
            .field("password", &if self.password.is_empty() { "" } else { "<redacted>" })
            .field("destination", &self.destination)
            .field("content_type", &self.content_type)
            .field("protocol", &self.protocol)
            .field("iterations", &self.iterations)
            .field("send_timeout_ms", &self.send_timeout_ms)
            .field("recv_timeout_ms", &self.recv_timeout_ms)
            .field("heartbeat_grace_multiplier", &self.heartbeat_grace_multiplier)
            .field("verbose", &self.verbose)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("dns", &self.dns)
            .finish()
    }
}

impl ManagerConfig {
    /// Configuration with credentials set and everything else defaulted.
    pub fn new(
        uri: impl Into<String>,
        login: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            login: login.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    /// Check that everything needed to dial is present.
    pub fn validate(&self) -> Result<(), BrokerError> {
        if self.uri.is_empty() {
            return Err(BrokerError::MissingConfig("URI"));
        }
        if self.login.is_empty() {
            return Err(BrokerError::MissingConfig("login"));
        }
        if self.password.is_empty() {
            return Err(BrokerError::MissingConfig("password"));
        }
        Ok(())
    }

    pub fn broker_uri(&self) -> Result<BrokerUri, BrokerError> {
        self.uri.parse()
    }

    pub fn is_test_mode(&self) -> bool {
        self.login == TEST_LOGIN
    }

    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat::from_millis(
            self.send_timeout_ms,
            self.recv_timeout_ms,
            self.heartbeat_grace_multiplier,
        )
    }

    pub fn dial_options(&self) -> DialOptions {
        DialOptions {
            protocol: self.protocol,
            login: self.login.clone(),
            password: Zeroizing::new(self.password.clone()),
            heartbeat: self.heartbeat(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_validate_order() {
        let mut config = ManagerConfig::default();
        assert!(matches!(config.validate(), Err(BrokerError::MissingConfig("URI"))));

        config.uri = "broker.example.com:61613".into();
        assert!(matches!(config.validate(), Err(BrokerError::MissingConfig("login"))));

        config.login = "producer".into();
        assert!(matches!(config.validate(), Err(BrokerError::MissingConfig("password"))));

        config.password = "secret".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_service_config() {
        let json = r#"{
            "uri": "broker.example.com:61613",
            "login": "producer",
            "password": "secret",
            "iterations": 3,
            "sendTimeout": 1000,
            "recvTimeout": 2000,
            "heartBeatGracePeriod": 2.5,
            "endpoint": "/topic/monitoring",
            "contentType": "application/json",
            "protocol": "tcp6",
            "verbose": 1
        }"#;

        let config: ManagerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.uri, "broker.example.com:61613");
        assert_eq!(config.destination, "/topic/monitoring");
        assert_eq!(config.content_type, "application/json");
        assert_eq!(config.protocol, ProtocolFamily::Tcp6);
        assert_eq!(config.iterations, 3);
        assert_eq!(config.verbose, 1);
        assert_eq!(config.dns, DnsBackend::System);
        assert_eq!(config.retry_max_delay_ms, 5000);

        let hb = config.heartbeat();
        assert_eq!(hb.send, Duration::from_millis(1000));
        assert_eq!(hb.read_timeout(), Duration::from_millis(5000));
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{"uri": "broker:61613", "protocol": "", "heartBeatGracePeriod": 0}"#;
        let config: ManagerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.protocol, ProtocolFamily::Tcp4);
        assert_eq!(config.iterations, 1);
        assert_eq!(config.heartbeat().grace_multiplier, 1.0);
    }

    #[test]
    fn test_deserialize_hickory_backend() {
        let config: ManagerConfig = serde_json::from_str(r#"{"dns": "hickory"}"#).unwrap();
        assert_eq!(config.dns, DnsBackend::Hickory);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ManagerConfig::new("broker:61613", "producer", "hunter2");
        let debug = format!("{:?}", config);
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_test_mode() {
        assert!(ManagerConfig::new("broker:61613", "test", "test").is_test_mode());
        assert!(!ManagerConfig::new("broker:61613", "producer", "test").is_test_mode());
    }

    #[test]
    fn test_dial_options() {
        let mut config = ManagerConfig::new("broker:61613", "producer", "secret");
        config.protocol = ProtocolFamily::Tcp;
        let options = config.dial_options();

        assert_eq!(options.protocol, ProtocolFamily::Tcp);
        assert_eq!(options.login, "producer");
        assert_eq!(options.password.as_str(), "secret");
    }
}
