use crate::base::brokererror::BrokerError;
use crate::dns::Endpoint;
use std::sync::Arc;

#[test]
fn test_missing_config_is_fatal() {
    let err = BrokerError::MissingConfig("login");
    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "Unable to connect to broker, no login configured");
}

#[test]
fn test_invalid_uri_is_fatal() {
    let err = BrokerError::InvalidUri("broker.example.com".into());
    assert!(err.is_fatal());
    assert!(err.endpoint().is_none());
}

#[test]
fn test_transient_errors_are_not_fatal() {
    let endpoint: Endpoint = "10.0.0.1:61613".parse().unwrap();
    let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");

    let errors = [
        BrokerError::dns_failed("broker.example.com", io),
        BrokerError::NoAddress {
            uri: "broker.example.com:61613".into(),
            protocol: "tcp6".into(),
        },
        BrokerError::NotConnected { endpoint },
        BrokerError::SendFailed {
            destination: "/topic/x".into(),
            endpoint,
            source: Arc::new(std::io::Error::other("eof")),
        },
    ];

    for err in errors {
        assert!(!err.is_fatal(), "{err} should be retryable");
    }
}

#[test]
fn test_error_is_clone_and_keeps_source() {
    use std::error::Error;

    let err = BrokerError::dns_failed(
        "broker.example.com",
        std::io::Error::new(std::io::ErrorKind::NotFound, "no such host"),
    );
    let cloned = err.clone();

    assert_eq!(err.to_string(), cloned.to_string());
    assert_eq!(cloned.source().map(|s| s.to_string()), Some("no such host".to_string()));
}
