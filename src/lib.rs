//! # brokerpool
//!
//! A resilient producer-side connection manager for message brokers.
//!
//! `brokerpool` resolves a broker `host:port` into every matching address,
//! keeps one connection per address, and sends each message over a randomly
//! chosen connection. A failed send tears the pool down and tries again, up
//! to a configured number of attempts.
//!
//! ## Features
//!
//! - **Endpoint Resolution**: system or hickory DNS, filtered by tcp/tcp4/tcp6
//! - **Connection Pooling**: one slot per address, partial availability tolerated
//! - **Random Selection**: uniform, with an injectable seedable source
//! - **Bounded Retry**: reset and reconnect between attempts, optional backoff
//! - **Test Mode**: login `test` resolves addresses but never dials
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use brokerpool::{BrokerManager, ManagerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut config = ManagerConfig::new("broker.example.com:61613", "producer", "secret");
//!     config.destination = "/topic/monitoring".into();
//!     config.iterations = 3;
//!
//!     let mut manager = BrokerManager::new(config, MyStompTransport::default()).await;
//!     manager.send(br#"{"status":"ok"}"#).await.unwrap();
//! }
//! ```
//!
//! The wire protocol is supplied by the caller through the
//! [`transport::Transport`] and [`transport::Connection`] traits.
//!
//! ## Modules
//!
//! - [`base`] - Error type and context helpers
//! - [`dns`] - Resolvers and endpoint derivation
//! - [`transport`] - Dialing and sending seam
//! - [`pool`] - Connection pool and random selection
//! - [`manager`] - Configuration, retry policy, and the manager itself

pub mod base;
pub mod dns;
pub mod manager;
pub mod pool;
pub mod transport;

pub use base::brokererror::BrokerError;
pub use dns::{Endpoint, ProtocolFamily};
pub use manager::{BrokerManager, ManagerConfig};
