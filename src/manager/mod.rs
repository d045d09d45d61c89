//! Broker manager facade.
//!
//! [`BrokerManager`] ties the pieces together: it resolves the configured
//! URI, keeps a [`ConnectionPool`](crate::pool::ConnectionPool) over the
//! resolved endpoints, and retries failed sends after a pool reset.

mod broker;
pub mod config;
pub mod retry;

pub use broker::{BrokerManager, ManagerBuilder, Picked};
pub use config::{DnsBackend, ManagerConfig, TEST_LOGIN};
pub use retry::RetryPolicy;
