//! DNS Resolution Module
//!
//! Provides pluggable DNS resolution with support for:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver (DoH/DoT capable)
//! - Hostname-to-IP override mechanism
//! - Broker URI parsing and protocol-family filtering into [`Endpoint`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use brokerpool::dns::{resolve_endpoints, BrokerUri, GaiResolver, ProtocolFamily};
//!
//! let uri: BrokerUri = "broker.example.com:61613".parse()?;
//! let endpoints = resolve_endpoints(&GaiResolver::new(), &uri, ProtocolFamily::Tcp4).await?;
//! for endpoint in endpoints {
//!     println!("Resolved: {}", endpoint);
//! }
//! ```

mod endpoint;
mod gai;
mod hickory;
mod resolve;

pub use endpoint::{resolve_endpoints, BrokerUri, Endpoint, ProtocolFamily};
pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use resolve::{Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
