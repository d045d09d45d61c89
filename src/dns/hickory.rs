//! Async resolver backed by hickory-dns.
//!
//! Reads the system resolver configuration when it can and falls back to
//! hickory's defaults otherwise. The lookup strategy follows the protocol
//! family the manager filters for, so a `tcp4` manager never waits on AAAA
//! records.
//!
//! Select it with `dns = "hickory"` in [`ManagerConfig`](crate::manager::ManagerConfig).

use super::{Addrs, Name, ProtocolFamily, Resolve, Resolving};
use crate::base::brokererror::BrokerError;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{io, net::IpAddr, sync::Arc};

/// hickory-dns resolver. Clones share one underlying resolver and its cache.
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    inner: Arc<TokioResolver>,
    strategy: LookupIpStrategy,
}

impl HickoryResolver {
    /// Dual-stack resolver.
    pub fn new() -> Self {
        Self::for_family(ProtocolFamily::Tcp)
    }

    /// Resolver that only queries the record types `family` can use.
    pub fn for_family(family: ProtocolFamily) -> Self {
        let strategy = match family {
            ProtocolFamily::Tcp => LookupIpStrategy::Ipv4AndIpv6,
            ProtocolFamily::Tcp4 => LookupIpStrategy::Ipv4Only,
            ProtocolFamily::Tcp6 => LookupIpStrategy::Ipv6Only,
        };

        let mut builder = match TokioResolver::builder_tokio() {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!(error = %e, "unable to read system DNS config, using defaults");
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
            }
        };
        builder.options_mut().ip_strategy = strategy;

        Self {
            inner: Arc::new(builder.build()),
            strategy,
        }
    }

    pub fn strategy(&self) -> LookupIpStrategy {
        self.strategy
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = self.inner.clone();
        Box::pin(async move {
            let host = name.as_str();

            let lookup = inner.lookup_ip(host).await.map_err(|e| {
                tracing::debug!(%host, error = %e, "hickory lookup failed");
                BrokerError::dns_failed(
                    host,
                    io::Error::new(io::ErrorKind::NotFound, e.to_string()),
                )
            })?;

            let addrs: Vec<IpAddr> = lookup.iter().collect();
            if addrs.is_empty() {
                return Err(BrokerError::dns_failed(
                    host,
                    io::Error::new(io::ErrorKind::NotFound, "empty answer"),
                ));
            }

            tracing::debug!(%host, count = addrs.len(), "hickory lookup complete");
            Ok(Box::new(addrs.into_iter()) as Addrs)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_domain_is_name_not_resolved() {
        let resolver = HickoryResolver::new();
        let err = resolver
            .resolve(Name::new("broker.does-not-exist.invalid"))
            .await
            .err()
            .expect("lookup should fail");

        match err {
            BrokerError::NameNotResolvedFor { domain, .. } => {
                assert_eq!(domain, "broker.does-not-exist.invalid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_ip_literal_resolves_locally() {
        let resolver = HickoryResolver::for_family(ProtocolFamily::Tcp4);
        let addrs: Vec<_> = resolver.resolve(Name::new("127.0.0.1")).await.unwrap().collect();
        assert_eq!(addrs, vec![IpAddr::from([127, 0, 0, 1])]);
    }

    #[tokio::test]
    async fn test_strategy_follows_family() {
        assert_eq!(HickoryResolver::new().strategy(), LookupIpStrategy::Ipv4AndIpv6);
        assert_eq!(
            HickoryResolver::for_family(ProtocolFamily::Tcp6).strategy(),
            LookupIpStrategy::Ipv6Only
        );
    }

    #[tokio::test]
    async fn test_clones_share_resolver() {
        let r1 = HickoryResolver::for_family(ProtocolFamily::Tcp4);
        let r2 = r1.clone();
        assert!(Arc::ptr_eq(&r1.inner, &r2.inner));
    }
}
