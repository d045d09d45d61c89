//! Resolver seam: hostname in, IP addresses out.

use crate::base::brokererror::BrokerError;
use std::{
    borrow::Cow, collections::HashMap, fmt, future::Future, net::IpAddr, pin::Pin, sync::Arc,
};

/// Broker hostname handed to a [`Resolve`] implementation.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct Name {
    host: Box<str>,
}

impl Name {
    pub fn new(host: impl Into<Box<str>>) -> Self {
        Self { host: host.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.host
    }
}

impl From<&str> for Name {
    fn from(value: &str) -> Self {
        Name::new(value)
    }
}

impl From<String> for Name {
    fn from(value: String) -> Self {
        Name::new(value)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.host, f)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.host, f)
    }
}

/// Addresses returned by one lookup, in resolver order.
pub type Addrs = Box<dyn Iterator<Item = IpAddr> + Send>;

/// Pending lookup.
pub type Resolving = Pin<Box<dyn Future<Output = Result<Addrs, BrokerError>> + Send>>;

/// Trait for DNS resolution.
///
/// Implementations perform a forward lookup of a broker hostname and return
/// every address it maps to, in resolver order. Family filtering and port
/// assignment happen one layer up, in [`resolve_endpoints`](super::resolve_endpoints).
/// An empty answer should be reported as an error rather than an empty
/// iterator.
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: Name) -> Resolving;
}

impl<R: Resolve + ?Sized> Resolve for Arc<R> {
    fn resolve(&self, name: Name) -> Resolving {
        (**self).resolve(name)
    }
}

/// Answers configured hostnames from a fixed table and forwards everything
/// else to `inner`.
///
/// Handy for pinning a broker alias to known instances without touching
/// system DNS.
///
/// # Example
///
/// ```rust,ignore
/// use brokerpool::dns::{DnsResolverWithOverrides, GaiResolver};
/// use std::collections::HashMap;
///
/// let mut overrides = HashMap::new();
/// overrides.insert(
///     "broker.local".into(),
///     vec!["10.0.0.1".parse().unwrap(), "10.0.0.2".parse().unwrap()],
/// );
///
/// let resolver = DnsResolverWithOverrides::new(Arc::new(GaiResolver::new()), overrides);
/// ```
pub struct DnsResolverWithOverrides {
    inner: Arc<dyn Resolve>,
    overrides: Arc<HashMap<Cow<'static, str>, Vec<IpAddr>>>,
}

impl DnsResolverWithOverrides {
    pub fn new(
        inner: Arc<dyn Resolve>,
        overrides: HashMap<Cow<'static, str>, Vec<IpAddr>>,
    ) -> Self {
        Self {
            inner,
            overrides: Arc::new(overrides),
        }
    }

    pub fn override_count(&self) -> usize {
        self.overrides.len()
    }
}

impl Resolve for DnsResolverWithOverrides {
    fn resolve(&self, name: Name) -> Resolving {
        if let Some(addrs) = self.overrides.get(name.as_str()) {
            tracing::debug!(domain = %name, count = addrs.len(), "using DNS override");
            let addrs: Addrs = Box::new(addrs.clone().into_iter());
            return Box::pin(std::future::ready(Ok(addrs)));
        }
        self.inner.resolve(name)
    }
}

impl fmt::Debug for DnsResolverWithOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DnsResolverWithOverrides")
            .field("override_count", &self.overrides.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_name_from_str() {
        let name = Name::from("broker.example.com");
        assert_eq!(name.as_str(), "broker.example.com");
        assert_eq!(name.to_string(), "broker.example.com");
    }

    #[test]
    fn test_name_equality() {
        let name1 = Name::new("broker.example.com");
        let name2 = Name::from(String::from("broker.example.com"));
        let name3 = Name::new("other.example.com");

        assert_eq!(name1, name2);
        assert_ne!(name1, name3);
    }

    struct MockResolver {
        response: Vec<IpAddr>,
    }

    impl Resolve for MockResolver {
        fn resolve(&self, _name: Name) -> Resolving {
            let addrs = self.response.clone();
            Box::pin(async move { Ok(Box::new(addrs.into_iter()) as Addrs) })
        }
    }

    #[tokio::test]
    async fn test_override_resolver_hit() {
        let mock = Arc::new(MockResolver {
            response: vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))],
        });

        let mut overrides = HashMap::new();
        overrides.insert(
            Cow::Borrowed("broker.local"),
            vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))],
        );

        let resolver = DnsResolverWithOverrides::new(mock, overrides);
        assert_eq!(resolver.override_count(), 1);

        let addrs: Vec<_> = resolver
            .resolve(Name::new("broker.local"))
            .await
            .unwrap()
            .collect();

        assert_eq!(
            addrs,
            vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2))]
        );
    }

    #[tokio::test]
    async fn test_override_resolver_miss() {
        let mock = Arc::new(MockResolver {
            response: vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))],
        });

        let resolver = DnsResolverWithOverrides::new(mock, HashMap::new());

        let addrs: Vec<_> = resolver
            .resolve(Name::new("not-overridden.example.com"))
            .await
            .unwrap()
            .collect();

        assert_eq!(addrs, vec![IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8))]);
    }
}
