//! Broker endpoint resolution.
//!
//! Turns a configured `host:port` broker URI into the ordered list of
//! concrete endpoints the connection pool dials, keeping only the address
//! family the manager was asked to use.

use super::{Name, Resolve};
use crate::base::brokererror::BrokerError;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

/// Network protocol family preference used to filter resolved addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ProtocolFamily {
    /// IPv4 and IPv6.
    Tcp,
    /// IPv4 only.
    #[default]
    Tcp4,
    /// IPv6 only.
    Tcp6,
}

impl ProtocolFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolFamily::Tcp => "tcp",
            ProtocolFamily::Tcp4 => "tcp4",
            ProtocolFamily::Tcp6 => "tcp6",
        }
    }

    /// Whether an address of this IP version may be used.
    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match self {
            ProtocolFamily::Tcp => true,
            ProtocolFamily::Tcp4 => ip.is_ipv4(),
            ProtocolFamily::Tcp6 => ip.is_ipv6(),
        }
    }
}

impl TryFrom<String> for ProtocolFamily {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ProtocolFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProtocolFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tcp" => Ok(ProtocolFamily::Tcp),
            "tcp4" | "" => Ok(ProtocolFamily::Tcp4),
            "tcp6" => Ok(ProtocolFamily::Tcp6),
            other => Err(format!("unknown protocol family '{}'", other)),
        }
    }
}

/// A concrete broker address.
///
/// Displays as `a.b.c.d:port` for IPv4 and `[addr]:port` for IPv6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Endpoint(SocketAddr);

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self(SocketAddr::new(ip, port))
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.0
    }

    pub fn ip(&self) -> IpAddr {
        self.0.ip()
    }

    pub fn port(&self) -> u16 {
        self.0.port()
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl FromStr for Endpoint {
    type Err = std::net::AddrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<SocketAddr>().map(Self)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A parsed `host:port` broker URI.
///
/// The split happens on the first colon, so bare IPv6 literals are not
/// accepted here; configure a hostname or an IPv4 literal instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerUri {
    host: String,
    port: u16,
}

impl BrokerUri {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for BrokerUri {
    type Err = BrokerError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let invalid = || BrokerError::InvalidUri(uri.to_string());

        let (host, rest) = uri.split_once(':').ok_or_else(invalid)?;
        // Anything after a second colon is ignored, matching a plain host:port split.
        let port = rest.split(':').next().unwrap_or_default();

        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for BrokerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Resolves a broker URI into the endpoints matching `family`.
///
/// Lookup failures are returned as-is. A lookup that succeeds but leaves no
/// address of the requested family returns an empty list, which the caller
/// must treat as "no usable endpoint".
pub async fn resolve_endpoints(
    resolver: &dyn Resolve,
    uri: &BrokerUri,
    family: ProtocolFamily,
) -> Result<Vec<Endpoint>, BrokerError> {
    let addrs = resolver.resolve(Name::new(uri.host())).await.map_err(|e| {
        tracing::warn!(host = %uri.host(), error = %e, "unable to resolve broker host");
        e
    })?;

    let mut endpoints: Vec<Endpoint> = Vec::new();
    for ip in addrs {
        if !family.accepts(&ip) {
            tracing::debug!(%ip, protocol = %family, "skipping address of other family");
            continue;
        }
        let endpoint = Endpoint::new(ip, uri.port());
        if !endpoints.contains(&endpoint) {
            endpoints.push(endpoint);
        }
    }

    tracing::debug!(
        uri = %uri,
        protocol = %family,
        count = endpoints.len(),
        "resolved broker endpoints"
    );
    Ok(endpoints)
}
