use crate::base::context::TransportResultExt;
use crate::dns::Endpoint;
use crate::transport::{Connection, DialOptions, Transport};
use futures::future::join_all;

/// One slot per resolved endpoint, in address order.
///
/// An empty slot is an endpoint whose dial failed while the pool was built;
/// the pool tolerates partial availability.
pub struct ConnectionPool<C> {
    slots: Vec<Option<C>>,
}

impl<C> Default for ConnectionPool<C> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<C> std::fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("slots", &self.slots.len())
            .field("live", &self.live_count())
            .finish()
    }
}

impl<C> ConnectionPool<C> {
    /// A pool with no slots, as held before the first build and after a reset.
    pub fn empty() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of slots holding a connection.
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_live(&self, idx: usize) -> bool {
        matches!(self.slots.get(idx), Some(Some(_)))
    }

    /// Indices of the slots holding a connection, in address order.
    pub fn live_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|_| idx))
            .collect()
    }

    pub fn slot_mut(&mut self, idx: usize) -> Option<&mut C> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }
}

impl<C: Connection> ConnectionPool<C> {
    /// Dial every endpoint and collect the results into slots.
    ///
    /// Dials run concurrently; slot `i` always belongs to `endpoints[i]`.
    pub async fn build<T>(transport: &T, endpoints: &[Endpoint], options: &DialOptions) -> Self
    where
        T: Transport<Conn = C> + ?Sized,
    {
        let dials = endpoints.iter().map(|endpoint| async move {
            match transport.dial(*endpoint, options).await.dial_context(endpoint) {
                Ok(conn) => {
                    tracing::info!(endpoint = %endpoint, "connected to broker");
                    Some(conn)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "slot left empty");
                    None
                }
            }
        });

        let slots = join_all(dials).await;
        let pool = Self { slots };
        tracing::debug!(slots = pool.len(), live = pool.live_count(), "connection pool built");
        pool
    }

    /// Disconnect every live connection and drop all slots.
    ///
    /// Disconnect failures are logged; the connection is discarded either way.
    /// Returns how many live connections were closed.
    pub async fn disconnect_all(&mut self) -> usize {
        let mut closed = 0;
        for (idx, slot) in self.slots.drain(..).enumerate() {
            let Some(mut conn) = slot else {
                continue;
            };
            if let Err(e) = conn.disconnect().await {
                tracing::debug!(slot = idx, error = %e, "disconnect failed, dropping connection");
            }
            closed += 1;
        }
        closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::ProtocolFamily;
    use crate::transport::{Heartbeat, Outgoing, TransportError};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use zeroize::Zeroizing;

    struct StubConn {
        disconnects: Arc<AtomicUsize>,
        fail_disconnect: bool,
    }

    impl Connection for StubConn {
        fn send<'a>(
            &'a mut self,
            _message: Outgoing<'a>,
        ) -> BoxFuture<'a, Result<(), TransportError>> {
            async { Ok(()) }.boxed()
        }

        fn disconnect(&mut self) -> BoxFuture<'_, Result<(), TransportError>> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail_disconnect;
            async move {
                if fail {
                    Err("already closed".into())
                } else {
                    Ok(())
                }
            }
            .boxed()
        }
    }

    /// Refuses every endpoint whose last octet is odd.
    struct StubTransport {
        disconnects: Arc<AtomicUsize>,
    }

    impl Transport for StubTransport {
        type Conn = StubConn;

        fn dial<'a>(
            &'a self,
            endpoint: Endpoint,
            _options: &'a DialOptions,
        ) -> BoxFuture<'a, Result<StubConn, TransportError>> {
            let refuse = match endpoint.ip() {
                std::net::IpAddr::V4(ip) => ip.octets()[3] % 2 == 1,
                std::net::IpAddr::V6(_) => false,
            };
            let disconnects = self.disconnects.clone();
            async move {
                if refuse {
                    Err("connection refused".into())
                } else {
                    Ok(StubConn {
                        disconnects,
                        fail_disconnect: endpoint.port() == 1,
                    })
                }
            }
            .boxed()
        }
    }

    fn options() -> DialOptions {
        DialOptions {
            protocol: ProtocolFamily::Tcp4,
            login: "producer".into(),
            password: Zeroizing::new("secret".into()),
            heartbeat: Heartbeat::default(),
        }
    }

    fn endpoints(port: u16) -> Vec<Endpoint> {
        (1..=4)
            .map(|i| format!("10.0.0.{}:{}", i, port).parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_build_tolerates_partial_failure() {
        let transport = StubTransport {
            disconnects: Arc::new(AtomicUsize::new(0)),
        };
        let pool = ConnectionPool::build(&transport, &endpoints(61613), &options()).await;

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.live_count(), 2);
        assert!(!pool.is_live(0));
        assert!(pool.is_live(1));
        assert!(!pool.is_live(2));
        assert!(pool.is_live(3));
        assert!(!pool.is_live(4));
        assert_eq!(pool.live_slots(), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_disconnect_all_empties_pool() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let transport = StubTransport {
            disconnects: disconnects.clone(),
        };
        let mut pool = ConnectionPool::build(&transport, &endpoints(61613), &options()).await;

        let closed = pool.disconnect_all().await;

        assert_eq!(closed, 2);
        assert_eq!(disconnects.load(Ordering::SeqCst), 2);
        assert!(pool.is_empty());
        assert!(pool.slot_mut(1).is_none());
    }

    #[tokio::test]
    async fn test_disconnect_errors_are_swallowed() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let transport = StubTransport {
            disconnects: disconnects.clone(),
        };
        let mut pool = ConnectionPool::build(&transport, &endpoints(1), &options()).await;

        assert_eq!(pool.disconnect_all().await, 2);
        assert!(pool.is_empty());
    }

    #[test]
    fn test_empty_pool() {
        let mut pool: ConnectionPool<StubConn> = ConnectionPool::default();
        assert!(pool.is_empty());
        assert_eq!(pool.live_count(), 0);
        assert!(pool.slot_mut(0).is_none());
    }
}
