use super::config::ManagerConfig;
use super::retry::RetryPolicy;
use crate::base::brokererror::BrokerError;
use crate::base::context::TransportResultExt;
use crate::dns::{resolve_endpoints, Endpoint, Resolve};
use crate::pool::{pick_slot, ConnectionPool, IndexPicker, ThreadRngPicker};
use crate::transport::{Connection, Outgoing, SendOptions, Transport};
use std::fmt;
use std::sync::Arc;

/// Outcome of connection selection.
///
/// The connection itself stays inside the pool; callers only learn which
/// endpoint was chosen and whether a live session backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Picked {
    endpoint: Endpoint,
    slot: Option<usize>,
}

impl Picked {
    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// False only in test mode, where nothing is dialed.
    pub fn has_connection(&self) -> bool {
        self.slot.is_some()
    }
}

/// Builder for a [`BrokerManager`].
pub struct ManagerBuilder<T> {
    config: ManagerConfig,
    transport: T,
    resolver: Option<Arc<dyn Resolve>>,
    picker: Option<Box<dyn IndexPicker>>,
}

impl<T: Transport> ManagerBuilder<T> {
    /// Use a specific resolver instead of the one selected by `config.dns`.
    pub fn resolver(mut self, resolver: Arc<dyn Resolve>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use a specific slot picker instead of the thread-local RNG.
    pub fn picker(mut self, picker: impl IndexPicker + 'static) -> Self {
        self.picker = Some(Box::new(picker));
        self
    }

    /// Build without contacting the broker; the first send resolves and dials.
    pub fn build(self) -> BrokerManager<T> {
        let resolver = self
            .resolver
            .unwrap_or_else(|| self.config.dns.resolver(self.config.protocol));
        let picker = self.picker.unwrap_or_else(|| Box::new(ThreadRngPicker));
        BrokerManager {
            retry: RetryPolicy::from_config(&self.config),
            config: self.config,
            transport: self.transport,
            resolver,
            picker,
            addresses: Vec::new(),
            pool: ConnectionPool::empty(),
            resets: 0,
        }
    }

    /// Build and immediately try to acquire a connection.
    ///
    /// Failure is logged and otherwise ignored so startup problems show up
    /// early without preventing construction.
    pub async fn connect(self) -> BrokerManager<T> {
        let mut manager = self.build();
        if let Err(e) = manager.pick().await {
            tracing::warn!(
                uri = %manager.config.uri,
                error = %e,
                "initial broker connection failed"
            );
        }
        tracing::info!(manager = %manager, "broker manager ready");
        manager
    }
}

/// Producer-side broker connection manager.
///
/// Resolves the configured broker URI once, keeps one connection per
/// resolved endpoint, and sends each message over a randomly chosen
/// connection, rebuilding the pool between failed attempts.
///
/// All operations take `&mut self`: a manager has a single owner. Wrap it in
/// a `tokio::sync::Mutex` to share it between tasks.
pub struct BrokerManager<T: Transport> {
    config: ManagerConfig,
    transport: T,
    resolver: Arc<dyn Resolve>,
    picker: Box<dyn IndexPicker>,
    retry: RetryPolicy,
    /// Cached until the manager is dropped; survives pool resets.
    addresses: Vec<Endpoint>,
    pool: ConnectionPool<T::Conn>,
    resets: u64,
}

impl<T: Transport> BrokerManager<T> {
    pub fn builder(config: ManagerConfig, transport: T) -> ManagerBuilder<T> {
        ManagerBuilder {
            config,
            transport,
            resolver: None,
            picker: None,
        }
    }

    /// Create a manager and eagerly attempt a first connection.
    pub async fn new(config: ManagerConfig, transport: T) -> Self {
        Self::builder(config, transport).connect().await
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Resolved endpoints, empty until the first successful resolution.
    pub fn addresses(&self) -> &[Endpoint] {
        &self.addresses
    }

    pub fn pool_len(&self) -> usize {
        self.pool.len()
    }

    pub fn live_connections(&self) -> usize {
        self.pool.live_count()
    }

    /// How many times the pool was torn down by [`reset`](Self::reset).
    pub fn reset_count(&self) -> u64 {
        self.resets
    }

    pub fn is_test_mode(&self) -> bool {
        self.config.is_test_mode()
    }

    /// Select a connection, building the pool if needed.
    pub async fn pick(&mut self) -> Result<Picked, BrokerError> {
        if !self.pool.is_empty() && self.pool.len() == self.addresses.len() {
            if let Some(idx) = pick_slot(self.picker.as_mut(), self.pool.len()) {
                if self.pool.is_live(idx) {
                    return Ok(Picked {
                        endpoint: self.addresses[idx],
                        slot: Some(idx),
                    });
                }
                tracing::debug!(slot = idx, "selected slot has no connection, rebuilding pool");
            }
        }

        self.config.validate()?;

        if self.addresses.is_empty() {
            let uri = self.config.broker_uri()?;
            let endpoints =
                resolve_endpoints(&*self.resolver, &uri, self.config.protocol).await?;
            if self.config.verbose > 0 {
                for endpoint in &endpoints {
                    tracing::info!(endpoint = %endpoint, "use");
                }
            }
            self.addresses = endpoints;
        }

        if self.addresses.is_empty() {
            return Err(BrokerError::NoAddress {
                uri: self.config.uri.clone(),
                protocol: self.config.protocol.to_string(),
            });
        }

        if self.config.is_test_mode() {
            let idx = pick_slot(self.picker.as_mut(), self.addresses.len()).unwrap_or(0);
            return Ok(Picked {
                endpoint: self.addresses[idx],
                slot: None,
            });
        }

        if !self.pool.is_empty() {
            self.pool.disconnect_all().await;
        }
        let options = self.config.dial_options();
        self.pool = ConnectionPool::build(&self.transport, &self.addresses, &options).await;

        // Draw among live slots only; fail when every dial failed.
        let live = self.pool.live_slots();
        match pick_slot(self.picker.as_mut(), live.len()) {
            Some(k) => Ok(Picked {
                endpoint: self.addresses[live[k]],
                slot: Some(live[k]),
            }),
            None => Err(BrokerError::NotConnected {
                endpoint: self.addresses[0],
            }),
        }
    }

    /// Disconnect every pooled connection and discard the pool.
    ///
    /// The resolved address list is kept, so the next acquisition redials
    /// without another DNS lookup.
    pub async fn reset(&mut self) {
        tracing::info!(uri = %self.config.uri, "reset all connections to broker");
        let closed = self.pool.disconnect_all().await;
        tracing::debug!(closed, "pool discarded");
        self.resets += 1;
    }

    /// Disconnect everything. The manager stays usable; a later send reconnects.
    pub async fn close(&mut self) {
        let closed = self.pool.disconnect_all().await;
        tracing::debug!(uri = %self.config.uri, closed, "broker manager closed");
    }

    /// Send `payload` to the configured destination.
    pub async fn send(&mut self, payload: impl AsRef<[u8]>) -> Result<(), BrokerError> {
        self.send_with(payload, &SendOptions::default()).await
    }

    /// Send `payload` with extra per-message headers.
    ///
    /// Makes up to `iterations` attempts. After a failed attempt the pool is
    /// reset and a new connection acquired. The first success returns
    /// immediately; exhaustion returns the last error seen.
    pub async fn send_with(
        &mut self,
        payload: impl AsRef<[u8]>,
        options: &SendOptions,
    ) -> Result<(), BrokerError> {
        let payload = payload.as_ref();
        let mut acquired = self.pick().await;
        let mut attempt = 0;

        loop {
            let err = match acquired {
                Ok(picked) => match self.transmit(picked, payload, options).await {
                    Ok(()) => return Ok(()),
                    Err(e) => e,
                },
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => e,
            };

            tracing::warn!(
                destination = %self.config.destination,
                attempt,
                error = %err,
                "unable to send data"
            );
            if self.retry.is_last(attempt) {
                return Err(err);
            }

            self.reset().await;
            attempt += 1;

            let delay = self.retry.backoff(attempt);
            if !delay.is_zero() {
                tracing::debug!(?delay, attempt, "waiting before retry");
                tokio::time::sleep(delay).await;
            }

            acquired = self.pick().await;
            if let Err(e) = &acquired {
                tracing::warn!(error = %e, attempt, "unable to get connection");
            }
        }
    }

    async fn transmit(
        &mut self,
        picked: Picked,
        payload: &[u8],
        options: &SendOptions,
    ) -> Result<(), BrokerError> {
        let endpoint = picked.endpoint;
        let Some(idx) = picked.slot else {
            tracing::debug!(
                endpoint = %endpoint,
                bytes = payload.len(),
                "test mode, message not transmitted"
            );
            return Ok(());
        };

        let conn = self
            .pool
            .slot_mut(idx)
            .ok_or(BrokerError::NotConnected { endpoint })?;
        let message = Outgoing {
            destination: &self.config.destination,
            content_type: &self.config.content_type,
            body: payload,
            headers: options.headers(),
        };
        conn.send(message)
            .await
            .send_context(&self.config.destination, &endpoint)?;

        if self.config.verbose > 0 {
            tracing::info!(
                endpoint = %endpoint,
                destination = %self.config.destination,
                "sent data"
            );
        }
        Ok(())
    }
}

impl<T: Transport> fmt::Display for BrokerManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addrs: Vec<String> = self.addresses.iter().map(ToString::to_string).collect();
        write!(
            f,
            "<BrokerManager: addrs=[{}], destination={}, iterations={}, sendTimeout={}ms, recvTimeout={}ms, protocol={}, verbose={}>",
            addrs.join(", "),
            self.config.destination,
            self.config.iterations,
            self.config.send_timeout_ms,
            self.config.recv_timeout_ms,
            self.config.protocol,
            self.config.verbose,
        )
    }
}

impl<T: Transport> fmt::Debug for BrokerManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerManager")
            .field("config", &self.config)
            .field("addresses", &self.addresses)
            .field("pool", &self.pool)
            .field("resets", &self.resets)
            .finish_non_exhaustive()
    }
}
