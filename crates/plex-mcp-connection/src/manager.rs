//! The connection manager: TTL-cached handle with guarded reconnect.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use plex_mcp_core::Result;

use crate::handle::Connector;

/// A validated handle and the moment it was validated. Kept as one value
/// under one lock so readers always observe a consistent pair, never a
/// torn update.
struct Cached<H> {
    handle: Arc<H>,
    validated_at: Instant,
}

/// Process-wide owner of the single upstream connection.
///
/// Guarantees that every caller of [`acquire`](Self::acquire) sees a handle
/// validated within the TTL, while performing at most one handshake per
/// staleness window even under concurrent callers. Shared as an `Arc` and
/// injected into the tool layer.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    ttl: Duration,
    state: RwLock<Option<Cached<C::Handle>>>,
    /// Serializes the slow path: no two handshakes ever run concurrently.
    reconnect: Mutex<()>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager with an empty cache. The first `acquire` performs
    /// the first handshake.
    pub fn new(connector: C, ttl: Duration) -> Self {
        Self {
            connector,
            ttl,
            state: RwLock::new(None),
            reconnect: Mutex::new(()),
        }
    }

    /// Staleness window this manager trusts a handle for.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return a handle validated within the TTL, handshaking if needed.
    ///
    /// Fast path: a read lock and an age check, no contention with other
    /// readers. Slow path: take the reconnect guard, re-check (another
    /// caller may have refreshed the cache while this one waited), then
    /// handshake. The new handle is installed only after the handshake
    /// fully succeeds; on failure the stale/absent state is left untouched
    /// so the next caller retries instead of wedging on a known-bad handle.
    ///
    /// Callers must not cache the handle beyond the current operation.
    pub async fn acquire(&self) -> Result<Arc<C::Handle>> {
        if let Some(handle) = self.fresh().await {
            return Ok(handle);
        }

        let _guard = self.reconnect.lock().await;

        // Double-checked: a waiter may find the cache already refreshed.
        if let Some(handle) = self.fresh().await {
            debug!("connection refreshed by a concurrent caller");
            return Ok(handle);
        }

        debug!("connection stale or absent, handshaking");
        let handle = Arc::new(self.connector.connect().await?);

        let mut state = self.state.write().await;
        *state = Some(Cached {
            handle: Arc::clone(&handle),
            validated_at: Instant::now(),
        });
        info!("upstream connection established");

        Ok(handle)
    }

    /// Drop the cached handle so the next `acquire` forces a fresh
    /// handshake, regardless of age. Idempotent; safe to call from
    /// concurrent failure paths.
    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        if state.take().is_some() {
            warn!("upstream connection invalidated");
        }
    }

    /// Run `op` against a live handle, applying the retry-policy contract:
    /// a connection-class failure (dead session, unreachable transport)
    /// discards the handle it happened on and retries the whole sequence
    /// exactly once; a domain-class failure (missing entity, bad
    /// parameters) propagates immediately - the connection is healthy, the
    /// request was simply invalid.
    pub async fn with_session<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn(Arc<C::Handle>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.try_op(&op).await {
            Err(e) if e.is_connection_error() => {
                warn!(error = %e, "connection-class failure, reconnecting once");
                self.try_op(&op).await
            }
            other => other,
        }
    }

    async fn try_op<T, F, Fut>(&self, op: &F) -> Result<T>
    where
        F: Fn(Arc<C::Handle>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        // Acquire failures need no invalidation: a failed handshake never
        // installs anything.
        let handle = self.acquire().await?;
        match op(Arc::clone(&handle)).await {
            Err(e) if e.is_connection_error() => {
                self.discard(&handle).await;
                Err(e)
            }
            other => other,
        }
    }

    /// Drop the cached handle only if it is still the one `stale` refers
    /// to. A fresher handle installed by a concurrent caller between the
    /// failure and this call survives, so one dead handle never costs two
    /// handshakes.
    async fn discard(&self, stale: &Arc<C::Handle>) {
        let mut state = self.state.write().await;
        if state
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(&cached.handle, stale))
        {
            *state = None;
            warn!("upstream connection invalidated");
        }
    }

    /// Snapshot of the cached handle if it is still inside the TTL.
    async fn fresh(&self) -> Option<Arc<C::Handle>> {
        let state = self.state.read().await;
        state
            .as_ref()
            .filter(|cached| cached.validated_at.elapsed() < self.ttl)
            .map(|cached| Arc::clone(&cached.handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use plex_mcp_core::Error;

    /// Counting connector. Each successful handshake yields the attempt
    /// number as the handle, so tests can tell handles apart.
    struct MockConnector {
        attempts: AtomicUsize,
        failures_remaining: AtomicUsize,
    }

    impl MockConnector {
        fn new() -> Self {
            Self::failing_first(0)
        }

        fn failing_first(failures: usize) -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                failures_remaining: AtomicUsize::new(failures),
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        type Handle = usize;

        async fn connect(&self) -> Result<usize> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            // Yield so concurrent callers pile up on the guard.
            tokio::task::yield_now().await;
            let fail = self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if fail {
                Err(Error::Connection("simulated handshake failure".into()))
            } else {
                Ok(attempt)
            }
        }
    }

    fn manager(ttl: Duration) -> ConnectionManager<MockConnector> {
        ConnectionManager::new(MockConnector::new(), ttl)
    }

    // P1: acquires inside the TTL share one handshake.
    #[tokio::test]
    async fn test_acquire_reuses_fresh_handle() {
        let manager = manager(Duration::from_secs(60));

        let first = manager.acquire().await.unwrap();
        let second = manager.acquire().await.unwrap();

        assert_eq!(manager.connector.attempts(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    // TTL scenario from the worked example, scaled to milliseconds:
    // handshake at t=0, cached hit inside the window, second handshake
    // after expiry. Expected handshake count after three calls: 2.
    #[tokio::test]
    async fn test_acquire_rehandshakes_after_ttl() {
        let manager = manager(Duration::from_millis(80));

        manager.acquire().await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        manager.acquire().await.unwrap();
        assert_eq!(manager.connector.attempts(), 1);

        tokio::time::sleep(Duration::from_millis(70)).await;
        manager.acquire().await.unwrap();
        assert_eq!(manager.connector.attempts(), 2);
    }

    // P2: invalidate forces a handshake regardless of age.
    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let manager = manager(Duration::from_secs(60));

        manager.acquire().await.unwrap();
        manager.invalidate().await;
        manager.acquire().await.unwrap();

        assert_eq!(manager.connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_is_idempotent() {
        let manager = manager(Duration::from_secs(60));

        manager.invalidate().await;
        manager.acquire().await.unwrap();
        manager.invalidate().await;
        manager.invalidate().await;
        manager.acquire().await.unwrap();

        assert_eq!(manager.connector.attempts(), 2);
    }

    // P3: N simultaneous acquires on an empty cache perform exactly one
    // handshake and all observe the same handle.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_acquires_single_handshake() {
        let manager = Arc::new(manager(Duration::from_secs(60)));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.acquire().await })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(manager.connector.attempts(), 1);
        assert!(handles.iter().all(|h| Arc::ptr_eq(h, &handles[0])));
    }

    // P4: a failed handshake leaves the state retryable - nothing cached,
    // nothing stamped - so the next acquire tries again.
    #[tokio::test]
    async fn test_failed_handshake_leaves_state_retryable() {
        let manager = ConnectionManager::new(
            MockConnector::failing_first(1),
            Duration::from_secs(60),
        );

        let err = manager.acquire().await.unwrap_err();
        assert!(err.is_connection_error());
        assert!(manager.fresh().await.is_none());

        let handle = manager.acquire().await.unwrap();
        assert_eq!(*handle, 2);
        assert_eq!(manager.connector.attempts(), 2);
    }

    // P5: a domain-class failure must never invalidate the connection.
    #[tokio::test]
    async fn test_domain_failure_keeps_connection() {
        let manager = manager(Duration::from_secs(60));
        let op_calls = AtomicUsize::new(0);

        let result: Result<()> = manager
            .with_session(|_handle| {
                op_calls.fetch_add(1, Ordering::SeqCst);
                async { Err(Error::NotFound("movie 'Heat'".into())) }
            })
            .await;

        assert!(matches!(result.unwrap_err(), Error::NotFound(_)));
        assert_eq!(op_calls.load(Ordering::SeqCst), 1);
        // The cached handle survived: another acquire does not handshake.
        manager.acquire().await.unwrap();
        assert_eq!(manager.connector.attempts(), 1);
    }

    // P5: a connection-class failure triggers exactly one invalidate and
    // one retry.
    #[tokio::test]
    async fn test_connection_failure_reconnects_once() {
        let manager = manager(Duration::from_secs(60));
        let op_calls = AtomicUsize::new(0);

        let result = manager
            .with_session(|handle| {
                let call = op_calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(Error::Transport("connection reset by peer".into()))
                    } else {
                        Ok(*handle)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(op_calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_persistent_connection_failure_surfaces_after_one_retry() {
        let manager = manager(Duration::from_secs(60));
        let op_calls = AtomicUsize::new(0);

        let result: Result<()> = manager
            .with_session(|_handle| {
                op_calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(Error::UpstreamStatus {
                        status: 401,
                        message: "Unauthorized".into(),
                    })
                }
            })
            .await;

        assert!(result.unwrap_err().is_connection_error());
        assert_eq!(op_calls.load(Ordering::SeqCst), 2);
    }

    // A connection-class op failure must discard only the handle it
    // happened on. If a concurrent caller already installed a fresher
    // handle, that handle is kept and the retry reuses it instead of
    // forcing a third handshake.
    #[tokio::test]
    async fn test_stale_failure_keeps_fresher_handle() {
        let manager = Arc::new(manager(Duration::from_secs(60)));
        let op_calls = Arc::new(AtomicUsize::new(0));

        let result = {
            let mgr = Arc::clone(&manager);
            let calls = Arc::clone(&op_calls);
            manager
                .with_session(move |handle| {
                    let mgr = Arc::clone(&mgr);
                    let calls = Arc::clone(&calls);
                    async move {
                        if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                            // Another caller replaces the connection while
                            // this op is still running on the old handle.
                            mgr.invalidate().await;
                            mgr.acquire().await?;
                            Err(Error::Transport("connection reset by peer".into()))
                        } else {
                            Ok(*handle)
                        }
                    }
                })
                .await
        };

        // The retry lands on the replacement handle; a third handshake
        // would mean the fresh handle was wrongly discarded.
        assert_eq!(result.unwrap(), 2);
        assert_eq!(op_calls.load(Ordering::SeqCst), 2);
        assert_eq!(manager.connector.attempts(), 2);
    }

    // Scenario: handshake fails once then succeeds; two concurrent callers
    // on an empty cache both finish on the same handle with exactly two
    // handshake attempts total, not four. Deterministic because a failed
    // acquire discards nothing and an op failure discards only its own
    // handle.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_callers_share_recovery() {
        let manager = Arc::new(ConnectionManager::new(
            MockConnector::failing_first(1),
            Duration::from_secs(60),
        ));

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    manager
                        .with_session(|handle| async move { Ok(*handle) })
                        .await
                })
            })
            .collect();

        let mut results = Vec::new();
        for task in tasks {
            results.push(task.await.unwrap().unwrap());
        }

        assert_eq!(manager.connector.attempts(), 2);
        assert_eq!(results[0], 2);
        assert_eq!(results[1], 2);
    }
}
