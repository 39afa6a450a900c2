// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Bounded pool of persistent HTTP connections
//!
//! This module provides:
//! - Lazy creation of up to `connection_pool_size` connections
//! - LIFO checkout with a bounded wait (`connection_pool_timeout`)
//! - Checkin on guard drop, so a connection serves one operation at a time
//! - The one-time server readiness probe
//! - Explicit `shutdown()` for graceful application exit

mod connection;
mod readiness;

pub use connection::{Connection, HttpResponse};
pub use readiness::READY_MARKER;

use parking_lot::{Condvar, Mutex};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::error::{RequestError, Result};
use readiness::ReadinessProbe;

struct PoolState {
    idle: Vec<Connection>,
    /// Connections currently alive, idle or checked out
    open: usize,
    next_id: usize,
    closed: bool,
}

struct PoolShared {
    config: Arc<Config>,
    state: Mutex<PoolState>,
    available: Condvar,
    readiness: ReadinessProbe,
}

impl PoolShared {
    fn checkin(&self, connection: Connection) {
        let mut state = self.state.lock();
        if state.closed {
            state.open -= 1;
            log::debug!("Dropping connection {} returned after shutdown", connection.id());
            return;
        }
        state.idle.push(connection);
        drop(state);
        self.available.notify_one();
    }
}

/// Shared, thread-safe connection pool
#[derive(Clone)]
pub struct ConnectionPool {
    shared: Arc<PoolShared>,
}

impl ConnectionPool {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            shared: Arc::new(PoolShared {
                config,
                state: Mutex::new(PoolState {
                    idle: Vec::new(),
                    open: 0,
                    next_id: 1,
                    closed: false,
                }),
                available: Condvar::new(),
                readiness: ReadinessProbe::default(),
            }),
        }
    }

    /// Check out a connection, waiting up to `connection_pool_timeout`
    pub fn acquire(&self) -> Result<PooledConnection> {
        let timeout = self.shared.config.connection_pool_timeout();
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();

        loop {
            if state.closed {
                return Err(RequestError::PoolClosed.into());
            }

            if let Some(connection) = state.idle.pop() {
                return Ok(self.guard(connection));
            }

            if state.open < self.shared.config.connection_pool_size {
                let id = state.next_id;
                let connection = Connection::open(id, &self.shared.config)?;
                state.next_id += 1;
                state.open += 1;
                log::debug!(
                    "Opened connection {} ({}/{})",
                    id,
                    state.open,
                    self.shared.config.connection_pool_size
                );
                return Ok(self.guard(connection));
            }

            if self
                .shared
                .available
                .wait_until(&mut state, deadline)
                .timed_out()
                && state.idle.is_empty()
                && !state.closed
            {
                log::warn!("Connection pool exhausted after waiting {:?}", timeout);
                return Err(RequestError::PoolExhausted(timeout).into());
            }
        }
    }

    /// Run the readiness probe once for this pool
    pub fn ensure_server_ready(&self, connection: &Connection) -> Result<()> {
        self.shared
            .readiness
            .ensure(connection, &self.shared.config)
    }

    pub fn is_server_ready(&self) -> bool {
        self.shared.readiness.is_ready()
    }

    /// Close every idle connection and refuse further checkouts.
    ///
    /// Connections still checked out are closed when they come back.
    pub fn shutdown(&self) {
        let drained = {
            let mut state = self.shared.state.lock();
            if state.closed {
                return;
            }
            state.closed = true;
            let drained = std::mem::take(&mut state.idle);
            state.open -= drained.len();
            drained
        };
        log::debug!("Connection pool shut down, closed {} idle connection(s)", drained.len());
        drop(drained);
        self.shared.available.notify_all();
    }

    /// Configured maximum size
    pub fn size(&self) -> usize {
        self.shared.config.connection_pool_size
    }

    pub fn idle_count(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    /// Connections currently checked out
    pub fn in_use(&self) -> usize {
        let state = self.shared.state.lock();
        state.open - state.idle.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.shared.config
    }

    fn guard(&self, connection: Connection) -> PooledConnection {
        PooledConnection {
            connection: Some(connection),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("size", &self.size())
            .field("idle", &self.idle_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// A checked-out connection; returns to the pool when dropped
pub struct PooledConnection {
    connection: Option<Connection>,
    shared: Arc<PoolShared>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `Drop` takes the connection out.
        self.connection
            .as_ref()
            .expect("pooled connection present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            self.shared.checkin(connection);
        }
    }
}

impl std::fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PooledConnection").field(&self.connection).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    fn pool(size: usize, timeout_ms: u64) -> ConnectionPool {
        let config = Config::default()
            .with_uri("http://127.0.0.1:9")
            .with_pool_size(size)
            .with_pool_timeout(Duration::from_millis(timeout_ms));
        ConnectionPool::new(Arc::new(config))
    }

    #[test]
    fn should_create_connections_lazily() {
        let pool = pool(3, 50);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.in_use(), 0);

        let first = pool.acquire().expect("Failed to acquire");
        assert_eq!(pool.in_use(), 1);
        drop(first);

        assert_eq!(pool.idle_count(), 1);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn should_reuse_most_recently_returned_connection() {
        let pool = pool(2, 50);
        let a = pool.acquire().expect("Failed to acquire");
        let b = pool.acquire().expect("Failed to acquire");
        let b_id = b.id();
        drop(a);
        drop(b);

        let again = pool.acquire().expect("Failed to acquire");
        assert_eq!(again.id(), b_id);
    }

    #[test]
    fn should_fail_with_request_error_when_exhausted() {
        let pool = pool(2, 50);
        let _a = pool.acquire().expect("Failed to acquire");
        let _b = pool.acquire().expect("Failed to acquire");

        let started = Instant::now();
        let result = pool.acquire();

        assert!(started.elapsed() >= Duration::from_millis(50));
        match result {
            Err(Error::Request(RequestError::PoolExhausted(waited))) => {
                assert_eq!(waited, Duration::from_millis(50));
            }
            other => panic!("expected pool exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn should_hand_over_connection_released_while_waiting() {
        let pool = pool(1, 2_000);
        let held = pool.acquire().expect("Failed to acquire");
        let held_id = held.id();

        let waiter = {
            let pool = pool.clone();
            std::thread::spawn(move || pool.acquire().map(|c| c.id()))
        };
        std::thread::sleep(Duration::from_millis(50));
        drop(held);

        let id = waiter
            .join()
            .expect("waiter panicked")
            .expect("waiter should get the connection");
        assert_eq!(id, held_id);
    }

    #[test]
    fn should_refuse_checkout_after_shutdown() {
        let pool = pool(2, 50);
        let held = pool.acquire().expect("Failed to acquire");
        drop(pool.acquire().expect("Failed to acquire"));
        assert_eq!(pool.idle_count(), 1);

        pool.shutdown();
        pool.shutdown();

        assert!(pool.is_closed());
        assert_eq!(pool.idle_count(), 0);
        assert!(matches!(
            pool.acquire(),
            Err(Error::Request(RequestError::PoolClosed))
        ));

        drop(held);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.in_use(), 0);
    }
}
