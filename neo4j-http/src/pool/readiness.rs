// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Startup readiness probe
//!
//! The client and the database often start together. Before the first real
//! request, the pool GETs the server root until the discovery document
//! answers, sleeping a fixed interval between attempts. A success is
//! remembered for the pool's lifetime; a failure is not.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::connection::Connection;
use crate::config::Config;
use crate::error::{RequestError, Result};

/// Substring identifying the server's discovery document
pub const READY_MARKER: &str = "neo4j_version";

#[derive(Default)]
pub(crate) struct ReadinessProbe {
    ready: AtomicBool,
    probing: Mutex<()>,
}

impl ReadinessProbe {
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub(crate) fn ensure(&self, connection: &Connection, config: &Config) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        // One prober at a time; later callers see the memoised result.
        let _guard = self.probing.lock();
        if self.is_ready() {
            return Ok(());
        }

        let retries = config.upstream_retries();
        let interval = config.upstream_retry_interval();
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            let reason = match probe_once(connection) {
                Ok(()) => {
                    self.ready.store(true, Ordering::Release);
                    log::debug!(
                        "Server at {} is ready after {} attempt(s)",
                        connection.base_url(),
                        attempt + 1
                    );
                    return Ok(());
                }
                Err(reason) => reason,
            };

            if attempt >= retries {
                return Err(RequestError::ServerUnavailable {
                    url: connection.base_url().to_string(),
                    waited: started.elapsed(),
                    reason,
                }
                .into());
            }

            attempt += 1;
            log::warn!(
                "Server at {} not ready ({}), retry {}/{} in {:?}",
                connection.base_url(),
                reason,
                attempt,
                retries,
                interval
            );
            std::thread::sleep(interval);
        }
    }
}

fn probe_once(connection: &Connection) -> std::result::Result<(), String> {
    match connection.get("/") {
        Ok(response) if response.is_success() && response.body.contains(READY_MARKER) => Ok(()),
        Ok(response) if response.is_success() => {
            Err("discovery document missing from response".to_string())
        }
        Ok(response) => Err(format!("HTTP {}", response.status)),
        Err(e) => Err(e.to_string()),
    }
}
