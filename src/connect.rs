//! Connection resolver: obtain a usable page handle from a moving target.
//!
//! The embedded browser's debug endpoint number is not guaranteed stable
//! across launches, so the candidate list encodes known historical values.
//! The sweep-with-backoff pattern absorbs the race between "window ready"
//! and "debug endpoint ready".

use crate::config::Config;
use crate::error::{Error, Result};
use crate::page::cdp::{self, CdpPage};
use std::future::Future;
use std::time::Duration;

/// Sweep the ordered candidate ports with `probe`, restarting the full sweep
/// after `backoff` up to `retries` times. Returns on the first success; fails
/// with [`Error::ConnectionExhausted`] only after exactly
/// `ports.len() × retries` probe attempts.
pub async fn sweep<T, F, Fut>(
    ports: &[u16],
    retries: u32,
    backoff: Duration,
    mut probe: F,
) -> Result<T>
where
    F: FnMut(u16) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempts = 0usize;
    for round in 0..retries {
        if round > 0 {
            tokio::time::sleep(backoff).await;
        }
        for &port in ports {
            attempts += 1;
            match probe(port).await {
                Ok(handle) => return Ok(handle),
                Err(e) => {
                    tracing::debug!(port, round, error = %e, "endpoint probe failed");
                }
            }
        }
        tracing::warn!(
            round = round + 1,
            of = retries,
            "all candidate endpoints failed, backing off"
        );
    }
    Err(Error::ConnectionExhausted { attempts })
}

/// Resolve a live page handle using the configured candidate ports.
/// Idempotent: safe to call repeatedly; each call opens a fresh connection.
pub async fn resolve(cfg: &Config) -> Result<CdpPage> {
    let probe_timeout = Duration::from_millis(cfg.probe_timeout_ms);
    sweep(
        &cfg.cdp_ports,
        cfg.connection_retries,
        cfg.backoff(),
        |port| cdp::connect_port(port, probe_timeout),
    )
    .await
}
