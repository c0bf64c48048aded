//! Client reachability probing
//!
//! One network probe per client, fanned out across worker tasks. The
//! fan-out is bounded: a semaphore caps concurrent probes and oversized
//! client lists are rejected outright. Both modes take a cancellation
//! token that aborts scheduling and in-flight probes.

use crate::clients::Client;
use crate::error::{ApctlError, ApctlResult};
use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default cap on concurrently running probes.
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Default cap on the number of clients accepted per probing call.
pub const DEFAULT_MAX_CLIENTS: usize = 1024;

/// One bounded-timeout reachability check. Probes are independent across
/// clients; implementations hold no per-probe state.
#[async_trait]
pub trait ReachabilityCheck: Send + Sync {
    /// True if the host answered within the timeout. Errors count as
    /// unreachable; this is a total function.
    async fn is_reachable(&self, addr: IpAddr, timeout: Duration) -> bool;
}

/// ICMP echo via the system `ping` binary, hard-bounded by a tokio
/// timeout on top of ping's own second-granularity deadline.
pub struct PingCheck;

#[async_trait]
impl ReachabilityCheck for PingCheck {
    async fn is_reachable(&self, addr: IpAddr, timeout: Duration) -> bool {
        let deadline_secs = timeout.as_secs().max(1).to_string();
        let mut cmd = Command::new("ping");
        cmd.args(["-c", "1", "-W", &deadline_secs, &addr.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        match tokio::time::timeout(timeout, cmd.status()).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(addr = %addr, error = %e, "ping failed to run");
                false
            }
            // Timed out; dropping the future reaps the child
            Err(_) => false,
        }
    }
}

/// Concurrent reachability prober over a client list.
pub struct ReachabilityProber {
    check: Arc<dyn ReachabilityCheck>,
    concurrency: usize,
    max_clients: usize,
}

impl ReachabilityProber {
    /// Prober backed by the system ping.
    pub fn new() -> Self {
        Self::with_check(Arc::new(PingCheck))
    }

    /// Prober with a custom reachability check (tests, alternative probes).
    pub fn with_check(check: Arc<dyn ReachabilityCheck>) -> Self {
        Self {
            check,
            concurrency: DEFAULT_CONCURRENCY,
            max_clients: DEFAULT_MAX_CLIENTS,
        }
    }

    /// Cap on concurrently running probes; clamped to at least 1.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Cap on accepted list size.
    pub fn max_clients(mut self, n: usize) -> Self {
        self.max_clients = n.max(1);
        self
    }

    fn check_size(&self, len: usize) -> ApctlResult<()> {
        if len > self.max_clients {
            return Err(ApctlError::InvalidParameter(format!(
                "Client list too large for probing: {} > {}",
                len, self.max_clients
            )));
        }
        Ok(())
    }

    /// Probe every client and collect the reachable ones.
    ///
    /// Results come back in submission order, not completion order.
    /// Cancellation and task failures abandon the whole batch - partial
    /// results are discarded, matching the all-or-nothing contract of
    /// the blocking mode.
    pub async fn probe_all(
        &self,
        clients: &[Client],
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ApctlResult<Vec<Client>> {
        self.check_size(clients.len())?;

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, client) in clients.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let check = self.check.clone();
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                if cancel.is_cancelled() {
                    return None;
                }
                let Ok(ip) = client.ip_addr.parse::<IpAddr>() else {
                    debug!(ip = %client.ip_addr, "Unparseable client address, skipping probe");
                    return None;
                };
                let reachable = tokio::select! {
                    _ = cancel.cancelled() => return None,
                    r = check.is_reachable(ip, timeout) => r,
                };
                reachable.then_some((index, client))
            });
        }

        let mut reachable = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(entry)) => reachable.push(entry),
                Ok(None) => {}
                Err(e) => {
                    tasks.abort_all();
                    return Err(ApctlError::ServiceError(format!(
                        "probe task failed: {}",
                        e
                    )));
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(ApctlError::Cancelled);
        }

        reachable.sort_by_key(|(index, _)| *index);
        Ok(reachable.into_iter().map(|(_, client)| client).collect())
    }

    /// Probe every client, delivering each reachable one over the
    /// returned channel as its probe completes.
    ///
    /// Every reachable client is sent exactly once, from a worker task;
    /// unreachable or failed probes are dropped silently. Channel
    /// closure is the completion signal.
    pub fn probe_each(
        &self,
        clients: Vec<Client>,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> ApctlResult<mpsc::Receiver<Client>> {
        self.check_size(clients.len())?;

        let (tx, rx) = mpsc::channel(clients.len().max(1));
        let check = self.check.clone();
        let concurrency = self.concurrency;

        tokio::spawn(async move {
            let semaphore = Arc::new(Semaphore::new(concurrency));
            let mut tasks = JoinSet::new();

            for client in clients {
                let semaphore = semaphore.clone();
                let check = check.clone();
                let cancel = cancel.clone();
                let tx = tx.clone();
                tasks.spawn(async move {
                    let Ok(_permit) = semaphore.acquire_owned().await else {
                        return;
                    };
                    if cancel.is_cancelled() {
                        return;
                    }
                    let Ok(ip) = client.ip_addr.parse::<IpAddr>() else {
                        debug!(ip = %client.ip_addr, "Unparseable client address, skipping probe");
                        return;
                    };
                    let reachable = tokio::select! {
                        _ = cancel.cancelled() => return,
                        r = check.is_reachable(ip, timeout) => r,
                    };
                    if reachable {
                        let _ = tx.send(client).await;
                    }
                });
            }

            drop(tx);
            while tasks.join_next().await.is_some() {}
        });

        Ok(rx)
    }
}

impl Default for ReachabilityProber {
    fn default() -> Self {
        Self::new()
    }
}
