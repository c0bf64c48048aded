//! Access point controller
//!
//! `ApController` is the single mutation point for AP on/off and the
//! entry point for client discovery and probing. It is plain owned data:
//! construct one per capability adapter, clone the `Arc` it wraps if
//! several tasks need it. Nothing here is process-global.

use crate::capability::{ApCapability, ApConfig, CapabilitySet};
use crate::clients::{read_neighbor_table, Client, ClientsSnapshot, NEIGHBOR_TABLE_PATH};
use crate::error::{ApctlError, ApctlResult};
use crate::interface::{enumerate_interfaces, find_local_address, resolve_wifi_device};
use crate::probe::ReachabilityProber;
use crate::state::ApState;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Poll interval used by [`ApController::wait_for_state`].
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Owned facade over one capability adapter.
///
/// The wifi device name is resolved once, at construction, and cached
/// for the controller's lifetime. If the wireless MAC changes at runtime
/// the cached name goes stale; construct a fresh controller to re-resolve.
pub struct ApController {
    capability: Arc<dyn ApCapability>,
    wifi_device: String,
    neighbor_table: PathBuf,
    prober: ReachabilityProber,
}

impl ApController {
    /// Build a controller, resolving the wifi device name from the
    /// adapter's reported wireless MAC. Resolution failures fall back to
    /// the default device name; construction itself never fails.
    pub async fn new(capability: Arc<dyn ApCapability>) -> Self {
        let station_mac = capability.station_mac().await;
        let interfaces = match enumerate_interfaces().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Interface enumeration failed during device resolution");
                Vec::new()
            }
        };
        let wifi_device = resolve_wifi_device(station_mac.as_ref(), &interfaces);

        Self {
            capability,
            wifi_device,
            neighbor_table: PathBuf::from(NEIGHBOR_TABLE_PATH),
            prober: ReachabilityProber::new(),
        }
    }

    /// Override the neighbor table location (tests, containers).
    pub fn with_neighbor_table(mut self, path: PathBuf) -> Self {
        self.neighbor_table = path;
        self
    }

    /// Override the prober (custom check, concurrency or size caps).
    pub fn with_prober(mut self, prober: ReachabilityProber) -> Self {
        self.prober = prober;
        self
    }

    /// The resolved wireless interface name.
    pub fn wifi_device(&self) -> &str {
        &self.wifi_device
    }

    /// Which primitives the underlying adapter binds.
    pub fn capabilities(&self) -> CapabilitySet {
        self.capability.capabilities()
    }

    /// Whether soft-AP control is usable: all four primitives bound and
    /// the hardware check passing. Individual calls may still fail.
    pub fn is_supported(&self) -> bool {
        self.capability.is_supported()
    }

    /// Whether the AP is currently enabled.
    pub async fn is_enabled(&self) -> ApctlResult<bool> {
        self.capability.ap_enabled().await
    }

    /// Current normalized AP state.
    ///
    /// Total by design: any underlying failure maps to
    /// [`ApState::Unknown`] so display pollers never branch on errors.
    pub async fn state(&self) -> ApState {
        match self.capability.ap_state_raw().await {
            Ok(raw) => ApState::from_raw(raw),
            Err(e) => {
                debug!(error = %e, "AP state read failed");
                ApState::Unknown
            }
        }
    }

    /// Current AP configuration.
    pub async fn configuration(&self) -> ApctlResult<ApConfig> {
        self.capability.ap_config().await
    }

    /// Start or stop the AP.
    ///
    /// The station Wi-Fi radio is the caller's responsibility: turn it
    /// off before enabling the AP and back on after disabling it. The
    /// returned boolean is the platform's acceptance of the request; the
    /// state transition itself is asynchronous - await it with
    /// [`wait_for_state`](Self::wait_for_state) or an
    /// [`ApStateMonitor`](crate::monitor::ApStateMonitor).
    pub async fn set_enabled(
        &self,
        config: Option<&ApConfig>,
        enabled: bool,
    ) -> ApctlResult<bool> {
        self.capability.set_ap_enabled(config, enabled).await
    }

    /// Start the AP under its current configuration. A configuration
    /// that cannot be read is passed through as absent, letting the
    /// backend use whatever it has stored.
    pub async fn enable(&self) -> ApctlResult<bool> {
        let config = self.capability.ap_config().await.ok();
        self.set_enabled(config.as_ref(), true).await
    }

    /// Stop any currently running AP.
    pub async fn disable(&self) -> ApctlResult<bool> {
        self.set_enabled(None, false).await
    }

    /// The device's own address on the AP-local network, skipping
    /// loopback. `Ok(None)` while the AP is disabled or when no address
    /// matches. Re-resolved on every call.
    pub async fn local_address(&self) -> ApctlResult<Option<IpAddr>> {
        if !self.is_enabled().await? {
            return Ok(None);
        }
        find_local_address(&self.wifi_device).await
    }

    /// One fresh snapshot of the clients attached to the AP network.
    ///
    /// Requires a running AP. The snapshot comes from the kernel
    /// neighbor cache, which evicts on its own schedule - a returned
    /// client may have disconnected minutes ago. A mid-read failure
    /// yields [`ClientsSnapshot::Partial`] with the rows parsed so far.
    pub async fn clients(&self) -> ApctlResult<ClientsSnapshot> {
        if !self.is_enabled().await? {
            return Err(ApctlError::NotEnabled);
        }
        Ok(read_neighbor_table(&self.neighbor_table, &self.wifi_device).await)
    }

    /// Probe the current client list and collect the reachable clients,
    /// in submission order.
    pub async fn reachable_clients(
        &self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> ApctlResult<Vec<Client>> {
        let snapshot = self.clients().await?;
        self.prober
            .probe_all(snapshot.clients(), timeout, cancel)
            .await
    }

    /// Probe the current client list, streaming each reachable client
    /// over the returned channel as its probe completes. Channel closure
    /// is the completion signal.
    pub async fn reachable_clients_each(
        &self,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> ApctlResult<mpsc::Receiver<Client>> {
        let snapshot = self.clients().await?;
        self.prober
            .probe_each(snapshot.into_clients(), timeout, cancel)
    }

    /// Poll until the AP reaches `target` or the deadline passes.
    pub async fn wait_for_state(&self, target: ApState, timeout: Duration) -> ApctlResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.state().await == target {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(ApctlError::Timeout(format!(
                    "AP did not reach state '{}' within {:?}",
                    target, timeout
                )));
            }
            sleep(WAIT_POLL_INTERVAL.min(timeout)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::FakeCapability;

    #[tokio::test]
    async fn test_state_total_on_failure() {
        let fake = Arc::new(FakeCapability::new().fail_reads());
        let controller = ApController::new(fake).await;
        assert_eq!(controller.state().await, ApState::Unknown);
    }

    #[tokio::test]
    async fn test_wait_for_state_follows_script() {
        // Disabled -> Enabling -> Enabled, one code per poll
        let fake = Arc::new(FakeCapability::new().with_state_script(vec![11, 12, 13]));
        let controller = ApController::new(fake).await;

        controller
            .wait_for_state(ApState::Enabled, Duration::from_secs(5))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_state_times_out() {
        let fake = Arc::new(FakeCapability::new());
        let controller = ApController::new(fake).await;

        let err = controller
            .wait_for_state(ApState::Enabled, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, ApctlError::Timeout(_)));
    }
}
