//! Platform capability binding
//!
//! Soft-AP control is not part of a stable platform interface, so every
//! backend is modeled as an [`ApCapability`] adapter that declares which
//! of the four primitives it actually provides. Binding never fails:
//! a missing primitive just stays unbound in the [`CapabilitySet`], and
//! calling it returns `ApctlError::NotSupported`.

use crate::error::{ApctlError, ApctlResult};
use crate::mac::MacAddr;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Access point configuration, passed through to the backend unmodified.
///
/// The facade does not validate or normalize these fields; backends own
/// their interpretation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApConfig {
    /// Network name
    pub ssid: String,
    /// WPA2 pre-shared key, `None` for an open network
    pub passphrase: Option<String>,
}

impl ApConfig {
    pub fn new(ssid: impl Into<String>, passphrase: Option<String>) -> Self {
        Self { ssid: ssid.into(), passphrase }
    }

    /// Load a configuration from a TOML file.
    pub async fn from_toml_file(path: &Path) -> ApctlResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        toml::from_str(&content)
            .map_err(|e| ApctlError::ParseError(format!("{}: {}", path.display(), e)))
    }
}

/// Which of the four soft-AP primitives an adapter provides.
///
/// Built once at adapter construction and immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub get_configuration: bool,
    pub get_state: bool,
    pub is_enabled: bool,
    pub set_enabled: bool,
}

impl CapabilitySet {
    /// A set with every primitive bound.
    pub fn full() -> Self {
        Self {
            get_configuration: true,
            get_state: true,
            is_enabled: true,
            set_enabled: true,
        }
    }

    /// A set with no primitive bound.
    pub fn empty() -> Self {
        Self {
            get_configuration: false,
            get_state: false,
            is_enabled: false,
            set_enabled: false,
        }
    }

    /// True only if every primitive is bound.
    pub fn all(&self) -> bool {
        self.get_configuration && self.get_state && self.is_enabled && self.set_enabled
    }
}

/// Backend seam for soft-AP control.
///
/// Implementations: [`HostapdCapability`](crate::hostapd::HostapdCapability)
/// for real hardware, [`FakeCapability`](crate::fake::FakeCapability) for
/// deterministic tests and dry runs.
#[async_trait]
pub trait ApCapability: Send + Sync {
    /// Which primitives this adapter binds. Computed at construction.
    fn capabilities(&self) -> CapabilitySet;

    /// Whether the radio hardware can host an AP. No backend currently
    /// probes this, so the default is `true`.
    fn hardware_supported(&self) -> bool {
        true
    }

    /// Reports whether soft-AP control is usable through this adapter:
    /// all four primitives bound and the hardware check passing. Even
    /// when true, the underlying platform operations may still fail at
    /// call time.
    fn is_supported(&self) -> bool {
        self.capabilities().all() && self.hardware_supported()
    }

    /// The device's own wireless hardware address, from the platform's
    /// connection info. `None` when the platform cannot report it, which
    /// sends interface resolution down the fallback path.
    async fn station_mac(&self) -> Option<MacAddr>;

    /// Current AP configuration.
    async fn ap_config(&self) -> ApctlResult<ApConfig>;

    /// Raw AP state code, before normalization. Legacy backends report
    /// codes below 10; see [`ApState::from_raw`](crate::state::ApState).
    async fn ap_state_raw(&self) -> ApctlResult<i32>;

    /// Whether the AP is currently enabled.
    async fn ap_enabled(&self) -> ApctlResult<bool>;

    /// Start or stop the AP. `config` replaces the stored configuration
    /// when given; `None` keeps it. Returns whether the platform accepted
    /// the request — acceptance, not completion: the state transition is
    /// asynchronous.
    async fn set_ap_enabled(&self, config: Option<&ApConfig>, enabled: bool)
        -> ApctlResult<bool>;
}
