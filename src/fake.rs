//! Deterministic in-memory capability adapter
//!
//! `FakeCapability` honors the full [`ApCapability`](crate::capability::ApCapability)
//! contract without touching the system. The test suite drives the
//! controller, monitor and prober through it; it is also useful as a
//! dry-run backend.

use crate::capability::{ApCapability, ApConfig, CapabilitySet};
use crate::error::{ApctlError, ApctlResult};
use crate::mac::MacAddr;
use crate::state::{ApState, AP_STATE_DISABLED, AP_STATE_ENABLED};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Inner {
    enabled: bool,
    config: Option<ApConfig>,
    /// Scripted raw state codes, consumed one per read; the last entry
    /// sticks. Empty means "derive from the enabled flag".
    state_script: VecDeque<i32>,
    fail_reads: bool,
    fail_writes: bool,
    set_calls: Vec<(Option<ApConfig>, bool)>,
}

/// In-memory [`ApCapability`] implementation with knobs for missing
/// primitives, legacy state numbering and injected failures.
pub struct FakeCapability {
    caps: CapabilitySet,
    legacy_codes: bool,
    station_mac: Option<MacAddr>,
    inner: Mutex<Inner>,
}

impl FakeCapability {
    /// A fully-bound adapter: AP disabled, no stored configuration.
    pub fn new() -> Self {
        Self {
            caps: CapabilitySet::full(),
            legacy_codes: false,
            station_mac: None,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Restrict which primitives the adapter declares.
    pub fn with_capabilities(mut self, caps: CapabilitySet) -> Self {
        self.caps = caps;
        self
    }

    /// Report raw state codes in the legacy (0-based) numbering.
    pub fn with_legacy_codes(mut self) -> Self {
        self.legacy_codes = true;
        self
    }

    /// Set the wireless MAC reported by the connection-info query.
    pub fn with_station_mac(mut self, mac: MacAddr) -> Self {
        self.station_mac = Some(mac);
        self
    }

    /// Seed a stored configuration.
    pub fn with_config(self, config: ApConfig) -> Self {
        self.inner.lock().unwrap().config = Some(config);
        self
    }

    /// Start with the AP already enabled.
    pub fn enabled(self) -> Self {
        self.inner.lock().unwrap().enabled = true;
        self
    }

    /// Script the raw state codes returned by successive state reads.
    /// The last code repeats once the script is exhausted.
    pub fn with_state_script(self, script: Vec<i32>) -> Self {
        self.inner.lock().unwrap().state_script = script.into();
        self
    }

    /// Make every read primitive fail with a service error.
    pub fn fail_reads(self) -> Self {
        self.inner.lock().unwrap().fail_reads = true;
        self
    }

    /// Make the write primitive fail with a service error.
    pub fn fail_writes(self) -> Self {
        self.inner.lock().unwrap().fail_writes = true;
        self
    }

    /// Every `set_ap_enabled` invocation seen so far.
    pub fn set_calls(&self) -> Vec<(Option<ApConfig>, bool)> {
        self.inner.lock().unwrap().set_calls.clone()
    }

    fn raw_code(&self, state: ApState) -> i32 {
        let code = match state {
            ApState::Enabled => AP_STATE_ENABLED,
            _ => AP_STATE_DISABLED,
        };
        if self.legacy_codes {
            code - 10
        } else {
            code
        }
    }
}

impl Default for FakeCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ApCapability for FakeCapability {
    fn capabilities(&self) -> CapabilitySet {
        self.caps
    }

    async fn station_mac(&self) -> Option<MacAddr> {
        self.station_mac
    }

    async fn ap_config(&self) -> ApctlResult<ApConfig> {
        if !self.caps.get_configuration {
            return Err(ApctlError::NotSupported("ap_config".to_string()));
        }
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(ApctlError::ServiceError("injected read failure".to_string()));
        }
        inner
            .config
            .clone()
            .ok_or_else(|| ApctlError::ServiceError("no configuration stored".to_string()))
    }

    async fn ap_state_raw(&self) -> ApctlResult<i32> {
        if !self.caps.get_state {
            return Err(ApctlError::NotSupported("ap_state".to_string()));
        }
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(ApctlError::ServiceError("injected read failure".to_string()));
        }
        if let Some(&next) = inner.state_script.front() {
            if inner.state_script.len() > 1 {
                inner.state_script.pop_front();
            }
            return Ok(next);
        }
        let state = if inner.enabled { ApState::Enabled } else { ApState::Disabled };
        Ok(self.raw_code(state))
    }

    async fn ap_enabled(&self) -> ApctlResult<bool> {
        if !self.caps.is_enabled {
            return Err(ApctlError::NotSupported("ap_enabled".to_string()));
        }
        let inner = self.inner.lock().unwrap();
        if inner.fail_reads {
            return Err(ApctlError::ServiceError("injected read failure".to_string()));
        }
        Ok(inner.enabled)
    }

    async fn set_ap_enabled(
        &self,
        config: Option<&ApConfig>,
        enabled: bool,
    ) -> ApctlResult<bool> {
        if !self.caps.set_enabled {
            return Err(ApctlError::NotSupported("set_ap_enabled".to_string()));
        }
        let mut inner = self.inner.lock().unwrap();
        inner.set_calls.push((config.cloned(), enabled));
        if inner.fail_writes {
            return Err(ApctlError::ServiceError("injected write failure".to_string()));
        }
        if let Some(cfg) = config {
            inner.config = Some(cfg.clone());
        }
        inner.enabled = enabled;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_config_round_trip() {
        let fake = FakeCapability::new();
        let cfg = ApConfig::new("TestNet", Some("secret123".to_string()));

        assert!(fake.set_ap_enabled(Some(&cfg), true).await.unwrap());
        assert!(fake.ap_enabled().await.unwrap());
        assert_eq!(fake.ap_config().await.unwrap(), cfg);
    }

    #[tokio::test]
    async fn test_missing_primitive_is_not_supported() {
        let fake = FakeCapability::new().with_capabilities(CapabilitySet {
            set_enabled: false,
            ..CapabilitySet::full()
        });

        assert!(!fake.is_supported());
        let err = fake.set_ap_enabled(None, true).await.unwrap_err();
        assert!(matches!(err, ApctlError::NotSupported(_)));
        // Read primitives still work
        assert!(!fake.ap_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_legacy_codes_offset() {
        let fake = FakeCapability::new().with_legacy_codes().enabled();
        let raw = fake.ap_state_raw().await.unwrap();
        assert_eq!(raw, 3);
        assert_eq!(ApState::from_raw(raw), ApState::Enabled);
    }

    #[tokio::test]
    async fn test_state_script_last_code_sticks() {
        let fake = FakeCapability::new().with_state_script(vec![11, 12, 13]);
        assert_eq!(fake.ap_state_raw().await.unwrap(), 11);
        assert_eq!(fake.ap_state_raw().await.unwrap(), 12);
        assert_eq!(fake.ap_state_raw().await.unwrap(), 13);
        assert_eq!(fake.ap_state_raw().await.unwrap(), 13);
    }
}
