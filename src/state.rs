//! Access point state codes
//!
//! Platform backends report AP state as small integers. Two numbering
//! generations exist: a legacy range starting at 0 and the current range
//! starting at 10. `ApState::from_raw` collapses both onto the canonical
//! values.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const AP_STATE_DISABLING: i32 = 10;
pub const AP_STATE_DISABLED: i32 = 11;
pub const AP_STATE_ENABLING: i32 = 12;
pub const AP_STATE_ENABLED: i32 = 13;
pub const AP_STATE_FAILED: i32 = 14;

/// Canonical access point state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApState {
    Disabling,
    Disabled,
    Enabling,
    Enabled,
    Failed,
    /// Raw code outside both known ranges, or the state read failed.
    /// Non-fatal; callers should treat the AP state as unknowable until
    /// the next poll.
    Unknown,
}

impl ApState {
    /// Normalize a raw backend state code.
    ///
    /// Legacy backends number the states from 0, current ones from 10;
    /// raw values below 10 get the offset added before mapping. Codes
    /// outside both ranges map to `Unknown`.
    pub fn from_raw(raw: i32) -> Self {
        let code = if (0..10).contains(&raw) { raw + 10 } else { raw };
        match code {
            AP_STATE_DISABLING => ApState::Disabling,
            AP_STATE_DISABLED => ApState::Disabled,
            AP_STATE_ENABLING => ApState::Enabling,
            AP_STATE_ENABLED => ApState::Enabled,
            AP_STATE_FAILED => ApState::Failed,
            _ => ApState::Unknown,
        }
    }

    /// Canonical numeric code, or -1 for `Unknown`.
    pub fn code(&self) -> i32 {
        match self {
            ApState::Disabling => AP_STATE_DISABLING,
            ApState::Disabled => AP_STATE_DISABLED,
            ApState::Enabling => AP_STATE_ENABLING,
            ApState::Enabled => AP_STATE_ENABLED,
            ApState::Failed => AP_STATE_FAILED,
            ApState::Unknown => -1,
        }
    }
}

impl fmt::Display for ApState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApState::Disabling => "disabling",
            ApState::Disabled => "disabled",
            ApState::Enabling => "enabling",
            ApState::Enabled => "enabled",
            ApState::Failed => "failed",
            ApState::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_and_current_codes_agree() {
        for raw in 0..10 {
            assert_eq!(ApState::from_raw(raw), ApState::from_raw(raw + 10));
        }
    }

    #[test]
    fn test_current_codes_map_to_themselves() {
        assert_eq!(ApState::from_raw(10), ApState::Disabling);
        assert_eq!(ApState::from_raw(11), ApState::Disabled);
        assert_eq!(ApState::from_raw(12), ApState::Enabling);
        assert_eq!(ApState::from_raw(13), ApState::Enabled);
        assert_eq!(ApState::from_raw(14), ApState::Failed);
    }

    #[test]
    fn test_out_of_range_is_unknown() {
        assert_eq!(ApState::from_raw(-1), ApState::Unknown);
        assert_eq!(ApState::from_raw(15), ApState::Unknown);
        assert_eq!(ApState::from_raw(100), ApState::Unknown);
    }

    #[test]
    fn test_normalization_idempotent() {
        for raw in -5..20 {
            let state = ApState::from_raw(raw);
            if state != ApState::Unknown {
                assert_eq!(ApState::from_raw(state.code()), state);
            }
        }
    }
}
