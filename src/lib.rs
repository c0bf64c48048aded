//! apctl - Wi-Fi Access Point Control Library
//!
//! Async library for controlling a soft AP and discovering the clients
//! attached to its network:
//! - Capability binding (which soft-AP primitives this platform provides)
//! - Wireless interface resolution from the device's own MAC address
//! - AP state control with state-code normalization
//! - Neighbor-table client discovery
//! - Bounded concurrent reachability probing
//! - AP state transition monitoring
//!
//! Backends implement the `ApCapability` trait; a hostapd-backed adapter
//! and a deterministic in-memory fake are included.

pub mod error;
pub mod mac;
pub mod state;
pub mod capability;
pub mod fake;
pub mod hostapd;
pub mod interface;
pub mod clients;
pub mod probe;
pub mod controller;
pub mod monitor;

// Re-export commonly used types
pub use error::{ApctlError, ApctlResult};
pub use mac::MacAddr;
pub use state::ApState;
pub use capability::{ApCapability, ApConfig, CapabilitySet};
pub use fake::FakeCapability;
pub use hostapd::HostapdCapability;
pub use interface::{NetInterface, FALLBACK_WIFI_DEVICE};
pub use clients::{Client, ClientsSnapshot};
pub use probe::{PingCheck, ReachabilityCheck, ReachabilityProber};
pub use controller::ApController;
pub use monitor::{ApEvent, ApStateMonitor};
