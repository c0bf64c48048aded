//! Network interface enumeration and wireless device resolution
//!
//! The wireless interface name is not directly queryable, so it is
//! resolved by matching the platform-reported wireless MAC against the
//! hardware addresses under `/sys/class/net`. Address listing shells out
//! to `ip -json addr show`.

use crate::error::{ApctlError, ApctlResult};
use crate::mac::MacAddr;
use std::net::IpAddr;
use std::path::Path;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

/// Device name used when resolution is impossible or finds nothing.
pub const FALLBACK_WIFI_DEVICE: &str = "wlan0";

/// A local network interface as seen during enumeration.
#[derive(Debug, Clone)]
pub struct NetInterface {
    pub name: String,
    /// Hardware address; absent for interfaces without one (tun, ppp)
    pub hw_addr: Option<MacAddr>,
}

/// Resolve the wireless interface name from the device's own wireless MAC.
///
/// `None` for the MAC models platforms whose connection info cannot
/// report it; those skip the scan entirely and take the fallback.
/// Interfaces are scanned in the order given; the first one whose
/// hardware address numerically equals the wireless MAC wins. No match
/// means the fallback name.
pub fn resolve_wifi_device(
    station_mac: Option<&MacAddr>,
    interfaces: &[NetInterface],
) -> String {
    let Some(mac) = station_mac else {
        warn!(
            "Wireless MAC unavailable - falling back to the default wifi device name: {}",
            FALLBACK_WIFI_DEVICE
        );
        return FALLBACK_WIFI_DEVICE.to_string();
    };

    let wanted = mac.to_u64();
    for iface in interfaces {
        let Some(hw) = iface.hw_addr else {
            continue;
        };
        if hw.to_u64() == wanted {
            debug!(device = %iface.name, "Resolved wifi device from hardware address");
            return iface.name.clone();
        }
    }

    warn!(
        "No interface matches the wireless MAC - falling back to the default wifi device name: {}",
        FALLBACK_WIFI_DEVICE
    );
    FALLBACK_WIFI_DEVICE.to_string()
}

/// Enumerate local interfaces from `/sys/class/net`.
///
/// Entries whose `address` file is missing or unparseable keep
/// `hw_addr: None` rather than failing the enumeration.
pub async fn enumerate_interfaces() -> ApctlResult<Vec<NetInterface>> {
    let net_path = Path::new("/sys/class/net");
    if !net_path.exists() {
        return Err(ApctlError::NotSupported(
            "/sys/class/net not available".to_string(),
        ));
    }

    let mut entries = fs::read_dir(net_path).await?;
    let mut interfaces = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(String::from) else {
            continue;
        };
        let addr_path = net_path.join(&name).join("address");
        let hw_addr = match fs::read_to_string(&addr_path).await {
            Ok(s) => MacAddr::parse(s.trim()).ok(),
            Err(_) => None,
        };
        interfaces.push(NetInterface { name, hw_addr });
    }

    interfaces.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(interfaces)
}

/// List the IP addresses bound to an interface via `ip -json addr show`.
pub async fn interface_addresses(interface: &str) -> ApctlResult<Vec<IpAddr>> {
    let cmd_str = format!("ip -json addr show {}", interface);
    let output = Command::new("ip")
        .args(["-json", "addr", "show", interface])
        .output()
        .await
        .map_err(|e| ApctlError::CommandFailed {
            cmd: cmd_str,
            code: None,
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        return Ok(Vec::new());
    }

    let json_str = String::from_utf8(output.stdout)
        .map_err(|e| ApctlError::ParseError(format!("Invalid UTF-8 in JSON output: {}", e)))?;
    let json: serde_json::Value = serde_json::from_str(&json_str)?;

    let mut addresses = Vec::new();

    if let Some(arr) = json.as_array() {
        if let Some(iface) = arr.first() {
            if let Some(addr_info) = iface.get("addr_info").and_then(|v| v.as_array()) {
                for addr in addr_info {
                    if let Some(local) = addr.get("local").and_then(|v| v.as_str()) {
                        if let Ok(ip) = local.parse::<IpAddr>() {
                            addresses.push(ip);
                        }
                    }
                }
            }
        }
    }

    Ok(addresses)
}

/// Pick the AP-local address from enumerated (interface name, addresses)
/// pairs: the first non-loopback address on an interface whose name
/// contains the wifi device name as a substring.
pub fn select_local_address(
    interfaces: &[(String, Vec<IpAddr>)],
    wifi_device: &str,
) -> Option<IpAddr> {
    for (name, addrs) in interfaces {
        for addr in addrs {
            if addr.is_loopback() {
                continue;
            }
            if name.contains(wifi_device) {
                return Some(*addr);
            }
        }
    }
    None
}

/// Find the local address assigned to the wifi device, skipping loopback.
/// Re-resolved on every call; nothing is cached.
pub async fn find_local_address(wifi_device: &str) -> ApctlResult<Option<IpAddr>> {
    let mut pairs = Vec::new();
    for iface in enumerate_interfaces().await? {
        let addrs = interface_addresses(&iface.name).await.unwrap_or_default();
        pairs.push((iface.name, addrs));
    }
    Ok(select_local_address(&pairs, wifi_device))
}
