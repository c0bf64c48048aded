//! Connected client discovery via the kernel neighbor table
//!
//! `/proc/net/arp` is a whitespace-delimited text table:
//!
//! ```text
//! IP address       HW type     Flags       HW address            Mask     Device
//! 192.168.43.5     0x1         0x2         aa:bb:cc:dd:ee:ff     *        wlan0
//! ```
//!
//! Rows are kept when the device column equals the wifi device name
//! exactly and the hardware address column has the `XX:XX:XX:XX:XX:XX`
//! shape. The header never matches the shape check; all-zero placeholder
//! entries do, and are returned. The kernel evicts neighbor entries on
//! its own schedule (commonly minutes), so a returned client may have
//! disconnected long before the read.

use crate::error::ApctlError;
use crate::mac::is_neighbor_mac;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

/// Default neighbor table location.
pub const NEIGHBOR_TABLE_PATH: &str = "/proc/net/arp";

/// A device attached to the AP's local network, as recorded in one
/// neighbor-table snapshot. Snapshots are fresh on every read; there is
/// no identity or caching across reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    /// Raw IP address string from the table
    pub ip_addr: String,
    /// Raw hardware address string from the table
    pub hw_addr: String,
}

/// Outcome of one neighbor-table read.
///
/// A mid-read failure does not discard the rows already parsed; it is
/// reported as `Partial` so callers can tell a truncated snapshot from a
/// complete one. The two cases are deliberately distinct outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientsSnapshot {
    /// The whole table was read.
    Complete(Vec<Client>),
    /// Reading failed partway through; `clients` holds the rows parsed
    /// before the failure.
    Partial { clients: Vec<Client>, error: String },
}

impl ClientsSnapshot {
    pub fn clients(&self) -> &[Client] {
        match self {
            ClientsSnapshot::Complete(clients) => clients,
            ClientsSnapshot::Partial { clients, .. } => clients,
        }
    }

    pub fn into_clients(self) -> Vec<Client> {
        match self {
            ClientsSnapshot::Complete(clients) => clients,
            ClientsSnapshot::Partial { clients, .. } => clients,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, ClientsSnapshot::Complete(_))
    }
}

/// Parse one neighbor-table line for the given device.
///
/// Field layout: IP address at 0, hardware address at 3, device at 5;
/// lines with fewer than 6 whitespace-separated fields are skipped.
pub fn parse_neighbor_line(line: &str, device: &str) -> Option<Client> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 6 {
        return None;
    }

    let ip_addr = parts[0];
    let hw_addr = parts[3];
    let line_device = parts[5];

    if line_device != device {
        return None;
    }
    if !is_neighbor_mac(hw_addr) {
        return None;
    }

    Some(Client {
        ip_addr: ip_addr.to_string(),
        hw_addr: hw_addr.to_string(),
    })
}

/// Read a neighbor table file and collect the clients on `device`.
///
/// I/O failures - including failure to open the table - yield a
/// `Partial` snapshot carrying whatever rows were parsed first.
pub async fn read_neighbor_table(path: &Path, device: &str) -> ClientsSnapshot {
    let mut clients = Vec::new();

    let file = match File::open(path).await {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot open neighbor table");
            return ClientsSnapshot::Partial {
                clients,
                error: ApctlError::Io(e).to_string(),
            };
        }
    };

    let mut lines = BufReader::new(file).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(client) = parse_neighbor_line(&line, device) {
                    clients.push(client);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Neighbor table read failed partway");
                return ClientsSnapshot::Partial {
                    clients,
                    error: ApctlError::Io(e).to_string(),
                };
            }
        }
    }

    ClientsSnapshot::Complete(clients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "IP address       HW type     Flags       HW address            Mask     Device";

    #[test]
    fn test_parse_matching_line() {
        let line = "192.168.43.5 0x1 0x2 aa:bb:cc:dd:ee:ff 0x0 wlan0";
        let client = parse_neighbor_line(line, "wlan0").unwrap();
        assert_eq!(client.ip_addr, "192.168.43.5");
        assert_eq!(client.hw_addr, "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn test_parse_skips_other_devices() {
        let line = "192.168.1.7 0x1 0x2 aa:bb:cc:dd:ee:ff 0x0 eth0";
        assert!(parse_neighbor_line(line, "wlan0").is_none());
    }

    #[test]
    fn test_parse_skips_short_lines() {
        assert!(parse_neighbor_line("192.168.43.5 0x1 0x2", "wlan0").is_none());
        assert!(parse_neighbor_line("", "wlan0").is_none());
    }

    #[test]
    fn test_parse_skips_header() {
        assert!(parse_neighbor_line(HEADER, "wlan0").is_none());
        // Even with a device named like the header's last column
        assert!(parse_neighbor_line(HEADER, "Device").is_none());
    }

    #[test]
    fn test_all_zero_placeholder_is_kept() {
        // The shape check is deliberately weak: incomplete entries with a
        // zeroed hardware address pass it and are returned to the caller.
        let line = "192.168.43.9 0x1 0x0 00:00:00:00:00:00 0x0 wlan0";
        let client = parse_neighbor_line(line, "wlan0").unwrap();
        assert_eq!(client.hw_addr, "00:00:00:00:00:00");
    }

    #[tokio::test]
    async fn test_read_complete_table() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "{}", HEADER).unwrap();
        writeln!(tmp, "192.168.43.5 0x1 0x2 aa:bb:cc:dd:ee:ff 0x0 wlan0").unwrap();
        writeln!(tmp, "192.168.1.7 0x1 0x2 11:22:33:44:55:66 0x0 eth0").unwrap();
        writeln!(tmp, "192.168.43.9 0x1 0x0 00:00:00:00:00:00 0x0 wlan0").unwrap();
        tmp.flush().unwrap();

        let snapshot = read_neighbor_table(tmp.path(), "wlan0").await;
        assert!(snapshot.is_complete());
        let clients = snapshot.into_clients();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].ip_addr, "192.168.43.5");
        assert_eq!(clients[1].hw_addr, "00:00:00:00:00:00");
    }

    #[tokio::test]
    async fn test_read_empty_matches_is_complete_and_empty() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "{}", HEADER).unwrap();
        writeln!(tmp, "192.168.1.7 0x1 0x2 11:22:33:44:55:66 0x0 eth0").unwrap();
        tmp.flush().unwrap();

        let snapshot = read_neighbor_table(tmp.path(), "wlan0").await;
        assert_eq!(snapshot, ClientsSnapshot::Complete(vec![]));
    }

    #[tokio::test]
    async fn test_read_missing_table_is_partial() {
        let snapshot =
            read_neighbor_table(Path::new("/nonexistent/neighbor-table"), "wlan0").await;
        match snapshot {
            ClientsSnapshot::Partial { clients, .. } => assert!(clients.is_empty()),
            other => panic!("expected partial snapshot, got {:?}", other),
        }
    }
}
