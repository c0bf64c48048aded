//! Hardware (MAC) address handling
//!
//! Parsing and canonical comparison of 48-bit hardware addresses as they
//! appear in sysfs, the neighbor table and platform connection info.

use crate::error::{ApctlError, ApctlResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit hardware address.
///
/// Accepts colon-, hyphen- or space-delimited hex octets in any case.
/// Comparison between addresses from different sources goes through the
/// canonical big-endian numeric value, so delimiter and case differences
/// never matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddr([u8; 6]);

impl MacAddr {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Canonical big-endian numeric value, used for interface matching.
    pub fn to_u64(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }

    /// Parse a delimited MAC string. Delimiters may be `:`, `-` or spaces.
    pub fn parse(s: &str) -> ApctlResult<Self> {
        let parts: Vec<&str> = s
            .split(|c: char| c == ':' || c == '-' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();

        if parts.len() != 6 {
            return Err(ApctlError::InvalidParameter(
                format!("MAC address must have 6 octets: '{}'", s)
            ));
        }

        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            if part.len() > 2 {
                return Err(ApctlError::InvalidParameter(
                    format!("MAC address octet too long: '{}'", part)
                ));
            }
            octets[i] = u8::from_str_radix(part, 16).map_err(|_| {
                ApctlError::InvalidParameter(
                    format!("Invalid hex digit in MAC address: '{}'", part)
                )
            })?;
        }

        Ok(Self(octets))
    }
}

impl FromStr for MacAddr {
    type Err = ApctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

/// Check a string for the `XX:XX:XX:XX:XX:XX` neighbor-table shape: exactly
/// six colon-delimited octets of two hex digits each.
///
/// This is a shape check only. The all-zero placeholder
/// `00:00:00:00:00:00` passes it, matching how incomplete neighbor entries
/// have always been reported to callers.
pub fn is_neighbor_mac(s: &str) -> bool {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 6 {
        return false;
    }
    parts
        .iter()
        .all(|p| p.len() == 2 && p.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delimiters_and_case() {
        let colon = MacAddr::parse("aa:bb:cc:dd:ee:ff").unwrap();
        let hyphen = MacAddr::parse("AA-BB-CC-DD-EE-FF").unwrap();
        let space = MacAddr::parse("aa bb cc dd ee ff").unwrap();

        assert_eq!(colon, hyphen);
        assert_eq!(colon, space);
        assert_eq!(colon.octets(), [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
    }

    #[test]
    fn test_parse_short_octets() {
        // Single hex digit per octet is accepted, as some drivers report it
        let mac = MacAddr::parse("0:1:2:a:b:c").unwrap();
        assert_eq!(mac.octets(), [0x00, 0x01, 0x02, 0x0a, 0x0b, 0x0c]);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(MacAddr::parse("").is_err());
        assert!(MacAddr::parse("aa:bb:cc:dd:ee").is_err());
        assert!(MacAddr::parse("aa:bb:cc:dd:ee:ff:00").is_err());
        assert!(MacAddr::parse("aa:bb:cc:dd:ee:gg").is_err());
        assert!(MacAddr::parse("aaa:bb:cc:dd:ee:ff").is_err());
    }

    #[test]
    fn test_to_u64_big_endian() {
        let mac = MacAddr::parse("00:11:22:33:44:55").unwrap();
        assert_eq!(mac.to_u64(), 0x0011_2233_4455);

        let high = MacAddr::parse("ff:00:00:00:00:00").unwrap();
        assert_eq!(high.to_u64(), 0xff00_0000_0000);
    }

    #[test]
    fn test_display_round_trip() {
        let mac = MacAddr::parse("AA-BB-CC-DD-EE-FF").unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(MacAddr::parse(&mac.to_string()).unwrap(), mac);
    }

    #[test]
    fn test_neighbor_mac_shape() {
        assert!(is_neighbor_mac("aa:bb:cc:dd:ee:ff"));
        assert!(is_neighbor_mac("AA:BB:CC:DD:EE:FF"));
        // The all-zero placeholder passes the shape check
        assert!(is_neighbor_mac("00:00:00:00:00:00"));

        assert!(!is_neighbor_mac("aa:bb:cc:dd:ee"));
        assert!(!is_neighbor_mac("aa-bb-cc-dd-ee-ff"));
        assert!(!is_neighbor_mac("a:bb:cc:dd:ee:ff"));
        assert!(!is_neighbor_mac("IP"));
    }
}
