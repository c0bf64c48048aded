//! hostapd-backed capability adapter
//!
//! Binds the four soft-AP primitives to a hostapd process: enable writes
//! a config and starts `hostapd -B -P <pidfile>`, disable SIGTERMs the
//! recorded pid, and state reads derive from pidfile liveness. The
//! write primitive is only bound when a hostapd binary is found, so a
//! system without hostapd degrades to a read-only (and unsupported)
//! adapter instead of failing construction.

use crate::capability::{ApCapability, ApConfig, CapabilitySet};
use crate::error::{ApctlError, ApctlResult};
use crate::mac::MacAddr;
use crate::state::{AP_STATE_DISABLED, AP_STATE_ENABLED};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

const HOSTAPD_PATHS: &[&str] = &[
    "/usr/sbin/hostapd",
    "/usr/bin/hostapd",
    "/sbin/hostapd",
    "/usr/local/bin/hostapd",
];

/// Real Linux adapter driving hostapd.
pub struct HostapdCapability {
    config_dir: PathBuf,
    pid_file: PathBuf,
    conf_file: PathBuf,
    /// Wireless interface hostapd binds the AP to
    interface: String,
    binary: Option<PathBuf>,
    caps: CapabilitySet,
}

impl HostapdCapability {
    /// Bind against the given runtime directory and wireless interface.
    ///
    /// Never fails: a missing hostapd binary leaves the write primitive
    /// unbound, which `is_supported()` reports.
    pub fn new(config_dir: PathBuf, interface: impl Into<String>) -> Self {
        let binary = HOSTAPD_PATHS
            .iter()
            .map(|p| PathBuf::from(*p))
            .find(|p| p.exists());

        if binary.is_none() {
            warn!("hostapd binary not found - AP control will be unsupported");
        }

        let caps = CapabilitySet {
            get_configuration: true,
            get_state: true,
            is_enabled: true,
            set_enabled: binary.is_some(),
        };

        Self {
            pid_file: config_dir.join("hostapd.pid"),
            conf_file: config_dir.join("hostapd.conf"),
            config_dir,
            interface: interface.into(),
            binary,
            caps,
        }
    }

    /// Generate a hostapd configuration for the AP.
    pub fn generate_config(&self, config: &ApConfig) -> ApctlResult<String> {
        let mut conf = String::new();

        conf.push_str(&format!("interface={}\n", self.interface));
        conf.push_str("driver=nl80211\n");
        conf.push_str(&format!("ssid={}\n", config.ssid));
        conf.push_str("hw_mode=g\nchannel=6\nwmm_enabled=1\n");

        if let Some(ref passphrase) = config.passphrase {
            if passphrase.len() < 8 {
                return Err(ApctlError::InvalidParameter(
                    "Passphrase must be at least 8 characters".to_string(),
                ));
            }
            conf.push_str("wpa=2\nwpa_passphrase=");
            conf.push_str(passphrase);
            conf.push_str("\nwpa_key_mgmt=WPA-PSK\nwpa_pairwise=CCMP\nrsn_pairwise=CCMP\n");
        }

        conf.push_str("auth_algs=1\nmacaddr_acl=0\n");

        Ok(conf)
    }

    async fn write_config(&self, config: &ApConfig) -> ApctlResult<()> {
        let content = self.generate_config(config)?;
        fs::create_dir_all(&self.config_dir).await?;
        fs::write(&self.conf_file, content).await?;
        Ok(())
    }

    async fn is_running(&self) -> bool {
        if !self.pid_file.exists() {
            return false;
        }
        if let Ok(pid_str) = fs::read_to_string(&self.pid_file).await {
            if let Ok(pid) = pid_str.trim().parse::<i32>() {
                return Path::new(&format!("/proc/{}", pid)).exists();
            }
        }
        false
    }

    async fn start(&self, config: Option<&ApConfig>) -> ApctlResult<bool> {
        let binary = self.binary.as_ref().ok_or_else(|| {
            ApctlError::NotSupported("hostapd binary not found".to_string())
        })?;

        if self.is_running().await {
            // Restart under the new configuration, matching the
            // set-while-running contract
            self.stop().await?;
        }

        if let Some(cfg) = config {
            self.write_config(cfg).await?;
        } else if !self.conf_file.exists() {
            return Err(ApctlError::ServiceError(
                "No stored AP configuration to enable".to_string(),
            ));
        }

        let output = Command::new(binary)
            .arg("-B")
            .arg("-P")
            .arg(&self.pid_file)
            .arg(&self.conf_file)
            .output()
            .await
            .map_err(|e| ApctlError::ServiceError(format!("Failed to start hostapd: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ApctlError::ServiceError(format!(
                "hostapd failed to start: {}",
                stderr.trim()
            )));
        }

        info!(interface = %self.interface, "hostapd started");
        Ok(true)
    }

    async fn stop(&self) -> ApctlResult<bool> {
        if !self.is_running().await {
            return Ok(true);
        }

        let pid_str = fs::read_to_string(&self.pid_file).await?;
        let pid: i32 = pid_str
            .trim()
            .parse()
            .map_err(|_| ApctlError::ServiceError("Invalid PID in pidfile".to_string()))?;

        Command::new("kill")
            .arg("-TERM")
            .arg(pid.to_string())
            .output()
            .await?;

        for _ in 0..10 {
            sleep(Duration::from_millis(500)).await;
            if !self.is_running().await {
                let _ = fs::remove_file(&self.pid_file).await;
                info!("hostapd stopped");
                return Ok(true);
            }
        }

        Err(ApctlError::Timeout("hostapd did not stop".to_string()))
    }
}

/// Parse `ssid=` and `wpa_passphrase=` back out of a hostapd config.
pub fn parse_hostapd_config(content: &str) -> ApctlResult<ApConfig> {
    let mut ssid = None;
    let mut passphrase = None;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("ssid=") {
            ssid = Some(v.to_string());
        } else if let Some(v) = line.strip_prefix("wpa_passphrase=") {
            passphrase = Some(v.to_string());
        }
    }

    match ssid {
        Some(ssid) => Ok(ApConfig { ssid, passphrase }),
        None => Err(ApctlError::ParseError(
            "hostapd config has no ssid".to_string(),
        )),
    }
}

#[async_trait]
impl ApCapability for HostapdCapability {
    fn capabilities(&self) -> CapabilitySet {
        self.caps
    }

    async fn station_mac(&self) -> Option<MacAddr> {
        let path = format!("/sys/class/net/{}/address", self.interface);
        match fs::read_to_string(&path).await {
            Ok(s) => MacAddr::parse(s.trim()).ok(),
            Err(e) => {
                debug!(path, error = %e, "Cannot read wireless hardware address");
                None
            }
        }
    }

    async fn ap_config(&self) -> ApctlResult<ApConfig> {
        let content = fs::read_to_string(&self.conf_file).await?;
        parse_hostapd_config(&content)
    }

    async fn ap_state_raw(&self) -> ApctlResult<i32> {
        // Process-level backend: only the two settled states are
        // observable, in the current numbering
        if self.is_running().await {
            Ok(AP_STATE_ENABLED)
        } else {
            Ok(AP_STATE_DISABLED)
        }
    }

    async fn ap_enabled(&self) -> ApctlResult<bool> {
        Ok(self.is_running().await)
    }

    async fn set_ap_enabled(
        &self,
        config: Option<&ApConfig>,
        enabled: bool,
    ) -> ApctlResult<bool> {
        if enabled {
            self.start(config).await
        } else {
            self.stop().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(dir: &Path) -> HostapdCapability {
        HostapdCapability::new(dir.to_path_buf(), "wlan0")
    }

    #[test]
    fn test_generate_config_wpa() {
        let tmp = tempfile::tempdir().unwrap();
        let cap = adapter(tmp.path());
        let conf = cap
            .generate_config(&ApConfig::new("TestNet", Some("secret123".to_string())))
            .unwrap();

        assert!(conf.contains("interface=wlan0\n"));
        assert!(conf.contains("ssid=TestNet\n"));
        assert!(conf.contains("wpa=2\n"));
        assert!(conf.contains("wpa_passphrase=secret123\n"));
    }

    #[test]
    fn test_generate_config_open_network() {
        let tmp = tempfile::tempdir().unwrap();
        let cap = adapter(tmp.path());
        let conf = cap.generate_config(&ApConfig::new("Open", None)).unwrap();

        assert!(conf.contains("ssid=Open\n"));
        assert!(!conf.contains("wpa="));
    }

    #[test]
    fn test_generate_config_rejects_short_passphrase() {
        let tmp = tempfile::tempdir().unwrap();
        let cap = adapter(tmp.path());
        let err = cap
            .generate_config(&ApConfig::new("X", Some("short".to_string())))
            .unwrap_err();
        assert!(matches!(err, ApctlError::InvalidParameter(_)));
    }

    #[test]
    fn test_config_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let cap = adapter(tmp.path());
        let config = ApConfig::new("TestNet", Some("secret123".to_string()));
        let conf = cap.generate_config(&config).unwrap();

        assert_eq!(parse_hostapd_config(&conf).unwrap(), config);
    }

    #[test]
    fn test_parse_config_without_ssid_fails() {
        assert!(parse_hostapd_config("driver=nl80211\n").is_err());
    }

    #[tokio::test]
    async fn test_not_running_without_pidfile() {
        let tmp = tempfile::tempdir().unwrap();
        let cap = adapter(tmp.path());
        assert!(!cap.is_running().await);
        assert_eq!(cap.ap_state_raw().await.unwrap(), AP_STATE_DISABLED);
        assert!(!cap.ap_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_pidfile_reads_as_stopped() {
        let tmp = tempfile::tempdir().unwrap();
        let cap = adapter(tmp.path());
        fs::create_dir_all(tmp.path()).await.unwrap();
        // A pid that cannot exist
        fs::write(tmp.path().join("hostapd.pid"), "999999999\n")
            .await
            .unwrap();
        assert!(!cap.is_running().await);
    }

    #[tokio::test]
    async fn test_read_primitives_bound_without_binary() {
        // Capability binding is silent: reads stay bound even when the
        // binary is missing, only the write primitive may be unbound
        let tmp = tempfile::tempdir().unwrap();
        let cap = adapter(tmp.path());
        let caps = cap.capabilities();
        assert!(caps.get_configuration && caps.get_state && caps.is_enabled);
        assert_eq!(cap.is_supported(), caps.set_enabled);
    }
}
