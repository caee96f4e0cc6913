//! Typed configuration for discovery and browsing.
//!
//! Defaults hold the calibrated values. Both structs deserialize with
//! `#[serde(default)]` so a front end can embed them in its own settings, and
//! individual keys can be overridden from the environment with
//! `PMOBROWSE_CONFIG__<KEY>` variables.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

pub const ENV_PREFIX: &str = "PMOBROWSE_CONFIG__";

const DEFAULT_SSDP_ADDR: &str = "239.255.255.250:1900";
const DEFAULT_NETWORK_PROBE_ADDR: &str = "8.8.8.8:80";
const DEFAULT_USER_AGENT: &str = "PMOMusic pmobrowse/0.1";

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Destination of the M-SEARCH datagrams.
    pub ssdp_addr: String,
    pub search_targets: Vec<String>,
    pub mx: u32,
    /// Deadline of a single socket read.
    pub ssdp_read_timeout_ms: u64,
    /// Overall ceiling of the response collection loop.
    pub ssdp_ceiling_ms: u64,
    pub description_timeout_ms: u64,

    pub scan_host_suffixes: Vec<u8>,
    pub scan_ports: Vec<u16>,
    pub scan_paths: Vec<String>,
    pub scan_timeout_ms: u64,
    /// External address used to learn which local interface routes outwards.
    pub network_probe_addr: String,
    /// First three octets of the subnet to scan, bypassing detection.
    pub network_base: Option<String>,

    pub event_capacity: usize,
    pub refresh_interval_secs: u64,
    pub user_agent: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            ssdp_addr: DEFAULT_SSDP_ADDR.to_string(),
            search_targets: vec![
                "upnp:rootdevice".to_string(),
                "urn:schemas-upnp-org:device:MediaServer:1".to_string(),
            ],
            mx: 3,
            ssdp_read_timeout_ms: 1_000,
            ssdp_ceiling_ms: 5_000,
            description_timeout_ms: 5_000,
            scan_host_suffixes: vec![1, 2, 10, 100, 200, 254],
            scan_ports: vec![32400, 8096, 8920],
            scan_paths: vec![
                "/".to_string(),
                "/status".to_string(),
                "/identity".to_string(),
            ],
            scan_timeout_ms: 500,
            network_probe_addr: DEFAULT_NETWORK_PROBE_ADDR.to_string(),
            network_base: None,
            event_capacity: 256,
            refresh_interval_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DiscoveryConfig {
    pub fn ssdp_read_timeout(&self) -> Duration {
        Duration::from_millis(self.ssdp_read_timeout_ms.max(1))
    }

    pub fn ssdp_ceiling(&self) -> Duration {
        Duration::from_millis(self.ssdp_ceiling_ms)
    }

    pub fn description_timeout(&self) -> Duration {
        Duration::from_millis(self.description_timeout_ms.max(1))
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms.max(1))
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    /// Applies `PMOBROWSE_CONFIG__*` variables from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`, keyed by full variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

        if let Some(v) = get("SSDP_ADDR") {
            self.ssdp_addr = v;
        }
        override_number(&mut self.mx, "MX", get("MX"));
        override_number(
            &mut self.ssdp_read_timeout_ms,
            "SSDP_READ_TIMEOUT_MS",
            get("SSDP_READ_TIMEOUT_MS"),
        );
        override_number(&mut self.ssdp_ceiling_ms, "SSDP_CEILING_MS", get("SSDP_CEILING_MS"));
        override_number(
            &mut self.description_timeout_ms,
            "DESCRIPTION_TIMEOUT_MS",
            get("DESCRIPTION_TIMEOUT_MS"),
        );
        override_number(&mut self.scan_timeout_ms, "SCAN_TIMEOUT_MS", get("SCAN_TIMEOUT_MS"));
        if let Some(v) = get("NETWORK_BASE") {
            self.network_base = Some(v).filter(|v| !v.trim().is_empty());
        }
        override_number(&mut self.event_capacity, "EVENT_CAPACITY", get("EVENT_CAPACITY"));
        override_number(
            &mut self.refresh_interval_secs,
            "REFRESH_INTERVAL_SECS",
            get("REFRESH_INTERVAL_SECS"),
        );
        if let Some(v) = get("USER_AGENT") {
            self.user_agent = v;
        }
        self
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    pub soap_timeout_ms: u64,
    pub http_timeout_ms: u64,
    pub requested_count: u32,
    pub user_agent: String,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            soap_timeout_ms: 10_000,
            http_timeout_ms: 5_000,
            requested_count: 100,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl BrowseConfig {
    pub fn soap_timeout(&self) -> Duration {
        Duration::from_millis(self.soap_timeout_ms.max(1))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms.max(1))
    }

    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(&format!("{ENV_PREFIX}{key}"));

        override_number(&mut self.soap_timeout_ms, "SOAP_TIMEOUT_MS", get("SOAP_TIMEOUT_MS"));
        override_number(&mut self.http_timeout_ms, "HTTP_TIMEOUT_MS", get("HTTP_TIMEOUT_MS"));
        override_number(&mut self.requested_count, "REQUESTED_COUNT", get("REQUESTED_COUNT"));
        if let Some(v) = get("USER_AGENT") {
            self.user_agent = v;
        }
        self
    }
}

fn override_number<T: std::str::FromStr>(slot: &mut T, key: &str, value: Option<String>) {
    let Some(raw) = value else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!("Ignoring {}{}: '{}' is not a valid number", ENV_PREFIX, key, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_calibrated_values() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.ssdp_addr, "239.255.255.250:1900");
        assert_eq!(config.mx, 3);
        assert_eq!(config.ssdp_ceiling(), Duration::from_secs(5));
        assert_eq!(config.scan_ports, vec![32400, 8096, 8920]);
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(BrowseConfig::default().requested_count, 100);
    }

    #[test]
    fn overrides_replace_valid_values_and_ignore_garbage() {
        let config = DiscoveryConfig::default().with_overrides(lookup(&[
            ("SSDP_CEILING_MS", "1500"),
            ("MX", "not-a-number"),
            ("NETWORK_BASE", "192.168.7"),
        ]));
        assert_eq!(config.ssdp_ceiling_ms, 1500);
        assert_eq!(config.mx, 3);
        assert_eq!(config.network_base.as_deref(), Some("192.168.7"));
    }

    #[test]
    fn browse_overrides() {
        let config = BrowseConfig::default().with_overrides(lookup(&[("REQUESTED_COUNT", "50")]));
        assert_eq!(config.requested_count, 50);
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
    }
}
