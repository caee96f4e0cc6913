//! Fallback discovery for media servers that do not answer SSDP.
//!
//! A handful of likely host addresses of the local /24 are probed on the
//! well-known Plex, Jellyfin and Emby ports. Any `200` on one of the configured
//! health paths is taken as a media server.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use get_if_addrs::get_if_addrs;
use tracing::{debug, info, trace, warn};
use ureq::Agent;

use crate::config::DiscoveryConfig;
use crate::errors::DiscoveryError;
use crate::http;
use crate::model::{Device, DiscoveryReport};
use crate::observer::Observer;
use crate::orchestrator::DeviceSource;

/// `server_header` of every scanned device.
pub const PORT_SCAN_SERVER: &str = "PortScan";

/// `search_target` of every scanned device.
pub const PORT_SCAN_TARGET: &str = "portscan";

pub struct PortScanner {
    config: DiscoveryConfig,
    agent: Agent,
    observer: Observer,
}

impl PortScanner {
    pub fn new(config: DiscoveryConfig, observer: Observer) -> Self {
        let agent = http::agent(config.scan_timeout());
        Self {
            config,
            agent,
            observer,
        }
    }

    pub fn scan(&self) -> DiscoveryReport {
        self.scan_with_callback(&HashSet::new(), |_| {})
    }

    /// Scans the local subnet, skipping locations already in `known`.
    pub fn scan_with_callback<F>(&self, known: &HashSet<String>, mut on_device: F) -> DiscoveryReport
    where
        F: FnMut(&Device),
    {
        self.observer.in_scope(|| self.run(known, &mut on_device))
    }

    fn run(&self, known: &HashSet<String>, on_device: &mut dyn FnMut(&Device)) -> DiscoveryReport {
        let base = match self.network_base() {
            Ok(base) => base,
            Err(err) => {
                warn!("Port scan skipped: {}", err);
                return DiscoveryReport::failed(err);
            }
        };

        info!("🔍 Port scan of {}.x", base);

        let mut report = DiscoveryReport::new();
        let mut seen: HashSet<String> = HashSet::new();

        for suffix in &self.config.scan_host_suffixes {
            let ip = format!("{}.{}", base, suffix);
            for &port in &self.config.scan_ports {
                let base_url = format!("http://{}:{}", ip, port);
                if known.contains(&base_url) || seen.contains(&base_url) {
                    trace!("Skipping already known {}", base_url);
                    continue;
                }

                if !self.responds(&base_url) {
                    continue;
                }

                seen.insert(base_url.clone());
                let device = scanned_device(&ip, port);
                info!(location = %device.location(), "✅ Found device {}", device.name());
                on_device(&device);
                report.devices.push(device);
            }
        }

        debug!("Port scan finished: {} device(s)", report.devices.len());
        report
    }

    fn network_base(&self) -> Result<String, DiscoveryError> {
        match &self.config.network_base {
            Some(base) if !base.trim().is_empty() => Ok(base.trim().trim_end_matches('.').to_string()),
            _ => local_network_base(&self.config.network_probe_addr),
        }
    }

    /// True when one of the health paths answers `200`.
    fn responds(&self, base_url: &str) -> bool {
        for path in &self.config.scan_paths {
            let url = format!("{}{}", base_url, path);
            match http::get_status(&self.agent, &url, &self.config.user_agent) {
                Ok(200) => return true,
                Ok(status) => trace!("{} answered {}", url, status),
                Err(err) => trace!("{} unreachable: {}", url, err),
            }
        }
        false
    }
}

impl DeviceSource for PortScanner {
    fn name(&self) -> &str {
        "portscan"
    }

    fn discover(&self, known: &HashSet<String>, on_device: &mut dyn FnMut(&Device)) -> DiscoveryReport {
        self.observer.in_scope(|| self.run(known, on_device))
    }
}

/// Vendor guessed from a well-known media server port.
pub fn server_label(port: u16) -> &'static str {
    match port {
        32400 => "Plex",
        8096 => "Jellyfin",
        8920 => "Emby",
        _ => "Media",
    }
}

fn scanned_device(ip: &str, port: u16) -> Device {
    let friendly = format!("{} Server", server_label(port));
    let url = format!("http://{}:{}", ip, port);
    Device::new(
        format!("{} ({}:{})", friendly, ip, port),
        friendly,
        url.clone(),
        url,
        PORT_SCAN_SERVER.to_string(),
        PORT_SCAN_TARGET.to_string(),
        None,
    )
}

/// First three octets of the local IPv4 address, e.g. `"192.168.1"`.
///
/// The address is taken from a UDP socket connected to `probe_addr` (nothing
/// is sent), falling back to the first non-loopback interface.
pub fn local_network_base(probe_addr: &str) -> Result<String, DiscoveryError> {
    if let Some(ip) = routed_ipv4(probe_addr) {
        return Ok(network_base_of(ip));
    }

    debug!("No route through {}, looking at interfaces", probe_addr);
    let interfaces = get_if_addrs().map_err(|err| DiscoveryError::LocalNetwork(err.to_string()))?;
    interfaces
        .into_iter()
        .find_map(|iface| match iface.ip() {
            IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
            _ => None,
        })
        .map(network_base_of)
        .ok_or_else(|| DiscoveryError::LocalNetwork("no non-loopback IPv4 interface".to_string()))
}

fn routed_ipv4(probe_addr: &str) -> Option<Ipv4Addr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect(probe_addr).ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(ip),
        _ => None,
    }
}

fn network_base_of(ip: Ipv4Addr) -> String {
    let [a, b, c, _] = ip.octets();
    format!("{}.{}.{}", a, b, c)
}
