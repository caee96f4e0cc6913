use std::collections::HashSet;
use std::io::{self, ErrorKind};
use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info, trace, warn};

use super::{build_msearch, parse_search_response};
use crate::config::DiscoveryConfig;
use crate::description::DescriptionFetcher;
use crate::errors::DiscoveryError;
use crate::model::{Device, DiscoveryReport};
use crate::observer::Observer;
use crate::orchestrator::DeviceSource;

const MULTICAST_TTL: u32 = 2;
const RECV_BUFFER_SIZE: usize = 8192;
/// Wait after a non-timeout read error before reading again.
const READ_ERROR_PAUSE: Duration = Duration::from_millis(50);

/// Sends M-SEARCH requests and collects the unicast answers of one probe.
pub struct SsdpProber {
    config: DiscoveryConfig,
    resolver: DescriptionFetcher,
    observer: Observer,
}

impl SsdpProber {
    pub fn new(config: DiscoveryConfig, observer: Observer) -> Self {
        let resolver = DescriptionFetcher::new(config.description_timeout(), &config.user_agent);
        Self {
            config,
            resolver,
            observer,
        }
    }

    pub fn probe(&self) -> DiscoveryReport {
        self.probe_with_callback(|_| {})
    }

    /// Probes the network, calling `on_device` for every new location as soon
    /// as it is parsed.
    pub fn probe_with_callback<F>(&self, mut on_device: F) -> DiscoveryReport
    where
        F: FnMut(&Device),
    {
        self.observer
            .in_scope(|| self.run(&HashSet::new(), &mut on_device))
    }

    fn run(&self, known: &HashSet<String>, on_device: &mut dyn FnMut(&Device)) -> DiscoveryReport {
        let socket = match open_socket() {
            Ok(socket) => socket,
            Err(err) => {
                warn!("Failed to create SSDP socket: {}", err);
                return DiscoveryReport::failed(DiscoveryError::bind(err));
            }
        };

        let target = match resolve_target(&self.config.ssdp_addr) {
            Ok(addr) => addr,
            Err(err) => {
                warn!("{}", err);
                return DiscoveryReport::failed(err);
            }
        };

        for (index, search_target) in self.config.search_targets.iter().enumerate() {
            let request = build_msearch(search_target, self.config.mx);
            match socket.send_to(request.as_bytes(), target) {
                Ok(_) => debug!(st = %search_target, "📤 M-SEARCH sent to {}", target),
                Err(err) if index == 0 => {
                    warn!("Failed to send M-SEARCH for {}: {}", search_target, err);
                    return DiscoveryReport::failed(DiscoveryError::send(err));
                }
                Err(err) => warn!("Failed to send M-SEARCH for {}: {}", search_target, err),
            }
        }

        self.collect(&socket, known, on_device)
    }

    fn collect(
        &self,
        socket: &UdpSocket,
        known: &HashSet<String>,
        on_device: &mut dyn FnMut(&Device),
    ) -> DiscoveryReport {
        let mut report = DiscoveryReport::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut buf = [0u8; RECV_BUFFER_SIZE];
        let mut datagrams = 0usize;
        let mut read_errors = 0usize;

        let ceiling = self.config.ssdp_ceiling();
        let read_timeout = self.config.ssdp_read_timeout();
        let started = Instant::now();

        loop {
            let elapsed = started.elapsed();
            if elapsed >= ceiling {
                debug!("SSDP ceiling of {:?} reached", ceiling);
                break;
            }
            let deadline = read_timeout.min(ceiling - elapsed);
            if let Err(err) = socket.set_read_timeout(Some(deadline)) {
                warn!("Failed to set SSDP read timeout: {}", err);
                break;
            }

            match socket.recv_from(&mut buf) {
                Ok((len, from)) => {
                    datagrams += 1;
                    let data = String::from_utf8_lossy(&buf[..len]);
                    trace!("📥 SSDP datagram from {}:\n{}", from, data);

                    let Some(response) = parse_search_response(&data) else {
                        continue;
                    };

                    if known.contains(&response.location) || !seen.insert(response.location.clone()) {
                        trace!("Duplicate SSDP response for {}", response.location);
                        continue;
                    }

                    let content_directory_url = self.resolver.content_directory_url(&response.location);
                    let device = response.into_device(content_directory_url);
                    info!(
                        location = %device.location(),
                        "✅ Found device {}",
                        device.name()
                    );

                    on_device(&device);
                    report.devices.push(device);
                }
                Err(err) if is_timeout(&err) => {
                    debug!("SSDP read timed out after {} datagrams", datagrams);
                    break;
                }
                Err(err) => {
                    read_errors += 1;
                    if read_errors == 1 {
                        warn!("SSDP read error: {}", err);
                    } else {
                        debug!("SSDP read error #{}: {}", read_errors, err);
                    }
                    thread::sleep(read_error_pause(ceiling.saturating_sub(started.elapsed())));
                }
            }
        }

        info!(
            "SSDP probe finished: {} device(s) from {} datagram(s)",
            report.devices.len(),
            datagrams
        );
        report
    }
}

impl DeviceSource for SsdpProber {
    fn name(&self) -> &str {
        "ssdp"
    }

    fn discover(&self, known: &HashSet<String>, on_device: &mut dyn FnMut(&Device)) -> DiscoveryReport {
        self.observer.in_scope(|| self.run(known, on_device))
    }
}

fn open_socket() -> io::Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;

    let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    socket.bind(&bind_addr.into())?;
    socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
    socket.set_multicast_loop_v4(true)?;

    Ok(socket.into())
}

fn resolve_target(addr: &str) -> Result<SocketAddr, DiscoveryError> {
    let mut candidates = addr
        .to_socket_addrs()
        .map_err(|err| DiscoveryError::MulticastAddress(format!("{}: {}", addr, err)))?;

    candidates
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| DiscoveryError::MulticastAddress(format!("{}: no IPv4 address", addr)))
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn read_error_pause(remaining: Duration) -> Duration {
    READ_ERROR_PAUSE.min(remaining)
}
