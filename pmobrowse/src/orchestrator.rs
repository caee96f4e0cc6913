//! # Discovery orchestration
//!
//! A run asks each [`DeviceSource`] in turn (SSDP first, then the port scan)
//! and relays what they find through one bounded channel:
//!
//! ```text
//! Started → DeviceFound* → Error* → Completed
//! ```
//!
//! A device is relayed the moment its source reports it, never twice for the
//! same location within a run. Sends block when the channel is full, so
//! events are never dropped. A consumer that hangs up only stops the relay;
//! the run itself still completes and returns its [`DiscoveryReport`].

use std::collections::HashSet;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, bounded, tick};
use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use crate::model::{Device, DiscoveryEvent, DiscoveryReport};
use crate::observer::Observer;
use crate::scanner::PortScanner;
use crate::ssdp::SsdpProber;

/// A discovery stage.
///
/// `discover` reports every new device through `on_device` as soon as it is
/// found and skips locations already in `known`.
pub trait DeviceSource: Send + Sync {
    fn name(&self) -> &str;

    fn discover(
        &self,
        known: &HashSet<String>,
        on_device: &mut dyn FnMut(&Device),
    ) -> DiscoveryReport;
}

pub struct DiscoveryOrchestrator {
    sources: Vec<Box<dyn DeviceSource>>,
    observer: Observer,
    event_capacity: usize,
    refresh_interval: Duration,
}

impl DiscoveryOrchestrator {
    /// SSDP probing followed by the port scan.
    pub fn new(config: DiscoveryConfig, observer: Observer) -> Self {
        let sources: Vec<Box<dyn DeviceSource>> = vec![
            Box::new(SsdpProber::new(config.clone(), observer.clone())),
            Box::new(PortScanner::new(config.clone(), observer.clone())),
        ];
        Self {
            sources,
            observer,
            event_capacity: config.event_capacity.max(1),
            refresh_interval: config.refresh_interval(),
        }
    }

    pub fn with_sources(sources: Vec<Box<dyn DeviceSource>>, observer: Observer) -> Self {
        let defaults = DiscoveryConfig::default();
        Self {
            sources,
            observer,
            event_capacity: defaults.event_capacity,
            refresh_interval: defaults.refresh_interval(),
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Bounded event channel sized for this orchestrator.
    pub fn channel(&self) -> (Sender<DiscoveryEvent>, Receiver<DiscoveryEvent>) {
        bounded(self.event_capacity)
    }

    /// Runs one discovery on the calling thread.
    pub fn run(&self, sink: &Sender<DiscoveryEvent>) -> DiscoveryReport {
        self.observer.in_scope(|| {
            let started = Instant::now();
            let mut relay = Relay::new(sink);
            relay.send(DiscoveryEvent::Started);
            info!("🔍 Discovery started");

            let mut report = DiscoveryReport::new();
            let mut known: HashSet<String> = HashSet::new();

            for source in &self.sources {
                debug!("Running {} discovery", source.name());

                let mut found: Vec<String> = Vec::new();
                let stage = source.discover(&known, &mut |device: &Device| {
                    let location = device.location();
                    if known.contains(location) || found.iter().any(|l| l == location) {
                        debug!("Already reported {}, skipping", location);
                        return;
                    }
                    found.push(location.to_string());
                    relay.send(DiscoveryEvent::DeviceFound(device.clone()));
                });

                debug!(
                    "{} discovery: {} device(s), {} error(s)",
                    source.name(),
                    stage.devices.len(),
                    stage.errors.len()
                );
                known.extend(found);
                report.merge(stage);
            }

            for message in report.error_messages() {
                relay.send(DiscoveryEvent::Error(message));
            }
            relay.send(DiscoveryEvent::Completed);

            info!(
                "✅ Discovery completed in {:?}: {} device(s), {} error(s)",
                started.elapsed(),
                report.devices.len(),
                report.errors.len()
            );
            report
        })
    }

    /// Runs one discovery on a dedicated thread, relaying events to `sink`.
    pub fn start(
        self: &Arc<Self>,
        sink: Sender<DiscoveryEvent>,
    ) -> io::Result<JoinHandle<DiscoveryReport>> {
        let orchestrator = Arc::clone(self);
        thread::Builder::new()
            .name("pmobrowse-discovery".into())
            .spawn(move || orchestrator.run(&sink))
    }

    /// Starts a detached run and hands back the receiving end of its channel.
    pub fn spawn(self: &Arc<Self>) -> io::Result<Receiver<DiscoveryEvent>> {
        let (tx, rx) = self.channel();
        self.start(tx)?;
        Ok(rx)
    }

    /// Ticks every refresh interval; each tick is a cue to start a new run.
    pub fn refresh_ticker(&self) -> Receiver<Instant> {
        tick(self.refresh_interval)
    }
}

/// Blocking sender that goes quiet once the receiver is gone.
struct Relay<'a> {
    sink: &'a Sender<DiscoveryEvent>,
    connected: bool,
}

impl<'a> Relay<'a> {
    fn new(sink: &'a Sender<DiscoveryEvent>) -> Self {
        Self {
            sink,
            connected: true,
        }
    }

    fn send(&mut self, event: DiscoveryEvent) {
        if !self.connected {
            return;
        }
        if self.sink.send(event).is_err() {
            debug!("Discovery event receiver dropped, no more events relayed");
            self.connected = false;
        }
    }
}
