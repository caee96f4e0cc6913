//! # pmobrowse
//!
//! Discovery of media servers on the local network and browsing of their
//! content.
//!
//! - [`SsdpProber`] finds UPnP devices with SSDP M-SEARCH requests and
//!   resolves their ContentDirectory control URL.
//! - [`PortScanner`] probes well-known Plex / Jellyfin / Emby ports on the
//!   local /24 for servers that stay silent on SSDP.
//! - [`DiscoveryOrchestrator`] chains both on a background thread and relays
//!   [`DiscoveryEvent`]s through a bounded crossbeam channel.
//! - [`ContentBrowser`] lists a device through ContentDirectory `Browse`,
//!   falling back to heuristic HTTP browsing.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pmobrowse::{DeviceList, DiscoveryConfig, DiscoveryOrchestrator, Observer};
//!
//! let orchestrator = Arc::new(DiscoveryOrchestrator::new(
//!     DiscoveryConfig::default().with_env_overrides(),
//!     Observer::inherit(),
//! ));
//! let events = orchestrator.spawn()?;
//!
//! let mut devices = DeviceList::new();
//! for event in events {
//!     devices.apply(&event);
//! }
//! # Ok::<(), std::io::Error>(())
//! ```

mod http;

pub mod browser;
pub mod cache;
pub mod config;
pub mod description;
pub mod device_list;
pub mod didl;
pub mod errors;
pub mod model;
pub mod observer;
pub mod orchestrator;
pub mod scanner;
pub mod soap;
pub mod ssdp;

pub use browser::{ContentBrowser, browse};
pub use cache::{PathContainerCache, ROOT_CONTAINER_ID};
pub use config::{BrowseConfig, DiscoveryConfig};
pub use description::{DescriptionFetcher, DeviceDescription};
pub use device_list::DeviceList;
pub use errors::{BrowseError, DescriptionError, DiscoveryError};
pub use model::{Device, DirectoryEntry, DiscoveryEvent, DiscoveryReport, EntryMetadata};
pub use observer::Observer;
pub use orchestrator::{DeviceSource, DiscoveryOrchestrator};
pub use scanner::PortScanner;
pub use ssdp::SsdpProber;
