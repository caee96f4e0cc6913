use serde::{Deserialize, Serialize};

use crate::errors::DiscoveryError;

/// A media-serving device found on the local network.
///
/// Built only by the SSDP prober and the port scanner, never mutated afterwards.
/// Two devices are the same device iff their `location` strings are equal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    name: String,
    friendly_name: String,
    location: String,
    base_url: String,
    server_header: String,
    search_target: String,
    content_directory_url: Option<String>,
}

impl Device {
    pub fn new(
        name: String,
        friendly_name: String,
        location: String,
        base_url: String,
        server_header: String,
        search_target: String,
        content_directory_url: Option<String>,
    ) -> Self {
        Self {
            name,
            friendly_name,
            location,
            base_url,
            server_header,
            search_target,
            content_directory_url: content_directory_url.filter(|url| !url.trim().is_empty()),
        }
    }

    /// Display name, e.g. `"Sonos Speaker (Linux/3.14 UPnP/1.0 Sonos/1.0)"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Device description URL; the identity key of the device.
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn server_header(&self) -> &str {
        &self.server_header
    }

    pub fn search_target(&self) -> &str {
        &self.search_target
    }

    pub fn content_directory_url(&self) -> Option<&str> {
        self.content_directory_url.as_deref()
    }

    pub fn is_same_device(&self, other: &Device) -> bool {
        self.location == other.location
    }
}

/// Optional facts about a playable entry, all of them possibly unknown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub size: Option<u64>,
    pub duration: Option<String>,
    pub format: Option<String>,
}

impl EntryMetadata {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.duration.is_none() && self.format.is_none()
    }
}

/// One line of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_container: bool,
    pub url: Option<String>,
    pub metadata: Option<EntryMetadata>,
    /// DIDL-Lite object id, when the entry came from a ContentDirectory.
    pub object_id: Option<String>,
}

impl DirectoryEntry {
    pub fn container(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_container: true,
            url: None,
            metadata: None,
            object_id: None,
        }
    }

    pub fn file(name: impl Into<String>, url: Option<String>) -> Self {
        Self {
            name: name.into(),
            is_container: false,
            url,
            metadata: None,
            object_id: None,
        }
    }
}

/// Events relayed from a discovery run to the consumer, in emission order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiscoveryEvent {
    Started,
    DeviceFound(Device),
    Error(String),
    Completed,
}

/// Devices and soft errors gathered by one discovery stage or one whole run.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    pub devices: Vec<Device>,
    pub errors: Vec<DiscoveryError>,
}

impl DiscoveryReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failed(error: DiscoveryError) -> Self {
        Self {
            devices: Vec::new(),
            errors: vec![error],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Appends `other`, skipping devices whose location is already present.
    pub fn merge(&mut self, other: DiscoveryReport) {
        for device in other.devices {
            if !self.devices.iter().any(|d| d.is_same_device(&device)) {
                self.devices.push(device);
            }
        }
        self.errors.extend(other.errors);
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }
}
