use crate::model::{Device, DiscoveryEvent};

/// Status left after a run that found nothing.
pub const NO_DEVICES_FOUND: &str = "No UPnP devices found";

/// Consumer-side view of discovery: the devices accumulated over every run,
/// deduplicated by location, plus the errors of the current run.
#[derive(Clone, Debug, Default)]
pub struct DeviceList {
    devices: Vec<Device>,
    errors: Vec<String>,
    last_error: Option<String>,
    discovering: bool,
}

impl DeviceList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the list. Returns `true` when a device was added.
    pub fn apply(&mut self, event: &DiscoveryEvent) -> bool {
        match event {
            DiscoveryEvent::Started => {
                self.discovering = true;
                self.errors.clear();
                false
            }
            DiscoveryEvent::DeviceFound(device) => {
                if self.contains(device.location()) {
                    return false;
                }
                self.devices.push(device.clone());
                true
            }
            DiscoveryEvent::Error(message) => {
                self.errors.push(message.clone());
                self.last_error = Some(message.clone());
                false
            }
            DiscoveryEvent::Completed => {
                self.discovering = false;
                self.last_error = self
                    .devices
                    .is_empty()
                    .then(|| NO_DEVICES_FOUND.to_string());
                false
            }
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn get(&self, location: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.location() == location)
    }

    pub fn contains(&self, location: &str) -> bool {
        self.get(location).is_some()
    }

    /// Errors relayed since the last `Started`.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_discovering(&self) -> bool {
        self.discovering
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}
