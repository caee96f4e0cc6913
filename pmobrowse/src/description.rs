//! Device description documents (`LOCATION` of an SSDP answer).

use std::time::Duration;

use quick_xml::{Reader, events::Event};
use tracing::debug;
use ureq::Agent;
use url::Url;

use crate::errors::DescriptionError;
use crate::http;

const CONTENT_DIRECTORY_MARKER: &str = "ContentDirectory";

/// The parts of a device description the browser cares about.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceDescription {
    pub udn: Option<String>,
    pub device_type: Option<String>,
    pub friendly_name: Option<String>,
    pub manufacturer: Option<String>,
    pub model_name: Option<String>,
    pub url_base: Option<String>,
    pub content_directory_service_type: Option<String>,
    /// Absolute ContentDirectory control URL.
    pub content_directory_url: Option<String>,
}

/// Fetches and parses description documents over HTTP.
#[derive(Clone)]
pub struct DescriptionFetcher {
    agent: Agent,
    user_agent: String,
}

impl DescriptionFetcher {
    pub fn new(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            agent: http::agent(timeout),
            user_agent: user_agent.into(),
        }
    }

    pub fn fetch(&self, location: &str) -> Result<DeviceDescription, DescriptionError> {
        debug!("Fetching description at {}", location);

        let response = http::get_text(&self.agent, location, &self.user_agent)?;
        if !response.is_ok() {
            return Err(DescriptionError::Status(response.status));
        }

        parse_description(&response.body, location)
    }

    /// ContentDirectory control URL of the device at `location`, if any.
    /// Failures are logged and reported as `None`.
    pub fn content_directory_url(&self, location: &str) -> Option<String> {
        match self.fetch(location) {
            Ok(description) => {
                if description.content_directory_url.is_none() {
                    debug!("No ContentDirectory service advertised at {}", location);
                }
                description.content_directory_url
            }
            Err(err) => {
                debug!("Description lookup failed for {}: {}", location, err);
                None
            }
        }
    }
}

/// Parses a description document. Relative control URLs are resolved against
/// `<URLBase>` when present, otherwise against `location`.
pub fn parse_description(xml: &str, location: &str) -> Result<DeviceDescription, DescriptionError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parsed = DeviceDescription::default();
    let mut in_service = false;
    let mut current_tag: Option<String> = None;
    let mut current_service_type: Option<String> = None;
    let mut current_control_url: Option<String> = None;
    let mut raw_control_url: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name == "service" {
                    in_service = true;
                    current_service_type = None;
                    current_control_url = None;
                    current_tag = None;
                } else {
                    current_tag = Some(name);
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"service" && in_service {
                    if raw_control_url.is_none() {
                        if let (Some(st), Some(ctrl)) = (&current_service_type, &current_control_url)
                        {
                            if st.contains(CONTENT_DIRECTORY_MARKER) {
                                debug!("Found ContentDirectory service: type={} controlURL={}", st, ctrl);
                                parsed.content_directory_service_type = Some(st.clone());
                                raw_control_url = Some(ctrl.clone());
                            }
                        }
                    }
                    in_service = false;
                }
                current_tag = None;
            }
            Event::Text(e) => {
                let Some(tag) = current_tag.as_deref() else {
                    continue;
                };
                let text = e.unescape()?.trim().to_string();
                if text.is_empty() {
                    continue;
                }

                // The root device comes first; embedded devices never override it.
                match tag {
                    "URLBase" => set_once(&mut parsed.url_base, text),
                    "UDN" => set_once(&mut parsed.udn, text),
                    "deviceType" => set_once(&mut parsed.device_type, text),
                    "friendlyName" => set_once(&mut parsed.friendly_name, text),
                    "manufacturer" => set_once(&mut parsed.manufacturer, text),
                    "modelName" => set_once(&mut parsed.model_name, text),
                    "serviceType" if in_service => current_service_type = Some(text),
                    "controlURL" if in_service => current_control_url = Some(text),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(ctrl) = raw_control_url {
        let base = parsed.url_base.as_deref().unwrap_or(location);
        parsed.content_directory_url = Some(resolve_url(base, &ctrl)?);
    }

    Ok(parsed)
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = Some(value);
    }
}

/// Resolves `url` against `base`; absolute URLs are returned as is.
pub(crate) fn resolve_url(base: &str, url: &str) -> Result<String, url::ParseError> {
    let url = url.trim();
    if let Ok(absolute) = Url::parse(url) {
        return Ok(absolute.to_string());
    }
    Ok(Url::parse(base)?.join(url)?.to_string())
}
