//! # Content browsing
//!
//! Listing a device goes through two strategies:
//!
//! 1. a ContentDirectory `Browse` SOAP call when the device advertised a
//!    control URL; the container id comes from the [`PathContainerCache`],
//! 2. heuristic HTTP browsing of the device base URL.
//!
//! Failures of the first strategy are logged and the second one is tried.
//! Only exhaustion of both is reported as [`BrowseError::NoBrowsableContent`].

mod http_fallback;

pub use http_fallback::{ROOT_ENDPOINTS, endpoints, parse_html_listing, parse_json_listing};

use tracing::{debug, info, warn};
use ureq::Agent;

use crate::cache::PathContainerCache;
use crate::config::BrowseConfig;
use crate::didl;
use crate::errors::BrowseError;
use crate::http;
use crate::model::{Device, DirectoryEntry};
use crate::observer::Observer;
use crate::soap;

pub struct ContentBrowser {
    config: BrowseConfig,
    soap_agent: Agent,
    http_agent: Agent,
    observer: Observer,
}

impl Default for ContentBrowser {
    fn default() -> Self {
        Self::new(BrowseConfig::default(), Observer::inherit())
    }
}

impl ContentBrowser {
    pub fn new(config: BrowseConfig, observer: Observer) -> Self {
        Self {
            soap_agent: http::agent(config.soap_timeout()),
            http_agent: http::agent(config.http_timeout()),
            config,
            observer,
        }
    }

    /// Lists the entries of `device` at `path` (empty for the root).
    ///
    /// Containers returned by a ContentDirectory are recorded in `cache` so
    /// that browsing into them later targets the right object id.
    pub fn browse(
        &self,
        device: &Device,
        path: &[String],
        cache: &mut PathContainerCache,
    ) -> Result<Vec<DirectoryEntry>, BrowseError> {
        self.observer.in_scope(|| {
            if let Some(control_url) = device.content_directory_url() {
                match self.browse_content_directory(control_url, path, cache) {
                    Ok(entries) => return Ok(entries),
                    Err(err) => warn!(
                        "ContentDirectory browse of {} failed, trying HTTP: {}",
                        device.name(),
                        err
                    ),
                }
            }

            http_fallback::browse(
                &self.http_agent,
                &self.config.user_agent,
                device.base_url(),
                path,
            )
        })
    }

    /// One `Browse` call against a ContentDirectory control URL.
    pub fn browse_content_directory(
        &self,
        control_url: &str,
        path: &[String],
        cache: &mut PathContainerCache,
    ) -> Result<Vec<DirectoryEntry>, BrowseError> {
        let object_id = cache.container_id(path);
        debug!(object_id = %object_id, "Browse {} at /{}", control_url, path.join("/"));

        let request = soap::build_browse_request(&object_id, self.config.requested_count)?;
        let response = http::post_xml(
            &self.soap_agent,
            control_url,
            soap::BROWSE_SOAP_ACTION,
            &self.config.user_agent,
            request,
        )?;

        if !response.is_ok() {
            return Err(BrowseError::Status(response.status));
        }
        if soap::contains_fault(&response.body) {
            return Err(BrowseError::SoapFault);
        }

        let entries = didl::parse_browse_response(&response.body)?;

        for container in entries.iter().filter(|entry| entry.is_container) {
            let id = match &container.object_id {
                Some(id) => id.clone(),
                None => child_key(path, &container.name),
            };
            cache.record(path, &container.name, &id);
        }

        info!(
            "📂 {} entries in container {} of {}",
            entries.len(),
            object_id,
            control_url
        );
        Ok(entries)
    }
}

/// Browses with the default configuration, logging through the caller's
/// subscriber.
pub fn browse(
    device: &Device,
    path: &[String],
    cache: &mut PathContainerCache,
) -> Result<Vec<DirectoryEntry>, BrowseError> {
    ContentBrowser::default().browse(device, path, cache)
}

fn child_key(path: &[String], name: &str) -> String {
    let mut segments = path.to_vec();
    segments.push(name.to_string());
    PathContainerCache::key_for(&segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_key_joins_path_and_name() {
        assert_eq!(child_key(&[], "Movies"), "Movies");
        assert_eq!(
            child_key(&["Movies".to_string(), "Action".to_string()], "1990s"),
            "Movies/Action/1990s"
        );
    }

    #[test]
    fn unreachable_device_is_exhausted() {
        let device = Device::new(
            "Gone".to_string(),
            "Gone".to_string(),
            "http://127.0.0.1:9/desc.xml".to_string(),
            "http://127.0.0.1:9".to_string(),
            String::new(),
            String::new(),
            Some("http://127.0.0.1:9/ctl".to_string()),
        );
        let mut cache = PathContainerCache::new();
        let err = ContentBrowser::default()
            .browse(&device, &[], &mut cache)
            .unwrap_err();
        assert!(matches!(err, BrowseError::NoBrowsableContent(url) if url == "http://127.0.0.1:9"));
        assert!(cache.is_empty());
    }
}
