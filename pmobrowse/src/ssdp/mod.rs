//! # SSDP - Simple Service Discovery Protocol
//!
//! Control-point side of SSDP: M-SEARCH requests go out to the multicast group,
//! unicast `HTTP/1.1 200 OK` answers come back to an ephemeral port and are
//! turned into [`Device`] records.
//!
//! - [`SsdpProber`] : socket handling, response collection and deduplication
//! - [`parse_search_response`] : datagram → [`SearchResponse`]
//! - [`friendly_name`] : best-effort naming from SERVER / USN / ST

mod naming;
mod prober;

pub use naming::friendly_name;
pub use prober::SsdpProber;

use std::collections::HashMap;

use tracing::trace;
use url::Url;

use crate::model::Device;

/// SSDP multicast address.
pub const SSDP_MULTICAST_ADDR: &str = "239.255.255.250";

pub const SSDP_PORT: u16 = 1900;

pub const ST_ROOT_DEVICE: &str = "upnp:rootdevice";

pub const ST_MEDIA_SERVER: &str = "urn:schemas-upnp-org:device:MediaServer:1";

/// Only responses starting with this status line are considered.
const SEARCH_RESPONSE_STATUS: &str = "HTTP/1.1 200 OK";

/// Builds an M-SEARCH request for `target`.
pub fn build_msearch(target: &str, mx: u32) -> String {
    format!(
        "M-SEARCH * HTTP/1.1\r\n\
         HOST: {}:{}\r\n\
         MAN: \"ssdp:discover\"\r\n\
         ST: {}\r\n\
         MX: {}\r\n\
         \r\n",
        SSDP_MULTICAST_ADDR, SSDP_PORT, target, mx
    )
}

/// Headers of an M-SEARCH answer that carried a `LOCATION`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResponse {
    pub location: String,
    pub server: Option<String>,
    pub st: Option<String>,
    pub usn: Option<String>,
}

impl SearchResponse {
    /// Builds the device record for this response.
    pub fn into_device(self, content_directory_url: Option<String>) -> Device {
        let server = self.server.unwrap_or_default();
        let usn = self.usn.unwrap_or_default();
        let st = self.st.unwrap_or_default();

        let friendly = friendly_name(&server, &usn, &st);
        let name = if server.is_empty() {
            friendly.clone()
        } else {
            format!("{} ({})", friendly, server)
        };
        let base = base_url(&self.location);

        Device::new(
            name,
            friendly,
            self.location,
            base,
            server,
            st,
            content_directory_url,
        )
    }
}

/// Parses one datagram. Anything that is not a `200 OK` search response with a
/// `LOCATION` header yields `None`.
pub fn parse_search_response(data: &str) -> Option<SearchResponse> {
    if !data.starts_with(SEARCH_RESPONSE_STATUS) {
        trace!("Ignoring SSDP datagram: not a search response");
        return None;
    }

    let headers = parse_headers(data.lines().skip(1));

    let location = match headers.get("location") {
        Some(loc) => loc.clone(),
        None => {
            trace!("M-SEARCH response missing LOCATION header, ignoring");
            return None;
        }
    };

    Some(SearchResponse {
        location,
        server: headers.get("server").cloned(),
        st: headers.get("st").cloned(),
        usn: headers.get("usn").cloned(),
    })
}

fn parse_headers<'a, I>(lines: I) -> HashMap<String, String>
where
    I: Iterator<Item = &'a str>,
{
    let mut headers = HashMap::new();
    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Split on first ':' only (values may contain ':')
        let Some((name, value)) = line.split_once(':') else {
            trace!("Skipping line without colon: '{}'", line);
            continue;
        };

        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if !name.is_empty() && !value.is_empty() {
            headers.insert(name, value.to_string());
        }
    }
    headers
}

/// `scheme://host:port` of `location`, with the scheme's default port made
/// explicit. Unparseable locations are returned unchanged.
pub fn base_url(location: &str) -> String {
    let Ok(url) = Url::parse(location) else {
        return location.to_string();
    };
    let (Some(host), Some(port)) = (url.host_str(), url.port_or_known_default()) else {
        return location.to_string();
    };

    // IPv6 literals keep their brackets through host_str()
    format!("{}://{}:{}", url.scheme(), host, port)
}
