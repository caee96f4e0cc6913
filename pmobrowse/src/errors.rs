use std::io::{self, ErrorKind};

use thiserror::Error;

/// Soft failures collected during a discovery run.
///
/// None of these abort a run: they are gathered into a [`crate::DiscoveryReport`]
/// and relayed to the consumer as `DiscoveryEvent::Error`.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("Failed to create UDP socket: {0}")]
    Bind(#[source] io::Error),
    #[error("Failed to resolve multicast address: {0}")]
    MulticastAddress(String),
    #[error("Failed to send M-SEARCH: {0}")]
    Send(#[source] io::Error),
    #[error("Failed to get local network: {0}")]
    LocalNetwork(String),
    #[error("Local network permission denied: {0}")]
    PermissionDenied(#[source] io::Error),
}

impl DiscoveryError {
    /// Socket creation failure, or a denied local network permission.
    pub fn bind(err: io::Error) -> Self {
        match err.kind() {
            ErrorKind::PermissionDenied => DiscoveryError::PermissionDenied(err),
            _ => DiscoveryError::Bind(err),
        }
    }

    /// M-SEARCH send failure, or a denied local network permission.
    pub fn send(err: io::Error) -> Self {
        match err.kind() {
            ErrorKind::PermissionDenied => DiscoveryError::PermissionDenied(err),
            _ => DiscoveryError::Send(err),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, DiscoveryError::PermissionDenied(_))
    }
}

#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    #[error("Description request returned HTTP status {0}")]
    Status(u16),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Browse failures.
///
/// Every variant but [`BrowseError::NoBrowsableContent`] describes why a single
/// browsing strategy gave up; the browser logs those and moves on to the next
/// strategy, so callers of `browse` only ever observe exhaustion.
#[derive(Error, Debug)]
pub enum BrowseError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] ureq::Error),
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("UPnP SOAP fault in response")]
    SoapFault,
    #[error("Failed to build SOAP request: {0}")]
    SoapRequest(#[from] xmltree::Error),
    #[error("Failed to parse DIDL-Lite payload: {0}")]
    Didl(#[from] quick_xml::Error),
    #[error("Endpoint returned no entries")]
    NoEntries,
    #[error("no browsable content found at {0}")]
    NoBrowsableContent(String),
}

impl BrowseError {
    pub fn no_browsable_content(base_url: &str) -> Self {
        BrowseError::NoBrowsableContent(base_url.to_string())
    }
}
