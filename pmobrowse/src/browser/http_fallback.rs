//! Heuristic browsing for servers without a usable ContentDirectory.
//!
//! Known media server endpoints are tried in order. JSON answers are sniffed
//! for the Plex and Jellyfin/Emby root objects; anything else is read as an
//! HTML directory index and its anchors become entries.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, trace};
use ureq::Agent;
use url::Url;

use crate::errors::BrowseError;
use crate::http;
use crate::model::DirectoryEntry;

/// Endpoints tried at the root of a server.
pub const ROOT_ENDPOINTS: &[&str] = &["/library/sections", "/Users", "/Items", "/"];

static ANCHOR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?href\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a>"#).ok()
});

/// Browses `base_url` at `path`; the first endpoint that yields entries wins.
pub(crate) fn browse(
    agent: &Agent,
    user_agent: &str,
    base_url: &str,
    path: &[String],
) -> Result<Vec<DirectoryEntry>, BrowseError> {
    let base = base_url.trim_end_matches('/');

    for endpoint in endpoints(path) {
        let url = format!("{}{}", base, endpoint);
        match browse_endpoint(agent, user_agent, &url) {
            Ok(entries) => {
                debug!("HTTP browse of {} returned {} entries", url, entries.len());
                return Ok(entries);
            }
            Err(err) => trace!("HTTP browse of {} failed: {}", url, err),
        }
    }

    Err(BrowseError::no_browsable_content(base_url))
}

/// Endpoints to try for `path`.
pub fn endpoints(path: &[String]) -> Vec<String> {
    if path.is_empty() {
        return ROOT_ENDPOINTS.iter().map(|e| e.to_string()).collect();
    }

    let segments: Vec<String> = path
        .iter()
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    vec![format!("/{}", segments.join("/"))]
}

fn browse_endpoint(
    agent: &Agent,
    user_agent: &str,
    url: &str,
) -> Result<Vec<DirectoryEntry>, BrowseError> {
    let response = http::get_text(agent, url, user_agent)?;
    if !response.is_ok() {
        return Err(BrowseError::Status(response.status));
    }

    let mut entries = parse_json_listing(&response.body);
    if entries.is_empty() {
        entries = parse_html_listing(&response.body, url);
    }

    if entries.is_empty() {
        Err(BrowseError::NoEntries)
    } else {
        Ok(entries)
    }
}

/// Recognizes the root objects of Plex and Jellyfin/Emby JSON APIs.
pub fn parse_json_listing(body: &str) -> Vec<DirectoryEntry> {
    if body.contains("\"MediaContainer\"") {
        vec![DirectoryEntry::container("Plex Media Server")]
    } else if body.contains("\"Items\"") {
        vec![DirectoryEntry::container("Media Library")]
    } else {
        Vec::new()
    }
}

/// Reads an HTML directory index. Links ending with `/` are containers,
/// other links are files whose URL is resolved against `page_url`.
pub fn parse_html_listing(body: &str, page_url: &str) -> Vec<DirectoryEntry> {
    let Some(anchor) = ANCHOR.as_ref() else {
        return Vec::new();
    };

    // Relative links of a directory index are relative to the directory itself
    let base = if page_url.ends_with('/') {
        Url::parse(page_url)
    } else {
        Url::parse(&format!("{}/", page_url))
    }
    .ok();

    let mut entries = Vec::new();
    for caps in anchor.captures_iter(body) {
        let href = caps[1].trim().replace("&amp;", "&");
        let text = &caps[2];

        if text.contains("Parent Directory") || is_navigation(&href) {
            continue;
        }

        let Some(name) = entry_name(&href) else {
            continue;
        };

        if href.ends_with('/') {
            entries.push(DirectoryEntry::container(name));
        } else {
            let url = match &base {
                Some(base) => base
                    .join(&href)
                    .map(|u| u.to_string())
                    .unwrap_or_else(|_| href.clone()),
                None => href.clone(),
            };
            entries.push(DirectoryEntry::file(name, Some(url)));
        }
    }
    entries
}

fn is_navigation(href: &str) -> bool {
    href.is_empty()
        || href.starts_with('?')
        || href.starts_with('#')
        || href == ".."
        || href == "../"
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
}

/// Last path segment of `href`, URL-decoded.
fn entry_name(href: &str) -> Option<String> {
    let segment = href.trim_end_matches('/').rsplit('/').next()?.trim();
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }

    let name = urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(name)
}
