use super::{ST_MEDIA_SERVER, ST_ROOT_DEVICE};

/// SERVER header fragments (lower case) and the name they stand for.
/// First match wins.
const VENDORS: &[(&str, &str)] = &[
    ("plex", "Plex Media Server"),
    ("platinum", "Plex Media Server"),
    ("jellyfin", "Jellyfin Server"),
    ("emby", "Emby Server"),
    ("sonos", "Sonos Speaker"),
    ("chromecast", "Chromecast"),
    ("hue", "Philips Hue Bridge"),
    ("hp-ilo", "HP iLO Server"),
];

const UUID_PREFIX_LEN: usize = 8;

/// Best-effort display name for an SSDP answer.
///
/// Tries the vendor table against `server`, then the USN (Sonos `RINCON_`
/// identifiers, then a short UUID), then the search target.
pub fn friendly_name(server: &str, usn: &str, search_target: &str) -> String {
    let server_lower = server.to_ascii_lowercase();
    if let Some((_, name)) = VENDORS
        .iter()
        .find(|(fragment, _)| server_lower.contains(fragment))
    {
        return (*name).to_string();
    }

    if usn.contains("RINCON_") {
        return "Sonos Speaker".to_string();
    }

    if let Some(uuid) = uuid_from_usn(usn) {
        let short: String = uuid.chars().take(UUID_PREFIX_LEN).collect();
        return format!("Device {}", short);
    }

    match search_target {
        ST_MEDIA_SERVER => "Media Server".to_string(),
        ST_ROOT_DEVICE => "UPnP Device".to_string(),
        "urn:schemas-upnp-org:device:basic:1" => "Basic Device".to_string(),
        "" => "Unknown Device".to_string(),
        other => other.to_string(),
    }
}

fn uuid_from_usn(usn: &str) -> Option<&str> {
    let start = usn.find("uuid:")? + "uuid:".len();
    let rest = &usn[start..];
    let uuid = match rest.find("::") {
        Some(end) => &rest[..end],
        None => rest,
    };
    let uuid = uuid.trim();
    if uuid.is_empty() { None } else { Some(uuid) }
}
