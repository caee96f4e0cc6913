use mockito::{Matcher, Server};
use pmobrowse::{BrowseConfig, BrowseError, ContentBrowser, Device, Observer, PathContainerCache};

const ROOT_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
<u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1">
<Result>&lt;DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"&gt;&lt;container id="64" parentID="0"&gt;&lt;dc:title&gt;Movies&lt;/dc:title&gt;&lt;/container&gt;&lt;container id="1" parentID="0"&gt;&lt;dc:title&gt;Music&lt;/dc:title&gt;&lt;/container&gt;&lt;/DIDL-Lite&gt;</Result>
<NumberReturned>2</NumberReturned><TotalMatches>2</TotalMatches><UpdateID>1</UpdateID>
</u:BrowseResponse></s:Body></s:Envelope>"#;

const MOVIES_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
<u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1">
<Result>&lt;DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"&gt;&lt;item id="64$0" parentID="64"&gt;&lt;dc:title&gt;Metropolis&lt;/dc:title&gt;&lt;res size="1024" protocolInfo="http-get:*:video/x-matroska:*"&gt;http://127.0.0.1/m.mkv&lt;/res&gt;&lt;/item&gt;&lt;/DIDL-Lite&gt;</Result>
</u:BrowseResponse></s:Body></s:Envelope>"#;

const FAULT_RESPONSE: &str = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"><SOAP-ENV:Body>
<SOAP-ENV:Fault><faultcode>SOAP-ENV:Client</faultcode><faultstring>UPnPError</faultstring>
<detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode></UPnPError></detail>
</SOAP-ENV:Fault></SOAP-ENV:Body></SOAP-ENV:Envelope>"#;

const FAULT_LIKE_TITLE_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
<u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1">
<Result>&lt;DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"&gt;&lt;container id="12" parentID="0"&gt;&lt;dc:title&gt;Tennis:Faults&lt;/dc:title&gt;&lt;/container&gt;&lt;/DIDL-Lite&gt;</Result>
</u:BrowseResponse></s:Body></s:Envelope>"#;

const ID_LESS_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
<u:BrowseResponse xmlns:u="urn:schemas-upnp-org:service:ContentDirectory:1">
<Result>&lt;DIDL-Lite xmlns:dc="http://purl.org/dc/elements/1.1/"&gt;&lt;container&gt;&lt;dc:title&gt;Movies&lt;/dc:title&gt;&lt;/container&gt;&lt;/DIDL-Lite&gt;</Result>
</u:BrowseResponse></s:Body></s:Envelope>"#;

fn device(server: &Server, with_content_directory: bool) -> Device {
    let control_url = with_content_directory.then(|| format!("{}/ctl/ContentDir", server.url()));
    Device::new(
        "Test Server".to_string(),
        "Test Server".to_string(),
        format!("{}/rootDesc.xml", server.url()),
        server.url(),
        "Linux UPnP/1.0 MiniDLNA/1.3.0".to_string(),
        "urn:schemas-upnp-org:device:MediaServer:1".to_string(),
        control_url,
    )
}

fn browser() -> ContentBrowser {
    ContentBrowser::new(BrowseConfig::default(), Observer::inherit())
}

#[test]
fn root_browse_records_containers_and_drives_next_level() {
    let mut server = Server::new();
    let root = server
        .mock("POST", "/ctl/ContentDir")
        .match_header(
            "soapaction",
            "urn:schemas-upnp-org:service:ContentDirectory:1#Browse",
        )
        .match_header("content-type", "text/xml; charset=utf-8")
        .match_body(Matcher::Regex("<ObjectID>0</ObjectID>".to_string()))
        .with_status(200)
        .with_body(ROOT_RESPONSE)
        .expect(2)
        .create();
    let movies = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(Matcher::Regex("<ObjectID>64</ObjectID>".to_string()))
        .with_status(200)
        .with_body(MOVIES_RESPONSE)
        .create();

    let device = device(&server, true);
    let browser = browser();
    let mut cache = PathContainerCache::new();

    let first = browser.browse(&device, &[], &mut cache).unwrap();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0].name, "Movies");
    assert!(first[0].is_container);
    assert_eq!(cache.get("Movies"), Some("64"));
    assert_eq!(cache.get("Music"), Some("1"));

    // Browsing the root again changes nothing
    let second = browser.browse(&device, &[], &mut cache).unwrap();
    assert_eq!(first, second);
    assert_eq!(cache.len(), 2);
    root.assert();

    let listing = browser
        .browse(&device, &["Movies".to_string()], &mut cache)
        .unwrap();
    movies.assert();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].name, "Metropolis");
    assert_eq!(listing[0].url.as_deref(), Some("http://127.0.0.1/m.mkv"));
    let metadata = listing[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.size, Some(1024));
    assert_eq!(metadata.format.as_deref(), Some("video/x-matroska"));
}

#[test]
fn soap_fault_falls_through_to_http() {
    let mut server = Server::new();
    let _soap = server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(FAULT_RESPONSE)
        .create();
    let plex = server
        .mock("GET", "/library/sections")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"MediaContainer":{"size":2,"Directory":[]}}"#)
        .create();

    let mut cache = PathContainerCache::new();
    let entries = browser().browse(&device(&server, true), &[], &mut cache).unwrap();

    plex.assert();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Plex Media Server");
    assert!(entries[0].is_container);
    assert!(cache.is_empty());
}

#[test]
fn fault_like_title_is_listed_over_soap() {
    let mut server = Server::new();
    let soap = server
        .mock("POST", "/ctl/ContentDir")
        .with_status(200)
        .with_body(FAULT_LIKE_TITLE_RESPONSE)
        .expect(1)
        .create();
    let fallback = server
        .mock("GET", Matcher::Any)
        .with_status(404)
        .expect(0)
        .create();

    let mut cache = PathContainerCache::new();
    let entries = browser().browse(&device(&server, true), &[], &mut cache).unwrap();

    soap.assert();
    fallback.assert();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "Tennis:Faults");
    assert_eq!(cache.get("Tennis:Faults"), Some("12"));
}

#[test]
fn container_without_id_is_browsed_by_path_key() {
    let mut server = Server::new();
    let root = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(Matcher::Regex("<ObjectID>0</ObjectID>".to_string()))
        .with_status(200)
        .with_body(ID_LESS_RESPONSE)
        .expect(1)
        .create();
    let movies = server
        .mock("POST", "/ctl/ContentDir")
        .match_body(Matcher::Regex("<ObjectID>Movies</ObjectID>".to_string()))
        .with_status(200)
        .with_body(MOVIES_RESPONSE)
        .expect(1)
        .create();

    let device = device(&server, true);
    let browser = browser();
    let mut cache = PathContainerCache::new();

    let first = browser.browse(&device, &[], &mut cache).unwrap();
    root.assert();
    assert_eq!(first.len(), 1);
    assert!(first[0].is_container);
    assert_eq!(cache.get("Movies"), Some("Movies"));

    let listing = browser
        .browse(&device, &["Movies".to_string()], &mut cache)
        .unwrap();
    movies.assert();
    assert_eq!(listing[0].name, "Metropolis");
}

#[test]
fn error_status_falls_through_to_directory_index() {
    let mut server = Server::new();
    let _soap = server
        .mock("POST", "/ctl/ContentDir")
        .with_status(500)
        .with_body("<s:Envelope><s:Body><s:Fault/></s:Body></s:Envelope>")
        .create();
    let _index = server
        .mock("GET", "/")
        .with_status(200)
        .with_body(r#"<html><body><a href="../">Parent Directory</a><a href="Movies/">Movies/</a><a href="clip%201.mp4">clip 1.mp4</a></body></html>"#)
        .create();

    let mut cache = PathContainerCache::new();
    let entries = browser().browse(&device(&server, true), &[], &mut cache).unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "Movies");
    assert!(entries[0].is_container);
    assert_eq!(entries[1].name, "clip 1.mp4");
    assert_eq!(
        entries[1].url.as_deref(),
        Some(format!("{}/clip%201.mp4", server.url()).as_str())
    );
}

#[test]
fn nested_http_path_is_fetched_directly() {
    let mut server = Server::new();
    let nested = server
        .mock("GET", Matcher::Regex(r"^/Movies/Sci(%20| )Fi$".to_string()))
        .with_status(200)
        .with_body(r#"<ul><li><a href="Alien.mkv">Alien.mkv</a></li></ul>"#)
        .create();

    let path = vec!["Movies".to_string(), "Sci Fi".to_string()];
    let mut cache = PathContainerCache::new();
    let entries = browser()
        .browse(&device(&server, false), &path, &mut cache)
        .unwrap();

    nested.assert();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].url.as_deref(),
        Some(format!("{}/Movies/Sci%20Fi/Alien.mkv", server.url()).as_str())
    );
}

#[test]
fn nothing_browsable_reports_base_url() {
    let server = Server::new();
    let device = device(&server, false);
    let mut cache = PathContainerCache::new();

    let err = browser().browse(&device, &[], &mut cache).unwrap_err();
    match err {
        BrowseError::NoBrowsableContent(base) => assert_eq!(base, server.url()),
        other => panic!("unexpected error: {other}"),
    }
}
