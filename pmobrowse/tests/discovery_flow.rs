use std::net::UdpSocket;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use mockito::Server;
use pmobrowse::{
    DeviceList, DiscoveryConfig, DiscoveryEvent, DiscoveryOrchestrator, Observer, SsdpProber,
};

const DESCRIPTION: &str = r#"<?xml version="1.0"?>
<root xmlns="urn:schemas-upnp-org:device-1-0">
  <device>
    <deviceType>urn:schemas-upnp-org:device:MediaServer:1</deviceType>
    <friendlyName>Living room NAS</friendlyName>
    <serviceList>
      <service>
        <serviceType>urn:schemas-upnp-org:service:ContentDirectory:1</serviceType>
        <controlURL>/ctl/ContentDir</controlURL>
      </service>
    </serviceList>
  </device>
</root>"#;

/// Loopback stand-in for SSDP responders: answers the first M-SEARCH it
/// receives with every datagram of `answers`.
fn responder(answers: Vec<String>) -> (String, JoinHandle<String>) {
    let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
    socket.set_read_timeout(Some(Duration::from_secs(3))).unwrap();
    let addr = socket.local_addr().unwrap().to_string();

    let handle = thread::spawn(move || {
        let mut buf = [0u8; 2048];
        let (len, client) = socket.recv_from(&mut buf).unwrap();
        for answer in &answers {
            socket.send_to(answer.as_bytes(), client).unwrap();
        }
        String::from_utf8_lossy(&buf[..len]).into_owned()
    });

    (addr, handle)
}

fn search_response(location: &str, server: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nCACHE-CONTROL: max-age=1800\r\nLOCATION: {}\r\nSERVER: {}\r\nST: urn:schemas-upnp-org:device:MediaServer:1\r\nUSN: uuid:4d696e69-444c-164e-9d41-b827eb96c6c2::urn:schemas-upnp-org:device:MediaServer:1\r\n\r\n",
        location, server
    )
}

fn loopback_config(ssdp_addr: String, scan_ports: Vec<u16>) -> DiscoveryConfig {
    DiscoveryConfig {
        ssdp_addr,
        ssdp_read_timeout_ms: 400,
        ssdp_ceiling_ms: 2_000,
        description_timeout_ms: 1_000,
        network_base: Some("127.0.0".to_string()),
        scan_host_suffixes: vec![1],
        scan_ports,
        scan_paths: vec!["/identity".to_string()],
        ..DiscoveryConfig::default()
    }
}

#[test]
fn probe_resolves_content_directory_eagerly() {
    let mut nas = Server::new();
    let description = nas
        .mock("GET", "/rootDesc.xml")
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(DESCRIPTION)
        .expect(1)
        .create();

    let location = format!("{}/rootDesc.xml", nas.url());
    let answer = search_response(&location, "Linux/6.1 UPnP/1.0 MiniDLNA/1.3.3");
    let (addr, handle) = responder(vec![answer.clone(), answer]);

    let prober = SsdpProber::new(loopback_config(addr, Vec::new()), Observer::inherit());
    let report = prober.probe();
    let request = handle.join().unwrap();

    assert!(request.starts_with("M-SEARCH * HTTP/1.1\r\n"));
    assert!(request.contains("MAN: \"ssdp:discover\"\r\n"));
    assert!(request.contains("ST: upnp:rootdevice\r\n"));

    // The duplicate answer neither produces a device nor a second lookup
    description.assert();
    assert_eq!(report.devices.len(), 1);

    let device = &report.devices[0];
    assert_eq!(device.location(), location);
    assert_eq!(device.base_url(), nas.url());
    assert_eq!(device.friendly_name(), "Device 4d696e69");
    assert_eq!(
        device.content_directory_url(),
        Some(format!("{}/ctl/ContentDir", nas.url()).as_str())
    );
}

#[test]
fn full_run_merges_ssdp_and_port_scan() {
    // Advertised over SSDP with its base URL as location, and listening on a
    // scanned port: the scan must not report it again.
    let mut advertised = Server::new();
    let advertised_probe = advertised
        .mock("GET", "/identity")
        .with_status(200)
        .expect(0)
        .create();

    let mut silent = Server::new();
    let _silent_probe = silent.mock("GET", "/identity").with_status(200).create();

    let advertised_port = advertised.socket_address().port();
    let silent_port = silent.socket_address().port();

    let (addr, handle) = responder(vec![search_response(&advertised.url(), "Emby UPnP/1.0")]);
    let config = loopback_config(addr, vec![advertised_port, silent_port]);
    let orchestrator = Arc::new(DiscoveryOrchestrator::new(config, Observer::inherit()));

    let events: Vec<DiscoveryEvent> = orchestrator.spawn().unwrap().iter().collect();
    handle.join().unwrap();

    assert_eq!(events.first(), Some(&DiscoveryEvent::Started));
    assert_eq!(events.last(), Some(&DiscoveryEvent::Completed));

    let found: Vec<(String, String)> = events
        .iter()
        .filter_map(|event| match event {
            DiscoveryEvent::DeviceFound(device) => {
                Some((device.location().to_string(), device.name().to_string()))
            }
            _ => None,
        })
        .collect();

    assert_eq!(
        found,
        vec![
            (advertised.url(), "Emby Server (Emby UPnP/1.0)".to_string()),
            (
                silent.url(),
                format!("Media Server (127.0.0.1:{})", silent_port)
            ),
        ]
    );
    advertised_probe.assert();

    let mut list = DeviceList::new();
    for event in &events {
        list.apply(event);
    }
    assert_eq!(list.len(), 2);
    assert_eq!(list.last_error(), None);
}

#[test]
fn silent_network_completes_with_no_devices() {
    let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
    let closed_port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let config = loopback_config(silent.local_addr().unwrap().to_string(), vec![closed_port]);
    let orchestrator = DiscoveryOrchestrator::new(config, Observer::inherit());
    let (tx, rx) = orchestrator.channel();
    let report = orchestrator.run(&tx);
    drop(tx);

    let events: Vec<DiscoveryEvent> = rx.iter().collect();
    assert_eq!(events, vec![DiscoveryEvent::Started, DiscoveryEvent::Completed]);
    assert!(report.devices.is_empty());
    assert!(report.errors.is_empty());

    let mut list = DeviceList::new();
    for event in &events {
        list.apply(event);
    }
    assert_eq!(list.last_error(), Some("No UPnP devices found"));
}
