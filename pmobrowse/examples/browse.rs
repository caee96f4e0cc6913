//! Lists a device found by SSDP.
//!
//! `cargo run --example browse -- <location substring> [path segments...]`

use pmobrowse::{
    BrowseConfig, ContentBrowser, DiscoveryConfig, Observer, PathContainerCache, SsdpProber,
};

fn main() {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let filter = args.next().unwrap_or_default();
    let path: Vec<String> = args.collect();

    let prober = SsdpProber::new(DiscoveryConfig::default().with_env_overrides(), Observer::inherit());
    let report = prober.probe();
    let Some(device) = report
        .devices
        .iter()
        .find(|d| d.location().contains(&filter) || d.name().contains(&filter))
    else {
        eprintln!("No device matching '{}' among {} found", filter, report.devices.len());
        return;
    };

    println!("Browsing {} ({})", device.name(), device.location());

    let browser = ContentBrowser::new(BrowseConfig::default().with_env_overrides(), Observer::inherit());
    let mut cache = PathContainerCache::new();

    // Walk down one level at a time so the cache learns each container id
    for depth in 0..=path.len() {
        let current = &path[..depth];
        match browser.browse(device, current, &mut cache) {
            Ok(entries) if depth == path.len() => {
                for entry in entries {
                    let marker = if entry.is_container { "/" } else { "" };
                    match entry.url {
                        Some(url) => println!("  {}{}  {}", entry.name, marker, url),
                        None => println!("  {}{}", entry.name, marker),
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                eprintln!("{}", err);
                return;
            }
        }
    }
}
