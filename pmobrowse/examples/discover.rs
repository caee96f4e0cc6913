use std::sync::Arc;

use pmobrowse::{DeviceList, DiscoveryConfig, DiscoveryEvent, DiscoveryOrchestrator, Observer};

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("Starting pmobrowse discovery example...");

    let config = DiscoveryConfig::default().with_env_overrides();
    let orchestrator = Arc::new(DiscoveryOrchestrator::new(config, Observer::inherit()));

    let mut devices = DeviceList::new();
    for event in orchestrator.spawn()? {
        match &event {
            DiscoveryEvent::Started => println!("Discovering..."),
            DiscoveryEvent::DeviceFound(device) => println!(
                "- {} [{}] content directory: {}",
                device.name(),
                device.location(),
                device.content_directory_url().unwrap_or("none")
            ),
            DiscoveryEvent::Error(message) => println!("! {}", message),
            DiscoveryEvent::Completed => println!("Done."),
        }
        devices.apply(&event);
    }

    println!("=====================");
    println!("Devices detected : {}", devices.len());
    if let Some(status) = devices.last_error() {
        println!("{}", status);
    }
    Ok(())
}
