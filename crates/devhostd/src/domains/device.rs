//! `device` domain: device listing and discovery events.

use std::sync::Arc;

use tracing::info;

use crate::discovery::{DISCOVERY_TARGET, DeviceDirectory, DiscoveryEngine};
use crate::dispatch::{Domain, DomainName, Outbound, to_payload};
use crate::services::DaemonServices;

/// Builds the `device` domain and starts discovery.
///
/// Returns the directory the discovery engine writes into so other domains
/// can read the current devices. When the source cannot start, the directory
/// stays empty for the daemon's lifetime.
pub(crate) fn build(outbound: Outbound, services: &DaemonServices) -> (Domain, DeviceDirectory) {
    let mut domain = Domain::new(DomainName::Device, outbound);
    let directory = DeviceDirectory::new();

    let reader = directory.clone();
    domain.register_sync("getDevices", move |_| to_payload(&reader.devices()));

    let engine = DiscoveryEngine::new(
        directory.clone(),
        Arc::clone(&services.cache),
        domain.events(),
    );
    match engine.start(services.devices.as_ref()) {
        Ok(task) => {
            info!(target: DISCOVERY_TARGET, "device discovery started");
            domain.attach(&task);
        }
        Err(error) => services.reporter.device_source_unavailable(&error),
    }
    (domain, directory)
}
