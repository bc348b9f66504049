//! Background reconciliation loop.

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::DISCOVERY_TARGET;
use super::registry::{DeviceDirectory, DeviceTransition};
use super::source::{DeviceCache, DeviceSnapshots, DeviceSource, DeviceSourceError};
use crate::dispatch::EventEmitter;

/// Turns device snapshots into registry updates and device events.
pub struct DiscoveryEngine {
    directory: DeviceDirectory,
    cache: Arc<dyn DeviceCache>,
    events: EventEmitter,
}

impl DiscoveryEngine {
    /// Creates an engine writing into `directory`.
    pub fn new(
        directory: DeviceDirectory,
        cache: Arc<dyn DeviceCache>,
        events: EventEmitter,
    ) -> Self {
        Self {
            directory,
            cache,
            events,
        }
    }

    /// Starts tracking `source` on a background task.
    ///
    /// Aborting the returned task drops the snapshot stream, which stops
    /// tracking.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot start tracking; the registry
    /// is left untouched.
    pub fn start(self, source: &dyn DeviceSource) -> Result<JoinHandle<()>, DeviceSourceError> {
        let snapshots = source.track()?;
        Ok(tokio::spawn(self.run(snapshots)))
    }

    async fn run(self, mut snapshots: DeviceSnapshots) {
        while let Some(snapshot) = snapshots.next().await {
            self.apply(&snapshot);
        }
        info!(target: DISCOVERY_TARGET, "device source ended");
    }

    fn apply(&self, snapshot: &[devhost_protocol::DeviceRecord]) {
        for transition in self.directory.reconcile(snapshot) {
            if let DeviceTransition::Removed(device) = &transition {
                self.cache.evict(device.id());
            }
            debug!(
                target: DISCOVERY_TARGET,
                event = transition.event_name(),
                device = transition.device().id(),
                "device transition"
            );
            self.events
                .send_serialized(transition.event_name(), transition.device());
        }
    }
}
