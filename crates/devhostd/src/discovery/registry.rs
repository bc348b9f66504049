//! Snapshot reconciliation.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use devhost_protocol::DeviceRecord;

use super::device::Device;

/// Change produced by reconciling one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceTransition {
    /// A device appeared for the first time.
    Added(Device),
    /// A known device changed connection state.
    Changed(Device),
    /// A known device is no longer reported.
    Removed(Device),
}

impl DeviceTransition {
    /// Event name emitted for this transition.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Added(_) => "added",
            Self::Changed(_) => "changed",
            Self::Removed(_) => "removed",
        }
    }

    /// Device the transition refers to, in its post-transition state.
    pub const fn device(&self) -> &Device {
        match self {
            Self::Added(device) | Self::Changed(device) | Self::Removed(device) => device,
        }
    }
}

/// Ordered set of known devices keyed by id.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: Vec<Device>,
}

impl DeviceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Known devices in first-seen order.
    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Returns `true` when no device is known.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Applies `snapshot` and returns the resulting transitions.
    ///
    /// Additions and changes follow snapshot order; removals follow in
    /// registry order. A repeated id within one snapshot is handled like a
    /// later poll, so its last report decides the stored connectivity.
    pub fn reconcile(&mut self, snapshot: &[DeviceRecord]) -> Vec<DeviceTransition> {
        let mut still_present: HashSet<String> =
            self.devices.iter().map(|device| device.id().to_owned()).collect();
        let mut transitions = Vec::new();

        for raw in snapshot {
            match self.devices.iter_mut().find(|device| device.id() == raw.id) {
                Some(known) => {
                    still_present.remove(&raw.id);
                    if known.is_connected() != raw.available {
                        known.set_connected(raw.available);
                        transitions.push(DeviceTransition::Changed(known.clone()));
                    }
                }
                None => {
                    let device = Device::from(raw);
                    self.devices.push(device.clone());
                    transitions.push(DeviceTransition::Added(device));
                }
            }
        }

        if !still_present.is_empty() {
            let (gone, kept): (Vec<Device>, Vec<Device>) = self
                .devices
                .drain(..)
                .partition(|device| still_present.contains(device.id()));
            self.devices = kept;
            transitions.extend(gone.into_iter().map(DeviceTransition::Removed));
        }

        transitions
    }
}

/// Shared read access to the registry.
///
/// The discovery engine is the only writer; command handlers take short
/// read locks to list devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceDirectory {
    registry: Arc<Mutex<DeviceRegistry>>,
}

impl DeviceDirectory {
    /// Creates a directory over an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the known devices.
    pub fn devices(&self) -> Vec<Device> {
        self.lock().devices().to_vec()
    }

    pub(crate) fn reconcile(&self, snapshot: &[DeviceRecord]) -> Vec<DeviceTransition> {
        self.lock().reconcile(snapshot)
    }

    fn lock(&self) -> MutexGuard<'_, DeviceRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
