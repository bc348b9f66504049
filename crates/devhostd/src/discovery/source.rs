//! External collaborators of the discovery engine.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use devhost_protocol::DeviceRecord;
use futures::stream::BoxStream;
use thiserror::Error;

/// Stream of device snapshots, one per enumeration cycle.
pub type DeviceSnapshots = BoxStream<'static, Vec<DeviceRecord>>;

/// Errors raised when a device source cannot start tracking.
#[derive(Debug, Error)]
pub enum DeviceSourceError {
    /// No enumeration command is configured.
    #[error("device source is not configured; set --device-command or DEVHOST_DEVICE_COMMAND")]
    NotConfigured,
    /// The source is configured but unusable.
    #[error("device source unavailable: {message}")]
    Unavailable {
        /// Failure description.
        message: String,
    },
}

/// Produces device snapshots.
pub trait DeviceSource: Send + Sync {
    /// Starts tracking and returns the snapshot stream. Dropping the stream
    /// stops tracking.
    ///
    /// # Errors
    ///
    /// Returns an error when tracking cannot start.
    fn track(&self) -> Result<DeviceSnapshots, DeviceSourceError>;
}

/// Per-device state held outside the registry.
#[cfg_attr(test, mockall::automock)]
pub trait DeviceCache: Send + Sync {
    /// Records that an application was launched on `id`.
    fn remember(&self, id: &str);

    /// Forgets everything cached for `id`.
    fn evict(&self, id: &str);
}

/// In-memory cache of device ids that have been launched against.
#[derive(Debug, Default)]
pub struct SharedDeviceCache {
    ids: Mutex<HashSet<String>>,
}

impl SharedDeviceCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `id` is cached.
    pub fn contains(&self, id: &str) -> bool {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }
}

impl DeviceCache for SharedDeviceCache {
    fn remember(&self, id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_owned());
    }

    fn evict(&self, id: &str) {
        self.ids
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
    }
}
