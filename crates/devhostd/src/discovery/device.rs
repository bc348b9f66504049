//! Tracked device state.

use devhost_protocol::{DeviceRecord, Platform};
use serde::{Serialize, Serializer};

/// A device known to the registry.
///
/// Identity is the `id`; only the connection state changes after the device
/// is first seen. Serialises as its wire record, with `connected` reported as
/// `available`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    id: String,
    name: String,
    platform: Platform,
    connected: bool,
}

impl Device {
    /// Creates a device.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        platform: Platform,
        connected: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            platform,
            connected,
        }
    }

    /// Stable identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target platform.
    pub const fn platform(&self) -> Platform {
        self.platform
    }

    /// Whether the device is currently connected.
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) const fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Owned wire record for this device.
    pub fn record(&self) -> DeviceRecord {
        DeviceRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            platform: self.platform,
            available: self.connected,
        }
    }
}

impl From<&DeviceRecord> for Device {
    fn from(raw: &DeviceRecord) -> Self {
        Self::new(raw.id.clone(), raw.name.clone(), raw.platform, raw.available)
    }
}

#[derive(Serialize)]
struct WireDevice<'a> {
    id: &'a str,
    name: &'a str,
    platform: Platform,
    available: bool,
}

impl Serialize for Device {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireDevice {
            id: &self.id,
            name: &self.name,
            platform: self.platform,
            available: self.connected,
        }
        .serialize(serializer)
    }
}
