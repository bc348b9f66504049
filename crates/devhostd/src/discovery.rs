//! Device discovery.
//!
//! A [`DeviceSource`] yields successive snapshots of the devices an external
//! enumeration tool can see. The engine reconciles each snapshot against a
//! [`DeviceRegistry`] and turns the differences into `device.added`,
//! `device.changed` and `device.removed` events. The registry is shared with
//! the rest of the daemon through a [`DeviceDirectory`].

mod command_source;
mod device;
mod engine;
mod registry;
mod source;

pub use self::command_source::CommandDeviceSource;
pub use self::device::Device;
pub use self::engine::DiscoveryEngine;
pub use self::registry::{DeviceDirectory, DeviceRegistry, DeviceTransition};
pub use self::source::{
    DeviceCache, DeviceSnapshots, DeviceSource, DeviceSourceError, SharedDeviceCache,
};

#[cfg(test)]
pub use self::source::MockDeviceCache;

/// Tracing target for discovery operations.
pub(crate) const DISCOVERY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::discovery");
