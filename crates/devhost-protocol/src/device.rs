//! Wire representation of devices.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Target platform of a device.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, EnumString, Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Platform {
    /// 32-bit ARM Android device or emulator.
    AndroidArm,
    /// x86-64 Android emulator.
    AndroidX64,
    /// Physical iOS device.
    Ios,
    /// iOS simulator.
    IosX86,
    /// macOS desktop.
    DarwinX64,
    /// Linux desktop.
    LinuxX64,
    /// Windows desktop.
    WindowsX64,
}

/// Errors encountered while parsing a [`Platform`] from text.
pub type PlatformParseError = strum::ParseError;

/// Device as reported to clients by `device.getDevices` and device events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceRecord {
    /// Stable identifier scoped to the enumeration source.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Target platform.
    pub platform: Platform,
    /// Whether the device is currently connected.
    pub available: bool,
}
