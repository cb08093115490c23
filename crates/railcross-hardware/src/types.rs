//! Common types shared across hardware device implementations.
//!
//! This module defines device metadata and the [`SignalHead`] model of the
//! crossing's light hardware.

use railcross_core::LightChannel;
use serde::{Deserialize, Serialize};

/// Generic device information.
///
/// Contains metadata about a hardware device such as name, model,
/// and firmware version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Device name (e.g., "AXI GPIO 0", "Mock Lights").
    pub name: String,

    /// Device model identifier.
    pub model: String,

    /// Optional firmware version string.
    pub firmware_version: Option<String>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            firmware_version: None,
        }
    }

    /// Set the firmware version.
    pub fn with_firmware_version(mut self, firmware_version: impl Into<String>) -> Self {
        self.firmware_version = Some(firmware_version.into());
        self
    }
}

/// Model of the crossing's signal hardware.
///
/// The colour channels drive one RGB indicator, so lighting a colour
/// replaces whatever colour was showing and switching a colour off darkens
/// the indicator. [`LightChannel::All`] drives the crossing lamp bank:
/// switching it on lights the bank, switching it off darkens both the bank
/// and the indicator.
///
/// # Examples
///
/// ```
/// use railcross_core::LightChannel;
/// use railcross_hardware::SignalHead;
///
/// let mut head = SignalHead::default();
/// head.apply(LightChannel::Red, true);
/// head.apply(LightChannel::All, true);
/// assert_eq!(head.indicator(), Some(LightChannel::Red));
/// assert!(head.lamps_on());
///
/// head.apply(LightChannel::All, false);
/// assert_eq!(head.indicator(), None);
/// assert!(!head.lamps_on());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalHead {
    indicator: Option<LightChannel>,
    lamps: bool,
}

impl SignalHead {
    /// Apply one light command.
    pub fn apply(&mut self, channel: LightChannel, on: bool) {
        match (channel, on) {
            (LightChannel::All, true) => self.lamps = true,
            (LightChannel::All, false) => {
                self.lamps = false;
                self.indicator = None;
            }
            (colour, true) => self.indicator = Some(colour),
            (_, false) => self.indicator = None,
        }
    }

    /// Colour currently shown on the indicator, if any.
    pub fn indicator(&self) -> Option<LightChannel> {
        self.indicator
    }

    /// Whether the crossing lamp bank is lit.
    pub fn lamps_on(&self) -> bool {
        self.lamps
    }

    /// Whether the given channel is currently lit.
    pub fn is_lit(&self, channel: LightChannel) -> bool {
        match channel {
            LightChannel::All => self.lamps,
            colour => self.indicator == Some(colour),
        }
    }

    /// Whether nothing is lit.
    pub fn is_dark(&self) -> bool {
        self.indicator.is_none() && !self.lamps
    }
}
