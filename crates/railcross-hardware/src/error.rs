//! Errors raised by crossing peripherals.
//!
//! Producer tasks turn these into [`PeripheralEvent::DeviceError`] and the
//! runtime logs failed writes and reads; neither ever panics on them.
//!
//! [`PeripheralEvent::DeviceError`]: crate::PeripheralEvent::DeviceError

/// Result type alias for hardware operations.
pub type Result<T> = std::result::Result<T, HardwareError>;

/// Errors that can occur during hardware device operations.
#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// The device, or the channel feeding it, is gone.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    /// A write to the device was not accepted.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// Bring-up could not complete.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    /// An analog conversion failed.
    #[error("Read error: {message}")]
    ReadError { message: String },
}

impl HardwareError {
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn read(message: impl Into<String>) -> Self {
        Self::ReadError {
            message: message.into(),
        }
    }
}

impl From<HardwareError> for railcross_core::Error {
    fn from(error: HardwareError) -> Self {
        railcross_core::Error::Hardware(error.to_string())
    }
}
