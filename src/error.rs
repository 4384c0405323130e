//! Error taxonomy for bus discovery and register access.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures of a single lighting operation.
///
/// Every kind is kept distinct up to the D-Bus boundary so that clients can
/// tell "cannot reach the device" apart from "device is in an unexpected
/// state".
#[derive(Error, Debug)]
pub enum LightingError {
    /// The sysfs device-class tree is missing or unreadable.
    #[error("sysfs unavailable at {}: {reason}", path.display())]
    SysFsUnavailable { path: PathBuf, reason: String },

    /// No I2C adapter name starts with the expected prefix.
    #[error("could not find an i2c bus matching '{prefix}'")]
    AdapterNotFound { prefix: String },

    /// A register transaction failed at the bus level.
    ///
    /// `register` is `None` when the bus itself could not be opened.
    #[error("{}: {source}", describe_register(*register))]
    BusIo {
        register: Option<u8>,
        #[source]
        source: io::Error,
    },

    /// The mode register holds a byte with no symbolic name.
    #[error("mode register holds unrecognized value {raw:#04x}")]
    AmbiguousDeviceState { raw: u8 },

    /// A caller-supplied value is outside the accepted set.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The blocking worker running a bus transaction did not complete.
    #[error("bus worker failed: {0}")]
    Worker(String),
}

impl LightingError {
    /// Wraps an I/O failure that happened while talking to `register`.
    pub fn bus_io(register: u8, source: io::Error) -> Self {
        Self::BusIo {
            register: Some(register),
            source,
        }
    }
}

fn describe_register(register: Option<u8>) -> String {
    match register {
        Some(reg) => format!("bus I/O error on register {reg:#04x}"),
        None => "failed to open i2c bus".to_string(),
    }
}

/// Result type for lighting operations.
pub type LightingResult<T> = Result<T, LightingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_io_message_names_register() {
        let err = LightingError::bus_io(0x06, io::Error::other("nack"));
        assert_eq!(err.to_string(), "bus I/O error on register 0x06: nack");
    }

    #[test]
    fn bus_open_message_has_no_register() {
        let err = LightingError::BusIo {
            register: None,
            source: io::Error::from(io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().starts_with("failed to open i2c bus"));
    }

    #[test]
    fn ambiguous_state_shows_raw_byte() {
        let err = LightingError::AmbiguousDeviceState { raw: 0x2a };
        assert_eq!(err.to_string(), "mode register holds unrecognized value 0x2a");
    }

    #[test]
    fn adapter_not_found_quotes_prefix() {
        let err = LightingError::AdapterNotFound {
            prefix: "NVIDIA i2c adapter 1".into(),
        };
        assert!(err.to_string().contains("'NVIDIA i2c adapter 1'"));
    }
}
