use std::io;
use thiserror::Error;
use msgbox::IconType;
use std::str::Utf8Error;
use btleplug;
use iced;
use serde_json;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to acquire file lock on config file: {source}")]
    CanNotLock { source: io::Error },

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("Invalid bluetooth address {address:?}")]
    InvalidAddress { address: String },

    #[error("No bluetooth adapters available")]
    NoAdapter,

    #[error("Peripheral {address} was not found")]
    PeripheralNotFound { address: String },

    #[error("A required bluetooth characteristic is not available")]
    MissingCharacteristic,

    #[error("The notification stream of the peripheral has ended")]
    NotificationsEnded,
}

impl DeviceError {
    /// Whether the connection to the peripheral can no longer deliver samples.
    /// Everything else only spoils the current read.
    pub fn is_fatal(&self) -> bool {
        match self {
            DeviceError::Btle { source } => matches!(
                source,
                btleplug::Error::NotConnected
                    | btleplug::Error::DeviceNotFound
                    | btleplug::Error::PermissionDenied
            ),
            DeviceError::NotificationsEnded => true,
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppRunError {
    #[error("Failed to start application (iced): {source}")]
    Iced { #[from] source: iced::Error },

    #[error("Failed to start application (config): {source}")]
    ConfigError { #[from] source: ConfigError },

    #[error("Failed to connect to the gamepad: {source}")]
    DeviceError { #[from] source: DeviceError },

    #[error("Failed to start the async runtime: {source}")]
    Runtime { source: io::Error },
}

/// The one line reported to the user when the application can not run.
pub fn fatal_report(error: &AppRunError) -> String {
    let headline = match error {
        AppRunError::ConfigError { source: ConfigError::CanNotLock { .. } } => "This application has already been started",
        _ => "Unexpected error",
    };
    format!("{}: {}", headline, error)
}

/// Shows `message` in a dialog. Logging it is up to the caller.
pub fn error_msgbox(message: &str) {
    if let Err(err) = msgbox::create(concat!("Tapete Brush ", env!("CARGO_PKG_VERSION")), message, IconType::Error) {
        log::warn!("Failed to create msgbox: {:?}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_connection_is_fatal() {
        assert!(DeviceError::from(btleplug::Error::NotConnected).is_fatal());
        assert!(DeviceError::from(btleplug::Error::DeviceNotFound).is_fatal());
        assert!(DeviceError::NotificationsEnded.is_fatal());
    }

    #[test]
    fn single_read_failures_are_recoverable() {
        assert!(!DeviceError::from(btleplug::Error::RuntimeError("busy".to_string())).is_fatal());
        assert!(!DeviceError::from(btleplug::Error::UnexpectedCharacteristic).is_fatal());
    }

    #[test]
    fn second_instance_is_reported_as_already_started() {
        let err = AppRunError::from(ConfigError::CanNotLock { source: io::Error::from(io::ErrorKind::WouldBlock) });
        assert!(fatal_report(&err).starts_with("This application has already been started: "));
    }

    #[test]
    fn other_failures_are_reported_once_with_their_cause() {
        let err = AppRunError::from(DeviceError::PeripheralNotFound { address: "E0:E2:E6:63:23:96".to_string() });
        let report = fatal_report(&err);

        assert!(report.starts_with("Unexpected error: "));
        assert_eq!(report.matches("E0:E2:E6:63:23:96").count(), 1);
        assert!(!report.contains('\n'));
    }
}
