//! Custom error types for the Razer laptop EC.
//!
//! This module provides fine-grained error handling for report encoding,
//! controller transactions, and argument validation.

use thiserror::Error;

/// Classification of a failure, independent of the data attached to it.
///
/// Transaction faults are recorded with this type (it is `Copy`) so that
/// fire-and-forget sequences can log them and keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PayloadTooLarge,
    ShortBuffer,
    ShortResponse,
    UnmatchedResponse,
    DeviceBusy,
    DeviceFailure,
    DeviceNotSupported,
    DeviceTimeout,
    InvalidArgument,
    InvalidResponse,
    NotFound,
    Config,
    Transport,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::PayloadTooLarge => "payload too large",
            ErrorKind::ShortBuffer => "short buffer",
            ErrorKind::ShortResponse => "short response",
            ErrorKind::UnmatchedResponse => "unmatched response",
            ErrorKind::DeviceBusy => "device busy",
            ErrorKind::DeviceFailure => "device failure",
            ErrorKind::DeviceNotSupported => "command not supported",
            ErrorKind::DeviceTimeout => "device timeout",
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::InvalidResponse => "invalid response",
            ErrorKind::NotFound => "device not found",
            ErrorKind::Config => "configuration error",
            ErrorKind::Transport => "transport error",
        };
        f.write_str(name)
    }
}

/// Main error type for EC operations.
#[derive(Error, Debug)]
pub enum RazerError {
    /// No supported controller found during enumeration.
    #[error("No supported Razer laptop controller found. Check permissions on /dev/hidraw*.")]
    DeviceNotFound,

    /// HID communication error.
    #[error("HID communication error: {0}")]
    HidError(#[from] hidapi::HidError),

    /// Report payload does not fit in the 80 byte argument block.
    #[error("Payload of {len} bytes exceeds the {max} byte argument block")]
    PayloadTooLarge { len: usize, max: usize },

    /// Fewer bytes than a full report were supplied to the decoder.
    #[error("Buffer too short: {len} bytes, expected {expected}")]
    ShortBuffer { len: usize, expected: usize },

    /// The controller answered with fewer bytes than a full report.
    #[error("Short response from controller: {len} bytes")]
    ShortResponse { len: usize },

    /// The response belongs to a different request.
    #[error("Response 0x{class:02X}/0x{id:02X} does not match the request")]
    UnmatchedResponse { class: u8, id: u8 },

    /// The controller reported a non-success status.
    #[error("Controller status for 0x{class:02X}/0x{id:02X}: {kind}")]
    DeviceStatus { kind: ErrorKind, class: u8, id: u8 },

    /// Response carried a value this driver cannot interpret.
    #[error("Invalid response from device: {message}")]
    InvalidResponse { message: String },

    /// Generic invalid input error.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Low-level transport failure that is not a HID error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Config file could not be read or written.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RazerError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RazerError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            RazerError::ShortBuffer { .. } => ErrorKind::ShortBuffer,
            RazerError::ShortResponse { .. } => ErrorKind::ShortResponse,
            RazerError::UnmatchedResponse { .. } => ErrorKind::UnmatchedResponse,
            RazerError::DeviceStatus { kind, .. } => *kind,
            RazerError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RazerError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            RazerError::DeviceNotFound => ErrorKind::NotFound,
            RazerError::Config(_) => ErrorKind::Config,
            RazerError::HidError(_) | RazerError::Transport(_) => ErrorKind::Transport,
        }
    }
}

/// Result type alias for EC operations.
pub type Result<T> = std::result::Result<T, RazerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            RazerError::ShortResponse { len: 12 }.kind(),
            ErrorKind::ShortResponse
        );
        assert_eq!(
            RazerError::DeviceStatus {
                kind: ErrorKind::DeviceTimeout,
                class: 0x0D,
                id: 0x82
            }
            .kind(),
            ErrorKind::DeviceTimeout
        );
        assert_eq!(
            RazerError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_non_transport_errors_keep_their_kind() {
        assert_eq!(
            RazerError::Config("bad json".into()).kind(),
            ErrorKind::Config
        );
        assert_eq!(RazerError::DeviceNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(
            RazerError::InvalidResponse {
                message: "mode 0x09".into()
            }
            .kind(),
            ErrorKind::InvalidResponse
        );
        assert_eq!(
            RazerError::Transport("write rejected".into()).kind(),
            ErrorKind::Transport
        );
    }

    #[test]
    fn test_display_mentions_command() {
        let err = RazerError::UnmatchedResponse {
            class: 0x0D,
            id: 0x82,
        };
        assert_eq!(
            err.to_string(),
            "Response 0x0D/0x82 does not match the request"
        );
    }
}
