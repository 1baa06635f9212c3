// error.rs
use thiserror::Error;

use crate::devices::DeviceKind;
use crate::models::{DeviceId, MessageType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceId),
    #[error("Unsupported message type {message_type} for {kind}")]
    UnsupportedMessageType {
        kind: DeviceKind,
        message_type: MessageType,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Short label used for metrics and log fields.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DeviceNotFound(_) => "device_not_found",
            AppError::UnsupportedMessageType { .. } => "unsupported_message_type",
            AppError::Validation(_) => "validation",
        }
    }
}
