// devices/mod.rs
mod hue_light;
mod smart_speaker;
mod smart_toilet;

pub use hue_light::HueLight;
pub use smart_speaker::SmartSpeaker;
pub use smart_toilet::SmartToilet;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::{
    error::AppError,
    models::{Ack, DeviceStatus, Message, MessageType},
};

/// Closed set of device variants known to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Light,
    Speaker,
    Toilet,
}

impl DeviceKind {
    /// The message types a variant accepts.
    pub fn capabilities(self) -> &'static [MessageType] {
        match self {
            DeviceKind::Light => &[MessageType::SwitchOn, MessageType::SwitchOff],
            DeviceKind::Speaker => &[
                MessageType::SwitchOn,
                MessageType::SwitchOff,
                MessageType::PlaySong,
            ],
            DeviceKind::Toilet => &[MessageType::Flush, MessageType::Clean],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Light => "light",
            DeviceKind::Speaker => "speaker",
            DeviceKind::Toilet => "toilet",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability contract every simulated device implements.
///
/// `handle` must reject message types outside [`Device::capabilities`] before
/// touching any state. Commands aimed at one device run one at a time.
#[async_trait::async_trait]
pub trait Device: Send + Sync {
    fn kind(&self) -> DeviceKind;

    fn capabilities(&self) -> &'static [MessageType] {
        self.kind().capabilities()
    }

    fn supports(&self, message_type: MessageType) -> bool {
        self.capabilities().contains(&message_type)
    }

    fn ensure_supported(&self, message: &Message) -> Result<(), AppError> {
        if self.supports(message.message_type) {
            Ok(())
        } else {
            tracing::warn!(
                device = %message.target,
                kind = %self.kind(),
                message_type = %message.message_type,
                "Rejected unsupported message"
            );
            Err(AppError::UnsupportedMessageType {
                kind: self.kind(),
                message_type: message.message_type,
            })
        }
    }

    async fn handle(&self, message: &Message) -> Result<Ack, AppError>;

    fn status(&self) -> DeviceStatus;
}

// Hardware response time. Suspends the calling task only.
async fn simulate_latency(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

fn lock<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_list_expected_capabilities_per_kind() {
        assert!(DeviceKind::Light.capabilities().contains(&MessageType::SwitchOn));
        assert!(!DeviceKind::Light.capabilities().contains(&MessageType::PlaySong));
        assert!(DeviceKind::Speaker.capabilities().contains(&MessageType::PlaySong));
        assert!(!DeviceKind::Toilet.capabilities().contains(&MessageType::SwitchOn));
    }

    #[test]
    fn should_accept_every_message_type_on_some_kind() {
        let kinds = [DeviceKind::Light, DeviceKind::Speaker, DeviceKind::Toilet];
        for message_type in MessageType::ALL {
            assert!(
                kinds.iter().any(|k| k.capabilities().contains(&message_type)),
                "{message_type} has no device"
            );
        }
    }
}
