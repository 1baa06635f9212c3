// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::devices::DeviceKind;

/// Registry-scoped handle to a device, handed out by [`crate::service::IotService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(Uuid);

impl DeviceId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    SwitchOn,
    SwitchOff,
    PlaySong,
    Flush,
    Clean,
}

impl MessageType {
    pub const ALL: [MessageType; 5] = [
        MessageType::SwitchOn,
        MessageType::SwitchOff,
        MessageType::PlaySong,
        MessageType::Flush,
        MessageType::Clean,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::SwitchOn => "SWITCH_ON",
            MessageType::SwitchOff => "SWITCH_OFF",
            MessageType::PlaySong => "PLAY_SONG",
            MessageType::Flush => "FLUSH",
            MessageType::Clean => "CLEAN",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single command aimed at one device.
///
/// The payload only carries meaning for [`MessageType::PlaySong`], where it
/// holds the song title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub target: DeviceId,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl Message {
    pub fn new(target: DeviceId, message_type: MessageType) -> Self {
        Self {
            target,
            message_type,
            payload: None,
        }
    }

    pub fn with_payload(
        target: DeviceId,
        message_type: MessageType,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            target,
            message_type,
            payload: Some(payload.into()),
        }
    }
}

/// Acknowledgement returned by a device once a command has completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub device: DeviceId,
    pub kind: DeviceKind,
    pub message_type: MessageType,
    pub detail: String,
    pub completed_at: DateTime<Utc>,
}

impl Ack {
    pub fn new(
        device: DeviceId,
        kind: DeviceKind,
        message_type: MessageType,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            device,
            kind,
            message_type,
            detail: detail.into(),
            completed_at: Utc::now(),
        }
    }
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} handled {}: {}",
            self.kind, self.device, self.message_type, self.detail
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "title", rename_all = "snake_case")]
pub enum Playback {
    Idle,
    Playing(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToiletCycle {
    Idle,
    Flushing,
    Cleaning,
}

/// Point-in-time snapshot of a device's observable state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceStatus {
    Light { power: bool },
    Speaker { power: bool, playback: Playback },
    Toilet { cycle: ToiletCycle },
}
