// smart_speaker.rs
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Mutex as CommandGate;
use tracing::info;

use super::{Device, DeviceKind, lock, simulate_latency};
use crate::{
    error::AppError,
    models::{Ack, DeviceStatus, Message, MessageType, Playback},
};

#[derive(Debug, Clone)]
struct SpeakerState {
    power: bool,
    playback: Playback,
}

pub struct SmartSpeaker {
    state: Mutex<SpeakerState>,
    gate: CommandGate<()>,
    latency: Duration,
}

impl SmartSpeaker {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

    pub fn new(latency: Duration) -> Self {
        Self {
            state: Mutex::new(SpeakerState {
                power: false,
                playback: Playback::Idle,
            }),
            gate: CommandGate::new(()),
            latency,
        }
    }

    pub fn is_on(&self) -> bool {
        lock(&self.state).power
    }

    pub fn playback(&self) -> Playback {
        lock(&self.state).playback.clone()
    }

    // Blank titles are rejected along with a missing payload.
    fn song_title(message: &Message) -> Result<&str, AppError> {
        match message.payload.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => Ok(title),
            Some(_) => Err(AppError::Validation("PLAY_SONG payload is blank".into())),
            None => Err(AppError::Validation(
                "PLAY_SONG requires a song title payload".into(),
            )),
        }
    }
}

impl Default for SmartSpeaker {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

#[async_trait]
impl Device for SmartSpeaker {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Speaker
    }

    async fn handle(&self, message: &Message) -> Result<Ack, AppError> {
        self.ensure_supported(message)?;
        let title = match message.message_type {
            MessageType::PlaySong => Some(Self::song_title(message)?.to_owned()),
            _ => None,
        };

        let _turn = self.gate.lock().await;
        simulate_latency(self.latency).await;

        let detail = {
            let mut state = lock(&self.state);
            match message.message_type {
                MessageType::SwitchOn => {
                    state.power = true;
                    "speaker is on".to_owned()
                }
                MessageType::SwitchOff => {
                    state.power = false;
                    state.playback = Playback::Idle;
                    "speaker is off".to_owned()
                }
                MessageType::PlaySong => {
                    let title = title.unwrap_or_default();
                    let detail = format!("playing '{title}'");
                    state.playback = Playback::Playing(title);
                    detail
                }
                other => {
                    return Err(AppError::UnsupportedMessageType {
                        kind: self.kind(),
                        message_type: other,
                    });
                }
            }
        };

        info!(device = %message.target, %detail, "Speaker updated");
        Ok(Ack::new(message.target, self.kind(), message.message_type, detail))
    }

    fn status(&self) -> DeviceStatus {
        let state = lock(&self.state);
        DeviceStatus::Speaker {
            power: state.power,
            playback: state.playback.clone(),
        }
    }
}
