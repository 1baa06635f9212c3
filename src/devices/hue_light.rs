// hue_light.rs
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Mutex as CommandGate;
use tracing::info;

use super::{Device, DeviceKind, lock, simulate_latency};
use crate::{
    error::AppError,
    models::{Ack, DeviceStatus, Message, MessageType},
};

pub struct HueLight {
    power: Mutex<bool>,
    gate: CommandGate<()>,
    latency: Duration,
}

impl HueLight {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(1000);

    pub fn new(latency: Duration) -> Self {
        Self {
            power: Mutex::new(false),
            gate: CommandGate::new(()),
            latency,
        }
    }

    pub fn is_on(&self) -> bool {
        *lock(&self.power)
    }
}

impl Default for HueLight {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

#[async_trait]
impl Device for HueLight {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Light
    }

    async fn handle(&self, message: &Message) -> Result<Ack, AppError> {
        self.ensure_supported(message)?;
        let _turn = self.gate.lock().await;

        let power = match message.message_type {
            MessageType::SwitchOn => true,
            MessageType::SwitchOff => false,
            other => {
                return Err(AppError::UnsupportedMessageType {
                    kind: self.kind(),
                    message_type: other,
                });
            }
        };

        simulate_latency(self.latency).await;
        *lock(&self.power) = power;

        let detail = if power { "light is on" } else { "light is off" };
        info!(device = %message.target, power, "Light switched");
        Ok(Ack::new(message.target, self.kind(), message.message_type, detail))
    }

    fn status(&self) -> DeviceStatus {
        DeviceStatus::Light {
            power: self.is_on(),
        }
    }
}
