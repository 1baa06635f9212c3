// smart_toilet.rs
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Mutex as CommandGate;
use tracing::{debug, info};

use super::{Device, DeviceKind, lock, simulate_latency};
use crate::{
    error::AppError,
    models::{Ack, DeviceStatus, Message, MessageType, ToiletCycle},
};

/// Toilet-like appliance: every command runs a cycle that ends back in idle.
pub struct SmartToilet {
    cycle: Mutex<ToiletCycle>,
    gate: CommandGate<()>,
    flush_latency: Duration,
    clean_latency: Duration,
}

impl SmartToilet {
    pub const DEFAULT_FLUSH_LATENCY: Duration = Duration::from_millis(2000);
    pub const DEFAULT_CLEAN_LATENCY: Duration = Duration::from_millis(2500);

    pub fn new(flush_latency: Duration, clean_latency: Duration) -> Self {
        Self {
            cycle: Mutex::new(ToiletCycle::Idle),
            gate: CommandGate::new(()),
            flush_latency,
            clean_latency,
        }
    }

    pub fn cycle(&self) -> ToiletCycle {
        *lock(&self.cycle)
    }
}

// Returns the toilet to idle when dropped, even if the command is abandoned mid-cycle.
struct CycleGuard<'a> {
    cycle: &'a Mutex<ToiletCycle>,
}

impl<'a> CycleGuard<'a> {
    fn start(cycle: &'a Mutex<ToiletCycle>, running: ToiletCycle) -> Self {
        *lock(cycle) = running;
        Self { cycle }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *lock(self.cycle) = ToiletCycle::Idle;
    }
}

impl Default for SmartToilet {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FLUSH_LATENCY, Self::DEFAULT_CLEAN_LATENCY)
    }
}

#[async_trait]
impl Device for SmartToilet {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Toilet
    }

    async fn handle(&self, message: &Message) -> Result<Ack, AppError> {
        self.ensure_supported(message)?;
        let _turn = self.gate.lock().await;

        let (running, latency, detail) = match message.message_type {
            MessageType::Flush => (ToiletCycle::Flushing, self.flush_latency, "flushed"),
            MessageType::Clean => (ToiletCycle::Cleaning, self.clean_latency, "cleaned"),
            other => {
                return Err(AppError::UnsupportedMessageType {
                    kind: self.kind(),
                    message_type: other,
                });
            }
        };

        let cycle = CycleGuard::start(&self.cycle, running);
        debug!(device = %message.target, cycle = ?running, "Toilet cycle started");
        simulate_latency(latency).await;
        drop(cycle);

        info!(device = %message.target, detail, "Toilet cycle finished");
        Ok(Ack::new(message.target, self.kind(), message.message_type, detail))
    }

    fn status(&self) -> DeviceStatus {
        DeviceStatus::Toilet {
            cycle: self.cycle(),
        }
    }
}
