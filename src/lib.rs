// lib.rs
pub mod config;
pub mod devices;
pub mod error;
pub mod metrics;
pub mod models;
pub mod program;
pub mod service;

pub use devices::{Device, DeviceKind, HueLight, SmartSpeaker, SmartToilet};
pub use error::AppError;
pub use models::{Ack, DeviceId, DeviceStatus, Message, MessageType, Playback, ToiletCycle};
pub use program::{Operation, op, run_parallel, run_sequence};
pub use service::IotService;
