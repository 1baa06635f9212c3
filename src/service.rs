// service.rs
use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, instrument, warn};

use crate::{
    devices::Device,
    error::AppError,
    metrics,
    models::{Ack, DeviceId, DeviceStatus, Message},
};

/// Registry of live devices and the entry point for dispatching messages.
///
/// The registry is the only shared mutable state. Registration, removal and
/// dispatch against different ids never contend on more than a map shard, and
/// the shard guard is released before a device handler is awaited.
#[derive(Default)]
pub struct IotService {
    devices: DashMap<DeviceId, Arc<dyn Device>>,
}

impl IotService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `device` under a fresh id that no live device holds.
    pub fn register_device(&self, device: Arc<dyn Device>) -> DeviceId {
        let kind = device.kind();
        let id = loop {
            let id = DeviceId::generate();
            if let Entry::Vacant(slot) = self.devices.entry(id) {
                slot.insert(device);
                break id;
            }
        };
        info!(device = %id, %kind, "Device registered");
        metrics::record_registry_size(self.devices.len());
        id
    }

    /// Removes `id` from the registry and hands the device back to the caller.
    pub fn unregister_device(&self, id: DeviceId) -> Result<Arc<dyn Device>, AppError> {
        let (_, device) = self
            .devices
            .remove(&id)
            .ok_or(AppError::DeviceNotFound(id))?;
        info!(device = %id, kind = %device.kind(), "Device unregistered");
        metrics::record_registry_size(self.devices.len());
        Ok(device)
    }

    #[instrument(skip(self, message), fields(device = %message.target, message_type = %message.message_type))]
    pub async fn send_msg(&self, message: Message) -> Result<Ack, AppError> {
        let device = self.lookup(message.target).inspect_err(|_| {
            warn!("Message for unknown device");
            metrics::record_undelivered(message.message_type, "device_not_found");
        })?;

        let started = Instant::now();
        let result = device.handle(&message).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        metrics::record_message(message.message_type, outcome, started.elapsed());
        result
    }

    pub fn device_status(&self, id: DeviceId) -> Result<DeviceStatus, AppError> {
        Ok(self.lookup(id)?.status())
    }

    pub fn device_ids(&self) -> Vec<DeviceId> {
        self.devices.iter().map(|entry| *entry.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    fn lookup(&self, id: DeviceId) -> Result<Arc<dyn Device>, AppError> {
        self.devices
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(AppError::DeviceNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{HueLight, SmartSpeaker, SmartToilet};
    use crate::models::{MessageType, Playback, ToiletCycle};
    use std::collections::HashSet;
    use std::time::Duration;

    const LATENCY: Duration = Duration::from_millis(100);

    fn light() -> Arc<HueLight> {
        Arc::new(HueLight::new(LATENCY))
    }

    #[tokio::test(start_paused = true)]
    async fn should_switch_registered_light_on_and_off() {
        let service = IotService::new();
        let light = light();
        let id = service.register_device(light.clone());

        service.send_msg(Message::new(id, MessageType::SwitchOn)).await.unwrap();
        assert!(light.is_on());

        service.send_msg(Message::new(id, MessageType::SwitchOff)).await.unwrap();
        assert!(!light.is_on());
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_with_device_not_found_after_unregister() {
        let service = IotService::new();
        let id = service.register_device(light());

        service.unregister_device(id).unwrap();

        let err = service
            .send_msg(Message::new(id, MessageType::SwitchOn))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::DeviceNotFound(id));
        assert!(service.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_fail_with_device_not_found_for_unknown_id() {
        let service = IotService::new();
        for _ in 0..8 {
            service.register_device(light());
        }
        let unknown = DeviceId::generate();

        let err = service
            .send_msg(Message::new(unknown, MessageType::SwitchOn))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::DeviceNotFound(unknown));
    }

    #[test]
    fn should_fail_unregistering_unknown_id() {
        let service = IotService::new();
        let id = service.register_device(light());
        service.unregister_device(id).unwrap();

        assert!(matches!(
            service.unregister_device(id),
            Err(AppError::DeviceNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn should_return_released_device_on_unregister() {
        let service = IotService::new();
        let toilet: Arc<dyn Device> = Arc::new(SmartToilet::default());
        let id = service.register_device(Arc::clone(&toilet));

        let released = service.unregister_device(id).unwrap();
        assert!(Arc::ptr_eq(&released, &toilet));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn should_hand_out_distinct_ids_under_concurrent_registration() {
        let service = Arc::new(IotService::new());
        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.register_device(Arc::new(HueLight::default())) })
            })
            .collect();

        let mut ids = HashSet::new();
        for task in tasks {
            ids.insert(task.await.unwrap());
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(service.len(), 64);
    }

    #[tokio::test(start_paused = true)]
    async fn should_leave_state_unchanged_on_unsupported_type() {
        let service = IotService::new();
        let id = service.register_device(Arc::new(SmartToilet::default()));
        let before = service.device_status(id).unwrap();

        let err = service
            .send_msg(Message::with_payload(id, MessageType::PlaySong, "Song 2"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::UnsupportedMessageType { .. }));
        assert_eq!(service.device_status(id).unwrap(), before);
        assert_eq!(before, DeviceStatus::Toilet { cycle: ToiletCycle::Idle });
    }

    #[tokio::test(start_paused = true)]
    async fn should_dispatch_to_different_devices_concurrently() {
        let service = IotService::new();
        let light = service.register_device(light());
        let speaker = service.register_device(Arc::new(SmartSpeaker::new(LATENCY)));
        let start = Instant::now();

        let (a, b) = tokio::join!(
            service.send_msg(Message::new(light, MessageType::SwitchOn)),
            service.send_msg(Message::with_payload(speaker, MessageType::PlaySong, "Hey Jude")),
        );

        a.unwrap();
        b.unwrap();
        assert_eq!(start.elapsed(), LATENCY);
        assert_eq!(
            service.device_status(speaker).unwrap(),
            DeviceStatus::Speaker {
                power: false,
                playback: Playback::Playing("Hey Jude".into()),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_finish_in_flight_command_when_unregistered_meanwhile() {
        let service = Arc::new(IotService::new());
        let light = light();
        let id = service.register_device(light.clone());

        let task = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.send_msg(Message::new(id, MessageType::SwitchOn)).await }
        });
        tokio::time::sleep(LATENCY / 2).await;
        service.unregister_device(id).unwrap();

        task.await.unwrap().unwrap();
        assert!(light.is_on());
    }

    #[test]
    fn should_list_registered_ids() {
        let service = IotService::new();
        let a = service.register_device(light());
        let b = service.register_device(Arc::new(SmartSpeaker::default()));

        let ids: HashSet<_> = service.device_ids().into_iter().collect();
        assert_eq!(ids, HashSet::from([a, b]));
    }
}
