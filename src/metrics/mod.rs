// metrics/mod.rs
use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::models::MessageType;

pub const MESSAGES_TOTAL: &str = "iot_messages_total";
pub const REGISTERED_DEVICES: &str = "iot_registered_devices";
pub const MESSAGE_DURATION: &str = "iot_message_duration_seconds";

/// Installs an in-process Prometheus recorder. Nothing is served over the
/// network; call [`PrometheusHandle::render`] to get the text exposition.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics recorder: {}", e))
}

pub fn record_message(message_type: MessageType, outcome: &'static str, elapsed: Duration) {
    counter!(MESSAGES_TOTAL, "type" => message_type.as_str(), "outcome" => outcome).increment(1);
    histogram!(MESSAGE_DURATION, "type" => message_type.as_str()).record(elapsed.as_secs_f64());
}

/// Counts a message that never reached a device. No duration is recorded.
pub fn record_undelivered(message_type: MessageType, outcome: &'static str) {
    counter!(MESSAGES_TOTAL, "type" => message_type.as_str(), "outcome" => outcome).increment(1);
}

pub fn record_registry_size(devices: usize) {
    gauge!(REGISTERED_DEVICES).set(devices as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_count_undelivered_messages_without_a_duration_sample() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        ::metrics::with_local_recorder(&recorder, || {
            record_undelivered(MessageType::Flush, "device_not_found");
            record_message(MessageType::SwitchOn, "ok", Duration::from_millis(5));
        });
        let rendered = handle.render();

        assert!(rendered.lines().any(|line| line.starts_with(MESSAGES_TOTAL)
            && line.contains("FLUSH")
            && line.contains("device_not_found")));
        assert!(rendered
            .lines()
            .any(|line| line.starts_with(MESSAGE_DURATION) && line.contains("SWITCH_ON")));
        assert!(!rendered
            .lines()
            .any(|line| line.starts_with(MESSAGE_DURATION) && line.contains("FLUSH")));
    }
}
