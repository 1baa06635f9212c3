// main.rs
use anyhow::Context;
use iot_orchestrator::{
    Device, HueLight, IotService, Message, MessageType, SmartSpeaker, SmartToilet,
    config::Settings, metrics, op, run_parallel, run_sequence,
};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::new().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter)),
        )
        .init();

    let recorder = if settings.metrics.enabled {
        Some(metrics::install_recorder()?)
    } else {
        None
    };

    let start = Instant::now();
    run(&settings).await?;
    let elapsed = start.elapsed();

    if let Some(handle) = recorder {
        println!("{}", handle.render());
    }
    println!("Elapsed: {:.3}s", elapsed.as_secs_f64());

    Ok(())
}

async fn run(settings: &Settings) -> anyhow::Result<()> {
    let service = IotService::new();
    let latency = &settings.latency;

    let hue_light = Arc::new(HueLight::new(latency.light()));
    let speaker = Arc::new(SmartSpeaker::new(latency.speaker()));
    let toilet = Arc::new(SmartToilet::new(latency.toilet_flush(), latency.toilet_clean()));

    let (hue_light_id, speaker_id, toilet_id) = tokio::join!(
        async { service.register_device(hue_light.clone()) },
        async { service.register_device(speaker.clone()) },
        async { service.register_device(toilet.clone()) },
    );

    // wake up
    let wake_up_light_on = Message::new(hue_light_id, MessageType::SwitchOn);
    let wake_up_speaker_on = Message::new(speaker_id, MessageType::SwitchOn);
    let wake_up_play_music =
        Message::with_payload(speaker_id, MessageType::PlaySong, settings.demo.song.as_str());

    // go to sleep
    let sleep_light_off = Message::new(hue_light_id, MessageType::SwitchOff);
    let sleep_speaker_off = Message::new(speaker_id, MessageType::SwitchOff);
    let sleep_toilet_flush = Message::new(toilet_id, MessageType::Flush);
    let sleep_toilet_clean = Message::new(toilet_id, MessageType::Clean);

    run_sequence([
        op(run_parallel([
            op(service.send_msg(wake_up_light_on)),
            op(service.send_msg(wake_up_speaker_on)),
        ])),
        op(service.send_msg(wake_up_play_music)),
    ])
    .await
    .context("wake up program failed")?;

    run_sequence([
        op(service.send_msg(sleep_light_off)),
        op(run_parallel([
            op(service.send_msg(sleep_speaker_off)),
            op(run_sequence([
                op(service.send_msg(sleep_toilet_flush)),
                op(service.send_msg(sleep_toilet_clean)),
            ])),
        ])),
    ])
    .await
    .context("sleep program failed")?;

    for (name, status) in [
        ("hue_light", hue_light.status()),
        ("speaker", speaker.status()),
        ("toilet", toilet.status()),
    ] {
        println!("{name}: {}", serde_json::to_string(&status)?);
    }

    let registry = &service;
    run_parallel(
        [hue_light_id, speaker_id, toilet_id]
            .map(|id| op(async move { registry.unregister_device(id) })),
    )
    .await
    .context("unregistering devices failed")?;

    Ok(())
}
