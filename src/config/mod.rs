// config/mod.rs
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub latency: LatencySettings,
    #[validate(nested)]
    pub demo: DemoSettings,
    #[validate(nested)]
    pub log: LogSettings,
    pub metrics: MetricsSettings,
}

/// Simulated hardware response times, in milliseconds.
#[derive(Debug, Deserialize, Validate)]
pub struct LatencySettings {
    #[validate(range(max = 60_000))]
    pub light_ms: u64,
    #[validate(range(max = 60_000))]
    pub speaker_ms: u64,
    #[validate(range(max = 60_000))]
    pub toilet_flush_ms: u64,
    #[validate(range(max = 60_000))]
    pub toilet_clean_ms: u64,
}

impl LatencySettings {
    pub fn light(&self) -> Duration {
        Duration::from_millis(self.light_ms)
    }

    pub fn speaker(&self) -> Duration {
        Duration::from_millis(self.speaker_ms)
    }

    pub fn toilet_flush(&self) -> Duration {
        Duration::from_millis(self.toilet_flush_ms)
    }

    pub fn toilet_clean(&self) -> Duration {
        Duration::from_millis(self.toilet_clean_ms)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct DemoSettings {
    #[validate(length(min = 1))]
    pub song: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LogSettings {
    #[validate(length(min = 1))]
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
}

impl Settings {
    /// Defaults, then `config/config.*` if present, then `IOT_*` variables
    /// (`IOT_LATENCY__LIGHT_MS=10`).
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_builder(
            Self::defaults()?
                .add_source(File::with_name("config/config").required(false))
                .add_source(
                    Environment::with_prefix("IOT")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::from_builder(Self::defaults()?.add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("latency.light_ms", 1000)?
            .set_default("latency.speaker_ms", 1000)?
            .set_default("latency.toilet_flush_ms", 2000)?
            .set_default("latency.toilet_clean_ms", 2500)?
            .set_default("demo.song", "Rick Astley - Never Gonna Give You Up")?
            .set_default("log.filter", "info")?
            .set_default("metrics.enabled", false)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings
            .validate()
            .map_err(|e| ConfigError::Message(format!("Invalid settings: {}", e)))?;
        Ok(settings)
    }
}
