use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{PipelineError, ScaleFactors, ANOMALY_LABEL, AXES, MAX_CHANNELS, MAX_STATE_LABEL_LEN};

// ---------------------------------------------------------------------------
// Defaults (device firmware values)
// ---------------------------------------------------------------------------
pub const DEFAULT_DEVICE_ID: u32 = 1583;
pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 100;
pub const DEFAULT_SAMPLES_PER_WINDOW: usize = 200;
pub const DEFAULT_CHANNELS_PER_SAMPLE: usize = 6;
pub const DEFAULT_LINEAR_SCALE: f32 = 100.0; // mg -> feature units
pub const DEFAULT_ANGULAR_SCALE: f32 = 1000.0; // mdps -> feature units
pub const DEFAULT_STATE_DURATION_MS: u32 = 400;
pub const DEFAULT_CYCLE_PAUSE_MS: u64 = 5_000;
pub const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DO_WORK_INTERVAL_MS: u64 = 100;
pub const DEFAULT_LABELS: [&str; 4] = ["Squat", "Stand", "Stoop", "Walk"];

/// Fixed startup configuration for the whole pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub device_id: u32,
    pub sample_rate_hz: u32,
    pub samples_per_window: usize,
    pub channels_per_sample: usize,
    pub linear_scale: f32,
    pub angular_scale: f32,
    /// Label set in the model's output order.
    pub labels: Vec<String>,
    pub state_duration_ms: u32,
    /// Pause between successful cycles.
    pub cycle_pause_ms: u64,
    pub publish_timeout_ms: u64,
    /// Stop after this many completed cycles (unbounded when absent).
    pub max_cycles: Option<u64>,
    pub transport: TransportConfig,
}

/// Options applied to the messaging transport when the session opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connection_string: String,
    pub log_trace: bool,
    /// PEM bundle handed to the transport as trusted roots.
    pub trusted_certificates: Option<String>,
    pub do_work_interval_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connection_string: String::new(),
            log_trace: false,
            trusted_certificates: None,
            do_work_interval_ms: DEFAULT_DO_WORK_INTERVAL_MS,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            device_id: DEFAULT_DEVICE_ID,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            samples_per_window: DEFAULT_SAMPLES_PER_WINDOW,
            channels_per_sample: DEFAULT_CHANNELS_PER_SAMPLE,
            linear_scale: DEFAULT_LINEAR_SCALE,
            angular_scale: DEFAULT_ANGULAR_SCALE,
            labels: DEFAULT_LABELS.iter().map(|l| l.to_string()).collect(),
            state_duration_ms: DEFAULT_STATE_DURATION_MS,
            cycle_pause_ms: DEFAULT_CYCLE_PAUSE_MS,
            publish_timeout_ms: DEFAULT_PUBLISH_TIMEOUT_MS,
            max_cycles: None,
            transport: TransportConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Build from a JSON value; missing fields take their defaults.
    pub fn from_json(config: Value) -> Result<Self> {
        let parsed: Self = serde_json::from_value(config).context("Failed to parse pipeline config")?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(read_json(path.as_ref())?)
    }

    /// Load the config and also hand back one extra top-level section
    /// (`Value::Null` when absent), e.g. the simulator settings.
    pub fn from_file_with_section(path: impl AsRef<Path>, section: &str) -> Result<(Self, Value)> {
        let value = read_json(path.as_ref())?;
        let extra = value.get(section).cloned().unwrap_or(Value::Null);
        Ok((Self::from_json(value)?, extra))
    }

    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sample_rate_hz == 0 {
            return Err(PipelineError::Config("sample_rate_hz must be positive".into()));
        }
        if self.samples_per_window == 0 {
            return Err(PipelineError::Config("samples_per_window must be positive".into()));
        }
        if self.channels_per_sample != AXES && self.channels_per_sample != MAX_CHANNELS {
            return Err(PipelineError::Config(format!(
                "channels_per_sample must be {} or {}, got {}",
                AXES, MAX_CHANNELS, self.channels_per_sample
            )));
        }
        if !(self.linear_scale > 0.0) || !(self.angular_scale > 0.0) {
            return Err(PipelineError::Config("scale factors must be positive".into()));
        }
        if self.labels.is_empty() {
            return Err(PipelineError::Config("label set is empty".into()));
        }
        for label in &self.labels {
            if label.is_empty() || label.len() > MAX_STATE_LABEL_LEN {
                return Err(PipelineError::Config(format!(
                    "label '{}' must be 1..={} bytes",
                    label, MAX_STATE_LABEL_LEN
                )));
            }
            if label == ANOMALY_LABEL {
                return Err(PipelineError::Config(format!("label '{}' is reserved", ANOMALY_LABEL)));
            }
        }
        Ok(())
    }

    pub fn window_len(&self) -> usize {
        self.samples_per_window * self.channels_per_sample
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.sample_rate_hz.max(1) as u64)
    }

    pub fn scale_factors(&self) -> ScaleFactors {
        ScaleFactors {
            linear: self.linear_scale,
            angular: self.angular_scale,
        }
    }

    pub fn cycle_pause(&self) -> Duration {
        Duration::from_millis(self.cycle_pause_ms)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Config file {} is not valid JSON", path.display()))
}
