use crate::core::Reading;
use crate::hal::SampleSource;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::f64::consts::PI;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone)]
enum MotionMode {
    /// Same reading on every call
    Constant(Reading),
    /// Sinusoidal linear acceleration around 1 g on z
    Oscillating { amplitude_mg: f64, period_samples: u64 },
}

/// Host-side stand-in for the 6-axis IMU.
pub struct SimulatedImu {
    mode: MotionMode,
    /// Per-read latencies, applied round-robin
    latencies: Vec<Duration>,
    /// Every Nth read fails (0 disables)
    fail_every: u64,
    reads: u64,
}

impl Default for SimulatedImu {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedImu {
    pub fn new() -> Self {
        Self {
            mode: MotionMode::Constant(Reading::new([0, 0, 1000], [0, 0, 0])),
            latencies: Vec::new(),
            fail_every: 0,
            reads: 0,
        }
    }

    pub fn constant(reading: Reading) -> Self {
        Self {
            mode: MotionMode::Constant(reading),
            ..Self::new()
        }
    }

    pub fn configure(&mut self, config: &Value) -> Result<()> {
        let mode = config["mode"].as_str().unwrap_or("constant");

        self.mode = match mode {
            "constant" => {
                let linear = axes_from(&config["linear"]).unwrap_or([0, 0, 1000]);
                let angular = axes_from(&config["angular"]).unwrap_or([0, 0, 0]);
                MotionMode::Constant(Reading::new(linear, angular))
            }
            "oscillating" => MotionMode::Oscillating {
                amplitude_mg: config["amplitude_mg"].as_f64().unwrap_or(500.0),
                period_samples: config["period_samples"].as_u64().unwrap_or(50).max(1),
            },
            _ => return Err(anyhow!("Unknown motion mode: {}", mode)),
        };

        if let Some(latencies) = config["latencies_us"].as_array() {
            self.latencies = latencies
                .iter()
                .filter_map(|v| v.as_u64())
                .map(Duration::from_micros)
                .collect();
        }
        if let Some(n) = config["fail_every"].as_u64() {
            self.fail_every = n;
        }

        Ok(())
    }

    fn current_reading(&self) -> Reading {
        match &self.mode {
            MotionMode::Constant(reading) => *reading,
            MotionMode::Oscillating { amplitude_mg, period_samples } => {
                let phase = 2.0 * PI * (self.reads % period_samples) as f64 / *period_samples as f64;
                let swing = (amplitude_mg * phase.sin()) as i32;
                let turn = (amplitude_mg * 10.0 * phase.cos()) as i32;
                Reading::new([swing, swing / 2, 1000 + swing], [turn, 0, -turn])
            }
        }
    }
}

fn axes_from(value: &Value) -> Option<[i32; 3]> {
    let arr = value.as_array()?;
    if arr.len() != 3 {
        return None;
    }
    let mut out = [0i32; 3];
    for (slot, v) in out.iter_mut().zip(arr) {
        *slot = v.as_i64()? as i32;
    }
    Some(out)
}

#[async_trait]
impl SampleSource for SimulatedImu {
    fn source_id(&self) -> &str {
        "simulated-imu"
    }

    async fn read(&mut self) -> Result<Reading> {
        if !self.latencies.is_empty() {
            let latency = self.latencies[(self.reads % self.latencies.len() as u64) as usize];
            sleep(latency).await;
        }

        self.reads += 1;
        if self.fail_every > 0 && self.reads % self.fail_every == 0 {
            return Err(anyhow!("Simulated I2C read failure on read {}", self.reads));
        }

        Ok(self.current_reading())
    }
}
