use crate::core::Reading;
use crate::hal::SampleSource;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::time::{sleep, Duration, Instant};

/// One scripted read: how long it takes and what it returns.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub latency: Duration,
    pub outcome: Option<Reading>,
}

impl ScriptStep {
    pub fn ok(reading: Reading) -> Self {
        Self { latency: Duration::ZERO, outcome: Some(reading) }
    }

    pub fn fail() -> Self {
        Self { latency: Duration::ZERO, outcome: None }
    }

    pub fn after(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Source that replays a fixed step list, then repeats a fallback reading.
///
/// Every read records the instant it started, so tests can measure the
/// effective sample rate.
pub struct ScriptedSource {
    steps: VecDeque<ScriptStep>,
    fallback: ScriptStep,
    draws: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedSource {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>, fallback: Reading) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            fallback: ScriptStep::ok(fallback),
            draws: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Latency applied to reads once the script is exhausted.
    pub fn with_fallback_latency(mut self, latency: Duration) -> Self {
        self.fallback.latency = latency;
        self
    }

    /// Shared view of draw instants, readable after the source is moved.
    pub fn draws(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.draws.clone()
    }
}

#[async_trait]
impl SampleSource for ScriptedSource {
    fn source_id(&self) -> &str {
        "scripted"
    }

    async fn read(&mut self) -> Result<Reading> {
        self.draws
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Instant::now());

        let step = self.steps.pop_front().unwrap_or_else(|| self.fallback.clone());
        if !step.latency.is_zero() {
            sleep(step.latency).await;
        }

        step.outcome.ok_or_else(|| anyhow!("Scripted read failure"))
    }
}
