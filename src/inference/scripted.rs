use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::core::StageTiming;
use crate::inference::{EngineOutput, InferenceEngine};

/// Engine that replays queued outcomes and records every window it saw.
pub struct ScriptedEngine {
    input_size: usize,
    label_count: usize,
    outcomes: VecDeque<Option<Vec<f32>>>,
    fallback: Vec<f32>,
    anomaly: Option<f32>,
    /// After this many calls, `input_size` reports `resized_to`
    resize_after: Option<(usize, usize)>,
    calls: Arc<Mutex<Vec<Vec<f32>>>>,
}

impl ScriptedEngine {
    /// Engine answering `fallback` for every window of `input_size` features.
    pub fn new(input_size: usize, fallback: Vec<f32>) -> Self {
        Self {
            input_size,
            label_count: fallback.len(),
            outcomes: VecDeque::new(),
            fallback,
            anomaly: None,
            resize_after: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn then_scores(mut self, scores: Vec<f32>) -> Self {
        self.outcomes.push_back(Some(scores));
        self
    }

    pub fn then_fail(mut self) -> Self {
        self.outcomes.push_back(None);
        self
    }

    pub fn with_anomaly(mut self, anomaly: f32) -> Self {
        self.anomaly = Some(anomaly);
        self
    }

    /// Simulate a model swap: after `calls` classifications the expected
    /// input size becomes `size`.
    pub fn resize_after(mut self, calls: usize, size: usize) -> Self {
        self.resize_after = Some((calls, size));
        self
    }

    /// Copies of every window passed to `classify`.
    pub fn calls(&self) -> Arc<Mutex<Vec<Vec<f32>>>> {
        self.calls.clone()
    }

    fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl InferenceEngine for ScriptedEngine {
    fn input_size(&self) -> usize {
        match self.resize_after {
            Some((after, size)) if self.call_count() >= after => size,
            _ => self.input_size,
        }
    }

    fn label_count(&self) -> usize {
        self.label_count
    }

    async fn classify(&mut self, features: &[f32]) -> Result<EngineOutput> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(features.to_vec());

        let scores = match self.outcomes.pop_front() {
            Some(Some(scores)) => scores,
            Some(None) => return Err(anyhow!("Scripted classifier failure")),
            None => self.fallback.clone(),
        };

        Ok(EngineOutput {
            scores,
            timing: StageTiming {
                dsp_ms: 1,
                classification_ms: 2,
                anomaly_ms: u32::from(self.anomaly.is_some()),
            },
            anomaly: self.anomaly,
        })
    }
}
