use anyhow::Result;
use async_trait::async_trait;

use crate::core::StageTiming;

/// Raw output of one inference pass, scores in the model's label order.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOutput {
    pub scores: Vec<f32>,
    pub timing: StageTiming,
    pub anomaly: Option<f32>,
}

/// Trait implemented by on-device inference back-ends
#[async_trait]
pub trait InferenceEngine: Send {
    /// Number of features the model consumes per window
    fn input_size(&self) -> usize;

    /// Number of trained classes
    fn label_count(&self) -> usize;

    /// Classify one complete feature window
    async fn classify(&mut self, features: &[f32]) -> Result<EngineOutput>;
}
