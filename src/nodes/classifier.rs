use std::sync::Arc;

use crate::core::{ClassificationResult, FeatureWindow, LabelScore, PipelineError};
use crate::inference::InferenceEngine;
use crate::observability::{PipelineMetrics, StageMetrics};

/// Runs the inference engine over a completely filled window.
pub struct ClassifierAdapter {
    engine: Box<dyn InferenceEngine>,
    labels: Vec<String>,
    metrics: Arc<PipelineMetrics>,
    stage: Option<Arc<StageMetrics>>,
}

impl ClassifierAdapter {
    pub fn new(engine: Box<dyn InferenceEngine>, labels: Vec<String>, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            engine,
            labels,
            metrics,
            stage: None,
        }
    }

    pub fn with_stage_metrics(mut self, stage: Arc<StageMetrics>) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn input_size(&self) -> usize {
        self.engine.input_size()
    }

    pub async fn classify(&mut self, window: &FeatureWindow) -> Result<ClassificationResult, PipelineError> {
        let expected = self.engine.input_size();
        if window.len() != expected {
            return Err(PipelineError::ConfigMismatch {
                expected,
                actual: window.len(),
            });
        }

        let features = window.as_complete().ok_or(PipelineError::IncompleteWindow {
            filled: window.filled_samples(),
            capacity: window.samples_per_window(),
        })?;

        let started = self.stage.as_ref().map(|s| s.start_processing());
        let output = match self.engine.classify(features).await {
            Ok(output) => output,
            Err(e) => {
                self.metrics.record_inference_fault();
                if let Some(stage) = &self.stage {
                    stage.record_error();
                }
                return Err(PipelineError::InferenceFault(e.to_string()));
            }
        };

        if output.scores.len() != self.labels.len() {
            return Err(PipelineError::LabelMismatch {
                expected: self.labels.len(),
                actual: output.scores.len(),
            });
        }

        if let (Some(stage), Some(started)) = (&self.stage, started) {
            stage.finish_processing(started);
            stage.record_processed();
        }

        log::debug!(
            "Predictions (DSP: {} ms., Classification: {} ms., Anomaly: {} ms.)",
            output.timing.dsp_ms,
            output.timing.classification_ms,
            output.timing.anomaly_ms
        );
        let scores: Vec<LabelScore> = self
            .labels
            .iter()
            .zip(output.scores)
            .map(|(label, value)| {
                log::debug!("    {}: {:.5}", label, value);
                LabelScore {
                    label: label.clone(),
                    value,
                }
            })
            .collect();
        if let Some(anomaly) = output.anomaly {
            log::debug!("    anomaly score: {:.3}", anomaly);
        }

        Ok(ClassificationResult {
            scores,
            timing: output.timing,
            anomaly: output.anomaly,
        })
    }
}
