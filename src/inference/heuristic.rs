// Stand-in classifier used on hosts without a compiled model.
//
// Buckets the mean absolute feature magnitude into one of four classes in the
// default label order [Squat, Stand, Stoop, Walk]. Good enough to drive the
// whole loop end to end; not a motion model.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::time::Instant;

use crate::core::StageTiming;
use crate::inference::{EngineOutput, InferenceEngine};

pub const HEURISTIC_LABEL_COUNT: usize = 4;

/// Confidence given to the winning bucket.
pub const WINNER_CONFIDENCE: f32 = 0.9;

pub struct HeuristicEngine {
    input_size: usize,
}

impl HeuristicEngine {
    pub fn new(input_size: usize) -> Self {
        Self { input_size }
    }

    /// Bucket index for a mean absolute magnitude.
    pub fn bucket_for(mean_abs: f32) -> usize {
        if mean_abs < 0.2 {
            1 // Stand
        } else if mean_abs < 0.6 {
            0 // Squat
        } else if mean_abs < 1.2 {
            2 // Stoop
        } else {
            3 // Walk
        }
    }
}

#[async_trait]
impl InferenceEngine for HeuristicEngine {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn label_count(&self) -> usize {
        HEURISTIC_LABEL_COUNT
    }

    async fn classify(&mut self, features: &[f32]) -> Result<EngineOutput> {
        if features.is_empty() {
            return Err(anyhow!("Empty feature window"));
        }

        let started = Instant::now();
        let mean_abs = features.iter().map(|v| v.abs()).sum::<f32>() / features.len() as f32;
        if !mean_abs.is_finite() {
            return Err(anyhow!("Non-finite feature magnitude"));
        }

        let winner = Self::bucket_for(mean_abs);
        let rest = (1.0 - WINNER_CONFIDENCE) / (HEURISTIC_LABEL_COUNT - 1) as f32;
        let scores = (0..HEURISTIC_LABEL_COUNT)
            .map(|ix| if ix == winner { WINNER_CONFIDENCE } else { rest })
            .collect();

        log::debug!("heuristic inference: mean |f| = {:.3} -> class {}", mean_abs, winner);

        Ok(EngineOutput {
            scores,
            timing: StageTiming {
                dsp_ms: 0,
                classification_ms: started.elapsed().as_millis() as u32,
                anomaly_ms: 0,
            },
            anomaly: None,
        })
    }
}
