use std::sync::Arc;

use tokio::time::{sleep_until, Duration, Instant};

use crate::core::{FeatureWindow, PipelineError, Reading, ScaleFactors};
use crate::hal::SampleSource;
use crate::observability::{PipelineMetrics, StageMetrics};

/// Fills the feature window at a fixed sample rate.
///
/// Each sample is drawn no earlier than one interval after the previous
/// draw. A slow read shortens the following wait instead of shifting every
/// later sample, so the rate holds across the window.
pub struct FeatureCollector {
    interval: Duration,
    scale: ScaleFactors,
    metrics: Arc<PipelineMetrics>,
    stage: Option<Arc<StageMetrics>>,
}

impl FeatureCollector {
    pub fn new(interval: Duration, scale: ScaleFactors, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            interval,
            scale,
            metrics,
            stage: None,
        }
    }

    pub fn with_stage_metrics(mut self, stage: Arc<StageMetrics>) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Collect one full window from `source`.
    ///
    /// The window is reset first. On error the partial fill stays behind the
    /// cursor and `window.as_complete()` keeps returning `None`.
    pub async fn collect(
        &self,
        source: &mut dyn SampleSource,
        window: &mut FeatureWindow,
    ) -> Result<(), PipelineError> {
        window.reset();
        let started = self.stage.as_ref().map(|s| s.start_processing());

        let mut last_draw: Option<Instant> = None;
        for sample_index in 0..window.samples_per_window() {
            if let Some(previous) = last_draw {
                sleep_until(previous + self.interval).await;
            }
            last_draw = Some(Instant::now());

            let reading = match self.read_with_retry(source, sample_index).await {
                Ok(reading) => reading,
                Err(e) => {
                    if let Some(stage) = &self.stage {
                        stage.record_error();
                    }
                    return Err(e);
                }
            };
            window.push_reading(&reading, &self.scale);
        }

        if let (Some(stage), Some(started)) = (&self.stage, started) {
            stage.finish_processing(started);
            stage.record_processed();
        }
        Ok(())
    }

    async fn read_with_retry(
        &self,
        source: &mut dyn SampleSource,
        sample_index: usize,
    ) -> Result<Reading, PipelineError> {
        match source.read().await {
            Ok(reading) => Ok(reading),
            Err(first) => {
                self.metrics.record_sample_retry();
                log::debug!(
                    "{}: read {} failed ({}), retrying",
                    source.source_id(),
                    sample_index,
                    first
                );
                source.read().await.map_err(|e| {
                    self.metrics.record_sample_fault();
                    PipelineError::SampleFault {
                        sample_index,
                        source: e.into(),
                    }
                })
            }
        }
    }
}
