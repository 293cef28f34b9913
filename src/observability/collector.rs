use std::collections::HashMap;
use std::sync::Arc;
use super::{PipelineMetrics, StageMetrics};

#[derive(Debug, Clone)]
pub struct StageSnapshot {
    pub stage_id: String,
    pub processed: u64,
    pub errors_count: u64,
    pub avg_latency_us: u64,
}

/// Holds every stage's metrics plus the loop-wide counters.
pub struct MetricsCollector {
    stages: HashMap<String, Arc<StageMetrics>>,
    pipeline: Arc<PipelineMetrics>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
            pipeline: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Create (or fetch) the metrics for a stage and keep them registered.
    pub fn stage(&mut self, stage_id: &str) -> Arc<StageMetrics> {
        self.stages
            .entry(stage_id.to_string())
            .or_insert_with(|| Arc::new(StageMetrics::new(stage_id)))
            .clone()
    }

    pub fn register(&mut self, stage_id: impl Into<String>, metrics: Arc<StageMetrics>) {
        self.stages.insert(stage_id.into(), metrics);
    }

    pub fn pipeline(&self) -> Arc<PipelineMetrics> {
        self.pipeline.clone()
    }

    pub fn snapshot(&self) -> HashMap<String, StageSnapshot> {
        self.stages
            .iter()
            .map(|(id, metrics)| {
                (
                    id.clone(),
                    StageSnapshot {
                        stage_id: metrics.stage_id().to_string(),
                        processed: metrics.processed(),
                        errors_count: metrics.errors_count(),
                        avg_latency_us: metrics.avg_latency_us(),
                    },
                )
            })
            .collect()
    }

    pub fn get_stage_metrics(&self, stage_id: &str) -> Option<Arc<StageMetrics>> {
        self.stages.get(stage_id).cloned()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            stages: self.stages.clone(),
            pipeline: self.pipeline.clone(),
        }
    }
}
