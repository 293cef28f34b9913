use serde::{Deserialize, Serialize};

/// Reserved state reported when no trained label can be chosen.
pub const ANOMALY_LABEL: &str = "Anomaly";

/// Confidence assigned to one trained label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub value: f32,
}

/// Per-stage durations reported by the inference engine, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub dsp_ms: u32,
    pub classification_ms: u32,
    pub anomaly_ms: u32,
}

/// Outcome of classifying one feature window. Lives for a single cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    /// Scores in the fixed label order.
    pub scores: Vec<LabelScore>,
    pub timing: StageTiming,
    pub anomaly: Option<f32>,
}

/// Discrete activity state chosen from a classification result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLabel {
    index: Option<usize>,
    name: String,
}

impl StateLabel {
    pub fn trained(index: usize, name: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            name: name.into(),
        }
    }

    pub fn anomaly() -> Self {
        Self {
            index: None,
            name: ANOMALY_LABEL.to_string(),
        }
    }

    /// Position in the label set, `None` for the anomaly state.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_anomaly(&self) -> bool {
        self.index.is_none()
    }
}

impl std::fmt::Display for StateLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
