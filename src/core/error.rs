use thiserror::Error;

/// Every fault the sampling-inference-publish loop can observe.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Sensor read failed twice for the same sample.
    #[error("sample fault at sample {sample_index}: {source}")]
    SampleFault {
        sample_index: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("inference fault: {0}")]
    InferenceFault(String),

    /// Window geometry disagrees with the model's input size.
    #[error("config mismatch: classifier expects {expected} features, window holds {actual}")]
    ConfigMismatch { expected: usize, actual: usize },

    #[error("label mismatch: {expected} labels configured, engine produced {actual} scores")]
    LabelMismatch { expected: usize, actual: usize },

    #[error("incomplete window: {filled} of {capacity} samples written")]
    IncompleteWindow { filled: usize, capacity: usize },

    #[error("invalid cycle transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("publish fault: {0}")]
    PublishFault(String),

    #[error("connection fault: {0}")]
    ConnectionFault(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Fatal faults end the run after teardown; the rest self-heal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigMismatch { .. }
                | Self::LabelMismatch { .. }
                | Self::IncompleteWindow { .. }
                | Self::InvalidTransition { .. }
                | Self::Config(_)
        )
    }

    /// Short kind name used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SampleFault { .. } => "SampleFault",
            Self::InferenceFault(_) => "InferenceFault",
            Self::ConfigMismatch { .. } => "ConfigMismatch",
            Self::LabelMismatch { .. } => "LabelMismatch",
            Self::IncompleteWindow { .. } => "IncompleteWindow",
            Self::InvalidTransition { .. } => "InvalidTransition",
            Self::PublishFault(_) => "PublishFault",
            Self::ConnectionFault(_) => "ConnectionFault",
            Self::Config(_) => "Config",
        }
    }
}
