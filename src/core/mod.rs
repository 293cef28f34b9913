pub mod classification;
pub mod error;
pub mod reading;
pub mod record;
pub mod window;

pub use classification::{ClassificationResult, LabelScore, StageTiming, StateLabel, ANOMALY_LABEL};
pub use error::PipelineError;
pub use reading::{Reading, ScaleFactors, AXES, MAX_CHANNELS};
pub use record::{StateRecord, MAX_PAYLOAD_LEN, MAX_STATE_LABEL_LEN};
pub use window::FeatureWindow;
