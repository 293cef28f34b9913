pub mod classifier;
pub mod collector;
pub mod decision;
pub mod publisher;

pub use classifier::ClassifierAdapter;
pub use collector::FeatureCollector;
pub use decision::DecisionMapper;
pub use publisher::{PublishDisposition, PublishHandle, PublishSlot, TelemetryPublisher};
