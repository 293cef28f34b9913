pub mod heuristic;
pub mod scripted;
pub mod traits;

pub use heuristic::HeuristicEngine;
pub use scripted::ScriptedEngine;
pub use traits::{EngineOutput, InferenceEngine};
