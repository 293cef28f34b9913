pub mod orchestrator;
pub mod state;

pub use orchestrator::{CycleOrchestrator, ShutdownHandle};
pub use state::CycleState;
