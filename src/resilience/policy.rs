use crate::core::PipelineError;

/// What the orchestrator does after a cycle reports a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    /// Discard the partial window and collect again from sample 0
    RestartCollection,

    /// Drop this cycle's record and collect again
    SkipPublish,

    /// Tear down and stop
    Shutdown,
}

/// Maps each fault kind to a recovery action.
#[derive(Debug, Clone, Default)]
pub struct FaultPolicy;

impl FaultPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn action_for(&self, fault: &PipelineError) -> FaultAction {
        if fault.is_fatal() {
            return FaultAction::Shutdown;
        }
        match fault {
            PipelineError::SampleFault { .. } => FaultAction::RestartCollection,
            _ => FaultAction::SkipPublish,
        }
    }
}
