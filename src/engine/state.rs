use serde::{Deserialize, Serialize};

/// Phases of one sampling-inference-publish cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CycleState {
    Idle,
    Collecting,
    Classifying,
    Deciding,
    Publishing,
    Aborting { reason: String, fatal: bool },
    ShuttingDown,
}

impl CycleState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &CycleState) -> bool {
        use CycleState::*;

        matches!(
            (self, target),
            // From Idle
            (Idle, Collecting) |
            (Idle, ShuttingDown) |

            // Main cycle
            (Collecting, Classifying) |
            (Classifying, Deciding) |
            (Deciding, Publishing) |
            (Publishing, Idle) |

            // Faults
            (Collecting, Aborting { .. }) |
            (Classifying, Aborting { .. }) |

            // From Aborting
            (Aborting { fatal: false, .. }, Collecting) |
            (Aborting { .. }, ShuttingDown)
        )
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Collecting => "Collecting",
            Self::Classifying => "Classifying",
            Self::Deciding => "Deciding",
            Self::Publishing => "Publishing",
            Self::Aborting { .. } => "Aborting",
            Self::ShuttingDown => "ShuttingDown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ShuttingDown)
    }
}

impl Default for CycleState {
    fn default() -> Self {
        Self::Idle
    }
}
