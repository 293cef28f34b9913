pub mod imu;
pub mod scripted;

pub use imu::SimulatedImu;
pub use scripted::{ScriptStep, ScriptedSource};
