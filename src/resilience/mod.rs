pub mod policy;

pub use policy::{FaultAction, FaultPolicy};
