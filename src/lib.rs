pub mod config;
pub mod core;
pub mod engine;
pub mod hal;
pub mod inference;
pub mod nodes;
pub mod observability;
pub mod resilience;
pub mod transport;
