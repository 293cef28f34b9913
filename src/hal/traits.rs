use anyhow::Result;
use async_trait::async_trait;

use crate::core::Reading;

/// Trait implemented by motion sensor drivers.
///
/// One call returns one multi-axis reading; implementations keep no buffer
/// between calls, and each call has bounded latency.
#[async_trait]
pub trait SampleSource: Send {
    /// Short identifier used in logs (e.g., "lsm6dsl", "simulated-imu")
    fn source_id(&self) -> &str;

    /// Read the current axis sample
    async fn read(&mut self) -> Result<Reading>;
}
