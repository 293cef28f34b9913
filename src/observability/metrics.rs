use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Processed/error counters and latency for one pipeline stage.
pub struct StageMetrics {
    stage_id: String,
    processed: AtomicU64,
    errors_count: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl StageMetrics {
    pub fn new(stage_id: impl Into<String>) -> Self {
        Self {
            stage_id: stage_id.into(),
            processed: AtomicU64::new(0),
            errors_count: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }

    pub fn stage_id(&self) -> &str {
        &self.stage_id
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn errors_count(&self) -> u64 {
        self.errors_count.load(Ordering::Relaxed)
    }

    pub fn record_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_processing(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_processing(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }
}

/// Loop-wide fault and publish counters.
///
/// Written from the cycle task and from transport callbacks, so every field
/// is an atomic.
#[derive(Default)]
pub struct PipelineMetrics {
    cycles_completed: AtomicU64,
    sample_retries: AtomicU64,
    sample_faults: AtomicU64,
    inference_faults: AtomicU64,
    publish_submitted: AtomicU64,
    publish_acked: AtomicU64,
    publish_failures: AtomicU64,
    publish_superseded: AtomicU64,
    publish_dropped: AtomicU64,
    publish_timeouts: AtomicU64,
    handles_closed: AtomicU64,
    late_completions: AtomicU64,
    inbound_messages: AtomicU64,
    connection_faults: AtomicU64,
}

macro_rules! counter {
    ($read:ident, $record:ident) => {
        pub fn $read(&self) -> u64 {
            self.$read.load(Ordering::Relaxed)
        }

        pub fn $record(&self) {
            self.$read.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    counter!(cycles_completed, record_cycle_completed);
    counter!(sample_retries, record_sample_retry);
    counter!(sample_faults, record_sample_fault);
    counter!(inference_faults, record_inference_fault);
    counter!(publish_submitted, record_publish_submitted);
    counter!(publish_acked, record_publish_acked);
    counter!(publish_failures, record_publish_failure);
    counter!(publish_superseded, record_publish_superseded);
    counter!(publish_dropped, record_publish_dropped);
    counter!(publish_timeouts, record_publish_timeout);
    counter!(handles_closed, record_handle_closed);
    counter!(late_completions, record_late_completion);
    counter!(inbound_messages, record_inbound_message);
    counter!(connection_faults, record_connection_fault);
}
