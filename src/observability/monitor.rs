use super::MetricsCollector;

/// Renders collected metrics as a human-readable report.
pub struct PipelineMonitor {
    collector: MetricsCollector,
}

fn plural(count: u64, noun: &str) -> String {
    format!("{} {}{}", count, noun, if count == 1 { "" } else { "s" })
}

impl PipelineMonitor {
    pub fn new(collector: MetricsCollector) -> Self {
        Self { collector }
    }

    pub fn generate_report(&self) -> String {
        let mut stages: Vec<_> = self.collector.snapshot().into_values().collect();
        stages.sort_by(|a, b| a.stage_id.cmp(&b.stage_id));

        let mut report = String::from("=== Pipeline Metrics ===\n");

        for stage in &stages {
            report.push_str(&format!(
                "\n[{}]\n  Processed: {}\n  Errors: {}\n  Avg Latency: {}μs\n",
                stage.stage_id,
                stage.processed,
                plural(stage.errors_count, "error"),
                stage.avg_latency_us
            ));
        }

        let p = self.collector.pipeline();
        report.push_str(&format!(
            "\n[loop]\n  Cycles: {}\n  Sample faults: {} ({} retried reads)\n  Inference faults: {}\n",
            plural(p.cycles_completed(), "cycle"),
            p.sample_faults(),
            p.sample_retries(),
            p.inference_faults(),
        ));
        report.push_str(&format!(
            "\n[publish]\n  Submitted: {}\n  Acked: {}\n  Failed: {}\n  Superseded: {}\n  Dropped: {}\n  Timed out: {}\n  Inbound: {}\n",
            p.publish_submitted(),
            p.publish_acked(),
            p.publish_failures(),
            p.publish_superseded(),
            p.publish_dropped(),
            p.publish_timeouts(),
            plural(p.inbound_messages(), "message"),
        ));

        report
    }

    pub fn collector(&self) -> &MetricsCollector {
        &self.collector
    }
}
