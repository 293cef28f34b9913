use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::PipelineConfig;
use crate::core::{FeatureWindow, PipelineError, StateRecord};
use crate::engine::state::CycleState;
use crate::hal::SampleSource;
use crate::inference::InferenceEngine;
use crate::nodes::{ClassifierAdapter, DecisionMapper, FeatureCollector, PublishDisposition, TelemetryPublisher};
use crate::observability::{MetricsCollector, PipelineMetrics, PipelineMonitor};
use crate::resilience::{FaultAction, FaultPolicy};
use crate::transport::{MessagingTransport, TransportSession};

/// Requests a graceful stop from outside the cycle task.
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Drives collect, classify, decide and publish in a loop.
///
/// Owns the one feature window and the transport session. Every exit from
/// [`run`](Self::run) goes through [`teardown`](Self::teardown), which also
/// runs on drop.
pub struct CycleOrchestrator {
    config: PipelineConfig,
    state: CycleState,
    window: FeatureWindow,
    source: Box<dyn SampleSource>,
    collector: FeatureCollector,
    classifier: ClassifierAdapter,
    mapper: DecisionMapper,
    publisher: TelemetryPublisher,
    session: TransportSession,
    policy: FaultPolicy,
    metrics: MetricsCollector,
    shutdown: ShutdownHandle,
    shutdown_rx: watch::Receiver<bool>,
    completed: u64,
    torn_down: bool,
}

impl CycleOrchestrator {
    pub fn new(
        config: PipelineConfig,
        source: Box<dyn SampleSource>,
        engine: Box<dyn InferenceEngine>,
        transport: Arc<dyn MessagingTransport>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;

        if engine.input_size() != config.window_len() {
            return Err(PipelineError::ConfigMismatch {
                expected: engine.input_size(),
                actual: config.window_len(),
            });
        }
        if engine.label_count() != config.labels.len() {
            return Err(PipelineError::LabelMismatch {
                expected: config.labels.len(),
                actual: engine.label_count(),
            });
        }

        let mut metrics = MetricsCollector::new();
        let pipeline = metrics.pipeline();

        let session = TransportSession::open(transport, &config.transport, pipeline.clone())?;

        let collector = FeatureCollector::new(config.sample_interval(), config.scale_factors(), pipeline.clone())
            .with_stage_metrics(metrics.stage("collector"));
        let classifier = ClassifierAdapter::new(engine, config.labels.clone(), pipeline.clone())
            .with_stage_metrics(metrics.stage("classifier"));
        let publisher = TelemetryPublisher::new(
            session.transport(),
            session.link(),
            pipeline,
            config.publish_timeout(),
        );

        let (tx, shutdown_rx) = watch::channel(false);

        log::info!(
            "Sampling {} at {} Hz, {} samples x {} channels per window",
            source.source_id(),
            config.sample_rate_hz,
            config.samples_per_window,
            config.channels_per_sample
        );

        Ok(Self {
            window: FeatureWindow::new(config.samples_per_window, config.channels_per_sample),
            config,
            state: CycleState::Idle,
            source,
            collector,
            classifier,
            mapper: DecisionMapper::new(),
            publisher,
            session,
            policy: FaultPolicy::new(),
            metrics,
            shutdown: ShutdownHandle { tx: Arc::new(tx) },
            shutdown_rx,
            completed: 0,
            torn_down: false,
        })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn state(&self) -> &CycleState {
        &self.state
    }

    pub fn cycles_completed(&self) -> u64 {
        self.completed
    }

    pub fn metrics(&self) -> Arc<PipelineMetrics> {
        self.metrics.pipeline()
    }

    pub fn monitor(&self) -> PipelineMonitor {
        PipelineMonitor::new(self.metrics.clone())
    }

    pub fn publisher(&self) -> &TelemetryPublisher {
        &self.publisher
    }

    pub fn session(&self) -> &TransportSession {
        &self.session
    }

    /// Run cycles until shutdown, `max_cycles`, or a fatal fault.
    ///
    /// Publish state is drained and the transport released before this
    /// returns, whatever the outcome.
    pub async fn run(&mut self) -> Result<(), PipelineError> {
        let result = self.run_cycles().await;
        if let Err(e) = &result {
            log::error!("Stopping on fatal {}: {}", e.kind(), e);
        }
        self.teardown();
        result
    }

    /// Close the publisher, then the session. Returns `true` only once.
    pub fn teardown(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;

        self.publisher.close();
        self.session.close();
        self.state = CycleState::ShuttingDown;
        log::info!("Shut down after {} completed cycles", self.completed);
        true
    }

    fn transition(&mut self, next: CycleState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(&next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state.name().to_string(),
                to: next.name().to_string(),
            });
        }
        log::trace!("{} -> {}", self.state.name(), next.name());
        self.state = next;
        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.shutdown.is_requested() || self.config.max_cycles.map_or(false, |max| self.completed >= max)
    }

    async fn run_cycles(&mut self) -> Result<(), PipelineError> {
        loop {
            if self.should_stop() {
                return self.transition(CycleState::ShuttingDown);
            }

            self.publisher.pump();
            self.transition(CycleState::Collecting)?;

            loop {
                let fault = match self.run_cycle().await {
                    Ok(()) => break,
                    Err(fault) => fault,
                };

                match self.policy.action_for(&fault) {
                    FaultAction::Shutdown => {
                        let aborting = CycleState::Aborting {
                            reason: fault.to_string(),
                            fatal: true,
                        };
                        let stopped = self
                            .transition(aborting)
                            .and_then(|()| self.transition(CycleState::ShuttingDown));
                        if let Err(e) = stopped {
                            log::error!("Could not stop cleanly from {}: {}", self.state.name(), e);
                        }
                        return Err(fault);
                    }
                    FaultAction::RestartCollection | FaultAction::SkipPublish => {
                        log::warn!("{}; restarting collection", fault);
                        self.transition(CycleState::Aborting {
                            reason: fault.to_string(),
                            fatal: false,
                        })?;
                        if self.shutdown.is_requested() {
                            return self.transition(CycleState::ShuttingDown);
                        }
                        self.publisher.pump();
                        self.transition(CycleState::Collecting)?;
                    }
                }
            }

            if !self.should_stop() {
                self.pause().await;
            }
        }
    }

    /// One pass from `Collecting` back to `Idle`.
    async fn run_cycle(&mut self) -> Result<(), PipelineError> {
        self.collector.collect(&mut *self.source, &mut self.window).await?;

        if !self.window.is_complete() {
            return Err(PipelineError::IncompleteWindow {
                filled: self.window.filled_samples(),
                capacity: self.window.samples_per_window(),
            });
        }
        self.transition(CycleState::Classifying)?;
        let result = self.classifier.classify(&self.window).await?;

        self.transition(CycleState::Deciding)?;
        let label = self.mapper.decide(&result);
        let record = StateRecord::new(self.config.device_id, &label, self.config.state_duration_ms)
            .with_anomaly(result.anomaly);

        self.transition(CycleState::Publishing)?;
        match self.publisher.publish(&record) {
            PublishDisposition::Submitted | PublishDisposition::Queued => {}
            other => log::debug!("Record for {} not submitted: {:?}", label, other),
        }

        self.transition(CycleState::Idle)?;
        self.completed += 1;
        self.metrics.pipeline().record_cycle_completed();
        log::info!("Cycle {} reported state {}", self.completed, label);
        Ok(())
    }

    async fn pause(&mut self) {
        let pause = self.config.cycle_pause();
        if pause.is_zero() {
            return;
        }

        let mut rx = self.shutdown_rx.clone();
        tokio::select! {
            _ = sleep(pause) => {}
            _ = rx.wait_for(|stop| *stop) => {
                log::info!("Shutdown requested during pause");
            }
        }
    }
}

impl Drop for CycleOrchestrator {
    fn drop(&mut self) {
        self.teardown();
    }
}
