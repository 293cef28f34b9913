use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time::{Duration, Instant};

use crate::core::StateRecord;
use crate::observability::PipelineMetrics;
use crate::transport::{LinkState, MessagingTransport, PublishResult};

/// Id value meaning "no publish outstanding".
const NO_HANDLE: u64 = 0;

/// What happened to a record handed to [`TelemetryPublisher::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishDisposition {
    /// Handed to the transport
    Submitted,
    /// Parked in the empty pending slot behind the outstanding publish
    Queued,
    /// Replaced an older pending payload, which was dropped
    Superseded,
    /// Link is down; the record was counted and discarded
    DroppedDisconnected,
    /// Serialization failed or the transport refused the submission
    Rejected,
}

/// Completion state shared with the transport's callback context.
///
/// Callbacks only touch these atomics; the publisher reaps the handle on its
/// own task.
pub struct PublishSlot {
    outstanding: AtomicU64,
    closed: AtomicBool,
    metrics: Arc<PipelineMetrics>,
}

impl PublishSlot {
    fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            outstanding: AtomicU64::new(NO_HANDLE),
            closed: AtomicBool::new(false),
            metrics,
        }
    }

    /// Completion callback body for the publish with handle `id`.
    pub fn on_publish_complete(&self, id: u64, result: PublishResult) {
        if self.closed.load(Ordering::Acquire) {
            self.metrics.record_late_completion();
            log::debug!("Ignoring completion for publish #{} after close ({:?})", id, result);
            return;
        }

        if self
            .outstanding
            .compare_exchange(id, NO_HANDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.metrics.record_late_completion();
            log::debug!("Ignoring stale completion for publish #{} ({:?})", id, result);
            return;
        }

        if result.is_ok() {
            self.metrics.record_publish_acked();
            log::info!("Confirmation received for publish #{}", id);
        } else {
            self.metrics.record_publish_failure();
            log::warn!("Publish #{} failed: {:?}", id, result);
        }
    }

    pub fn outstanding_id(&self) -> Option<u64> {
        match self.outstanding.load(Ordering::Acquire) {
            NO_HANDLE => None,
            id => Some(id),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// The single publish in flight.
#[derive(Debug)]
pub struct PublishHandle {
    pub id: u64,
    pub payload: String,
    pub submitted_at: Instant,
}

/// Serializes state records and keeps at most one publish in flight.
///
/// A record produced while a publish is outstanding waits in a single pending
/// slot; a newer record replaces it. The cycle loop never waits on the
/// transport.
pub struct TelemetryPublisher {
    transport: Arc<dyn MessagingTransport>,
    link: Arc<LinkState>,
    slot: Arc<PublishSlot>,
    metrics: Arc<PipelineMetrics>,
    timeout: Duration,
    outstanding: Option<PublishHandle>,
    pending: Option<String>,
    next_id: u64,
}

impl TelemetryPublisher {
    pub fn new(
        transport: Arc<dyn MessagingTransport>,
        link: Arc<LinkState>,
        metrics: Arc<PipelineMetrics>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            link,
            slot: Arc::new(PublishSlot::new(metrics.clone())),
            metrics,
            timeout,
            outstanding: None,
            pending: None,
            next_id: 1,
        }
    }

    pub fn publish(&mut self, record: &StateRecord) -> PublishDisposition {
        if self.slot.is_closed() {
            log::warn!("Publisher closed, discarding {} record", record.state);
            return PublishDisposition::Rejected;
        }

        let payload = match record.to_payload() {
            Ok(payload) => payload,
            Err(e) => {
                self.metrics.record_publish_failure();
                log::error!("{}", e);
                return PublishDisposition::Rejected;
            }
        };

        if !self.link.is_connected() {
            // A waiting record is older than this one and must not go out later.
            if let Some(stale) = self.pending.take() {
                self.metrics.record_publish_dropped();
                log::warn!("Not connected, dropping message: {}", stale);
            }
            self.metrics.record_publish_dropped();
            log::warn!("Not connected, dropping message: {}", payload);
            return PublishDisposition::DroppedDisconnected;
        }

        self.reap();
        if self.outstanding.is_none() {
            if let Some(older) = self.pending.take() {
                self.metrics.record_publish_superseded();
                log::debug!("Superseded pending message: {}", older);
            }
            return self.submit(payload);
        }

        match self.pending.replace(payload) {
            Some(older) => {
                self.metrics.record_publish_superseded();
                log::debug!("Superseded pending message: {}", older);
                PublishDisposition::Superseded
            }
            None => PublishDisposition::Queued,
        }
    }

    /// Reap a finished or timed-out handle, then flush the pending slot.
    pub fn pump(&mut self) {
        if self.slot.is_closed() {
            return;
        }
        self.reap();

        if !self.link.is_connected() {
            if let Some(dropped) = self.pending.take() {
                self.metrics.record_publish_dropped();
                log::warn!("Not connected, dropping message: {}", dropped);
            }
            return;
        }

        if self.outstanding.is_none() {
            if let Some(payload) = self.pending.take() {
                self.submit(payload);
            }
        }
    }

    /// Close the outstanding handle and drop the pending payload.
    ///
    /// Returns `true` only for the first call.
    pub fn close(&mut self) -> bool {
        if self.slot.closed.swap(true, Ordering::AcqRel) {
            return false;
        }

        if let Some(handle) = self.outstanding.take() {
            self.slot.outstanding.store(NO_HANDLE, Ordering::Release);
            self.close_handle(&handle, "teardown");
        }
        if let Some(dropped) = self.pending.take() {
            self.metrics.record_publish_dropped();
            log::debug!("Discarding pending message at teardown: {}", dropped);
        }
        true
    }

    pub fn has_outstanding(&self) -> bool {
        self.outstanding.is_some()
    }

    pub fn outstanding(&self) -> Option<&PublishHandle> {
        self.outstanding.as_ref()
    }

    pub fn pending_payload(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    pub fn slot(&self) -> Arc<PublishSlot> {
        self.slot.clone()
    }

    fn submit(&mut self, payload: String) -> PublishDisposition {
        let id = self.next_id;
        self.next_id += 1;

        // Armed before submission: the callback may fire before publish_async returns.
        self.slot.outstanding.store(id, Ordering::Release);
        let slot = self.slot.clone();
        let on_complete = Box::new(move |result| slot.on_publish_complete(id, result));

        log::info!("Sending message: {}", payload);
        match self.transport.publish_async(payload.clone(), on_complete) {
            Ok(()) => {
                self.metrics.record_publish_submitted();
                self.outstanding = Some(PublishHandle {
                    id,
                    payload,
                    submitted_at: Instant::now(),
                });
                PublishDisposition::Submitted
            }
            Err(e) => {
                let _ = self.slot.outstanding.compare_exchange(
                    id,
                    NO_HANDLE,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
                self.metrics.record_publish_failure();
                log::error!("Failed to send message {}: {}", payload, e);
                PublishDisposition::Rejected
            }
        }
    }

    fn reap(&mut self) {
        let Some(handle) = &self.outstanding else {
            return;
        };

        if self.slot.outstanding.load(Ordering::Acquire) != handle.id {
            if let Some(handle) = self.outstanding.take() {
                self.close_handle(&handle, "completed");
            }
            return;
        }

        if handle.submitted_at.elapsed() < self.timeout {
            return;
        }

        let abandoned = self
            .slot
            .outstanding
            .compare_exchange(handle.id, NO_HANDLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if let Some(handle) = self.outstanding.take() {
            if abandoned {
                self.metrics.record_publish_timeout();
                log::warn!(
                    "Publish #{} not confirmed after {:?}, abandoning it",
                    handle.id,
                    self.timeout
                );
                self.close_handle(&handle, "timed out");
            } else {
                self.close_handle(&handle, "completed");
            }
        }
    }

    fn close_handle(&self, handle: &PublishHandle, why: &str) {
        self.metrics.record_handle_closed();
        log::debug!("Closed publish handle #{} ({})", handle.id, why);
    }
}
