use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::TransportConfig;
use crate::core::PipelineError;
use crate::observability::PipelineMetrics;
use super::traits::MessagingTransport;
use super::types::{ConnectionReason, ConnectionStatus, MessageDisposition, TransportOption};

/// Connection state written by the transport's status callback and read by
/// the publisher.
pub struct LinkState {
    connected: AtomicBool,
    metrics: Arc<PipelineMetrics>,
}

impl LinkState {
    pub fn new(metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            connected: AtomicBool::new(false),
            metrics,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn on_connection_status(&self, status: ConnectionStatus, reason: ConnectionReason) {
        match status {
            ConnectionStatus::Authenticated => {
                self.connected.store(true, Ordering::Release);
                log::info!("Connected to telemetry hub");
            }
            ConnectionStatus::Unauthenticated => {
                let was_connected = self.connected.swap(false, Ordering::AcqRel);
                self.metrics.record_connection_fault();
                if was_connected {
                    log::warn!("Connection lost, reason: {:?}; dropping publishes until it returns", reason);
                } else {
                    log::error!("Connection failed, reason: {:?}", reason);
                }
            }
        }
    }
}

/// Handler for cloud-to-device messages.
pub fn on_message_received(body: &[u8], metrics: &PipelineMetrics) -> MessageDisposition {
    metrics.record_inbound_message();
    match std::str::from_utf8(body) {
        Ok(text) => {
            log::info!("Message received from hub: {}", text);
            MessageDisposition::Accepted
        }
        Err(_) => {
            log::error!("Failed to extract message data ({} bytes)", body.len());
            MessageDisposition::Abandoned
        }
    }
}

/// Owned connection to the messaging transport.
///
/// The connection is released exactly once: by [`close`] or, failing that,
/// on drop. Every exit path of the orchestrator (including a failed open)
/// therefore disconnects.
///
/// [`close`]: TransportSession::close
pub struct TransportSession {
    transport: Arc<dyn MessagingTransport>,
    link: Arc<LinkState>,
    released: bool,
}

impl TransportSession {
    /// Apply options, install callbacks and start connecting.
    pub fn open(
        transport: Arc<dyn MessagingTransport>,
        config: &TransportConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Result<Self, PipelineError> {
        log::info!("Initializing {} client", transport.transport_id());

        let link = Arc::new(LinkState::new(metrics.clone()));
        let mut session = Self {
            transport,
            link,
            released: false,
        };

        session.apply(TransportOption::LogTrace(config.log_trace))?;
        if let Some(certs) = &config.trusted_certificates {
            session.apply(TransportOption::TrustedCertificates(certs.clone()))?;
        }
        session.apply(TransportOption::DoWorkFrequency(std::time::Duration::from_millis(
            config.do_work_interval_ms,
        )))?;

        let inbound_metrics = metrics.clone();
        session
            .transport
            .set_inbound_message_callback(Box::new(move |body: &[u8]| on_message_received(body, &inbound_metrics)))
            .map_err(|e| PipelineError::ConnectionFault(format!("Failed to set message callback: {}", e)))?;

        let status_link = session.link.clone();
        session
            .transport
            .set_connection_callback(Box::new(move |status, reason| {
                status_link.on_connection_status(status, reason)
            }))
            .map_err(|e| {
                PipelineError::ConnectionFault(format!("Failed to set connection status callback: {}", e))
            })?;

        session
            .transport
            .connect(&config.connection_string)
            .map_err(|e| PipelineError::ConnectionFault(format!("Failed to connect: {}", e)))?;

        Ok(session)
    }

    fn apply(&mut self, option: TransportOption) -> Result<(), PipelineError> {
        let name = option.name();
        self.transport
            .set_option(option)
            .map_err(|e| PipelineError::ConnectionFault(format!("Failed to set option {}: {}", name, e)))
    }

    pub fn transport(&self) -> Arc<dyn MessagingTransport> {
        self.transport.clone()
    }

    pub fn link(&self) -> Arc<LinkState> {
        self.link.clone()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Disconnect. Returns `true` only for the call that released the link.
    pub fn close(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.transport.disconnect();
        self.link.connected.store(false, Ordering::Release);
        log::info!("Released {} connection", self.transport.transport_id());
        true
    }
}

impl Drop for TransportSession {
    fn drop(&mut self) {
        self.close();
    }
}
