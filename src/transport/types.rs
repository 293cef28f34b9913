use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Authenticated,
    Unauthenticated,
}

/// Why the connection status changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionReason {
    ConnectionOk,
    ExpiredToken,
    DeviceDisabled,
    BadCredential,
    RetryExpired,
    NoNetwork,
    CommunicationError,
    NoPingResponse,
}

/// Final outcome of one asynchronous publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishResult {
    Ok,
    /// Transport was torn down before the publish finished
    Destroyed,
    MessageTimeout,
    Error,
}

impl PublishResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Answer returned to the transport for an inbound cloud-to-device message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageDisposition {
    Accepted,
    Rejected,
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportOption {
    LogTrace(bool),
    TrustedCertificates(String),
    /// How often the transport processes network work
    DoWorkFrequency(Duration),
}

impl TransportOption {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LogTrace(_) => "logtrace",
            Self::TrustedCertificates(_) => "TrustedCerts",
            Self::DoWorkFrequency(_) => "do_work_freq_ms",
        }
    }
}

pub type ConnectionCallback = Box<dyn Fn(ConnectionStatus, ConnectionReason) + Send + Sync>;
pub type InboundCallback = Box<dyn Fn(&[u8]) -> MessageDisposition + Send + Sync>;
pub type CompletionCallback = Box<dyn FnOnce(PublishResult) + Send>;
