use anyhow::Result;

use super::types::{CompletionCallback, ConnectionCallback, InboundCallback, TransportOption};

/// Trait implemented by remote messaging clients (MQTT hub clients and the like).
///
/// Calls return as soon as the request is handed over. Network progress and
/// every callback run on the transport's own execution context, never on the
/// caller's.
pub trait MessagingTransport: Send + Sync {
    /// Unique transport identifier (e.g., "mqtt-hub", "simulated")
    fn transport_id(&self) -> &str;

    fn set_option(&self, option: TransportOption) -> Result<()>;

    fn set_connection_callback(&self, callback: ConnectionCallback) -> Result<()>;

    fn set_inbound_message_callback(&self, callback: InboundCallback) -> Result<()>;

    /// Begin connecting to the endpoint named by `connection_string`; the
    /// outcome arrives through the connection callback
    fn connect(&self, connection_string: &str) -> Result<()>;

    /// Queue one payload; `on_complete` fires exactly once unless the
    /// transport is already disconnected, in which case this returns an error
    fn publish_async(&self, payload: String, on_complete: CompletionCallback) -> Result<()>;

    /// Release the connection. Outstanding completions are delivered before
    /// this returns; none fire afterwards.
    fn disconnect(&self);
}
