pub mod mock;
pub mod session;
pub mod traits;
pub mod types;

pub use mock::{AckMode, SimulatedTransport};
pub use session::{LinkState, TransportSession};
pub use traits::MessagingTransport;
pub use types::{
    CompletionCallback, ConnectionCallback, ConnectionReason, ConnectionStatus, InboundCallback,
    MessageDisposition, PublishResult, TransportOption,
};
