use async_trait::async_trait;
use slotbot_core::{ConversationRef, ConversationSlotState, TransportError};
use tokio::sync::mpsc;

/// A message delivered to a conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    pub conversation: ConversationRef,
    pub text: String,
}

/// Delivers turn replies and persists small per-conversation state.
///
/// Implementations are registered via [`TransportRegistry`](crate::TransportRegistry).
/// The host is expected to serialize turns of one conversation; a transport
/// only needs to be safe across different conversations.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns the transport's plugin name (e.g. `"memory"`, `"file"`).
    fn name(&self) -> &str;
    /// One-time initialisation with transport-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), TransportError>;
    /// Deliver `text` to the conversation.
    async fn send(&self, conversation: &ConversationRef, text: &str)
        -> Result<(), TransportError>;
    /// Load the slot state, or the default state if none was saved yet.
    async fn load_state(
        &self,
        conversation: &ConversationRef,
    ) -> Result<ConversationSlotState, TransportError>;
    /// Persist the slot state, replacing any previous record.
    async fn save_state(
        &self,
        conversation: &ConversationRef,
        state: &ConversationSlotState,
    ) -> Result<(), TransportError>;
    /// Returns `true` if the transport is currently able to deliver messages.
    fn is_healthy(&self) -> bool;
    /// Hand out the stream of delivered messages, once. Transports that
    /// cannot mirror their output return `None`.
    fn take_outbox_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<OutboundMessage>> {
        None
    }
    /// Gracefully shut down the transport, releasing resources.
    async fn shutdown(&self) -> Result<(), TransportError>;
}
