use crate::transport_trait::{OutboundMessage, Transport};
use async_trait::async_trait;
use slotbot_core::{ConversationRef, ConversationSlotState, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Messages kept in the transcript unless configured otherwise.
pub const DEFAULT_TRANSCRIPT_LIMIT: usize = 1024;

/// In-process transport: state lives in a map, sent messages go to an outbox
/// channel and a bounded transcript of the most recent messages.
pub struct MemoryTransport {
    states: Mutex<HashMap<ConversationRef, ConversationSlotState>>,
    sent: Mutex<VecDeque<OutboundMessage>>,
    transcript_limit: usize,
    outbox_tx: mpsc::UnboundedSender<OutboundMessage>,
    outbox_rx: Mutex<Option<mpsc::UnboundedReceiver<OutboundMessage>>>,
    fail_sends: AtomicBool,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl MemoryTransport {
    pub fn new() -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        Self {
            states: Mutex::new(HashMap::new()),
            sent: Mutex::new(VecDeque::new()),
            transcript_limit: DEFAULT_TRANSCRIPT_LIMIT,
            outbox_tx,
            outbox_rx: Mutex::new(Some(outbox_rx)),
            fail_sends: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
            save_count: AtomicUsize::new(0),
        }
    }

    /// Keep at most `limit` messages in the transcript; 0 disables it.
    pub fn with_transcript_limit(mut self, limit: usize) -> Self {
        self.transcript_limit = limit;
        self
    }

    /// Most recent messages sent, oldest first.
    pub fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Texts sent to one conversation, oldest first.
    pub fn sent_texts(&self, conversation: &ConversationRef) -> Vec<String> {
        self.sent_messages()
            .into_iter()
            .filter(|m| &m.conversation == conversation)
            .map(|m| m.text)
            .collect()
    }

    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::Relaxed)
    }

    /// Simulate an outage of message delivery.
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// Simulate an outage of the state store.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::Relaxed);
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), TransportError> {
        if let Some(limit) = config.get("transcript_limit") {
            let limit = limit
                .as_integer()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    TransportError::InitializationFailed(
                        "'transcript_limit' must be a non-negative integer".to_string(),
                    )
                })?;
            self.transcript_limit = limit;
        }
        Ok(())
    }

    async fn send(
        &self,
        conversation: &ConversationRef,
        text: &str,
    ) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(TransportError::SendFailed("memory transport offline".to_string()));
        }

        let message = OutboundMessage {
            conversation: conversation.clone(),
            text: text.to_string(),
        };
        if self.transcript_limit > 0 {
            let mut sent = self
                .sent
                .lock()
                .map_err(|_| TransportError::SendFailed("transcript poisoned".to_string()))?;
            if sent.len() == self.transcript_limit {
                sent.pop_front();
            }
            sent.push_back(message.clone());
        }
        // Nobody listening is fine.
        let _ = self.outbox_tx.send(message);
        Ok(())
    }

    async fn load_state(
        &self,
        conversation: &ConversationRef,
    ) -> Result<ConversationSlotState, TransportError> {
        let states = self
            .states
            .lock()
            .map_err(|_| TransportError::StateLoadFailed("state map poisoned".to_string()))?;
        Ok(states.get(conversation).copied().unwrap_or_default())
    }

    async fn save_state(
        &self,
        conversation: &ConversationRef,
        state: &ConversationSlotState,
    ) -> Result<(), TransportError> {
        if self.fail_saves.load(Ordering::Relaxed) {
            return Err(TransportError::StateSaveFailed(
                "memory state store offline".to_string(),
            ));
        }

        self.states
            .lock()
            .map_err(|_| TransportError::StateSaveFailed("state map poisoned".to_string()))?
            .insert(conversation.clone(), *state);
        self.save_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        !self.fail_sends.load(Ordering::Relaxed) && !self.fail_saves.load(Ordering::Relaxed)
    }

    fn take_outbox_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<OutboundMessage>> {
        self.outbox_rx.get_mut().ok().and_then(|rx| rx.take())
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
