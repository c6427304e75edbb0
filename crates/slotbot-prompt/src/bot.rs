use crate::controller::{cancellable, PromptTurnController, TurnOutcome};
use slotbot_core::{ConversationRef, PromptError, TurnContext};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// A conversation's turn lock and the number of turns holding or waiting on it.
#[derive(Default)]
struct TurnSlot {
    lock: Arc<tokio::sync::Mutex<()>>,
    claims: usize,
}

type TurnSlots = Mutex<HashMap<ConversationRef, TurnSlot>>;

/// Application layer around a [`PromptTurnController`].
///
/// Replies with `"{value} {unit}"` on acceptance and with the bare status
/// code on rejection, optionally followed by the retry prompt. Turns of the
/// same conversation are run one at a time; different conversations run
/// concurrently.
pub struct SlotBot {
    controller: Arc<PromptTurnController>,
    turn_slots: TurnSlots,
}

/// One turn's claim on its conversation slot. The slot is removed when the
/// last claim is dropped, including when the turn future itself is dropped.
struct TurnClaim<'a> {
    slots: &'a TurnSlots,
    conversation: &'a ConversationRef,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for TurnClaim<'_> {
    fn drop(&mut self) {
        let mut slots = lock_slots(self.slots);
        if let Some(slot) = slots.get_mut(self.conversation) {
            slot.claims -= 1;
            if slot.claims == 0 {
                slots.remove(self.conversation);
            }
        }
    }
}

fn lock_slots(slots: &TurnSlots) -> MutexGuard<'_, HashMap<ConversationRef, TurnSlot>> {
    match slots.lock() {
        Ok(slots) => slots,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl SlotBot {
    pub fn new(controller: Arc<PromptTurnController>) -> Self {
        Self {
            controller,
            turn_slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn controller(&self) -> &Arc<PromptTurnController> {
        &self.controller
    }

    fn claim_turn<'a>(&'a self, ctx: &'a TurnContext) -> TurnClaim<'a> {
        let mut slots = lock_slots(&self.turn_slots);
        let slot = slots.entry(ctx.conversation.clone()).or_default();
        slot.claims += 1;
        TurnClaim {
            slots: &self.turn_slots,
            conversation: &ctx.conversation,
            lock: Arc::clone(&slot.lock),
        }
    }

    pub async fn on_turn(&self, ctx: &TurnContext) -> Result<TurnOutcome, PromptError> {
        let claim = self.claim_turn(ctx);
        let _turn = cancellable(ctx, async { Ok(claim.lock.lock().await) }).await?;

        let outcome = self.controller.on_turn(ctx).await?;
        match &outcome {
            TurnOutcome::Prompted => {}
            TurnOutcome::Accepted(result) => {
                let reply = result
                    .formatted()
                    .unwrap_or_else(|| result.status.to_string());
                self.reply(ctx, &reply).await?;
            }
            TurnOutcome::Rejected(result) => {
                self.reply(ctx, &result.status.to_string()).await?;
                if let Some(retry) = self.controller.settings().retry_text {
                    self.controller.prompt(ctx, &retry).await?;
                }
            }
        }
        Ok(outcome)
    }

    async fn reply(&self, ctx: &TurnContext, text: &str) -> Result<(), PromptError> {
        cancellable(ctx, async {
            self.controller
                .transport()
                .send(&ctx.conversation, text)
                .await
                .map_err(PromptError::from)
        })
        .await
    }

    /// Conversations with a turn running or waiting to run.
    pub fn active_conversations(&self) -> usize {
        lock_slots(&self.turn_slots).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::PromptOptions;
    use crate::validator::MinimumValidator;
    use slotbot_recognizer::QuantityRecognizer;
    use slotbot_transport::MemoryTransport;

    fn bot(options: PromptOptions) -> (Arc<MemoryTransport>, SlotBot) {
        let transport = Arc::new(MemoryTransport::new());
        let controller = PromptTurnController::new(
            transport.clone(),
            Arc::new(QuantityRecognizer::new()),
            options,
        )
        .unwrap();
        (transport, SlotBot::new(Arc::new(controller)))
    }

    fn ctx(conversation: &str, text: &str) -> TurnContext {
        TurnContext::new(ConversationRef::new("test", conversation), text)
    }

    #[tokio::test]
    async fn test_bot_replies_with_status_on_rejection() {
        let (transport, bot) = bot(PromptOptions::new("Gimme:"));
        bot.on_turn(&ctx("c1", "hi")).await.unwrap();
        bot.on_turn(&ctx("c1", "test test test")).await.unwrap();

        let texts = transport.sent_texts(&ctx("c1", "").conversation);
        assert_eq!(texts, vec!["Gimme:", "NotRecognized"]);
    }

    #[tokio::test]
    async fn test_bot_sends_retry_text_after_rejection() {
        let (transport, bot) = bot(
            PromptOptions::new("Gimme:")
                .with_retry_text("Please tell me an age.")
                .with_validator(MinimumValidator::new(10.0)),
        );
        bot.on_turn(&ctx("c1", "hi")).await.unwrap();
        bot.on_turn(&ctx("c1", "it is 1 year old")).await.unwrap();
        bot.on_turn(&ctx("c1", "it is 15 year old")).await.unwrap();

        let texts = transport.sent_texts(&ctx("c1", "").conversation);
        assert_eq!(
            texts,
            vec!["Gimme:", "TooSmall", "Please tell me an age.", "15 Year"]
        );
    }

    #[tokio::test]
    async fn test_bot_tracks_conversations_separately() {
        let (transport, bot) = bot(PromptOptions::new("Gimme:"));
        bot.on_turn(&ctx("c1", "hi")).await.unwrap();
        bot.on_turn(&ctx("c2", "hi")).await.unwrap();
        bot.on_turn(&ctx("c1", "I am 30 years old")).await.unwrap();

        assert_eq!(
            transport.sent_texts(&ctx("c1", "").conversation),
            vec!["Gimme:", "30 Year"]
        );
        assert_eq!(transport.sent_texts(&ctx("c2", "").conversation), vec!["Gimme:"]);
    }

    #[tokio::test]
    async fn test_bot_releases_idle_turn_locks() {
        let (transport, bot) = bot(PromptOptions::new("Gimme:"));
        for i in 0..1000 {
            bot.on_turn(&ctx(&format!("c{i}"), "hi")).await.unwrap();
        }
        assert_eq!(bot.active_conversations(), 0);

        // Conversation state lives in the transport, not in the lock map.
        bot.on_turn(&ctx("c7", "I am 30 years old")).await.unwrap();
        assert_eq!(
            transport.sent_texts(&ctx("c7", "").conversation),
            vec!["Gimme:", "30 Year"]
        );
        assert_eq!(bot.active_conversations(), 0);
    }

    #[tokio::test]
    async fn test_bot_releases_turn_lock_on_error() {
        let (transport, bot) = bot(PromptOptions::new("Gimme:"));
        transport.fail_sends(true);
        assert!(bot.on_turn(&ctx("c1", "hi")).await.is_err());
        assert_eq!(bot.active_conversations(), 0);
    }

    #[tokio::test]
    async fn test_bot_counts_in_flight_conversations() {
        let (_transport, bot) = bot(PromptOptions::new("Gimme:"));
        let running = ctx("c1", "hi");
        let held = bot.claim_turn(&running);
        let guard = held.lock.lock().await;
        assert_eq!(bot.active_conversations(), 1);

        let waiting = ctx("c1", "hi");
        waiting.cancellation().cancel();
        assert!(matches!(bot.on_turn(&waiting).await, Err(PromptError::Cancelled)));
        assert_eq!(bot.active_conversations(), 1);

        drop(guard);
        drop(held);
        assert_eq!(bot.active_conversations(), 0);
    }

    #[tokio::test]
    async fn test_bot_reply_failure_propagates() {
        let (transport, bot) = bot(PromptOptions::new("Gimme:"));
        bot.on_turn(&ctx("c1", "hi")).await.unwrap();
        transport.fail_sends(true);

        let result = bot.on_turn(&ctx("c1", "I am 30 years old")).await;
        assert!(matches!(result, Err(PromptError::Transport(_))));
    }
}
