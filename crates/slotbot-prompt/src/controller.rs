//! Slot-filling turn loop: prompt, recognize, validate, and report.
//!
//! A conversation starts in `AwaitingPrompt` (`in_prompt == false`). Any turn
//! in that state sends the prompt and persists `in_prompt = true`. Every later
//! turn is an input attempt: it is recognized, validated, and reported as
//! accepted or rejected. The controller never re-sends the prompt by itself.

use crate::validator::{MinimumValidator, Validator};
use slotbot_core::config::PromptConfig;
use slotbot_core::{
    AppConfig, ConfigDiff, ConversationSlotState, PromptError, PromptStatus, RecognitionResult,
    TurnContext,
};
use slotbot_recognizer::Recognizer;
use slotbot_transport::Transport;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Culture used when neither the prompt nor the turn names one.
pub const DEFAULT_CULTURE: &str = "en-us";

/// Settings that may change while the controller is running.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSettings {
    pub text: String,
    pub retry_text: Option<String>,
    pub culture: Option<String>,
}

impl PromptSettings {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            retry_text: None,
            culture: None,
        }
    }

    pub fn from_config(config: &PromptConfig) -> Self {
        Self {
            text: config.text.clone(),
            retry_text: config.retry_text.clone(),
            culture: config.culture.clone(),
        }
    }
}

pub struct PromptOptions {
    pub settings: PromptSettings,
    pub validator: Option<Arc<dyn Validator>>,
}

impl PromptOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            settings: PromptSettings::new(text),
            validator: None,
        }
    }

    /// Prompt settings plus the `[validator]` section, if present.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            settings: PromptSettings::from_config(&config.prompt),
            validator: config
                .validator
                .as_ref()
                .map(|v| Arc::new(MinimumValidator::from_config(v)) as Arc<dyn Validator>),
        }
    }

    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.settings.culture = Some(culture.into());
        self
    }

    pub fn with_retry_text(mut self, retry_text: impl Into<String>) -> Self {
        self.settings.retry_text = Some(retry_text.into());
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }
}

/// What a single turn did.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The prompt was sent; no recognition happened this turn.
    Prompted,
    /// Recognition and validation succeeded.
    Accepted(RecognitionResult),
    /// Nothing recognized, or the validator rejected the value.
    Rejected(RecognitionResult),
}

/// Runs `fut` unless the turn is cancelled first.
pub(crate) async fn cancellable<T, F>(ctx: &TurnContext, fut: F) -> Result<T, PromptError>
where
    F: Future<Output = Result<T, PromptError>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => Err(PromptError::Cancelled),
        result = fut => result,
    }
}

pub struct PromptTurnController {
    transport: Arc<dyn Transport>,
    recognizer: Arc<dyn Recognizer>,
    settings: RwLock<PromptSettings>,
    validator: Option<Arc<dyn Validator>>,
}

impl PromptTurnController {
    pub fn new(
        transport: Arc<dyn Transport>,
        recognizer: Arc<dyn Recognizer>,
        options: PromptOptions,
    ) -> Result<Self, PromptError> {
        if options.settings.text.trim().is_empty() {
            return Err(PromptError::EmptyPrompt);
        }
        Ok(Self {
            transport,
            recognizer,
            settings: RwLock::new(options.settings),
            validator: options.validator,
        })
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn settings(&self) -> PromptSettings {
        match self.settings.read() {
            Ok(settings) => settings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Swap the runtime settings. Turns already past their prompt keep going
    /// with the new culture on their next input.
    pub fn update_settings(&self, settings: PromptSettings) -> Result<(), PromptError> {
        if settings.text.trim().is_empty() {
            return Err(PromptError::EmptyPrompt);
        }
        let mut guard = match self.settings.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = settings;
        Ok(())
    }

    /// Apply the reloadable part of a config diff. Returns whether anything
    /// changed.
    pub fn apply_diff(&self, diff: &ConfigDiff) -> Result<bool, PromptError> {
        if !diff.has_reloadable() {
            return Ok(false);
        }
        let mut settings = self.settings();
        if let Some(ref text) = diff.prompt_text {
            settings.text = text.clone();
        }
        if let Some(ref retry_text) = diff.retry_text {
            settings.retry_text = retry_text.clone();
        }
        if let Some(ref culture) = diff.culture {
            settings.culture = culture.clone();
        }
        self.update_settings(settings)?;
        Ok(true)
    }

    /// Prompt culture, then the turn's locale, then [`DEFAULT_CULTURE`].
    pub fn resolve_culture(&self, ctx: &TurnContext) -> String {
        let named = |c: &String| !c.trim().is_empty();
        self.settings()
            .culture
            .filter(named)
            .or_else(|| ctx.locale.clone().filter(named))
            .unwrap_or_else(|| DEFAULT_CULTURE.to_string())
    }

    /// Send `text` to the turn's conversation. Does not wait for a reply.
    pub async fn prompt(&self, ctx: &TurnContext, text: &str) -> Result<(), PromptError> {
        if text.trim().is_empty() {
            return Err(PromptError::EmptyPrompt);
        }
        cancellable(ctx, async {
            self.transport
                .send(&ctx.conversation, text)
                .await
                .map_err(PromptError::from)
        })
        .await
    }

    /// Recognize the turn's text and apply the validator to a success.
    ///
    /// `NotRecognized` and validator rejections come back as `Ok`; only a
    /// failing recognizer is an `Err`.
    pub async fn recognize(&self, ctx: &TurnContext) -> Result<RecognitionResult, PromptError> {
        let culture = self.resolve_culture(ctx);
        let mut result = cancellable(ctx, async {
            self.recognizer
                .recognize(&ctx.text, &culture)
                .await
                .map_err(PromptError::from)
        })
        .await?;

        if result.is_success() {
            if let Some(ref validator) = self.validator {
                result.status = validator.validate(ctx, &result);
            }
        }

        tracing::debug!(
            conversation = %ctx.conversation,
            culture = %culture,
            status = %result.status,
            "recognized input"
        );
        Ok(result)
    }

    /// Drive one turn of the exchange.
    pub async fn on_turn(&self, ctx: &TurnContext) -> Result<TurnOutcome, PromptError> {
        if ctx.is_cancelled() {
            return Err(PromptError::Cancelled);
        }

        let state = self.state(ctx).await?;
        if !state.in_prompt {
            let text = self.settings().text;
            self.prompt(ctx, &text).await?;

            // The flag is only committed once the send went through; a
            // cancelled or failed save leaves the conversation awaiting its
            // prompt again.
            let next = ConversationSlotState { in_prompt: true };
            cancellable(ctx, async {
                self.transport
                    .save_state(&ctx.conversation, &next)
                    .await
                    .map_err(PromptError::from)
            })
            .await?;

            tracing::debug!(conversation = %ctx.conversation, "prompt sent, awaiting input");
            return Ok(TurnOutcome::Prompted);
        }

        let result = self.recognize(ctx).await?;
        if result.status == PromptStatus::SUCCESS {
            tracing::info!(
                conversation = %ctx.conversation,
                value = ?result.value,
                unit = ?result.unit,
                "input accepted"
            );
            Ok(TurnOutcome::Accepted(result))
        } else {
            tracing::warn!(
                conversation = %ctx.conversation,
                status = %result.status,
                "input rejected"
            );
            Ok(TurnOutcome::Rejected(result))
        }
    }

    /// Persisted slot state for the turn's conversation.
    pub async fn state(&self, ctx: &TurnContext) -> Result<ConversationSlotState, PromptError> {
        cancellable(ctx, async {
            self.transport
                .load_state(&ctx.conversation)
                .await
                .map_err(PromptError::from)
        })
        .await
    }

    /// Start the exchange over: the next turn sends the prompt again.
    pub async fn reset(&self, ctx: &TurnContext) -> Result<(), PromptError> {
        cancellable(ctx, async {
            self.transport
                .save_state(&ctx.conversation, &ConversationSlotState::default())
                .await
                .map_err(PromptError::from)
        })
        .await
    }
}
