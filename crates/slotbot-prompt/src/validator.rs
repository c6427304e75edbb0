use slotbot_core::config::ValidatorConfig;
use slotbot_core::{PromptStatus, RecognitionResult, TurnContext};

/// Post-processes a successful recognition.
///
/// The validator sees the result read-only and answers with the status the
/// result should carry. Returning anything other than `Success` rejects the
/// value; `text`, `value` and `unit` are never changed.
pub trait Validator: Send + Sync {
    fn validate(&self, ctx: &TurnContext, result: &RecognitionResult) -> PromptStatus;
}

impl<F> Validator for F
where
    F: Fn(&TurnContext, &RecognitionResult) -> PromptStatus + Send + Sync,
{
    fn validate(&self, ctx: &TurnContext, result: &RecognitionResult) -> PromptStatus {
        self(ctx, result)
    }
}

/// Accepts values strictly greater than `bound`.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimumValidator {
    bound: f64,
    rejection: PromptStatus,
}

impl MinimumValidator {
    pub fn new(bound: f64) -> Self {
        Self {
            bound,
            rejection: PromptStatus::TOO_SMALL,
        }
    }

    pub fn with_rejection(mut self, rejection: impl Into<PromptStatus>) -> Self {
        self.rejection = rejection.into();
        self
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(config.min_value).with_rejection(config.rejection.clone())
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }
}

impl Validator for MinimumValidator {
    fn validate(&self, _ctx: &TurnContext, result: &RecognitionResult) -> PromptStatus {
        match result.value {
            Some(value) if value > self.bound => result.status.clone(),
            _ => self.rejection.clone(),
        }
    }
}
