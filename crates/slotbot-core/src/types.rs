use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Outcome code of a recognition attempt.
///
/// Codes are open-ended: validators may introduce their own rejection reasons
/// (e.g. `"TooSmall"`) next to the built-in [`SUCCESS`](Self::SUCCESS) and
/// [`NOT_RECOGNIZED`](Self::NOT_RECOGNIZED). `Display` renders the bare code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptStatus(Cow<'static, str>);

impl PromptStatus {
    pub const SUCCESS: PromptStatus = PromptStatus::from_static("Success");
    pub const NOT_RECOGNIZED: PromptStatus = PromptStatus::from_static("NotRecognized");
    pub const TOO_SMALL: PromptStatus = PromptStatus::from_static("TooSmall");

    pub const fn from_static(code: &'static str) -> Self {
        Self(Cow::Borrowed(code))
    }

    pub fn new(code: impl Into<String>) -> Self {
        Self(Cow::Owned(code.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }
}

impl fmt::Display for PromptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PromptStatus {
    fn from(code: &'static str) -> Self {
        Self::from_static(code)
    }
}

impl From<String> for PromptStatus {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

/// A typed quantity extracted from user text.
///
/// As produced by a recognizer, `value` and `unit` are present exactly when
/// `status` is [`PromptStatus::SUCCESS`]. A validator may later replace the
/// status, in which case `value` and `unit` stay visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub text: Option<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub status: PromptStatus,
}

impl RecognitionResult {
    pub fn success(text: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            value: Some(value),
            unit: Some(unit.into()),
            status: PromptStatus::SUCCESS,
        }
    }

    pub fn not_recognized() -> Self {
        Self {
            text: None,
            value: None,
            unit: None,
            status: PromptStatus::NOT_RECOGNIZED,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// `"{value} {unit}"`, or `None` unless both are present.
    pub fn formatted(&self) -> Option<String> {
        match (self.value, self.unit.as_deref()) {
            (Some(value), Some(unit)) => Some(format!("{value} {unit}")),
            _ => None,
        }
    }
}

/// Per-conversation record persisted between turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSlotState {
    #[serde(default)]
    pub in_prompt: bool,
}

/// Addresses one conversation on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationRef {
    pub channel_id: String,
    pub conversation_id: String,
}

impl ConversationRef {
    pub fn new(channel_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            conversation_id: conversation_id.into(),
        }
    }

    /// Key used by state stores.
    pub fn key(&self) -> String {
        format!("{}/{}", self.channel_id, self.conversation_id)
    }
}

impl fmt::Display for ConversationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.conversation_id)
    }
}

/// One inbound user turn.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub conversation: ConversationRef,
    pub text: String,
    pub locale: Option<String>,
    cancel: CancellationToken,
}

impl TurnContext {
    pub fn new(conversation: ConversationRef, text: impl Into<String>) -> Self {
        Self {
            conversation,
            text: text.into(),
            locale: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// Ties this turn to a host-owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
