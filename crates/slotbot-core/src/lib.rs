pub mod config;
pub mod config_diff;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use config_diff::ConfigDiff;
pub use error::{ConfigError, PromptError, RecognizerError, TransportError};
pub use types::{
    ConversationRef, ConversationSlotState, PromptStatus, RecognitionResult, TurnContext,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_status_display_is_bare_code() {
        assert_eq!(PromptStatus::SUCCESS.to_string(), "Success");
        assert_eq!(PromptStatus::NOT_RECOGNIZED.to_string(), "NotRecognized");
        assert_eq!(PromptStatus::TOO_SMALL.to_string(), "TooSmall");
    }

    #[test]
    fn test_prompt_status_custom_code_equals_builtin() {
        assert_eq!(PromptStatus::new("TooSmall"), PromptStatus::TOO_SMALL);
        assert_ne!(PromptStatus::new("TooBig"), PromptStatus::TOO_SMALL);
        assert!(PromptStatus::from("Success").is_success());
        assert!(!PromptStatus::from("NotRecognized".to_string()).is_success());
    }

    #[test]
    fn test_recognition_result_success_fields() {
        let result = RecognitionResult::success("30 years", 30.0, "Year");
        assert!(result.is_success());
        assert_eq!(result.text.as_deref(), Some("30 years"));
        assert_eq!(result.value, Some(30.0));
        assert_eq!(result.unit.as_deref(), Some("Year"));
        assert_eq!(result.formatted().as_deref(), Some("30 Year"));
    }

    #[test]
    fn test_recognition_result_not_recognized_has_no_value() {
        let result = RecognitionResult::not_recognized();
        assert_eq!(result.status, PromptStatus::NOT_RECOGNIZED);
        assert!(result.text.is_none());
        assert!(result.value.is_none());
        assert!(result.unit.is_none());
        assert!(result.formatted().is_none());
    }

    #[test]
    fn test_recognition_result_formats_fractional_value() {
        let result = RecognitionResult::success("2.5 years", 2.5, "Year");
        assert_eq!(result.formatted().as_deref(), Some("2.5 Year"));
    }

    #[test]
    fn test_slot_state_defaults_to_not_in_prompt() {
        assert!(!ConversationSlotState::default().in_prompt);
    }

    #[test]
    fn test_conversation_ref_key() {
        let conversation = ConversationRef::new("console", "c1");
        assert_eq!(conversation.key(), "console/c1");
        assert_eq!(conversation.to_string(), "console/c1");
    }

    #[test]
    fn test_turn_context_cancellation() {
        let token = tokio_util::sync::CancellationToken::new();
        let ctx = TurnContext::new(ConversationRef::new("console", "c1"), "hi")
            .with_locale("en-us")
            .with_cancellation(token.clone());
        assert_eq!(ctx.locale.as_deref(), Some("en-us"));
        assert!(!ctx.is_cancelled());
        token.cancel();
        assert!(ctx.is_cancelled());
    }
}
