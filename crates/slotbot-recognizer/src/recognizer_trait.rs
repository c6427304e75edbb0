use async_trait::async_trait;
use slotbot_core::{RecognitionResult, RecognizerError};

/// Turns free text into a typed quantity under a culture.
///
/// A successful no-match is `Ok` with status `NotRecognized`; `Err` is
/// reserved for the recognizer itself being unusable.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Returns the recognizer's plugin name (e.g. `"quantity"`, `"null"`).
    fn name(&self) -> &str;
    /// One-time initialisation with recognizer-specific TOML configuration.
    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognizerError>;
    /// Extract the single best quantity from `text`, if any.
    async fn recognize(
        &self,
        text: &str,
        culture: &str,
    ) -> Result<RecognitionResult, RecognizerError>;
}
