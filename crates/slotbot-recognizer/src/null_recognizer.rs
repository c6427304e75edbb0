use crate::recognizer_trait::Recognizer;
use async_trait::async_trait;
use slotbot_core::{RecognitionResult, RecognizerError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Recognizes nothing. Useful for wiring tests and dry runs.
pub struct NullRecognizer {
    call_count: AtomicUsize,
}

impl NullRecognizer {
    pub fn new() -> Self {
        Self {
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for NullRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Recognizer for NullRecognizer {
    fn name(&self) -> &str {
        "null"
    }

    async fn initialize(&mut self, _config: toml::Value) -> Result<(), RecognizerError> {
        Ok(())
    }

    async fn recognize(
        &self,
        text: &str,
        culture: &str,
    ) -> Result<RecognitionResult, RecognizerError> {
        let count = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::trace!("NullRecognizer call #{count}, {} chars, culture {culture}", text.len());
        Ok(RecognitionResult::not_recognized())
    }
}
