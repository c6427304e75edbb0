use crate::recognizer_trait::Recognizer;
use async_trait::async_trait;
use regex::Regex;
use slotbot_core::{RecognitionResult, RecognizerError};

const QUANTITY_PATTERN: &str =
    r"(?i)\b(\d+(?:\.\d+)?)\s*(years?|yrs?|months?|weeks?|wks?|days?)\b";

/// Pattern-based recognizer for `<number> <time unit>` phrases in English.
///
/// This is a stand-in for a real number-with-unit model: it knows digits and
/// a handful of unit words, normalized to `Year`, `Month`, `Week` and `Day`.
/// The first match in the text wins.
pub struct QuantityRecognizer {
    pattern: Regex,
    cultures: Vec<String>,
}

impl QuantityRecognizer {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(QUANTITY_PATTERN).unwrap(),
            cultures: vec!["en".to_string()],
        }
    }

    /// Culture prefixes this recognizer accepts, lowercase.
    pub fn cultures(&self) -> &[String] {
        &self.cultures
    }

    fn supports(&self, culture: &str) -> bool {
        let culture = culture.to_ascii_lowercase();
        !culture.is_empty()
            && self
                .cultures
                .iter()
                .any(|prefix| culture.starts_with(prefix.as_str()))
    }
}

impl Default for QuantityRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_unit(token: &str) -> Option<&'static str> {
    let token = token.to_ascii_lowercase();
    if token.starts_with('y') {
        Some("Year")
    } else if token.starts_with('m') {
        Some("Month")
    } else if token.starts_with('w') {
        Some("Week")
    } else if token.starts_with('d') {
        Some("Day")
    } else {
        None
    }
}

#[async_trait]
impl Recognizer for QuantityRecognizer {
    fn name(&self) -> &str {
        "quantity"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), RecognizerError> {
        let Some(list) = config.get("cultures") else {
            return Ok(());
        };
        let list = list.as_array().ok_or_else(|| {
            RecognizerError::InitializationFailed("'cultures' must be an array".to_string())
        })?;

        let mut cultures = Vec::with_capacity(list.len());
        for entry in list {
            let culture = entry.as_str().ok_or_else(|| {
                RecognizerError::InitializationFailed(
                    "'cultures' entries must be strings".to_string(),
                )
            })?;
            cultures.push(culture.to_ascii_lowercase());
        }
        if cultures.is_empty() {
            return Err(RecognizerError::InitializationFailed(
                "'cultures' must not be empty".to_string(),
            ));
        }

        self.cultures = cultures;
        Ok(())
    }

    async fn recognize(
        &self,
        text: &str,
        culture: &str,
    ) -> Result<RecognitionResult, RecognizerError> {
        if !self.supports(culture) {
            return Err(RecognizerError::UnsupportedCulture(culture.to_string()));
        }

        for caps in self.pattern.captures_iter(text) {
            // Digit runs too long for f64 parse as infinity.
            let Some(value) = caps[1].parse::<f64>().ok().filter(|v| v.is_finite()) else {
                continue;
            };
            if let Some(unit) = normalize_unit(&caps[2]) {
                tracing::trace!(value, unit, "quantity matched");
                return Ok(RecognitionResult::success(&caps[0], value, unit));
            }
        }

        Ok(RecognitionResult::not_recognized())
    }
}
