use crate::config::AppConfig;

/// Describes runtime-safe changes between two configs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDiff {
    pub prompt_text: Option<String>,
    pub retry_text: Option<Option<String>>,
    pub culture: Option<Option<String>>,
    pub non_reloadable: Vec<String>,
}

impl ConfigDiff {
    /// Compare two configs and return the diff.
    /// Reloadable: prompt text, retry text, culture.
    /// Non-reloadable: validator, recognizer, transport, channel id — logged as warnings.
    pub fn diff(old: &AppConfig, new: &AppConfig) -> Self {
        let mut result = Self::default();

        if old.prompt.text != new.prompt.text {
            result.prompt_text = Some(new.prompt.text.clone());
        }
        if old.prompt.retry_text != new.prompt.retry_text {
            result.retry_text = Some(new.prompt.retry_text.clone());
        }
        if old.prompt.culture != new.prompt.culture {
            result.culture = Some(new.prompt.culture.clone());
        }

        if old.general.channel_id != new.general.channel_id {
            result.non_reloadable.push(format!(
                "channel_id changed ('{}' → '{}'), requires restart",
                old.general.channel_id, new.general.channel_id
            ));
        }

        if old.validator != new.validator {
            result
                .non_reloadable
                .push("validator changed, requires restart".to_string());
        }

        if old.recognizer.engine != new.recognizer.engine {
            result.non_reloadable.push(format!(
                "recognizer engine changed ('{}' → '{}'), requires restart",
                old.recognizer.engine, new.recognizer.engine
            ));
        } else if old.recognizer.options != new.recognizer.options {
            result
                .non_reloadable
                .push("recognizer options changed, requires restart".to_string());
        }

        if old.transport.engine != new.transport.engine {
            result.non_reloadable.push(format!(
                "transport engine changed ('{}' → '{}'), requires restart",
                old.transport.engine, new.transport.engine
            ));
        } else if old.transport.options != new.transport.options {
            result
                .non_reloadable
                .push("transport options changed, requires restart".to_string());
        }

        result
    }

    /// True when at least one reloadable setting changed.
    pub fn has_reloadable(&self) -> bool {
        self.prompt_text.is_some() || self.retry_text.is_some() || self.culture.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_reloadable() && self.non_reloadable.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig::from_toml_str(
            r#"
[prompt]
text = "Gimme:"

[validator]
min_value = 10
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_config_diff_no_changes() {
        let diff = ConfigDiff::diff(&base_config(), &base_config());
        assert!(diff.is_empty());
        assert_eq!(diff, ConfigDiff::default());
    }

    #[test]
    fn test_config_diff_prompt_text_change() {
        let old = base_config();
        let new = AppConfig::from_toml_str(
            r#"
[prompt]
text = "How old?"

[validator]
min_value = 10
"#,
        )
        .unwrap();

        let diff = ConfigDiff::diff(&old, &new);
        assert_eq!(diff.prompt_text.as_deref(), Some("How old?"));
        assert!(diff.retry_text.is_none());
        assert!(diff.has_reloadable());
        assert!(diff.non_reloadable.is_empty());
    }

    #[test]
    fn test_config_diff_retry_text_removed() {
        let old = AppConfig::from_toml_str(
            r#"
[prompt]
retry_text = "Again:"
"#,
        )
        .unwrap();
        let new = AppConfig::from_toml_str("").unwrap();

        let diff = ConfigDiff::diff(&old, &new);
        assert_eq!(diff.retry_text, Some(None));
    }

    #[test]
    fn test_config_diff_culture_change() {
        let old = base_config();
        let mut new = base_config();
        new.prompt.culture = Some("en-gb".to_string());

        let diff = ConfigDiff::diff(&old, &new);
        assert_eq!(diff.culture, Some(Some("en-gb".to_string())));
    }

    #[test]
    fn test_config_diff_validator_change_is_non_reloadable() {
        let old = base_config();
        let mut new = base_config();
        new.validator.as_mut().unwrap().min_value = 18.0;

        let diff = ConfigDiff::diff(&old, &new);
        assert!(!diff.has_reloadable());
        assert_eq!(diff.non_reloadable.len(), 1);
        assert!(diff.non_reloadable[0].contains("validator"));
    }

    #[test]
    fn test_config_diff_engine_changes_are_non_reloadable() {
        let old = base_config();
        let mut new = base_config();
        new.recognizer.engine = "null".to_string();
        new.transport.engine = "file".to_string();
        new.general.channel_id = "web".to_string();

        let diff = ConfigDiff::diff(&old, &new);
        assert_eq!(diff.non_reloadable.len(), 3);
        assert!(diff.non_reloadable.iter().any(|w| w.contains("recognizer engine")));
        assert!(diff.non_reloadable.iter().any(|w| w.contains("transport engine")));
        assert!(diff.non_reloadable.iter().any(|w| w.contains("channel_id")));
    }

    #[test]
    fn test_config_diff_transport_options_change() {
        let old = base_config();
        let new = AppConfig::from_toml_str(
            r#"
[prompt]
text = "Gimme:"

[validator]
min_value = 10

[transport.options]
path = "/tmp/other.log"
"#,
        )
        .unwrap();

        let diff = ConfigDiff::diff(&old, &new);
        assert_eq!(
            diff.non_reloadable,
            vec!["transport options changed, requires restart".to_string()]
        );
    }
}
