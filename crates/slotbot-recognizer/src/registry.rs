use crate::recognizer_trait::Recognizer;
use slotbot_core::RecognizerError;
use std::collections::HashMap;

pub struct RecognizerRegistry {
    factories: HashMap<String, fn() -> Box<dyn Recognizer>>,
}

impl RecognizerRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("null", || Box::new(crate::null_recognizer::NullRecognizer::new()));
        registry.register("quantity", || {
            Box::new(crate::quantity_recognizer::QuantityRecognizer::new())
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn Recognizer>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Recognizer>, RecognizerError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| RecognizerError::NotFound(name.to_string()))
    }

    /// Create and initialise a recognizer in one step.
    pub async fn build(
        &self,
        name: &str,
        config: toml::Value,
    ) -> Result<Box<dyn Recognizer>, RecognizerError> {
        let mut recognizer = self.create(name)?;
        recognizer.initialize(config).await?;
        tracing::debug!(recognizer = %name, "recognizer initialized");
        Ok(recognizer)
    }

    pub fn list_recognizers(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for RecognizerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullRecognizer;

    #[test]
    fn test_registry_new_has_builtin_recognizers() {
        let registry = RecognizerRegistry::new();
        assert!(registry.create("null").is_ok());
        assert!(registry.create("quantity").is_ok());
    }

    #[test]
    fn test_registry_create_returns_correct_name() {
        let registry = RecognizerRegistry::new();
        assert_eq!(registry.create("quantity").unwrap().name(), "quantity");
        assert_eq!(registry.create("null").unwrap().name(), "null");
    }

    #[test]
    fn test_registry_create_unknown_returns_error() {
        let registry = RecognizerRegistry::new();
        match registry.create("nope") {
            Err(RecognizerError::NotFound(name)) => assert_eq!(name, "nope"),
            _ => panic!("expected NotFound error"),
        }
    }

    #[test]
    fn test_registry_register_custom_recognizer() {
        let mut registry = RecognizerRegistry::new();
        registry.register("custom", || Box::new(NullRecognizer::new()));
        let recognizer = registry.create("custom").unwrap();
        // NullRecognizer backs the factory, so the name is still "null"
        assert_eq!(recognizer.name(), "null");
    }

    #[test]
    fn test_registry_list_recognizers() {
        let registry = RecognizerRegistry::new();
        let names = registry.list_recognizers();
        assert!(names.contains(&"null"));
        assert!(names.contains(&"quantity"));
    }

    #[tokio::test]
    async fn test_registry_build_propagates_initialize_error() {
        let registry = RecognizerRegistry::new();
        let config: toml::Value = toml::from_str("cultures = 3").unwrap();
        let result = registry.build("quantity", config).await;
        assert!(matches!(result, Err(RecognizerError::InitializationFailed(_))));
    }
}
