use crate::transport_trait::Transport;
use slotbot_core::TransportError;
use std::collections::HashMap;

pub struct TransportRegistry {
    factories: HashMap<String, fn() -> Box<dyn Transport>>,
}

impl TransportRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("memory", || Box::new(crate::memory_transport::MemoryTransport::new()));
        registry.register("file", || Box::new(crate::file_transport::FileTransport::new()));
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn Transport>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Transport>, TransportError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| TransportError::NotFound(name.to_string()))
    }

    /// Create and initialise a transport in one step.
    pub async fn build(
        &self,
        name: &str,
        config: toml::Value,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let mut transport = self.create(name)?;
        transport.initialize(config).await?;
        tracing::debug!(transport = %name, "transport initialized");
        Ok(transport)
    }

    pub fn list_transports(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
