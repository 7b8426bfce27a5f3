//! Provider registry and dispatch.

use std::collections::HashMap;
use std::sync::Arc;

use vidforge_models::ProviderKind;

use crate::adapter::VideoProvider;
use crate::error::ProviderResult;
use crate::kling::KlingProvider;
use crate::luma::LumaProvider;
use crate::pika::PikaProvider;
use crate::runway::RunwayProvider;

/// Owns one adapter per provider and dispatches by kind.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn VideoProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build all adapters from environment configuration.
    pub fn from_env() -> ProviderResult<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(KlingProvider::from_env()?));
        registry.register(Arc::new(RunwayProvider::from_env()?));
        registry.register(Arc::new(LumaProvider::from_env()?));
        registry.register(Arc::new(PikaProvider::from_env()?));
        Ok(registry)
    }

    /// Register an adapter, replacing any previous one of the same kind.
    pub fn register(&mut self, provider: Arc<dyn VideoProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// Look up the adapter for a provider.
    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn VideoProvider>> {
        self.providers.get(&kind).cloned()
    }

    /// Kinds with a registered adapter.
    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ProviderConfig;

    #[test]
    fn test_register_and_get() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.get(ProviderKind::Kling).is_none());

        let config = ProviderConfig::from_env("TEST_KLING", "http://localhost:9000");
        registry.register(Arc::new(KlingProvider::new(config).unwrap()));

        let provider = registry.get(ProviderKind::Kling).unwrap();
        assert_eq!(provider.kind(), ProviderKind::Kling);
        assert!(registry.get(ProviderKind::Luma).is_none());
    }
}
