//! Handler registry

use crate::handler::HandlerFactory;
use std::sync::Arc;

/// Ordered set of handler factories, keyed by service name.
///
/// Populated once in the composition root and read-only afterwards.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    factories: Vec<Arc<dyn HandlerFactory>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. Returns false if the service name is already
    /// registered, in which case the registry is unchanged.
    pub fn register(&mut self, factory: Arc<dyn HandlerFactory>) -> bool {
        let name = factory.service_name();
        if self.contains(name) {
            tracing::debug!("Service {} already registered", name);
            return false;
        }
        tracing::debug!("Registering service {}", name);
        self.factories.push(factory);
        true
    }

    pub fn with(mut self, factory: Arc<dyn HandlerFactory>) -> Self {
        self.register(factory);
        self
    }

    pub fn contains(&self, service_name: &str) -> bool {
        self.get(service_name).is_some()
    }

    pub fn get(&self, service_name: &str) -> Option<&Arc<dyn HandlerFactory>> {
        self.factories
            .iter()
            .find(|f| f.service_name() == service_name)
    }

    /// Factories in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn HandlerFactory>> {
        self.factories.iter()
    }

    pub fn service_names(&self) -> Vec<&'static str> {
        self.factories.iter().map(|f| f.service_name()).collect()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("services", &self.service_names())
            .finish()
    }
}
