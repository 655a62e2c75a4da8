//! Service registry

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::handler::SharedHandler;
use crate::middleware::{Middleware, SharedMiddleware};

/// A registered method: its handler plus the middleware scoped to it
pub struct Service {
    name: String,
    handler: SharedHandler,
    middlewares: Vec<SharedMiddleware>,
}

impl Service {
    pub(crate) fn new(name: String, handler: SharedHandler) -> Self {
        Self {
            name,
            handler,
            middlewares: Vec::new(),
        }
    }

    /// Lower-cased method name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &SharedHandler {
        &self.handler
    }

    pub fn middlewares(&self) -> &[SharedMiddleware] {
        &self.middlewares
    }

    /// Add middleware that runs only for this service, inside any server
    /// middleware.
    pub fn use_middleware<M: Middleware + 'static>(&mut self, middleware: M) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("name", &self.name)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}

/// Startup-time configuration mistakes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("can not register service with empty method")]
    EmptyName,

    #[error("method `{0}` is already registered")]
    Duplicate(String),
}

/// Case-insensitive map from method name to [`Service`]
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Service>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        handler: SharedHandler,
    ) -> Result<&mut Service, RegistrationError> {
        if name.is_empty() {
            return Err(RegistrationError::EmptyName);
        }
        let key = name.to_lowercase();
        if self.services.contains_key(&key) {
            return Err(RegistrationError::Duplicate(key));
        }
        Ok(self
            .services
            .entry(key.clone())
            .or_insert_with(|| Service::new(key, handler)))
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub(crate) fn into_services(self) -> impl Iterator<Item = Service> {
        self.services.into_values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RequestContext;
    use crate::handler::handler_fn;
    use serde_json::Value;

    fn noop() -> SharedHandler {
        Arc::new(handler_fn(|_ctx: RequestContext| async move { Ok(Value::Null) }))
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut registry = ServiceRegistry::new();
        registry.register("Sum", noop()).unwrap();

        for name in ["sum", "SUM", "Sum", "sUm"] {
            assert_eq!(registry.get(name).map(Service::name), Some("sum"));
        }
        assert!(registry.get("div").is_none());
    }

    #[test]
    fn test_registration_errors() {
        let mut registry = ServiceRegistry::new();
        assert_eq!(
            registry.register("", noop()).unwrap_err(),
            RegistrationError::EmptyName
        );

        registry.register("sum", noop()).unwrap();
        assert_eq!(
            registry.register("SUM", noop()).unwrap_err(),
            RegistrationError::Duplicate("sum".to_string())
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_service_middleware_is_recorded_in_order() {
        let mut registry = ServiceRegistry::new();
        registry
            .register("sum", noop())
            .unwrap()
            .use_middleware(crate::middleware::builtins::Logging)
            .use_middleware(crate::middleware::builtins::Recovery);
        assert_eq!(registry.get("sum").unwrap().middlewares().len(), 2);
    }
}
