//! Lifecycle Manager
//!
//! Collects lifecycle hooks from a built registry and runs them.

use super::{LifecycleError, OnApplicationShutdown, OnModuleInit, Result};
use crate::di::Registry;
use crate::metadata::ComponentType;
use std::sync::Arc;

struct LifecycleHook<T: ?Sized> {
    service: Arc<T>,
    name: String,
}

impl<T: ?Sized> LifecycleHook<T> {
    fn new(service: Arc<T>, name: impl Into<String>) -> Self {
        Self {
            service,
            name: name.into(),
        }
    }
}

/// Runs lifecycle hooks for the components of a registry.
///
/// Init hooks come from `COMPONENT`, `SERVICE` and `SERVER_SERVICE` instances
/// in registration order. Shutdown hooks come from every instance and run in
/// reverse order.
///
/// # Example
///
/// ```rust,ignore
/// let manager = LifecycleManager::from_registry(&registry);
/// manager.call_module_init().await?;
/// // ... application runs ...
/// manager.call_application_shutdown().await;
/// ```
#[derive(Default)]
pub struct LifecycleManager {
    on_init_hooks: Vec<LifecycleHook<dyn OnModuleInit>>,
    on_shutdown_hooks: Vec<LifecycleHook<dyn OnApplicationShutdown>>,
}

impl LifecycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_registry(registry: &Registry) -> Self {
        let mut manager = Self::new();
        for instance in registry.instances() {
            let initializes = matches!(
                instance.component_type(),
                ComponentType::Component | ComponentType::Service | ComponentType::ServerService
            );
            if initializes {
                if let Some(hook) = instance.as_on_init() {
                    manager.register_init(hook, instance.name());
                }
            }
            if let Some(hook) = instance.as_on_shutdown() {
                manager.register_shutdown(hook, instance.name());
            }
        }
        manager
    }

    pub fn register_init(&mut self, service: Arc<dyn OnModuleInit>, name: impl Into<String>) {
        self.on_init_hooks.push(LifecycleHook::new(service, name));
    }

    pub fn register_shutdown(
        &mut self,
        service: Arc<dyn OnApplicationShutdown>,
        name: impl Into<String>,
    ) {
        self.on_shutdown_hooks
            .push(LifecycleHook::new(service, name));
    }

    /// Execute all OnModuleInit hooks in registration order.
    ///
    /// Stops at the first failing hook.
    pub async fn call_module_init(&self) -> Result<()> {
        tracing::info!("Calling OnModuleInit hooks...");

        for hook in &self.on_init_hooks {
            tracing::debug!("Initializing: {}", hook.name);
            hook.service.on_module_init().await.map_err(|e| {
                tracing::error!("OnModuleInit failed for {}: {}", hook.name, e);
                LifecycleError::hook_failed(&hook.name, e.to_string())
            })?;
            tracing::debug!("Initialized: {}", hook.name);
        }

        tracing::info!(
            "OnModuleInit complete ({} hooks executed)",
            self.on_init_hooks.len()
        );
        Ok(())
    }

    /// Execute all OnApplicationShutdown hooks in **reverse order**.
    ///
    /// Failures are logged; every hook runs. Returns the number of failures.
    pub async fn call_application_shutdown(&self) -> usize {
        tracing::info!("Calling OnApplicationShutdown hooks...");

        let mut failures = 0;
        for hook in self.on_shutdown_hooks.iter().rev() {
            tracing::debug!("Shutting down: {}", hook.name);
            if let Err(e) = hook.service.on_application_shutdown().await {
                tracing::error!("OnApplicationShutdown failed for {}: {}", hook.name, e);
                failures += 1;
            }
        }

        tracing::info!(
            "OnApplicationShutdown complete ({} hooks executed)",
            self.on_shutdown_hooks.len()
        );
        failures
    }

    pub fn init_hook_count(&self) -> usize {
        self.on_init_hooks.len()
    }

    pub fn shutdown_hook_count(&self) -> usize {
        self.on_shutdown_hooks.len()
    }
}
