//! Lifecycle hook traits
//!
//! Components opt in by implementing a trait and declaring the capability on
//! their class (`with_init()` / `with_shutdown()`).

use super::LifecycleError;
use async_trait::async_trait;

/// Called once the registry is built, before any route is composed.
///
/// Use this hook to open connections or warm caches. An error aborts startup.
///
/// # Example
///
/// ```rust,ignore
/// #[async_trait]
/// impl OnModuleInit for CacheService {
///     async fn on_module_init(&self) -> Result<(), LifecycleError> {
///         self.warm().await.map_err(|e| LifecycleError::init_failed(e.to_string()))
///     }
/// }
/// ```
#[async_trait]
pub trait OnModuleInit: Send + Sync {
    async fn on_module_init(&self) -> Result<(), LifecycleError>;
}

/// Called after the transport has stopped accepting requests.
///
/// Hooks run in reverse registration order; a failing hook is logged and the
/// remaining hooks still run.
#[async_trait]
pub trait OnApplicationShutdown: Send + Sync {
    async fn on_application_shutdown(&self) -> Result<(), LifecycleError>;
}
