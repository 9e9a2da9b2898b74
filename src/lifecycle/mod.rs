//! Lifecycle hooks for registered components.
//!
//! # Startup and shutdown order
//!
//! ```text
//! 1. Configuration loading
//!    ↓
//! 2. Discovery and registry population
//!    ↓
//! 3. OnModuleInit (components, services, server services)   ← hook
//!    ↓
//! 4. Controller and route composition
//!    ↓
//! 5. Error handling configuration
//!    ↓
//! 6. Scheduler and transport start
//!    ↓
//! [Running...]
//!    ↓
//! 7. Shutdown signal (SIGTERM/SIGINT)
//!    ↓
//! 8. OnApplicationShutdown (reverse order)                  ← hook
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use trellis::lifecycle::{LifecycleError, OnModuleInit};
//! use async_trait::async_trait;
//!
//! #[derive(Default)]
//! pub struct DatabaseService;
//!
//! #[async_trait]
//! impl OnModuleInit for DatabaseService {
//!     async fn on_module_init(&self) -> Result<(), LifecycleError> {
//!         tracing::info!("Initializing database connection");
//!         Ok(())
//!     }
//! }
//!
//! let class = Class::of::<DatabaseService>().with_init();
//! ```

mod error;
mod manager;
mod shutdown;
mod traits;

pub use error::{LifecycleError, Result};
pub use manager::LifecycleManager;
pub use shutdown::shutdown_signal;
pub use traits::{OnApplicationShutdown, OnModuleInit};
