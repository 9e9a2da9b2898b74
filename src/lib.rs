//! # Trellis
//!
//! A component registry and route/middleware wiring engine for axum servers.
//!
//! Classes are declared with explicit markers (`component`, `service`,
//! `controller`, `middleware`, `schedule`, ...), collected by a discovery
//! source into a registry, and wired at startup: controllers are composed
//! into routes, middleware references are resolved by name, scheduled jobs
//! are started, and the transport adapter serves the result.
//!
//! ## Features
//!
//! - **Registry**: name- and type-indexed component lookup with explicit
//!   override resolution; lookups always return a sequence
//! - **Route composition**: canonical path joining and deterministic
//!   middleware ordering (controller-level before route-level)
//! - **Late-bound middleware**: references resolve after every component is
//!   registered, and one name may expand to a set of middleware
//! - **Scheduled jobs**: cron expressions validated at declaration time
//! - **Lifecycle hooks**: `OnModuleInit` and `OnApplicationShutdown`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trellis::prelude::*;
//!
//! #[derive(Default)]
//! pub struct UsersController;
//!
//! impl UsersController {
//!     async fn find(self: Arc<Self>, request: Request<Body>) -> HandlerResult {
//!         Ok(format!("user at {}", request.uri().path()).into_response())
//!     }
//! }
//!
//! impl Controller for UsersController {
//!     fn handler(self: Arc<Self>, operation: &str) -> Option<Handler> {
//!         match operation {
//!             "find" => Some(bind(self, UsersController::find)),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> trellis::Result<()> {
//!     let discovery = StaticDiscovery::new().add(annotate::controller(
//!         Class::of::<UsersController>().with_routes(),
//!         ControllerParams::new("/users").route(RouteEntry::get("find", "/:id")),
//!     ));
//!
//!     Server::new(ServerConfig::default())
//!         .port(8080)
//!         .discover(discovery)
//!         .start()
//!         .await
//! }
//! ```

pub mod adapter;
pub mod component;
pub mod config;
pub mod controller;
pub mod di;
pub mod error;
pub mod exception;
pub mod lifecycle;
pub mod metadata;
pub mod middleware;
pub mod router;
pub mod schedule;
pub mod server;

// Re-export core types
pub use component::{Class, ClassDef, ComponentInstance, Definition};
pub use di::{Discovery, Registry, RegistryBuilder, StaticDiscovery};
pub use error::{Result, TrellisError};
pub use metadata::{ComponentDescriptor, ComponentType};
pub use server::Server;

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use trellis::prelude::*;
/// ```
pub mod prelude {
    pub use crate::adapter::{Adapter, AxumAdapter, RouteRegistration};
    pub use crate::component::annotate::{
        self, ComponentParams, ControllerParams, MiddlewareParams, ScheduleParams,
    };
    pub use crate::component::{Class, ClassDef, ComponentInstance, Definition};
    pub use crate::config::{ConfigService, ServerConfig};
    pub use crate::controller::{Controller, Handler, HandlerResult, bind};
    pub use crate::di::{Discovery, Registry, RegistryBuilder, StaticDiscovery};
    pub use crate::error::{BoxError, Result, TrellisError};
    pub use crate::exception::{ExceptionFilter, HttpException, HttpExceptionFilter};
    pub use crate::lifecycle::{LifecycleError, OnApplicationShutdown, OnModuleInit};
    pub use crate::metadata::{ComponentDescriptor, ComponentType, HttpMethod, MiddlewareRef, RouteEntry};
    pub use crate::middleware::{Middleware, MiddlewareChain, Next};
    pub use crate::schedule::Job;
    pub use crate::server::Server;
    pub use async_trait::async_trait;
    pub use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
