//! Server bootstrap.
//!
//! Startup is strictly sequential: registry → services → controllers →
//! error handling → transport. Any fatal error aborts the whole sequence
//! before the transport sees a single route.

use crate::adapter::{Adapter, AxumAdapter, RouteRegistration};
use crate::component::ClassDef;
use crate::component::annotate::server_service;
use crate::config::{ConfigService, ServerConfig};
use crate::di::{Discovery, Registry, RegistryBuilder};
use crate::error::{Result, TrellisError};
use crate::exception::{ExceptionFilter, HttpExceptionFilter};
use crate::lifecycle::LifecycleManager;
use crate::metadata::ComponentType;
use crate::router::{self, RouteRecord};
use crate::schedule::Scheduler;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Name under which the bootstrap registers [`ConfigService`].
pub const CONFIG_COMPONENT: &str = "config";

pub struct Server<A: Adapter = AxumAdapter> {
    config: ServerConfig,
    adapter: A,
    discoveries: Vec<Box<dyn Discovery>>,
    exception_filter: Arc<dyn ExceptionFilter>,
    lifecycle: LifecycleManager,
    registry: Option<Arc<Registry>>,
    routes: Vec<RouteRecord>,
}

impl Server<AxumAdapter> {
    pub fn new(config: ServerConfig) -> Self {
        let adapter = AxumAdapter::new().host(config.host.clone());
        Self::with_adapter(config, adapter)
    }

    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(ServerConfig::load(path)?))
    }

    /// The axum router for the routes registered so far.
    pub fn router(&self) -> axum::Router {
        self.adapter.router()
    }
}

impl<A: Adapter> Server<A> {
    pub fn with_adapter(config: ServerConfig, mut adapter: A) -> Self {
        adapter.set_port(config.port);
        Self {
            config,
            adapter,
            discoveries: Vec::new(),
            exception_filter: Arc::new(HttpExceptionFilter),
            lifecycle: LifecycleManager::new(),
            registry: None,
            routes: Vec::new(),
        }
    }

    /// Override the configured port.
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self.adapter.set_port(port);
        self
    }

    /// Add a discovery source. Sources run in the order they were added.
    pub fn discover(mut self, discovery: impl Discovery + 'static) -> Self {
        self.discoveries.push(Box::new(discovery));
        self
    }

    pub fn exception_filter(mut self, filter: impl ExceptionFilter) -> Self {
        self.exception_filter = Arc::new(filter);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// The registry, once bootstrapped.
    pub fn registry(&self) -> Option<&Arc<Registry>> {
        self.registry.as_ref()
    }

    /// Routes handed to the adapter, in registration order.
    pub fn routes(&self) -> &[RouteRecord] {
        &self.routes
    }

    /// Run every startup step except starting the transport.
    ///
    /// Idempotent: a second call returns the registry built by the first.
    pub async fn bootstrap(&mut self) -> Result<Arc<Registry>> {
        if let Some(registry) = &self.registry {
            return Ok(Arc::clone(registry));
        }

        let registry = Arc::new(self.init_registry().await?);
        self.init_services(&registry).await?;
        self.init_controllers(&registry)?;
        self.configure_error_handling();

        self.registry = Some(Arc::clone(&registry));
        Ok(registry)
    }

    /// Bootstrap, run scheduled jobs and serve until the transport stops.
    /// Shutdown hooks run after the transport returns.
    pub async fn start(mut self) -> Result<()> {
        let registry = self.bootstrap().await?;
        let scheduler = Scheduler::from_registry(&registry).start();

        tracing::info!("Server started on port {}", self.config.port);
        let served = self.adapter.start().await;
        if let Err(e) = &served {
            tracing::error!("Transport stopped with error: {}", e);
        }

        scheduler.shutdown().await;
        self.lifecycle.call_application_shutdown().await;
        served
    }

    async fn init_registry(&self) -> Result<Registry> {
        let mut builder = RegistryBuilder::new();
        let config = ConfigService::from_config(&self.config);
        builder.register_definition(server_service(
            ClassDef::new(move || config.clone()),
            CONFIG_COMPONENT,
        ))?;

        for discovery in &self.discoveries {
            discovery.search_and_register(&mut builder).await?;
        }

        let registry = builder.build();
        for rejected in registry.rejected() {
            tracing::warn!("Component rejected: {}", rejected);
        }
        tracing::info!("IoC initialized");
        Ok(registry)
    }

    async fn init_services(&mut self, registry: &Registry) -> Result<()> {
        self.lifecycle = LifecycleManager::from_registry(registry);
        self.lifecycle.call_module_init().await?;
        Ok(())
    }

    /// Compose every controller before touching the adapter, so a failing
    /// controller leaves no route registered.
    fn init_controllers(&mut self, registry: &Registry) -> Result<()> {
        let mut composed = Vec::new();
        let mut seen = HashSet::new();
        for controller in registry.get_all(ComponentType::Controller) {
            let routes = router::compose(registry, &controller)?;
            for route in &routes {
                if !seen.insert((route.method, route.path.clone())) {
                    return Err(TrellisError::RouteConflict {
                        method: route.method.to_string(),
                        path: route.path.clone(),
                    });
                }
            }
            composed.push((controller, routes));
        }

        for (controller, routes) in composed {
            tracing::info!("Controller: {} found", controller.name());

            for route in routes {
                let middleware = self.adapter.prepare_middlewares(route.middleware_chain());
                let handler = self.adapter.prepare_handler(Arc::clone(&route.handler));
                self.adapter.register_route(RouteRegistration {
                    method: route.method,
                    path: route.path.clone(),
                    middleware,
                    handler,
                })?;

                match &route.description {
                    Some(description) => tracing::info!(
                        "METHOD: {}, PATH: {}, DESCRIPTION: {}, READY",
                        route.method,
                        route.path,
                        description
                    ),
                    None => tracing::info!("METHOD: {}, PATH: {}, READY", route.method, route.path),
                }
                self.routes.push(route);
            }
        }
        Ok(())
    }

    fn configure_error_handling(&mut self) {
        self.adapter
            .set_exception_filter(Arc::clone(&self.exception_filter));
    }
}
