//! Route and middleware composition.
//!
//! Turns a controller's routing metadata plus the registry's contents into
//! transport-agnostic [`RouteRecord`]s. Middleware references are resolved
//! here, after every component is registered.

use crate::component::ComponentInstance;
use crate::controller::Handler;
use crate::di::Registry;
use crate::error::{Result, TrellisError};
use crate::metadata::{ComponentType, HttpMethod, MiddlewareRef};
use crate::middleware::Middleware;
use std::fmt;
use std::sync::Arc;

/// A middleware instance resolved from a reference.
#[derive(Clone)]
pub struct ResolvedMiddleware {
    pub name: String,
    pub middleware: Arc<dyn Middleware>,
}

impl fmt::Debug for ResolvedMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResolvedMiddleware").field(&self.name).finish()
    }
}

/// One fully composed route.
#[derive(Clone)]
pub struct RouteRecord {
    pub controller: String,
    pub operation: String,
    pub method: HttpMethod,
    pub path: String,
    pub description: Option<String>,
    pub middlewares: Vec<ResolvedMiddleware>,
    pub handler: Handler,
}

impl RouteRecord {
    pub fn middleware_chain(&self) -> Vec<Arc<dyn Middleware>> {
        self.middlewares
            .iter()
            .map(|resolved| Arc::clone(&resolved.middleware))
            .collect()
    }

    pub fn middleware_names(&self) -> Vec<&str> {
        self.middlewares.iter().map(|m| m.name.as_str()).collect()
    }
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("controller", &self.controller)
            .field("operation", &self.operation)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("description", &self.description)
            .field("middlewares", &self.middleware_names())
            .finish()
    }
}

/// Join a base path and a route path into one canonical, rooted path.
///
/// ```
/// use trellis::router::join_paths;
///
/// assert_eq!(join_paths("/a/", "/b").unwrap(), "/a/b");
/// assert_eq!(join_paths("", "/b").unwrap(), "/b");
/// ```
pub fn join_paths(base: &str, path: &str) -> Result<String> {
    let joined = format!("{base}/{path}");
    let mut segments: Vec<&str> = Vec::new();

    for segment in joined.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(TrellisError::invalid_path(joined.clone(), "'..' escapes the root"));
                }
            }
            _ => {
                if segment.chars().any(|c| c.is_whitespace() || c == '?' || c == '#') {
                    let reason = format!("segment '{segment}' contains a reserved character");
                    return Err(TrellisError::invalid_path(joined.clone(), reason));
                }
                if segment == ":" {
                    return Err(TrellisError::invalid_path(joined.clone(), "empty parameter name"));
                }
                segments.push(segment);
            }
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Resolve middleware references against the registry.
///
/// A reference with no registered component is skipped. A reference naming
/// several instances expands to all of them, in registration order.
pub fn resolve_middlewares<'a, I>(registry: &Registry, refs: I) -> Vec<ResolvedMiddleware>
where
    I: IntoIterator<Item = &'a MiddlewareRef>,
{
    let mut resolved = Vec::new();
    for reference in refs {
        let instances = registry.get(reference.name());
        if instances.is_empty() {
            tracing::debug!("Middleware '{}' is not registered, skipping", reference.name());
            continue;
        }
        for instance in instances {
            match instance.as_middleware() {
                Some(middleware) => resolved.push(ResolvedMiddleware {
                    name: reference.name().to_string(),
                    middleware,
                }),
                None => tracing::warn!(
                    "Component '{}' ({}) has no middleware handler, skipping",
                    instance.name(),
                    instance.type_name()
                ),
            }
        }
    }
    resolved
}

/// Compose every route declared on one controller instance.
pub fn compose(registry: &Registry, controller: &ComponentInstance) -> Result<Vec<RouteRecord>> {
    let routing = controller
        .descriptor()
        .controller()
        .ok_or_else(|| TrellisError::InvalidDescriptor {
            name: controller.name().to_string(),
            message: "controller has no routing metadata".to_string(),
        })?;

    if routing.routes().is_empty() {
        return Ok(Vec::new());
    }

    let target = controller
        .as_controller()
        .ok_or_else(|| TrellisError::UnknownOperation {
            controller: controller.name().to_string(),
            operation: routing.routes()[0].method_name.clone(),
        })?;

    let mut records = Vec::with_capacity(routing.routes().len());
    for route in routing.routes() {
        let path = join_paths(&routing.base_path, &route.path)?;
        let middlewares = resolve_middlewares(
            registry,
            routing.middlewares.iter().chain(route.middlewares.iter()),
        );
        let handler = Arc::clone(&target)
            .handler(&route.method_name)
            .ok_or_else(|| TrellisError::UnknownOperation {
                controller: controller.name().to_string(),
                operation: route.method_name.clone(),
            })?;

        records.push(RouteRecord {
            controller: controller.name().to_string(),
            operation: route.method_name.clone(),
            method: route.http_method,
            path,
            description: route.description.clone(),
            middlewares,
            handler,
        });
    }
    Ok(records)
}

/// Compose the routes of every registered controller, in registration order.
pub fn compose_all(registry: &Registry) -> Result<Vec<RouteRecord>> {
    let mut records = Vec::new();
    for controller in registry.get_all(ComponentType::Controller) {
        records.extend(compose(registry, &controller)?);
    }
    Ok(records)
}
