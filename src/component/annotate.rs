//! Declarative component markers.
//!
//! Each marker turns a [`Class`] into a [`Definition`]: the class plus the
//! [`ComponentDescriptor`] the registry consumes. Shape constraints that can be
//! checked without the registry are checked here, before any scan starts.

use super::Class;
use crate::error::{Result, TrellisError};
use crate::metadata::{
    ComponentDescriptor, ComponentType, ControllerDescriptor, DescriptorExtra, MiddlewareRef,
    RouteEntry, short_name,
};
use crate::schedule::ScheduleDescriptor;

/// A declared class, ready to be registered.
#[derive(Debug, Clone)]
pub struct Definition {
    pub class: Class,
    pub descriptor: ComponentDescriptor,
}

impl Definition {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Mark this component as the winner of a name collision.
    pub fn overriding(mut self) -> Self {
        self.descriptor.overrides = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ComponentParams {
    pub name: Option<String>,
    pub overrides: bool,
}

impl ComponentParams {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            overrides: false,
        }
    }

    pub fn overriding(mut self) -> Self {
        self.overrides = true;
        self
    }
}

impl From<&str> for ComponentParams {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for ComponentParams {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ControllerParams {
    pub path: String,
    pub name: Option<String>,
    pub middlewares: Vec<MiddlewareRef>,
    pub routes: Vec<RouteEntry>,
    pub overrides: bool,
}

impl ControllerParams {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Controller-level middleware, applied before every route's own list.
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middlewares.push(middleware.into());
        self
    }

    pub fn route(mut self, route: RouteEntry) -> Self {
        self.routes.push(route);
        self
    }

    pub fn overriding(mut self) -> Self {
        self.overrides = true;
        self
    }
}

impl From<&str> for ControllerParams {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleParams {
    pub cron: String,
    pub name: Option<String>,
    pub overrides: bool,
}

impl ScheduleParams {
    pub fn new(cron: impl Into<String>) -> Self {
        Self {
            cron: cron.into(),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl From<&str> for ScheduleParams {
    fn from(cron: &str) -> Self {
        Self::new(cron)
    }
}

pub type MiddlewareParams = ComponentParams;

fn define(
    class: Class,
    component_type: ComponentType,
    name: Option<String>,
    overrides: bool,
    extra: DescriptorExtra,
) -> Definition {
    let name = name.unwrap_or_else(|| short_name(class.type_name()));
    let descriptor = ComponentDescriptor::new(name, component_type)
        .with_override(overrides)
        .with_extra(extra);
    Definition { class, descriptor }
}

/// Plain component.
pub fn component(class: impl Into<Class>, params: impl Into<ComponentParams>) -> Definition {
    let params = params.into();
    define(
        class.into(),
        ComponentType::Component,
        params.name,
        params.overrides,
        DescriptorExtra::None,
    )
}

pub fn service(class: impl Into<Class>, params: impl Into<ComponentParams>) -> Definition {
    let params = params.into();
    define(
        class.into(),
        ComponentType::Service,
        params.name,
        params.overrides,
        DescriptorExtra::None,
    )
}

/// Background service owned by the server process.
pub fn server_service(class: impl Into<Class>, params: impl Into<ComponentParams>) -> Definition {
    let params = params.into();
    define(
        class.into(),
        ComponentType::ServerService,
        params.name,
        params.overrides,
        DescriptorExtra::None,
    )
}

/// Controller with its base path, controller-level middleware and routes.
pub fn controller(class: impl Into<Class>, params: impl Into<ControllerParams>) -> Definition {
    let params = params.into();
    let mut routing = ControllerDescriptor::new(params.path);
    routing.middlewares = params.middlewares;
    for route in params.routes {
        routing.add_route(route);
    }
    define(
        class.into(),
        ComponentType::Controller,
        params.name,
        params.overrides,
        DescriptorExtra::Controller(routing),
    )
}

/// Scheduled job. The cron expression is parsed here so a malformed schedule
/// fails as early as possible.
pub fn schedule(class: impl Into<Class>, params: impl Into<ScheduleParams>) -> Result<Definition> {
    let class = class.into();
    let params = params.into();
    let schedule = ScheduleDescriptor::parse(params.cron)?;
    if !class.has_job() {
        return Err(TrellisError::MissingHandler {
            type_name: short_name(class.type_name()),
            operation: "run".to_string(),
            role: "a scheduled job".to_string(),
        });
    }
    Ok(define(
        class,
        ComponentType::Schedule,
        params.name,
        params.overrides,
        DescriptorExtra::Schedule(schedule),
    ))
}

/// Middleware. The class must expose a `handle` operation.
pub fn middleware(
    class: impl Into<Class>,
    params: impl Into<MiddlewareParams>,
) -> Result<Definition> {
    let class = class.into();
    let params = params.into();
    if !class.has_handler() {
        return Err(missing_handler(&class));
    }
    Ok(define(
        class,
        ComponentType::Middleware,
        params.name,
        params.overrides,
        DescriptorExtra::None,
    ))
}

/// Mark any definition as the winner of a name collision.
pub fn overriding(definition: Definition) -> Definition {
    definition.overriding()
}

pub(crate) fn missing_handler(class: &Class) -> TrellisError {
    TrellisError::MissingHandler {
        type_name: short_name(class.type_name()),
        operation: "handle".to_string(),
        role: "middleware".to_string(),
    }
}
