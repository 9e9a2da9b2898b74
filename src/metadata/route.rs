use super::default_name;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

/// Reference to a middleware component by name.
///
/// Resolved when routes are composed, not when the reference is created, so
/// the referenced component does not need to exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MiddlewareRef(String);

impl MiddlewareRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Reference a middleware declared under its default (type) name.
    pub fn of<T: ?Sized>() -> Self {
        Self(default_name::<T>())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One route declared on a controller operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub method_name: String,
    pub http_method: HttpMethod,
    pub path: String,
    pub description: Option<String>,
    pub middlewares: Vec<MiddlewareRef>,
}

impl RouteEntry {
    pub fn new(
        http_method: HttpMethod,
        method_name: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            method_name: method_name.into(),
            http_method,
            path: path.into(),
            description: None,
            middlewares: Vec::new(),
        }
    }

    pub fn get(method_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, method_name, path)
    }

    pub fn post(method_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, method_name, path)
    }

    pub fn put(method_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, method_name, path)
    }

    pub fn delete(method_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, method_name, path)
    }

    pub fn patch(method_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Patch, method_name, path)
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middlewares.push(middleware.into());
        self
    }
}

/// Routing metadata of a controller class.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerDescriptor {
    pub base_path: String,
    pub middlewares: Vec<MiddlewareRef>,
    routes: Vec<RouteEntry>,
}

impl ControllerDescriptor {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            middlewares: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Add a route. A later entry for the same operation replaces the earlier
    /// one in place.
    pub fn add_route(&mut self, route: RouteEntry) {
        match self
            .routes
            .iter_mut()
            .find(|existing| existing.method_name == route.method_name)
        {
            Some(existing) => *existing = route,
            None => self.routes.push(route),
        }
    }

    pub fn route(&self, method_name: &str) -> Option<&RouteEntry> {
        self.routes.iter().find(|r| r.method_name == method_name)
    }

    /// Routes in declaration order.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }
}
