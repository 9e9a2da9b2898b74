//! Declaration-time metadata for components.
//!
//! A [`ComponentDescriptor`] is produced when a class is declared and passed
//! explicitly to the registry. It carries everything the registry and the
//! route composer need to know about a class: its name, its classification,
//! whether it wins name collisions, and a type-specific payload.

mod route;

pub use route::{ControllerDescriptor, HttpMethod, MiddlewareRef, RouteEntry};

use crate::schedule::ScheduleDescriptor;
use strum_macros::{Display, EnumIter, EnumString};

/// Classification marker of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentType {
    Component,
    Service,
    Controller,
    ServerService,
    Schedule,
    Middleware,
}

/// Type-specific part of a descriptor.
#[derive(Debug, Clone, Default)]
pub enum DescriptorExtra {
    #[default]
    None,
    Controller(ControllerDescriptor),
    Schedule(ScheduleDescriptor),
}

#[derive(Debug, Clone)]
pub struct ComponentDescriptor {
    pub name: String,
    pub component_type: ComponentType,
    pub overrides: bool,
    pub extra: DescriptorExtra,
}

impl ComponentDescriptor {
    pub fn new(name: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            name: name.into(),
            component_type,
            overrides: false,
            extra: DescriptorExtra::None,
        }
    }

    pub fn with_override(mut self, overrides: bool) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn with_extra(mut self, extra: DescriptorExtra) -> Self {
        self.extra = extra;
        self
    }

    pub fn controller(&self) -> Option<&ControllerDescriptor> {
        match &self.extra {
            DescriptorExtra::Controller(controller) => Some(controller),
            _ => None,
        }
    }

    pub fn schedule(&self) -> Option<&ScheduleDescriptor> {
        match &self.extra {
            DescriptorExtra::Schedule(schedule) => Some(schedule),
            _ => None,
        }
    }
}

/// Short, human-facing name of a type: last path segment with generics removed.
pub fn default_name<T: ?Sized>() -> String {
    short_name(std::any::type_name::<T>())
}

pub(crate) fn short_name(type_name: &str) -> String {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    struct UsersController;
    struct Wrapper<T>(T);

    #[test]
    fn test_default_name_strips_path_and_generics() {
        assert_eq!(default_name::<UsersController>(), "UsersController");
        assert_eq!(default_name::<Wrapper<UsersController>>(), "Wrapper");
    }

    #[test]
    fn test_component_type_names() {
        assert_eq!(ComponentType::ServerService.to_string(), "SERVER_SERVICE");
        assert_eq!(
            ComponentType::from_str("SCHEDULE").unwrap(),
            ComponentType::Schedule
        );
        for component_type in ComponentType::iter() {
            assert_eq!(
                ComponentType::from_str(&component_type.to_string()).unwrap(),
                component_type
            );
        }
    }

    #[test]
    fn test_descriptor_accessors() {
        let descriptor = ComponentDescriptor::new("users", ComponentType::Controller).with_extra(
            DescriptorExtra::Controller(ControllerDescriptor::new("/users")),
        );
        assert_eq!(descriptor.controller().unwrap().base_path, "/users");
        assert!(descriptor.schedule().is_none());
        assert!(!descriptor.overrides);
    }
}
