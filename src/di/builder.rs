use super::Registry;
use crate::component::annotate::missing_handler;
use crate::component::{Class, Definition};
use crate::error::{Result, TrellisError};
use crate::metadata::{ComponentDescriptor, ComponentType, short_name};
use crate::schedule::CronSchedule;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

struct Pending {
    class: Class,
    descriptor: ComponentDescriptor,
}

/// Collects declared components and turns them into a [`Registry`].
///
/// Name collisions are resolved as components are registered: among all
/// definitions sharing a name exactly one must be marked override.
///
/// # Example
/// ```rust,ignore
/// let mut builder = RegistryBuilder::new();
/// builder.register_definition(annotate::service(Class::of::<RedisCache>(), "cache"))?;
/// builder.register_definition(annotate::service(Class::of::<MemoryCache>(), "cache").overriding())?;
/// let registry = builder.build();
/// ```
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<Pending>,
    names: HashMap<String, Vec<usize>>,
    rejected: Vec<TrellisError>,
}

impl fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.pending.iter().map(|p| p.descriptor.name.as_str()).collect();
        f.debug_struct("RegistryBuilder")
            .field("pending", &names)
            .field("rejected", &self.rejected.len())
            .finish()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class to the pending list under its descriptor.
    ///
    /// A scheduled component whose schedule does not validate is refused with
    /// a `Schedule` error and recorded in [`Registry::rejected`]. It never
    /// takes part in name collisions.
    pub fn register(
        &mut self,
        class: impl Into<Class>,
        descriptor: ComponentDescriptor,
    ) -> Result<&mut Self> {
        let class = class.into();
        self.check_shape(&class, &descriptor)?;
        if descriptor.component_type == ComponentType::Schedule {
            if let Err((cron, reason)) = validate_schedule(&descriptor) {
                tracing::warn!(
                    "Scheduled component '{}' rejected: {}",
                    descriptor.name,
                    reason
                );
                self.rejected.push(TrellisError::schedule(&cron, &reason));
                return Err(TrellisError::schedule(cron, reason));
            }
        }
        self.check_collision(&descriptor)?;

        tracing::debug!(
            "Registered {} '{}' ({})",
            descriptor.component_type,
            descriptor.name,
            short_name(class.type_name())
        );

        let index = self.pending.len();
        self.names
            .entry(descriptor.name.clone())
            .or_default()
            .push(index);
        self.pending.push(Pending { class, descriptor });
        Ok(self)
    }

    pub fn register_definition(&mut self, definition: Definition) -> Result<&mut Self> {
        self.register(definition.class, definition.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn check_shape(&self, class: &Class, descriptor: &ComponentDescriptor) -> Result<()> {
        match descriptor.component_type {
            ComponentType::Controller if class.binding().is_multi() => {
                Err(TrellisError::InvalidDescriptor {
                    name: descriptor.name.clone(),
                    message: "a controller cannot be bound to multiple instances".to_string(),
                })
            }
            ComponentType::Middleware if !class.has_handler() => Err(missing_handler(class)),
            ComponentType::Schedule if !class.has_job() => Err(TrellisError::MissingHandler {
                type_name: short_name(class.type_name()),
                operation: "run".to_string(),
                role: "a scheduled job".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn check_collision(&self, descriptor: &ComponentDescriptor) -> Result<()> {
        let Some(existing) = self.names.get(&descriptor.name) else {
            return Ok(());
        };
        let overrides = existing
            .iter()
            .filter(|&&index| self.pending[index].descriptor.overrides)
            .count()
            + usize::from(descriptor.overrides);
        if overrides != 1 {
            return Err(TrellisError::DuplicateComponent {
                name: descriptor.name.clone(),
                count: existing.len() + 1,
                overrides,
            });
        }
        Ok(())
    }

    /// Instantiate every winning component exactly once, in registration order.
    pub fn build(self) -> Registry {
        let mut instances = Vec::new();

        for Pending { class, descriptor } in &self.pending {
            let contenders = &self.names[&descriptor.name];
            if contenders.len() > 1 && !descriptor.overrides {
                tracing::debug!(
                    "'{}' ({}) is overridden",
                    descriptor.name,
                    short_name(class.type_name())
                );
                continue;
            }

            let descriptor = Arc::new(descriptor.clone());
            instances.extend(class.instantiate(&descriptor));
        }

        Registry::new(instances, self.rejected)
    }
}

// Declared schedules are parsed once already; this re-check covers
// descriptors that were built by hand. Returns the expression and the reason.
fn validate_schedule(descriptor: &ComponentDescriptor) -> std::result::Result<(), (String, String)> {
    let Some(schedule) = descriptor.schedule() else {
        return Err((String::new(), "no cron expression attached".to_string()));
    };
    CronSchedule::parse(schedule.raw_cron())
        .map(|_| ())
        .map_err(|reason| (schedule.raw_cron().to_string(), reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ClassDef, annotate};
    use crate::controller::{Controller, Handler};
    use crate::schedule::Job;
    use async_trait::async_trait;

    struct Cache(&'static str);

    fn cache(label: &'static str) -> ClassDef<Cache> {
        ClassDef::new(move || Cache(label))
    }

    #[derive(Default)]
    struct Users;

    impl Controller for Users {
        fn handler(self: Arc<Self>, _operation: &str) -> Option<Handler> {
            None
        }
    }

    #[derive(Default)]
    struct Cleanup;

    #[async_trait]
    impl Job for Cleanup {
        async fn run(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_duplicate_without_override_fails() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_definition(annotate::service(cache("redis"), "cache"))
            .unwrap();
        let err = builder
            .register_definition(annotate::service(cache("memory"), "cache"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            TrellisError::DuplicateComponent { ref name, count: 2, overrides: 0 } if name == "cache"
        ));
    }

    #[test]
    fn test_duplicate_with_two_overrides_fails() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_definition(annotate::service(cache("redis"), "cache").overriding())
            .unwrap();
        let err = builder
            .register_definition(annotate::service(cache("memory"), "cache").overriding())
            .err()
            .unwrap();
        assert!(matches!(err, TrellisError::DuplicateComponent { overrides: 2, .. }));
    }

    #[test]
    fn test_single_override_wins_regardless_of_order() {
        for override_first in [true, false] {
            let mut builder = RegistryBuilder::new();
            let redis = annotate::service(cache("redis"), "cache");
            let memory = annotate::service(cache("memory"), "cache").overriding();
            let (a, b) = if override_first {
                (memory, redis)
            } else {
                (redis, memory)
            };
            builder.register_definition(a).unwrap();
            builder.register_definition(b).unwrap();

            let registry = builder.build();
            let found = registry.get("cache");
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].downcast::<Cache>().unwrap().0, "memory");
        }
    }

    #[test]
    fn test_third_duplicate_is_checked_against_all() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_definition(annotate::service(cache("a"), "cache"))
            .unwrap();
        builder
            .register_definition(annotate::service(cache("b"), "cache").overriding())
            .unwrap();
        builder
            .register_definition(annotate::service(cache("c"), "cache"))
            .unwrap();
        assert!(
            builder
                .register_definition(annotate::service(cache("d"), "cache").overriding())
                .is_err()
        );

        let registry = builder.build();
        assert_eq!(registry.get("cache")[0].downcast::<Cache>().unwrap().0, "b");
    }

    #[test]
    fn test_multi_bound_controller_is_rejected() {
        let ctors: [fn() -> Users; 2] = [Users::default, Users::default];
        let definition = annotate::controller(ClassDef::set(ctors).with_routes(), "/users");
        let err = RegistryBuilder::new()
            .register_definition(definition)
            .err()
            .unwrap();
        assert!(matches!(err, TrellisError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_hand_built_descriptors_are_validated() {
        let mut builder = RegistryBuilder::new();
        let err = builder
            .register(
                Class::of::<Cleanup>(),
                ComponentDescriptor::new("plain", ComponentType::Middleware),
            )
            .err()
            .unwrap();
        assert!(matches!(err, TrellisError::MissingHandler { .. }));

        // A schedule descriptor without a cron expression only drops that component.
        let err = builder
            .register(
                Class::of::<Cleanup>().with_job(),
                ComponentDescriptor::new("cleanup", ComponentType::Schedule),
            )
            .unwrap_err();
        assert!(!err.is_fatal());
        assert!(!builder.contains("cleanup"));
        builder
            .register_definition(
                annotate::schedule(Class::of::<Cleanup>().with_job(), "@hourly").unwrap(),
            )
            .unwrap();

        let registry = builder.build();
        let jobs = registry.get_all(ComponentType::Schedule);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name(), "Cleanup");
        assert_eq!(registry.rejected().len(), 1);
        assert!(!registry.rejected()[0].is_fatal());
    }

    #[test]
    fn test_rejected_override_schedule_keeps_the_other_component() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_definition(annotate::service(cache("kept"), "job"))
            .unwrap();
        let err = builder
            .register(
                Class::of::<Cleanup>().with_job(),
                ComponentDescriptor::new("job", ComponentType::Schedule).with_override(true),
            )
            .unwrap_err();
        assert!(matches!(err, TrellisError::Schedule { .. }));

        let registry = builder.build();
        let found = registry.get("job");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].downcast::<Cache>().unwrap().0, "kept");
        assert_eq!(registry.rejected().len(), 1);
    }

    #[test]
    fn test_registration_order_is_kept() {
        let mut builder = RegistryBuilder::new();
        for name in ["c", "a", "b"] {
            builder
                .register_definition(annotate::service(cache(name), name))
                .unwrap();
        }
        let registry = builder.build();
        let names: Vec<String> = registry
            .get_all(ComponentType::Service)
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
