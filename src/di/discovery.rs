use super::RegistryBuilder;
use crate::component::Definition;
use crate::error::Result;
use async_trait::async_trait;

/// Finds the component set and feeds it to the registry.
///
/// Runs once, to completion, before the registry is built.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn search_and_register(&self, registry: &mut RegistryBuilder) -> Result<()>;
}

type Declaration = Box<dyn Fn() -> Result<Definition> + Send + Sync>;

/// Discovery over an explicit list of declarations.
///
/// Declarations run during discovery. A declaration that fails with a local
/// error (a malformed schedule) is skipped; any other error stops discovery.
///
/// # Example
/// ```rust,ignore
/// let discovery = StaticDiscovery::new()
///     .add(annotate::service(Class::of::<UserService>(), "users"))
///     .declare(|| annotate::schedule(Class::of::<Cleanup>().with_job(), "*/5 * * * *"));
/// ```
#[derive(Default)]
pub struct StaticDiscovery {
    declarations: Vec<Declaration>,
}

impl StaticDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(self, definition: Definition) -> Self {
        self.declare(move || Ok(definition.clone()))
    }

    pub fn declare<F>(mut self, declaration: F) -> Self
    where
        F: Fn() -> Result<Definition> + Send + Sync + 'static,
    {
        self.declarations.push(Box::new(declaration));
        self
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn search_and_register(&self, registry: &mut RegistryBuilder) -> Result<()> {
        for declaration in &self.declarations {
            let registered = declaration()
                .and_then(|definition| registry.register_definition(definition).map(|_| ()));
            match registered {
                Ok(()) => {}
                Err(e) if !e.is_fatal() => {
                    tracing::warn!("Skipping component: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Class, annotate};
    use crate::error::TrellisError;
    use crate::metadata::{ComponentDescriptor, ComponentType};
    use crate::schedule::Job;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Report;

    #[async_trait]
    impl Job for Report {
        async fn run(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Plain;

    #[tokio::test]
    async fn test_bad_schedule_skips_only_that_component() {
        let discovery = StaticDiscovery::new()
            .declare(|| {
                annotate::schedule(
                    Class::of::<Report>().with_job(),
                    annotate::ScheduleParams::new("not-a-cron").name("broken"),
                )
            })
            .declare(|| annotate::schedule(Class::of::<Report>().with_job(), "*/5 * * * *"))
            .add(annotate::service(Class::of::<Plain>(), "plain"));
        assert_eq!(discovery.len(), 3);

        let mut builder = RegistryBuilder::new();
        discovery.search_and_register(&mut builder).await.unwrap();
        let registry = builder.build();

        let jobs = registry.get_all(ComponentType::Schedule);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name(), "Report");
        assert!(registry.get("broken").is_empty());
        assert!(registry.contains("plain"));
    }

    #[tokio::test]
    async fn test_refused_registration_is_skipped() {
        let definition = Definition {
            class: Class::of::<Report>().with_job().build(),
            descriptor: ComponentDescriptor::new("nightly", ComponentType::Schedule),
        };
        let discovery = StaticDiscovery::new()
            .add(definition)
            .add(annotate::service(Class::of::<Plain>(), "plain"));

        let mut builder = RegistryBuilder::new();
        discovery.search_and_register(&mut builder).await.unwrap();
        let registry = builder.build();

        assert!(registry.get("nightly").is_empty());
        assert!(registry.contains("plain"));
        assert_eq!(registry.rejected().len(), 1);
    }

    #[tokio::test]
    async fn test_fatal_declaration_error_stops_discovery() {
        let discovery = StaticDiscovery::new()
            .declare(|| annotate::middleware(Class::of::<Plain>(), "plain"));
        let mut builder = RegistryBuilder::new();
        let err = discovery.search_and_register(&mut builder).await.unwrap_err();
        assert!(matches!(err, TrellisError::MissingHandler { .. }));
        assert!(builder.is_empty());
    }
}
