use crate::component::ComponentInstance;
use crate::error::{Result, TrellisError};
use crate::metadata::ComponentType;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// The populated component container.
///
/// Built once by [`RegistryBuilder::build`](super::RegistryBuilder::build) and
/// read-only afterwards, so lookups need no coordination with writers.
pub struct Registry {
    by_name: DashMap<String, Vec<ComponentInstance>>,
    by_type: DashMap<ComponentType, Vec<ComponentInstance>>,
    instances: Vec<ComponentInstance>,
    rejected: Vec<TrellisError>,
}

impl Registry {
    pub(super) fn new(instances: Vec<ComponentInstance>, rejected: Vec<TrellisError>) -> Self {
        let by_name: DashMap<String, Vec<ComponentInstance>> = DashMap::new();
        let by_type: DashMap<ComponentType, Vec<ComponentInstance>> = DashMap::new();
        for instance in &instances {
            by_name
                .entry(instance.name().to_string())
                .or_default()
                .push(instance.clone());
            by_type
                .entry(instance.component_type())
                .or_default()
                .push(instance.clone());
        }
        Self {
            by_name,
            by_type,
            instances,
            rejected,
        }
    }

    /// Every instance registered under `name`, in registration order.
    ///
    /// An unknown name yields an empty sequence.
    pub fn get(&self, name: &str) -> Vec<ComponentInstance> {
        self.by_name
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Every instance of a classification, in registration order.
    pub fn get_all(&self, component_type: ComponentType) -> Vec<ComponentInstance> {
        self.by_type
            .get(&component_type)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// All instances in registration order.
    pub fn instances(&self) -> &[ComponentInstance] {
        &self.instances
    }

    /// Resolve a required dependency by name.
    pub fn resolve<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>> {
        let entry = self
            .by_name
            .get(name)
            .ok_or_else(|| TrellisError::DependencyNotFound {
                name: name.to_string(),
            })?;
        let instance = entry
            .value()
            .first()
            .ok_or_else(|| TrellisError::DependencyNotFound {
                name: name.to_string(),
            })?;
        instance
            .downcast::<T>()
            .ok_or_else(|| TrellisError::DowncastFailed {
                name: name.to_string(),
                type_name: std::any::type_name::<T>().to_string(),
            })
    }

    /// Resolve every instance registered under `name`.
    pub fn resolve_all<T: Send + Sync + 'static>(&self, name: &str) -> Result<Vec<Arc<T>>> {
        self.get(name)
            .iter()
            .map(|instance| {
                instance
                    .downcast::<T>()
                    .ok_or_else(|| TrellisError::DowncastFailed {
                        name: name.to_string(),
                        type_name: std::any::type_name::<T>().to_string(),
                    })
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Components dropped while building because of local errors.
    pub fn rejected(&self) -> &[TrellisError] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.instances.iter().map(|i| i.name()).collect();
        f.debug_struct("Registry")
            .field("instances", &names)
            .field("rejected", &self.rejected.len())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}
