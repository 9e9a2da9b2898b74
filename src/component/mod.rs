//! Class definitions and live component instances.
//!
//! A [`Class`] is the runtime stand-in for a declared type: how to construct
//! it (with no arguments) and which capabilities it exposes. Capabilities are
//! type-erased casters in the same way the registry stores instances as
//! `Arc<dyn Any>`; the annotator checks them at declaration time and the
//! composer and bootstrap use them to reach the trait an instance implements.

pub mod annotate;

pub use annotate::Definition;

use crate::controller::Controller;
use crate::lifecycle::{OnApplicationShutdown, OnModuleInit};
use crate::metadata::{ComponentDescriptor, ComponentType};
use crate::middleware::Middleware;
use crate::schedule::Job;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A type-erased component object.
pub type Object = Arc<dyn Any + Send + Sync>;

type Constructor = Arc<dyn Fn() -> Object + Send + Sync>;

/// Casts an erased object back to a capability trait object.
type CasterFn<T> = Arc<dyn Fn(Object) -> Option<Arc<T>> + Send + Sync>;

fn caster<C, T>(cast: fn(Arc<C>) -> Arc<T>) -> CasterFn<T>
where
    C: Send + Sync + 'static,
    T: ?Sized + 'static,
{
    Arc::new(move |object: Object| object.downcast::<C>().ok().map(cast))
}

/// How many instances a class produces.
#[derive(Clone)]
pub enum Binding {
    Single(Constructor),
    Multi(Vec<Constructor>),
}

impl Binding {
    pub fn is_multi(&self) -> bool {
        matches!(self, Binding::Multi(_))
    }

    fn instantiate(&self) -> Vec<Object> {
        match self {
            Binding::Single(ctor) => vec![ctor()],
            Binding::Multi(ctors) => ctors.iter().map(|ctor| ctor()).collect(),
        }
    }
}

#[derive(Clone, Default)]
struct Capabilities {
    handler: Option<CasterFn<dyn Middleware>>,
    routes: Option<CasterFn<dyn Controller>>,
    job: Option<CasterFn<dyn Job>>,
    on_init: Option<CasterFn<dyn OnModuleInit>>,
    on_shutdown: Option<CasterFn<dyn OnApplicationShutdown>>,
}

/// Type-erased class definition.
#[derive(Clone)]
pub struct Class {
    type_id: TypeId,
    type_name: &'static str,
    binding: Binding,
    capabilities: Capabilities,
}

impl Class {
    /// Declare a class constructed through `Default`.
    pub fn of<T: Default + Send + Sync + 'static>() -> ClassDef<T> {
        ClassDef::new(T::default)
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Whether the class exposes a middleware `handle` operation.
    pub fn has_handler(&self) -> bool {
        self.capabilities.handler.is_some()
    }

    pub fn has_routes(&self) -> bool {
        self.capabilities.routes.is_some()
    }

    pub fn has_job(&self) -> bool {
        self.capabilities.job.is_some()
    }

    pub(crate) fn instantiate(&self, descriptor: &Arc<ComponentDescriptor>) -> Vec<ComponentInstance> {
        self.binding
            .instantiate()
            .into_iter()
            .map(|object| ComponentInstance {
                descriptor: Arc::clone(descriptor),
                type_name: self.type_name,
                object,
                capabilities: self.capabilities.clone(),
            })
            .collect()
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("type_name", &self.type_name)
            .field("multi", &self.binding.is_multi())
            .field("handler", &self.has_handler())
            .field("routes", &self.has_routes())
            .field("job", &self.has_job())
            .finish()
    }
}

/// Typed builder for a [`Class`].
///
/// # Example
/// ```rust,ignore
/// let auth = Class::of::<AuthMiddleware>().with_handler();
/// let ctors: [fn() -> Tag; 2] = [|| Tag("a"), || Tag("b")];
/// let tags = ClassDef::set(ctors).with_handler();
/// ```
pub struct ClassDef<T> {
    class: Class,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> ClassDef<T> {
    /// Declare a class with a single zero-argument constructor.
    pub fn new<F>(ctor: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_binding(Binding::Single(erase(ctor)))
    }

    /// Declare a multi-valued binding: every constructor yields one instance
    /// registered under the same name.
    pub fn set<F, I>(ctors: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::with_binding(Binding::Multi(ctors.into_iter().map(erase).collect()))
    }

    fn with_binding(binding: Binding) -> Self {
        Self {
            class: Class {
                type_id: TypeId::of::<T>(),
                type_name: std::any::type_name::<T>(),
                binding,
                capabilities: Capabilities::default(),
            },
            _marker: PhantomData,
        }
    }

    pub fn with_handler(mut self) -> Self
    where
        T: Middleware,
    {
        self.class.capabilities.handler =
            Some(caster::<T, dyn Middleware>(|t: Arc<T>| t as Arc<dyn Middleware>));
        self
    }

    pub fn with_routes(mut self) -> Self
    where
        T: Controller,
    {
        self.class.capabilities.routes =
            Some(caster::<T, dyn Controller>(|t: Arc<T>| t as Arc<dyn Controller>));
        self
    }

    pub fn with_job(mut self) -> Self
    where
        T: Job,
    {
        self.class.capabilities.job =
            Some(caster::<T, dyn Job>(|t: Arc<T>| t as Arc<dyn Job>));
        self
    }

    pub fn with_init(mut self) -> Self
    where
        T: OnModuleInit + 'static,
    {
        self.class.capabilities.on_init =
            Some(caster::<T, dyn OnModuleInit>(|t: Arc<T>| t as Arc<dyn OnModuleInit>));
        self
    }

    pub fn with_shutdown(mut self) -> Self
    where
        T: OnApplicationShutdown + 'static,
    {
        self.class.capabilities.on_shutdown = Some(caster::<T, dyn OnApplicationShutdown>(
            |t: Arc<T>| t as Arc<dyn OnApplicationShutdown>,
        ));
        self
    }

    pub fn build(self) -> Class {
        self.class
    }
}

impl<T> From<ClassDef<T>> for Class {
    fn from(def: ClassDef<T>) -> Self {
        def.class
    }
}

fn erase<T, F>(ctor: F) -> Constructor
where
    T: Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Arc::new(move || Arc::new(ctor()) as Object)
}

/// A constructed component, shared by every lookup that returns it.
#[derive(Clone)]
pub struct ComponentInstance {
    descriptor: Arc<ComponentDescriptor>,
    type_name: &'static str,
    object: Object,
    capabilities: Capabilities,
}

impl ComponentInstance {
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn component_type(&self) -> ComponentType {
        self.descriptor.component_type
    }

    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }

    pub fn as_middleware(&self) -> Option<Arc<dyn Middleware>> {
        self.cast(&self.capabilities.handler)
    }

    pub fn as_controller(&self) -> Option<Arc<dyn Controller>> {
        self.cast(&self.capabilities.routes)
    }

    pub fn as_job(&self) -> Option<Arc<dyn Job>> {
        self.cast(&self.capabilities.job)
    }

    pub fn as_on_init(&self) -> Option<Arc<dyn OnModuleInit>> {
        self.cast(&self.capabilities.on_init)
    }

    pub fn as_on_shutdown(&self) -> Option<Arc<dyn OnApplicationShutdown>> {
        self.cast(&self.capabilities.on_shutdown)
    }

    /// Whether both values refer to the same constructed object.
    pub fn same_instance(&self, other: &ComponentInstance) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }

    fn cast<T: ?Sized>(&self, caster: &Option<CasterFn<T>>) -> Option<Arc<T>> {
        caster
            .as_ref()
            .and_then(|cast| cast(Arc::clone(&self.object)))
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.descriptor.name)
            .field("type", &self.descriptor.component_type)
            .field("class", &self.type_name)
            .finish()
    }
}
