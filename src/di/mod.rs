mod builder;
mod discovery;
mod registry;

pub use builder::RegistryBuilder;
pub use discovery::{Discovery, StaticDiscovery};
pub use registry::Registry;
