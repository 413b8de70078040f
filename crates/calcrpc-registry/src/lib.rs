pub mod index;
pub mod service;

pub use index::{RegistryEntry, RegistryIndex};
pub use service::DiscoveryService;
