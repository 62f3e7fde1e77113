//! Hardware service registry access
//!
//! The enumerator only needs three things from the platform: match-and-iterate
//! over a registry class, resolve an entry's parent in a plane, and snapshot an
//! entry's properties. [`ServiceRegistry`] is that boundary.
//!
//! Handles are plain owned values that release their platform resource in
//! `Drop`, so a handle is released exactly once on every exit path and handles
//! acquired later in a scope are released first.

pub mod memory;

#[cfg(target_os = "macos")]
pub mod iokit;

pub use memory::MemoryRegistry;

use crate::error::{RegistryError, RegistryResult};
use std::convert::Infallible;

/// A hardware service registry
pub trait ServiceRegistry {
    /// Owned handle to one registry entry
    type Entry;
    /// Iterator over the entries matching a class
    type Entries: Iterator<Item = Self::Entry>;
    /// Snapshot of an entry's properties
    type Properties: PropertySnapshot;

    /// Start iterating the entries of a registry class
    fn matching_services(&self, class: &str) -> RegistryResult<Self::Entries>;

    /// Unique 64-bit identifier of an entry
    fn registry_entry_id(&self, entry: &Self::Entry) -> RegistryResult<u64>;

    /// Parent of an entry in the given plane
    fn parent_entry(&self, entry: &Self::Entry, plane: &str) -> RegistryResult<Self::Entry>;

    /// Snapshot of an entry's properties
    fn properties(&self, entry: &Self::Entry) -> RegistryResult<Self::Properties>;
}

/// Key-value snapshot of registry properties
#[cfg_attr(test, mockall::automock)]
pub trait PropertySnapshot {
    /// Raw bytes of a data property, `None` when absent or not a data blob
    fn data(&self, key: &str) -> Option<Vec<u8>>;
}

/// Registry for platforms without an I/O Registry
///
/// Every query fails with [`RegistryError::Unavailable`], so enumeration
/// yields nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableRegistry;

/// Empty property snapshot of [`UnavailableRegistry`]
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProperties;

impl PropertySnapshot for NoProperties {
    fn data(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }
}

impl ServiceRegistry for UnavailableRegistry {
    type Entry = Infallible;
    type Entries = std::iter::Empty<Infallible>;
    type Properties = NoProperties;

    fn matching_services(&self, _class: &str) -> RegistryResult<Self::Entries> {
        Err(RegistryError::Unavailable)
    }

    fn registry_entry_id(&self, entry: &Infallible) -> RegistryResult<u64> {
        match *entry {}
    }

    fn parent_entry(&self, entry: &Infallible, _plane: &str) -> RegistryResult<Infallible> {
        match *entry {}
    }

    fn properties(&self, entry: &Infallible) -> RegistryResult<NoProperties> {
        match *entry {}
    }
}

/// The registry of the host platform
#[cfg(target_os = "macos")]
pub type SystemRegistry = iokit::IoKitRegistry;

/// The registry of the host platform
#[cfg(not(target_os = "macos"))]
pub type SystemRegistry = UnavailableRegistry;

/// Open the registry of the host platform
pub fn system_registry() -> SystemRegistry {
    SystemRegistry::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_registry_refuses_queries() {
        let registry = UnavailableRegistry;
        assert_eq!(
            registry.matching_services("IOAccelerator").err(),
            Some(RegistryError::Unavailable)
        );
    }

    #[test]
    fn test_no_properties_is_empty() {
        assert_eq!(NoProperties.data("model"), None);
    }

    #[test]
    fn test_system_registry_opens() {
        // Result depends on the host, just make sure it constructs
        let _ = system_registry();
    }
}
