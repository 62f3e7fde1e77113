//! In-memory service registry
//!
//! Stands in for the hardware registry in tests and benchmarks. Each
//! accelerator can be set up to fail at any lookup step, and every handle the
//! registry hands out records its acquisition and release in a shared ledger.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::config::SERVICE_PLANE;
use crate::error::{RegistryError, RegistryResult};
use crate::registry::{PropertySnapshot, ServiceRegistry};

/// A handle handed out by [`MemoryRegistry`]
///
/// The index is the position of the accelerator in the order it was added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Handle {
    /// Iterator over matching services
    Iterator,
    /// Accelerator entry
    Accelerator(usize),
    /// Parent device of an accelerator
    Parent(usize),
    /// Property snapshot of a parent device
    Properties(usize),
}

/// Ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleEvent {
    /// Handle handed out
    Acquired(Handle),
    /// Handle dropped
    Released(Handle),
}

type Ledger = Rc<RefCell<Vec<HandleEvent>>>;

/// Parent device of an accelerator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceNode {
    /// Property snapshot, `None` makes the snapshot call fail
    pub properties: Option<BTreeMap<String, Vec<u8>>>,
}

impl DeviceNode {
    /// Device whose `model` property holds `model` with a trailing NUL,
    /// the way the registry stores it
    pub fn with_model(model: &str) -> Self {
        let mut bytes = model.as_bytes().to_vec();
        bytes.push(0);
        Self::default().with_property("model", bytes)
    }

    /// Device whose property snapshot cannot be taken
    pub fn without_properties() -> Self {
        Self { properties: None }
    }

    /// Add a raw property
    pub fn with_property(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Accelerator service entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceleratorNode {
    /// Registry identifier, `None` makes the lookup fail
    pub registry_id: Option<u64>,
    /// Parent in the service plane, `None` makes the lookup fail
    pub parent: Option<DeviceNode>,
}

impl AcceleratorNode {
    /// Accelerator with an identifier and a parent
    pub fn new(registry_id: u64, parent: DeviceNode) -> Self {
        Self {
            registry_id: Some(registry_id),
            parent: Some(parent),
        }
    }

    /// Accelerator whose identifier cannot be resolved
    pub fn without_id(parent: DeviceNode) -> Self {
        Self {
            registry_id: None,
            parent: Some(parent),
        }
    }

    /// Accelerator whose parent cannot be resolved
    pub fn orphan(registry_id: u64) -> Self {
        Self {
            registry_id: Some(registry_id),
            parent: None,
        }
    }
}

/// Handle guard that records itself in the ledger
#[derive(Debug)]
struct Tracked {
    handle: Handle,
    ledger: Ledger,
}

impl Tracked {
    fn acquire(handle: Handle, ledger: &Ledger) -> Self {
        ledger.borrow_mut().push(HandleEvent::Acquired(handle));
        Self {
            handle,
            ledger: Rc::clone(ledger),
        }
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger
            .borrow_mut()
            .push(HandleEvent::Released(self.handle));
    }
}

#[derive(Debug)]
enum EntryNode {
    Accelerator(AcceleratorNode),
    Device(DeviceNode),
}

/// Entry handle of [`MemoryRegistry`]
#[derive(Debug)]
pub struct MemoryEntry {
    index: usize,
    node: EntryNode,
    guard: Tracked,
}

impl MemoryEntry {
    /// Ledger handle of this entry
    pub fn handle(&self) -> Handle {
        self.guard.handle
    }
}

/// Entries iterator of [`MemoryRegistry`]
#[derive(Debug)]
pub struct MemoryEntries {
    nodes: std::vec::IntoIter<(usize, AcceleratorNode)>,
    ledger: Ledger,
    _guard: Tracked,
}

impl Iterator for MemoryEntries {
    type Item = MemoryEntry;

    fn next(&mut self) -> Option<MemoryEntry> {
        let (index, node) = self.nodes.next()?;
        Some(MemoryEntry {
            index,
            node: EntryNode::Accelerator(node),
            guard: Tracked::acquire(Handle::Accelerator(index), &self.ledger),
        })
    }
}

/// Property snapshot of [`MemoryRegistry`]
#[derive(Debug)]
pub struct MemoryProperties {
    values: BTreeMap<String, Vec<u8>>,
    _guard: Tracked,
}

impl PropertySnapshot for MemoryProperties {
    fn data(&self, key: &str) -> Option<Vec<u8>> {
        self.values.get(key).cloned()
    }
}

/// In-memory service registry with a handle ledger
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    services: Vec<(String, AcceleratorNode)>,
    query_fails: bool,
    ledger: Ledger,
}

impl MemoryRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entry of the accelerator class
    pub fn with_accelerator(self, node: AcceleratorNode) -> Self {
        self.with_service(crate::config::ACCELERATOR_CLASS, node)
    }

    /// Register an entry of an arbitrary class
    pub fn with_service(mut self, class: &str, node: AcceleratorNode) -> Self {
        self.services.push((class.to_string(), node));
        self
    }

    /// Make every query fail to start
    pub fn failing_query(mut self) -> Self {
        self.query_fails = true;
        self
    }

    /// Every acquisition and release so far, in order
    pub fn events(&self) -> Vec<HandleEvent> {
        self.ledger.borrow().clone()
    }

    /// Number of handles acquired but not yet released
    pub fn outstanding(&self) -> usize {
        self.ledger
            .borrow()
            .iter()
            .fold(0isize, |open, event| match event {
                HandleEvent::Acquired(_) => open + 1,
                HandleEvent::Released(_) => open - 1,
            })
            .max(0) as usize
    }

    /// How many times a handle was released
    pub fn release_count(&self, handle: Handle) -> usize {
        self.ledger
            .borrow()
            .iter()
            .filter(|event| **event == HandleEvent::Released(handle))
            .count()
    }
}

impl ServiceRegistry for MemoryRegistry {
    type Entry = MemoryEntry;
    type Entries = MemoryEntries;
    type Properties = MemoryProperties;

    fn matching_services(&self, class: &str) -> RegistryResult<MemoryEntries> {
        if self.query_fails {
            return Err(RegistryError::not_found("IOServiceGetMatchingServices"));
        }

        let nodes: Vec<(usize, AcceleratorNode)> = self
            .services
            .iter()
            .enumerate()
            .filter(|(_, (service_class, _))| service_class == class)
            .map(|(index, (_, node))| (index, node.clone()))
            .collect();

        Ok(MemoryEntries {
            nodes: nodes.into_iter(),
            ledger: Rc::clone(&self.ledger),
            _guard: Tracked::acquire(Handle::Iterator, &self.ledger),
        })
    }

    fn registry_entry_id(&self, entry: &MemoryEntry) -> RegistryResult<u64> {
        match &entry.node {
            EntryNode::Accelerator(node) => node
                .registry_id
                .ok_or_else(|| RegistryError::not_found("IORegistryEntryGetRegistryEntryID")),
            EntryNode::Device(_) => Err(RegistryError::not_found(
                "IORegistryEntryGetRegistryEntryID",
            )),
        }
    }

    fn parent_entry(&self, entry: &MemoryEntry, plane: &str) -> RegistryResult<MemoryEntry> {
        let parent = match &entry.node {
            EntryNode::Accelerator(node) if plane == SERVICE_PLANE => node.parent.clone(),
            _ => None,
        };
        let parent =
            parent.ok_or_else(|| RegistryError::not_found("IORegistryEntryGetParentEntry"))?;

        Ok(MemoryEntry {
            index: entry.index,
            node: EntryNode::Device(parent),
            guard: Tracked::acquire(Handle::Parent(entry.index), &self.ledger),
        })
    }

    fn properties(&self, entry: &MemoryEntry) -> RegistryResult<MemoryProperties> {
        let values = match &entry.node {
            EntryNode::Device(device) => device.properties.clone(),
            EntryNode::Accelerator(_) => None,
        };
        let values =
            values.ok_or_else(|| RegistryError::not_found("IORegistryEntryCreateCFProperties"))?;

        Ok(MemoryProperties {
            values,
            _guard: Tracked::acquire(Handle::Properties(entry.index), &self.ledger),
        })
    }
}
