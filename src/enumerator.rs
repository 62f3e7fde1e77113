//! Graphics accelerator enumeration
//!
//! For every accelerator entry the registry yields, the enumerator resolves the
//! entry's identifier, walks to its parent device and reads the parent's model
//! name. An entry that fails any of those steps is skipped; it never stops the
//! scan. Handles are scoped per entry, so the property snapshot is released
//! before the parent and the parent before the entry.

use std::fmt;
use std::io::{self, Write};
use std::iter::FusedIterator;

use log::debug;
use serde::Serialize;

use crate::config::EnumerationConfig;
use crate::error::RegistryResult;
use crate::registry::{PropertySnapshot, ServiceRegistry};

/// Width the device name is right-aligned to
pub const NAME_WIDTH: usize = 40;

/// One discovered accelerator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRecord {
    /// Model name of the parent device, invalid UTF-8 replaced
    pub name: String,
    /// Registry identifier of the accelerator entry, as used by Metal and OpenGL
    pub registry_id: u64,
    #[serde(skip)]
    raw_name: Vec<u8>,
}

impl DeviceRecord {
    /// Record for a model name exactly as read from the registry
    pub fn new(raw_name: impl Into<Vec<u8>>, registry_id: u64) -> Self {
        let raw_name = raw_name.into();
        Self {
            name: String::from_utf8_lossy(&raw_name).into_owned(),
            registry_id,
            raw_name,
        }
    }

    /// Model name bytes as stored in the registry
    pub fn name_bytes(&self) -> &[u8] {
        &self.raw_name
    }

    /// Write the device line with the raw name bytes
    ///
    /// The name is right-aligned to [`NAME_WIDTH`] bytes, so the line is
    /// byte-for-byte what `printf("%40s")` produces.
    pub fn write_line<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "Device: {:pad$}", "", pad = padding(self.raw_name.len()))?;
        out.write_all(&self.raw_name)?;
        writeln!(out, " - ID: 0x{:x}", self.registry_id)
    }
}

/// Spaces needed to right-align a name of `len` bytes
fn padding(len: usize) -> usize {
    NAME_WIDTH.saturating_sub(len)
}

impl fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Device: {:pad$}{} - ID: 0x{:x}",
            "",
            self.name,
            self.registry_id,
            pad = padding(self.name.len())
        )
    }
}

/// Lazy iterator over the accelerators of a registry
///
/// The registry query starts when the iterator is created. A query that fails
/// to start yields no records.
pub struct Devices<'r, R: ServiceRegistry> {
    registry: &'r R,
    config: &'r EnumerationConfig,
    entries: Option<R::Entries>,
}

impl<'r, R: ServiceRegistry> Devices<'r, R> {
    /// Start enumerating `config.device_class` entries of `registry`
    pub fn new(registry: &'r R, config: &'r EnumerationConfig) -> Self {
        let entries = match registry.matching_services(&config.device_class) {
            Ok(entries) => Some(entries),
            Err(err) => {
                debug!("registry query for {} failed: {}", config.device_class, err);
                None
            }
        };

        Self {
            registry,
            config,
            entries,
        }
    }
}

impl<'r, R: ServiceRegistry> Iterator for Devices<'r, R> {
    type Item = DeviceRecord;

    fn next(&mut self) -> Option<DeviceRecord> {
        let entries = self.entries.as_mut()?;

        loop {
            let entry = match entries.next() {
                Some(entry) => entry,
                None => {
                    // Exhausted, release the iterator
                    self.entries = None;
                    return None;
                }
            };

            match describe(self.registry, self.config, &entry) {
                Ok(record) => return Some(record),
                Err(err) => debug!("skipping {} entry: {}", self.config.device_class, err),
            }
        }
    }
}

impl<'r, R: ServiceRegistry> FusedIterator for Devices<'r, R> {}

/// Build the record of one accelerator entry
fn describe<R: ServiceRegistry>(
    registry: &R,
    config: &EnumerationConfig,
    entry: &R::Entry,
) -> RegistryResult<DeviceRecord> {
    let registry_id = registry.registry_entry_id(entry)?;
    let parent = registry.parent_entry(entry, &config.parent_plane)?;
    let properties = registry.properties(&parent)?;

    let name = model_bytes(&properties, &config.name_property, config.name_capacity);
    if name.is_empty() {
        debug!(
            "entry 0x{:x} has no {} property",
            registry_id, config.name_property
        );
    }

    Ok(DeviceRecord::new(name, registry_id))
}

/// Read a NUL-terminated name property
///
/// At most `capacity` bytes are kept and the name ends at the first NUL.
/// A missing property gives an empty name.
pub fn model_bytes<P>(properties: &P, key: &str, capacity: usize) -> Vec<u8>
where
    P: PropertySnapshot + ?Sized,
{
    let Some(mut bytes) = properties.data(key) else {
        return Vec::new();
    };

    bytes.truncate(capacity);
    if let Some(end) = bytes.iter().position(|&b| b == 0) {
        bytes.truncate(end);
    }
    bytes
}

/// Write one line per accelerator to `out`
///
/// Returns the number of lines written.
pub fn print_devices<R, W>(registry: &R, config: &EnumerationConfig, out: &mut W) -> io::Result<usize>
where
    R: ServiceRegistry,
    W: Write + ?Sized,
{
    let mut count = 0;
    for record in Devices::new(registry, config) {
        record.write_line(out)?;
        count += 1;
    }
    out.flush()?;
    Ok(count)
}
