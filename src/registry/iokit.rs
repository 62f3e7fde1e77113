//! macOS I/O Registry backend

use std::ffi::CString;
use std::ptr;

use core_foundation::base::{CFType, TCFType};
use core_foundation::data::CFData;
use core_foundation::dictionary::CFDictionary;
use core_foundation::string::CFString;
use core_foundation_sys::base::kCFAllocatorDefault;
use core_foundation_sys::dictionary::{CFDictionaryRef, CFMutableDictionaryRef};
use io_kit_sys::ret::kIOReturnSuccess;
use io_kit_sys::types::{io_iterator_t, io_object_t, io_registry_entry_t};
use io_kit_sys::{
    kIOMasterPortDefault, IOIteratorNext, IOObjectRelease, IORegistryEntryCreateCFProperties,
    IORegistryEntryGetParentEntry, IORegistryEntryGetRegistryEntryID,
    IOServiceGetMatchingServices, IOServiceMatching,
};

use crate::error::{RegistryError, RegistryResult};
use crate::registry::{PropertySnapshot, ServiceRegistry};

const IO_OBJECT_NULL: io_object_t = 0;

fn c_name(name: &str) -> RegistryResult<CString> {
    CString::new(name).map_err(|_| RegistryError::InvalidName(name.to_string()))
}

/// Owned I/O Registry entry, released with `IOObjectRelease` on drop
#[derive(Debug)]
pub struct RegistryEntry(io_registry_entry_t);

impl Drop for RegistryEntry {
    fn drop(&mut self) {
        unsafe { IOObjectRelease(self.0) };
    }
}

/// Owned iterator over matching services
#[derive(Debug)]
pub struct ServiceIterator(io_iterator_t);

impl Iterator for ServiceIterator {
    type Item = RegistryEntry;

    fn next(&mut self) -> Option<RegistryEntry> {
        let entry = unsafe { IOIteratorNext(self.0) };
        if entry == IO_OBJECT_NULL {
            None
        } else {
            Some(RegistryEntry(entry))
        }
    }
}

impl Drop for ServiceIterator {
    fn drop(&mut self) {
        unsafe { IOObjectRelease(self.0) };
    }
}

/// Property dictionary of an entry, released by CoreFoundation on drop
pub struct PropertyDictionary(CFDictionary<CFString, CFType>);

impl PropertySnapshot for PropertyDictionary {
    fn data(&self, key: &str) -> Option<Vec<u8>> {
        let key = CFString::new(key);
        let value = self.0.find(&key)?;
        value.downcast::<CFData>().map(|data| data.bytes().to_vec())
    }
}

/// The I/O Registry of the running macOS kernel
#[derive(Debug, Clone, Copy, Default)]
pub struct IoKitRegistry;

impl IoKitRegistry {
    /// Handle to the default I/O Registry
    pub fn new() -> Self {
        Self
    }
}

impl ServiceRegistry for IoKitRegistry {
    type Entry = RegistryEntry;
    type Entries = ServiceIterator;
    type Properties = PropertyDictionary;

    fn matching_services(&self, class: &str) -> RegistryResult<ServiceIterator> {
        let class = c_name(class)?;
        let matching = unsafe { IOServiceMatching(class.as_ptr() as _) };
        if matching.is_null() {
            return Err(RegistryError::not_found("IOServiceMatching"));
        }

        // The matching dictionary is consumed by the call, even on failure
        let mut iterator: io_iterator_t = IO_OBJECT_NULL;
        let status = unsafe {
            IOServiceGetMatchingServices(kIOMasterPortDefault, matching as _, &mut iterator)
        };
        if status != kIOReturnSuccess {
            return Err(RegistryError::call("IOServiceGetMatchingServices", status));
        }

        Ok(ServiceIterator(iterator))
    }

    fn registry_entry_id(&self, entry: &RegistryEntry) -> RegistryResult<u64> {
        let mut id: u64 = 0;
        let status = unsafe { IORegistryEntryGetRegistryEntryID(entry.0, &mut id) };
        if status != kIOReturnSuccess {
            return Err(RegistryError::call("IORegistryEntryGetRegistryEntryID", status));
        }
        Ok(id)
    }

    fn parent_entry(&self, entry: &RegistryEntry, plane: &str) -> RegistryResult<RegistryEntry> {
        let plane = c_name(plane)?;
        let mut parent: io_registry_entry_t = IO_OBJECT_NULL;
        let status =
            unsafe { IORegistryEntryGetParentEntry(entry.0, plane.as_ptr() as _, &mut parent) };
        if status != kIOReturnSuccess {
            return Err(RegistryError::call("IORegistryEntryGetParentEntry", status));
        }
        Ok(RegistryEntry(parent))
    }

    fn properties(&self, entry: &RegistryEntry) -> RegistryResult<PropertyDictionary> {
        let mut dict: CFMutableDictionaryRef = ptr::null_mut();
        let status = unsafe {
            IORegistryEntryCreateCFProperties(entry.0, &mut dict, kCFAllocatorDefault, 0)
        };
        if status != kIOReturnSuccess || dict.is_null() {
            return Err(RegistryError::call("IORegistryEntryCreateCFProperties", status));
        }

        let dict = unsafe { CFDictionary::wrap_under_create_rule(dict as CFDictionaryRef) };
        Ok(PropertyDictionary(dict))
    }
}
