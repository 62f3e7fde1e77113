//! # GPULIST - Graphics Accelerator Listing
//!
//! A small Rust library for listing the graphics accelerators registered in
//! the macOS I/O Registry, together with the registry ID Metal and OpenGL use
//! to refer to the same device.
//!
//! ## Features
//!
//! - **One entry per logical accelerator** (`IOAccelerator`, not PCI devices)
//! - **Model names** read from each accelerator's parent device
//! - **Best-effort scanning**: an entry that cannot be resolved is skipped
//! - **Pluggable registry** via [`ServiceRegistry`], with an in-memory
//!   implementation for tests
//!
//! ## Quick Start
//!
//! ```rust
//! use gpulist;
//!
//! for device in gpulist::list_devices() {
//!     println!("{}", device);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod enumerator;
pub mod error;
pub mod platform;
pub mod registry;

// Re-export main API for easy access
pub use config::EnumerationConfig;
pub use enumerator::{print_devices, DeviceRecord, Devices};
pub use error::{RegistryError, RegistryResult};
pub use platform::{check_platform, system_name, PlatformStatus};
pub use registry::{system_registry, PropertySnapshot, ServiceRegistry, SystemRegistry};

use std::io::{self, Write};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the platform guard, then list every accelerator
///
/// The warning (if any) goes to `diag` before any device line is written to
/// `out`. Returns the number of devices listed.
///
/// # Example
///
/// ```
/// use gpulist::registry::memory::{AcceleratorNode, DeviceNode, MemoryRegistry};
///
/// let registry = MemoryRegistry::new()
///     .with_accelerator(AcceleratorNode::new(0x118000000, DeviceNode::with_model("Apple M1")));
/// let mut out = Vec::new();
/// let mut diag = Vec::new();
///
/// let count = gpulist::report("Darwin", &registry, &Default::default(), &mut out, &mut diag)?;
/// assert_eq!(count, 1);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn report<R, O, D>(
    sysname: &str,
    registry: &R,
    config: &EnumerationConfig,
    out: &mut O,
    diag: &mut D,
) -> io::Result<usize>
where
    R: ServiceRegistry,
    O: Write + ?Sized,
    D: Write + ?Sized,
{
    check_platform(sysname, config, diag)?;
    print_devices(registry, config, out)
}

/// List the accelerators of the host registry
///
/// Returns an empty list on hosts without an I/O Registry.
///
/// # Example
///
/// ```no_run
/// use gpulist;
///
/// let devices = gpulist::list_devices();
/// for device in devices {
///     println!("{} (0x{:x})", device.name, device.registry_id);
/// }
/// ```
pub fn list_devices() -> Vec<DeviceRecord> {
    let registry = system_registry();
    let config = EnumerationConfig::default();
    Devices::new(&registry, &config).collect()
}

/// Run a quick compatibility check
///
/// Returns `true` if the host reports itself as Darwin.
///
/// # Example
///
/// ```no_run
/// use gpulist;
///
/// if !gpulist::is_supported() {
///     println!("No I/O Registry on this host");
/// }
/// ```
pub fn is_supported() -> bool {
    let expected = EnumerationConfig::default().expected_platform;
    system_name()
        .map(|name| platform::is_expected_platform(&name, &expected))
        .unwrap_or(false)
}

/// Get library information
///
/// # Example
///
/// ```no_run
/// use gpulist;
///
/// println!("Using gpulist v{}", gpulist::version());
/// ```
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::memory::{AcceleratorNode, DeviceNode, MemoryRegistry};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!version().is_empty());
    }

    #[test]
    fn test_is_supported_matches_target() {
        assert_eq!(is_supported(), cfg!(target_os = "macos"));
    }

    #[test]
    fn test_list_devices() {
        // Depends on the host, off macOS it must be empty
        let devices = list_devices();
        if !cfg!(target_os = "macos") {
            assert!(devices.is_empty());
        }
    }

    #[test]
    fn test_report_warns_then_lists() {
        let registry = MemoryRegistry::new()
            .with_accelerator(AcceleratorNode::new(0x2a, DeviceNode::with_model("GPU")));
        let mut out = Vec::new();
        let mut diag = Vec::new();

        let count = report(
            "Linux",
            &registry,
            &EnumerationConfig::default(),
            &mut out,
            &mut diag,
        )
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            String::from_utf8(diag).unwrap(),
            "This command is only supported on macOS"
        );
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("Device: {:>40} - ID: 0x2a\n", "GPU")
        );
    }
}

/// Prelude module for convenient imports
///
/// # Example
///
/// ```no_run
/// use gpulist::prelude::*;
///
/// let devices: Vec<DeviceRecord> = list_devices();
/// ```
pub mod prelude {
    pub use crate::config::EnumerationConfig;
    pub use crate::enumerator::{print_devices, DeviceRecord, Devices};
    pub use crate::registry::{system_registry, PropertySnapshot, ServiceRegistry};
    pub use crate::{is_supported, list_devices, report, version};
}
