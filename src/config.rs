//! Enumeration settings

/// Registry class of graphics accelerator services
pub const ACCELERATOR_CLASS: &str = "IOAccelerator";

/// Registry plane used to walk from a service to the device that owns it
pub const SERVICE_PLANE: &str = "IOService";

/// Property of the parent device holding its human-readable model name
pub const MODEL_PROPERTY: &str = "model";

/// Size of the platform's device-path string buffer (`io_string_t`)
pub const NAME_CAPACITY: usize = 512;

/// `uname` system name of the supported platform
pub const EXPECTED_PLATFORM: &str = "Darwin";

/// Settings for one enumeration pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumerationConfig {
    /// Registry class to match
    pub device_class: String,
    /// Plane in which the parent device is resolved
    pub parent_plane: String,
    /// Parent property that holds the display name
    pub name_property: String,
    /// Maximum number of name bytes kept; longer names are truncated
    pub name_capacity: usize,
    /// System name the platform guard expects
    pub expected_platform: String,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            device_class: ACCELERATOR_CLASS.to_string(),
            parent_plane: SERVICE_PLANE.to_string(),
            name_property: MODEL_PROPERTY.to_string(),
            name_capacity: NAME_CAPACITY,
            expected_platform: EXPECTED_PLATFORM.to_string(),
        }
    }
}

impl EnumerationConfig {
    /// Match a different registry class, keeping every other setting
    pub fn with_device_class(mut self, class: impl Into<String>) -> Self {
        self.device_class = class.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_accelerators() {
        let config = EnumerationConfig::default();
        assert_eq!(config.device_class, "IOAccelerator");
        assert_eq!(config.parent_plane, "IOService");
        assert_eq!(config.name_property, "model");
        assert_eq!(config.name_capacity, 512);
        assert_eq!(config.expected_platform, "Darwin");
    }

    #[test]
    fn test_with_device_class() {
        let config = EnumerationConfig::default().with_device_class("IOPCIDevice");
        assert_eq!(config.device_class, "IOPCIDevice");
        assert_eq!(config.parent_plane, SERVICE_PLANE);
    }
}
