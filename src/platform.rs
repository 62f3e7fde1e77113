//! Host platform guard

use std::ffi::CStr;
use std::io::{self, Write};

use crate::config::EnumerationConfig;

/// Warning written when the host is not macOS
pub const UNSUPPORTED_WARNING: &str = "This command is only supported on macOS";

/// Outcome of the platform check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformStatus {
    /// Host matches the expected platform
    Supported,
    /// Host is something else; a warning was written
    Unsupported,
}

/// System name of the running kernel, as reported by `uname(2)`
pub fn system_name() -> io::Result<String> {
    let mut uts: libc::utsname = unsafe { std::mem::zeroed() };
    if unsafe { libc::uname(&mut uts) } != 0 {
        return Err(io::Error::last_os_error());
    }

    let sysname = unsafe { CStr::from_ptr(uts.sysname.as_ptr()) };
    Ok(sysname.to_string_lossy().into_owned())
}

/// Whether `sysname` begins with `expected`
///
/// Only the first `expected.len()` bytes are compared, so `Darwin` matches any
/// system name that starts with it.
pub fn is_expected_platform(sysname: &str, expected: &str) -> bool {
    sysname.as_bytes().starts_with(expected.as_bytes())
}

/// Warn on `diag` when `sysname` is not the expected platform
///
/// The warning has no trailing newline. Never stops the caller; enumeration
/// is expected to run either way.
pub fn check_platform<W>(
    sysname: &str,
    config: &EnumerationConfig,
    diag: &mut W,
) -> io::Result<PlatformStatus>
where
    W: Write + ?Sized,
{
    if is_expected_platform(sysname, &config.expected_platform) {
        return Ok(PlatformStatus::Supported);
    }

    diag.write_all(UNSUPPORTED_WARNING.as_bytes())?;
    diag.flush()?;
    Ok(PlatformStatus::Unsupported)
}
