//! Free-space probing for the download directory.

use std::path::Path;

/// Returns the number of bytes available to unprivileged users on the
/// filesystem holding `path`, or `None` when it cannot be determined.
#[cfg(unix)]
pub fn available_space(path: &Path) -> Option<u64> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut stats: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stats) };
    if rc != 0 {
        return None;
    }
    Some(stats.f_bavail as u64 * stats.f_frsize as u64)
}

/// Free-space probing is not implemented on this platform.
#[cfg(not(unix))]
pub fn available_space(_path: &Path) -> Option<u64> {
    None
}
