//! Filesystem utilities: crash-safe writes and permission bits.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::TallyResult;

/// Crash-safe file write: stage into a sibling temp file, fsync, then
/// rename over the destination.
///
/// Same-filesystem `rename()` is atomic on POSIX, so readers only ever
/// see the previous content or the complete new content.
pub fn atomic_write(path: &Path, data: &[u8]) -> TallyResult<()> {
    let tmp = path.with_extension("tmp");
    let mut file = File::create(&tmp)?;
    file.write_all(data)?;
    file.sync_data()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Mark a file executable (0o755) on Unix; no-op elsewhere.
pub fn make_executable(path: &Path) -> TallyResult<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Copy the permission bits of `src` onto `dest`.
pub fn copy_mode(src: &Path, dest: &Path) -> TallyResult<()> {
    let perms = fs::metadata(src)?.permissions();
    fs::set_permissions(dest, perms)?;
    Ok(())
}

/// True if the file carries any executable bit (always false off Unix).
pub fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        false
    }
}
