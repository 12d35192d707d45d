use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::Builder;

/// Write `contents` to `path` through a temporary file in the same directory
/// followed by a rename, so a failed run never leaves a truncated label.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };

    let mut tmp = Builder::new().prefix(".pds4-label").tempfile_in(&parent)?;
    tmp.as_file_mut().write_all(contents.as_bytes())?;
    tmp.as_file_mut().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(path) {
            let perm = metadata.permissions().mode();
            let _ = fs::set_permissions(tmp.path(), fs::Permissions::from_mode(perm));
        }
    }

    tmp.persist(path).map(|_| ()).map_err(|err| err.error)
}
