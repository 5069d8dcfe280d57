use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("forge"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Writes `data` to a sibling temp file and renames it over `path`.
///
/// A failed write never leaves a truncated file under the final name, and the
/// temp file is cleaned up.
pub fn atomic_write(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path(path);
    if let Err(e) = fs::write(&tmp_path, data).and_then(|_| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }

    Ok(())
}
