use crate::atomic_write;
use crate::error::ManifestError;
use crate::hash::is_content_hash;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One asset file in a [`Manifest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the asset root, `/`-separated with a leading `/`,
    /// e.g. "/textures/test.png".
    pub path: String,

    /// Content hash. This is the key of the blob in the remote store.
    pub hash: String,

    /// Size in bytes
    pub size: u64,
}

impl ManifestEntry {
    /// Resolves the entry against a local asset root.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        self.path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }

    fn validate(&self) -> Result<(), ManifestError> {
        let valid_path = self
            .path
            .strip_prefix('/')
            .is_some_and(|rest| rest.split('/').all(|s| !matches!(s, "" | "." | "..")));
        if !valid_path {
            return Err(ManifestError::InvalidPath(self.path.clone()));
        }

        if !is_content_hash(&self.hash) {
            return Err(ManifestError::InvalidHash {
                path: self.path.clone(),
                hash: self.hash.clone(),
            });
        }

        Ok(())
    }
}

/// An ordered snapshot of an asset tree.
///
/// Serialized as a plain JSON array of entries. Order follows the directory
/// walk that produced it; paths are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Default file name of a written manifest.
    pub const FILE_NAME: &'static str = "manifest.json";

    pub fn from_entries(entries: Vec<ManifestEntry>) -> Result<Self, ManifestError> {
        let manifest = Self { entries };
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ManifestEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }

    pub fn get(&self, path: &str) -> Option<&ManifestEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Checks path uniqueness, path shape and hash format.
    pub fn validate(&self) -> Result<(), ManifestError> {
        let mut seen = HashSet::with_capacity(self.entries.len());
        for entry in &self.entries {
            entry.validate()?;
            if !seen.insert(entry.path.as_str()) {
                return Err(ManifestError::DuplicatePath(entry.path.clone()));
            }
        }
        Ok(())
    }

    /// Two-space indented JSON.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, ManifestError> {
        let mut data = serde_json::to_vec_pretty(self)?;
        data.push(b'\n');
        Ok(data)
    }

    pub fn from_slice(data: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_slice(data)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ManifestError::NotFound(path.to_path_buf()),
            _ => ManifestError::Io(e),
        })?;
        Self::from_slice(&data)
    }

    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let data = self.to_json_pretty()?;
        atomic_write(path, &data)?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a ManifestEntry;
    type IntoIter = std::slice::Iter<'a, ManifestEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
