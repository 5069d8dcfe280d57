use crate::error::GenerateError;
use crate::hash::hash_file;
use crate::manifest::{Manifest, ManifestEntry};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Builds a [`Manifest`] from an asset directory.
#[derive(Clone, Debug)]
pub struct Generator {
    source_dir: PathBuf,
    output_dir: PathBuf,
    manifest_name: String,
}

impl Generator {
    pub fn new(source_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            output_dir: output_dir.into(),
            manifest_name: Manifest::FILE_NAME.to_string(),
        }
    }

    /// Overrides the output file name. Files with this name are never
    /// recorded as assets.
    pub fn with_manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.manifest_name)
    }

    /// Walks the source directory and hashes every regular file, including
    /// files reached through a symbolic link.
    pub fn scan(&self) -> Result<Manifest, GenerateError> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(&self.source_dir)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if entry.file_name() == self.manifest_name.as_str() {
                debug!(path = ?entry.path(), "skipping manifest file");
                continue;
            }

            let path = entry.path();
            if file_type.is_symlink() {
                // Linked files are recorded with their target's content. Linked
                // directories are not descended into.
                let target = std::fs::metadata(path).map_err(|source| GenerateError::Hash {
                    path: path.to_path_buf(),
                    source,
                })?;
                if !target.is_file() {
                    debug!(path = ?path, "skipping link to non-file");
                    continue;
                }
            } else if !file_type.is_file() {
                continue;
            }

            let relative_path = manifest_path(&self.source_dir, path);

            let (hash, size) = hash_file(path).map_err(|source| GenerateError::Hash {
                path: path.to_path_buf(),
                source,
            })?;

            info!("  {relative_path} ({size} bytes)");
            entries.push(ManifestEntry {
                path: relative_path,
                hash,
                size,
            });
        }

        Ok(Manifest::from_entries(entries)?)
    }

    /// Scans the source directory and writes the manifest to
    /// [`Generator::output_path`]. Nothing is written if any file fails.
    pub fn generate(&self) -> Result<Manifest, GenerateError> {
        let manifest = self.scan()?;

        std::fs::create_dir_all(&self.output_dir).map_err(|source| GenerateError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let output_path = self.output_path();
        manifest.save(&output_path)?;

        info!(
            "Manifest written to {} ({} entries)",
            output_path.display(),
            manifest.len()
        );

        Ok(manifest)
    }
}

/// `root/sub/b.txt` -> `/sub/b.txt`
fn manifest_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let segments: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::hash_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, data: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, data).unwrap();
    }

    #[test]
    fn identical_content_shares_hash() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"hello");
        write(src.path(), "sub/b.txt", b"hello");

        let manifest = Generator::new(src.path(), out.path()).generate().unwrap();

        let entries = manifest.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, "/a.txt");
        assert_eq!(entries[1].path, "/sub/b.txt");
        assert_eq!(entries[0].hash, entries[1].hash);
        assert_eq!(entries[0].hash, hash_bytes(b"hello"));
        assert!(entries.iter().all(|e| e.size == 5));
    }

    #[test]
    fn writes_manifest_and_creates_output_dir() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let output_dir = out.path().join("game").join("bin");
        write(src.path(), "textures/test.png", &[1, 2, 3]);

        let generator = Generator::new(src.path(), &output_dir);
        let manifest = generator.generate().unwrap();

        let written = Manifest::load(&generator.output_path()).unwrap();
        assert_eq!(written, manifest);
        assert_eq!(generator.output_path(), output_dir.join("manifest.json"));
    }

    #[test]
    fn skips_its_own_output_on_regeneration() {
        let src = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"a");
        write(src.path(), "nested/manifest.json", b"[]");

        let generator = Generator::new(src.path(), src.path());
        generator.generate().unwrap();
        let second = generator.generate().unwrap();

        let paths: Vec<_> = second.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["/a.txt"]);
    }

    #[test]
    fn custom_manifest_name_is_skipped() {
        let src = TempDir::new().unwrap();
        write(src.path(), "assets.json", b"{}");
        write(src.path(), "manifest.json", b"[]");

        let manifest = Generator::new(src.path(), src.path())
            .with_manifest_name("assets.json")
            .scan()
            .unwrap();

        let paths: Vec<_> = manifest.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["/manifest.json"]);
    }

    #[test]
    fn order_is_stable_and_sorted() {
        let src = TempDir::new().unwrap();
        for name in ["c.bin", "a.bin", "b/z.bin", "b/a.bin"] {
            write(src.path(), name, name.as_bytes());
        }

        let manifest = Generator::new(src.path(), src.path()).scan().unwrap();

        let paths: Vec<_> = manifest.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["/a.bin", "/b/a.bin", "/b/z.bin", "/c.bin"]);
    }

    #[test]
    fn empty_tree_yields_empty_array() {
        let src = TempDir::new().unwrap();
        let generator = Generator::new(src.path(), src.path());

        let manifest = generator.generate().unwrap();

        assert!(manifest.is_empty());
        let text = fs::read_to_string(generator.output_path()).unwrap();
        assert_eq!(text.trim(), "[]");
    }

    #[test]
    fn missing_source_fails_without_writing() {
        let out = TempDir::new().unwrap();
        let generator = Generator::new(out.path().join("missing"), out.path());

        let err = generator.generate().unwrap_err();

        assert!(matches!(err, GenerateError::Walk(_)));
        assert!(!generator.output_path().exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_hashed_through() {
        let src = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"alpha");
        write(outside.path(), "shared/tex.png", b"pixels");
        std::os::unix::fs::symlink(
            outside.path().join("shared/tex.png"),
            src.path().join("tex.png"),
        )
        .unwrap();
        std::os::unix::fs::symlink(outside.path().join("shared"), src.path().join("linked"))
            .unwrap();

        let manifest = Generator::new(src.path(), src.path()).scan().unwrap();

        let paths: Vec<_> = manifest.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["/a.txt", "/tex.png"]);
        let linked = manifest.get("/tex.png").unwrap();
        assert_eq!(linked.hash, hash_bytes(b"pixels"));
        assert_eq!(linked.size, 6);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_fails_generation() {
        let src = TempDir::new().unwrap();
        write(src.path(), "a.txt", b"alpha");
        std::os::unix::fs::symlink(src.path().join("gone.png"), src.path().join("b.png"))
            .unwrap();
        let generator = Generator::new(src.path(), src.path());

        let err = generator.generate().unwrap_err();

        assert!(matches!(err, GenerateError::Hash { .. }));
        assert!(!generator.output_path().exists());
    }

    #[test]
    fn manifest_path_normalizes_separators() {
        let root = Path::new("root");
        assert_eq!(manifest_path(root, &root.join("a").join("b.txt")), "/a/b.txt");
    }
}
