//! Firmware roots: named file trees indexed for module resolution.
//!
//! A root is one directory indexed as a unit. Indexing is non-recursive;
//! subdirectories are separate named roots. Every file gets a content hash,
//! and script files additionally get their scanned annotations attached.

use crate::annotations;
use crate::error::{BuildError, Result};
use crate::fsutil;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// File extension of script files, without the dot.
pub const SCRIPT_EXT: &str = "lua";

/// One file inside a root.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Path relative to the owning root, `/`-separated.
    pub path: String,
    /// Base path of the owning root.
    pub base: PathBuf,
    /// SHA256 hex digest of the file's bytes.
    pub hash: String,
    /// Dotted module names this file requires (script files only).
    pub dependencies: BTreeSet<String>,
    /// Datafile tokens this file declares (script files only).
    pub datafiles: BTreeSet<String>,
}

impl FileEntry {
    /// Absolute (or base-relative) location of the file on disk.
    pub fn source_path(&self) -> PathBuf {
        self.base.join(&self.path)
    }

    /// Whether this entry is a script file.
    pub fn is_script(&self) -> bool {
        Path::new(&self.path)
            .extension()
            .is_some_and(|ext| ext == SCRIPT_EXT)
    }
}

/// A named, indexed file tree.
#[derive(Debug, Clone)]
pub struct Root {
    pub name: String,
    pub base: PathBuf,
    /// Entries keyed by relative path; unique within the root.
    pub files: BTreeMap<String, FileEntry>,
}

/// Index one directory as a root: hash every immediate file and scan
/// script files for annotations. Subdirectories are skipped.
pub fn index_root(name: &str, base: &Path) -> Result<Root> {
    let listing = fsutil::list_dir(base)?;
    let mut files = BTreeMap::new();
    for file_name in listing.files {
        let full_path = base.join(&file_name);
        let mut entry = FileEntry {
            path: file_name.clone(),
            base: base.to_path_buf(),
            hash: fsutil::hash_file(&full_path)?,
            dependencies: BTreeSet::new(),
            datafiles: BTreeSet::new(),
        };
        if entry.is_script() {
            let annotations = annotations::scan_file(&full_path)?;
            entry.dependencies = annotations.dependencies;
            entry.datafiles = annotations.datafiles;
        }
        files.insert(file_name, entry);
    }
    Ok(Root {
        name: name.to_string(),
        base: base.to_path_buf(),
        files,
    })
}

/// All roots indexed for one build invocation, keyed by logical name:
/// `firmware` for the shared core root, `lib/<name>` for libraries,
/// `device/<name>` for device roots.
#[derive(Debug, Default)]
pub struct RootSet {
    roots: BTreeMap<String, Root>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, root: Root) {
        self.roots.insert(root.name.clone(), root);
    }

    /// Look up a root by logical name.
    pub fn get(&self, name: &str) -> Result<&Root> {
        self.roots
            .get(name)
            .ok_or_else(|| BuildError::RootNotFound(name.to_string()))
    }
}

/// Map a dotted module name to its relative file path.
pub fn module_path(module: &str) -> String {
    format!("{}.{}", module.replace('.', "/"), SCRIPT_EXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_name_maps_to_script_path() {
        assert_eq!(module_path("init"), "init.lua");
        assert_eq!(module_path("core.net.wifi"), "core/net/wifi.lua");
    }

    #[test]
    fn missing_root_is_an_error() {
        let roots = RootSet::new();
        let err = roots.get("lib/nope").unwrap_err();
        assert!(err.to_string().contains("lib/nope"));
    }
}
