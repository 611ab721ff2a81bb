//! Filesystem primitives shared across the build pipeline.
//!
//! Hashing, directory listing, removal, and JSON helpers. Directory
//! listings are always returned sorted so that no filesystem iteration
//! order ever leaks into build output.

use crate::error::{BuildError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// A directory listing with files and subdirectories separated.
/// Both lists are sorted by name.
#[derive(Debug, Default)]
pub struct DirListing {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

/// Compute the SHA256 hex digest of a file's bytes.
pub fn hash_file(path: &Path) -> Result<String> {
    let content = fs::read(path).map_err(|e| BuildError::io(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&content);
    Ok(format!("{:x}", hasher.finalize()))
}

/// List the immediate entries of a directory, sorted by name.
pub fn list_dir(path: &Path) -> Result<DirListing> {
    let mut listing = DirListing::default();
    let entries = fs::read_dir(path).map_err(|e| BuildError::io(path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(path, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type().map_err(|e| BuildError::io(entry.path(), e))?;
        if file_type.is_dir() {
            listing.dirs.push(name);
        } else {
            listing.files.push(name);
        }
    }
    listing.files.sort();
    listing.dirs.sort();
    Ok(listing)
}

/// Remove everything inside a directory, creating it if missing.
/// The directory itself survives.
pub fn remove_dir_contents(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| BuildError::io(path, e))?;
        return Ok(());
    }
    let entries = fs::read_dir(path).map_err(|e| BuildError::io(path, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| BuildError::io(path, e))?;
        let entry_path = entry.path();
        let file_type = entry.file_type().map_err(|e| BuildError::io(&entry_path, e))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&entry_path).map_err(|e| BuildError::io(&entry_path, e))?;
        } else {
            fs::remove_file(&entry_path).map_err(|e| BuildError::io(&entry_path, e))?;
        }
    }
    Ok(())
}

/// Copy a single file, creating the destination directory if needed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::copy(src, dst).map_err(|e| BuildError::io(src, e))?;
    Ok(())
}

/// Write raw bytes, creating the destination directory if needed.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| BuildError::io(path, e))
}

/// Read and deserialize a JSON document.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    serde_json::from_str(&content).map_err(|e| BuildError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Serialize a value to pretty JSON and write it.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value).map_err(|e| BuildError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_bytes(path, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn listing_is_sorted_and_split() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.lua"), "2").unwrap();
        fs::write(dir.path().join("a.lua"), "1").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let listing = list_dir(dir.path()).unwrap();
        assert_eq!(listing.files, vec!["a.lua", "b.lua"]);
        assert_eq!(listing.dirs, vec!["sub"]);
    }

    #[test]
    fn hash_tracks_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("f");
        fs::write(&path, "one").unwrap();
        let first = hash_file(&path).unwrap();
        fs::write(&path, "two").unwrap();
        assert_ne!(first, hash_file(&path).unwrap());
    }

    #[test]
    fn remove_dir_contents_keeps_the_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        remove_dir_contents(dir.path()).unwrap();
        assert!(dir.path().exists());
        assert!(list_dir(dir.path()).unwrap().files.is_empty());
        assert!(list_dir(dir.path()).unwrap().dirs.is_empty());
    }

    #[test]
    fn remove_dir_contents_creates_missing_dir() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("fresh");
        remove_dir_contents(&target).unwrap();
        assert!(target.is_dir());
    }

    #[test]
    fn json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        write_json(&path, &vec!["a", "b"]).unwrap();
        let value: Vec<String> = read_json(&path).unwrap();
        assert_eq!(value, vec!["a", "b"]);
    }

    #[test]
    fn copy_file_creates_destination_dirs() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.img");
        fs::write(&src, "artifact").unwrap();

        let dst = dir.path().join("dist/nested/out.img");
        copy_file(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(&dst).unwrap(), "artifact");
    }
}
