//! Bytecode (LFS) bundle compilation with a content-addressed cache.
//!
//! Devices that request an LFS bundle get their script files compiled into
//! a single bytecode image by an external cross-compiler. Compilation is
//! expensive, so artifacts are cached under a key derived purely from the
//! content hashes of the bundled files: same inputs, same key, regardless
//! of build order. The cache directory persists across builds and is only
//! ever added to.

use crate::config::Config;
use crate::error::{BuildError, Result};
use crate::firmware::{FileSet, FirmwareDef};
use crate::fsutil;
use crate::process::Cmd;
use crate::root::FileEntry;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Compute the cache key for a set of files: a digest over their content
/// hashes concatenated in sorted path order. Pure with respect to its
/// inputs; filesystem state plays no part.
pub fn cache_key(entries: &[&FileEntry]) -> String {
    let mut ordered: Vec<&&FileEntry> = entries.iter().collect();
    ordered.sort_by(|a, b| a.path.cmp(&b.path));
    let mut hasher = Sha256::new();
    for entry in ordered {
        hasher.update(entry.hash.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Compile the device's script files into a bytecode image, reusing the
/// cached artifact when one exists for the same input hashes. The compiled
/// image is copied into the output directory and returned as a file entry
/// to join the device's file set. Returns `None` when the device has no
/// script files to bundle.
pub fn build_lfs_image(config: &Config, def: &FirmwareDef, files: &FileSet) -> Result<Option<FileEntry>> {
    let scripts: Vec<&FileEntry> = files.values().filter(|e| e.is_script()).collect();
    if scripts.is_empty() {
        return Ok(None);
    }

    let image_name = format!("{}-lfs.img", def.device.id);
    let key = cache_key(&scripts);
    let cached = config.imgcache_dir.join(format!("{image_name}.{key}"));

    if !cached.exists() {
        let sources: Vec<PathBuf> = scripts.iter().map(|e| e.source_path()).collect();
        println!("  compiling LFS bundle ({} scripts)", sources.len());
        std::fs::create_dir_all(&config.imgcache_dir)
            .map_err(|e| BuildError::io(&config.imgcache_dir, e))?;
        // The compiler writes to a staging path; the artifact lands on its
        // cache key only after a successful exit. A failed compile must
        // never leave a partial file where a later build would trust it.
        let staging = config.imgcache_dir.join(format!("{image_name}.{key}.tmp"));
        let result = Cmd::new(&config.luac_path)
            .arg("-o")
            .arg_path(&staging)
            .arg("-f")
            .arg_paths(sources.iter().map(PathBuf::as_path))
            .run();
        if let Err(e) = result {
            let _ = std::fs::remove_file(&staging);
            return Err(e);
        }
        std::fs::rename(&staging, &cached).map_err(|e| BuildError::io(&staging, e))?;
    } else {
        println!("  LFS bundle up to date (cached)");
    }

    let hash = fsutil::hash_file(&cached)?;
    let dist_path = config.dist_dir.join(&image_name);
    fsutil::copy_file(&cached, &dist_path)?;

    Ok(Some(FileEntry {
        path: image_name,
        base: config.dist_dir.clone(),
        hash,
        dependencies: BTreeSet::new(),
        datafiles: BTreeSet::new(),
    }))
}
