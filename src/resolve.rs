//! Dependency resolution and device file-set assembly.
//!
//! The resolver walks a device's entry modules depth-first across an
//! ordered list of search roots. The accumulated file set doubles as the
//! memo table: a path already present is never re-resolved, which makes
//! cyclic and diamond dependency graphs terminate naturally. Search order
//! is the device's libraries in declared order, then the shared core root;
//! the first root carrying a path wins.

use crate::error::{BuildError, Result};
use crate::firmware::{FileSet, FirmwareDef, LibDef};
use crate::root::{self, FileEntry, Root, RootSet};
use glob::{MatchOptions, Pattern};

/// Find the first entry for a relative path across the search roots.
fn find_in_roots<'a>(path: &str, roots: &[&'a Root]) -> Option<&'a FileEntry> {
    roots.iter().find_map(|root| root.files.get(path))
}

/// The roots a device's modules are resolved against: its libraries with
/// `includeLua` set, in declared order, then the shared core root last.
pub fn search_roots<'a>(roots: &'a RootSet, libs: &[LibDef]) -> Result<Vec<&'a Root>> {
    let mut search = Vec::new();
    for lib in libs {
        if lib.include_lua {
            search.push(roots.get(&format!("lib/{}", lib.name))?);
        }
    }
    search.push(roots.get("firmware")?);
    Ok(search)
}

/// Add a module and its transitive dependencies to the file set.
pub fn add_module_files(
    module: &str,
    roots: &[&Root],
    files: &mut FileSet,
    device: &str,
) -> Result<()> {
    let module_file = root::module_path(module);
    if files.contains_key(&module_file) {
        return Ok(());
    }
    let entry = find_in_roots(&module_file, roots).ok_or_else(|| {
        BuildError::FileNotFoundInRoots {
            module: module.to_string(),
            device: device.to_string(),
        }
    })?;
    files.insert(module_file, entry.clone());
    for dep in &entry.dependencies {
        add_module_files(dep, roots, files, device).map_err(|e| BuildError::Dependency {
            module: dep.clone(),
            path: entry.path.clone(),
            source: Box::new(e),
        })?;
    }
    Ok(())
}

/// Add every library file matched by the library's include patterns,
/// overwriting module-closure entries at the same path.
pub fn add_library_assets(roots: &RootSet, libs: &[LibDef], files: &mut FileSet) -> Result<()> {
    let options = MatchOptions {
        // `*` must not cross path separators; globs are path-aware.
        require_literal_separator: true,
        ..MatchOptions::default()
    };
    for lib in libs {
        if lib.include.is_empty() {
            continue;
        }
        let root = roots.get(&format!("lib/{}", lib.name))?;
        for pattern in &lib.include {
            let compiled = Pattern::new(pattern).map_err(|e| BuildError::GlobSyntax {
                library: lib.name.clone(),
                pattern: pattern.clone(),
                source: e,
            })?;
            for (path, entry) in &root.files {
                if compiled.matches_with(path, options) {
                    files.insert(path.clone(), entry.clone());
                }
            }
        }
    }
    Ok(())
}

/// Overlay every file physically present in the device's own root.
/// Device-local files always win.
pub fn add_device_files(device_root: &Root, files: &mut FileSet) {
    for entry in device_root.files.values() {
        files.insert(entry.path.clone(), entry.clone());
    }
}

/// Produce the final file set for one device: module closure, then
/// library-included assets, then device-specific files.
pub fn assemble_device(roots: &RootSet, def: &FirmwareDef, device: &str) -> Result<FileSet> {
    let search = search_roots(roots, &def.libs)?;
    let mut files = FileSet::new();
    for module in &def.modules {
        add_module_files(&module.name, &search, &mut files, device)?;
    }
    add_library_assets(roots, &def.libs, &mut files)?;
    let device_root = roots.get(&format!("device/{device}"))?;
    add_device_files(device_root, &mut files);
    Ok(files)
}
