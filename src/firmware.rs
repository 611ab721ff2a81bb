//! Device firmware definitions and build manifests.
//!
//! A device root carries a `firmware.json` definition naming the device,
//! its libraries, and its entry modules. The build turns that into a
//! `FirmwareManifest`: the device identity plus the final resolved file
//! list, sorted by path so identical inputs always serialize identically.

use crate::error::{BuildError, Result};
use crate::fsutil;
use crate::root::FileEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Name of the device definition document inside a device root.
pub const DEFINITION_FILE: &str = "firmware.json";

/// Device identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub name: String,
    pub id: String,
}

/// A library selected by a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibDef {
    pub name: String,
    /// Whether the library's module tree participates in dependency search.
    #[serde(default, rename = "includeLua")]
    pub include_lua: bool,
    /// Glob patterns selecting additional non-module assets.
    #[serde(default)]
    pub include: Vec<String>,
}

/// An entry module to resolve for a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    /// Passed through to the manifest for the runtime; not interpreted here.
    #[serde(default)]
    pub autostart: bool,
}

/// A device firmware definition, as read from `firmware.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct FirmwareDef {
    #[serde(flatten)]
    pub device: DeviceInfo,
    #[serde(default)]
    pub libs: Vec<LibDef>,
    #[serde(default)]
    pub modules: Vec<ModuleDef>,
    /// Bundle the device's script files into a compiled bytecode image.
    #[serde(default)]
    pub lfs: bool,
}

impl FirmwareDef {
    /// Load and parse the definition document of a device root.
    pub fn load(device: &str, path: &Path) -> Result<Self> {
        fsutil::read_json(path).map_err(|e| match e {
            BuildError::Json { source, .. } => BuildError::DefinitionParse {
                device: device.to_string(),
                source,
            },
            other => other,
        })
    }
}

/// One file of a manifest: relative path plus content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestFile {
    pub path: String,
    pub hash: String,
}

/// The primary build output for one device: identity plus the final,
/// lexicographically ordered file list.
#[derive(Debug, Clone, Serialize)]
pub struct FirmwareManifest {
    #[serde(flatten)]
    pub device: DeviceInfo,
    pub modules: Vec<ModuleDef>,
    pub files: Vec<ManifestFile>,
}

/// The final resolved file set of a device, keyed by relative path.
pub type FileSet = BTreeMap<String, FileEntry>;

impl FirmwareManifest {
    /// Build a manifest from a resolved file set. Returns the manifest
    /// together with the full entries in manifest order, which the image
    /// packer consumes.
    pub fn from_file_set(def: &FirmwareDef, files: &FileSet) -> (Self, Vec<FileEntry>) {
        let mut entries: Vec<FileEntry> = files.values().cloned().collect();
        // Explicit sort before serialization; never rely on map order.
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        let manifest = FirmwareManifest {
            device: def.device.clone(),
            modules: def.modules.clone(),
            files: entries
                .iter()
                .map(|e| ManifestFile {
                    path: e.path.clone(),
                    hash: e.hash.clone(),
                })
                .collect(),
        };
        (manifest, entries)
    }

    /// Write the manifest document as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        fsutil::write_json(path, self)
    }
}
