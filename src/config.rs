//! Configuration management for fwforge.
//!
//! Reads configuration from a .env file and environment variables.
//! Environment variables take precedence over the .env file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default command for the Lua bytecode cross-compiler.
pub const DEFAULT_LUAC: &str = "luac.cross";

/// Build configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Site base directory; all defaults are relative to it.
    pub base_dir: PathBuf,
    /// Shared core root of firmware modules (default: firmware)
    pub firmware_dir: PathBuf,
    /// Site directory holding lib/ and devices/ (default: site)
    pub site_dir: PathBuf,
    /// Output directory, cleared at the start of every build (default: dist)
    pub dist_dir: PathBuf,
    /// Bytecode cache directory, persists across builds (default: imgcache)
    pub imgcache_dir: PathBuf,
    /// Bytecode cross-compiler command (default: luac.cross)
    pub luac_path: String,
}

impl Config {
    /// Load configuration from `<base_dir>/.env` and the environment.
    pub fn load(base_dir: &Path) -> Self {
        let mut env_vars = HashMap::new();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            if let Ok(content) = fs::read_to_string(&env_path) {
                for line in content.lines() {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((key, value)) = line.split_once('=') {
                        let value = value.trim().trim_matches('"').trim_matches('\'');
                        env_vars.insert(key.trim().to_string(), value.to_string());
                    }
                }
            }
        }

        // Environment variables override the .env file
        for (key, value) in std::env::vars() {
            env_vars.insert(key, value);
        }

        let dir = |key: &str, default: &str| -> PathBuf {
            env_vars
                .get(key)
                .map(|s| {
                    let path = PathBuf::from(s);
                    if path.is_absolute() {
                        path
                    } else {
                        base_dir.join(path)
                    }
                })
                .unwrap_or_else(|| base_dir.join(default))
        };

        Self {
            base_dir: base_dir.to_path_buf(),
            firmware_dir: dir("FIRMWARE_DIR", "firmware"),
            site_dir: dir("SITE_DIR", "site"),
            dist_dir: dir("DIST_DIR", "dist"),
            imgcache_dir: dir("IMGCACHE_DIR", "imgcache"),
            luac_path: env_vars
                .get("LUAC_PATH")
                .cloned()
                .unwrap_or_else(|| DEFAULT_LUAC.to_string()),
        }
    }

    /// Directory holding one subdirectory per library root.
    pub fn lib_dir(&self) -> PathBuf {
        self.site_dir.join("lib")
    }

    /// Directory holding one subdirectory per device root.
    pub fn devices_dir(&self) -> PathBuf {
        self.site_dir.join("devices")
    }

    /// Root directory of one device.
    pub fn device_dir(&self, device: &str) -> PathBuf {
        self.devices_dir().join(device)
    }

    /// Print configuration for debugging.
    pub fn print(&self) {
        println!("Configuration:");
        println!("  FIRMWARE_DIR: {}", self.firmware_dir.display());
        println!("  SITE_DIR: {}", self.site_dir.display());
        println!("  DIST_DIR: {}", self.dist_dir.display());
        println!("  IMGCACHE_DIR: {}", self.imgcache_dir.display());
        println!("  LUAC_PATH: {}", self.luac_path);
        if self.firmware_dir.is_dir() {
            println!("  Firmware root: FOUND");
        } else {
            println!("  Firmware root: NOT FOUND");
        }
    }
}
