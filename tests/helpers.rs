//! Shared test utilities for fwforge tests.

use fwforge::config::Config;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test environment with a temporary site tree:
/// firmware/, site/lib/, site/devices/.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Site base directory
    pub base: PathBuf,
}

impl TestEnv {
    /// Create a new test environment with an empty site tree.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base = temp_dir.path().to_path_buf();

        fs::create_dir_all(base.join("firmware")).expect("Failed to create firmware dir");
        fs::create_dir_all(base.join("site/lib")).expect("Failed to create lib dir");
        fs::create_dir_all(base.join("site/devices")).expect("Failed to create devices dir");

        Self {
            _temp_dir: temp_dir,
            base,
        }
    }

    /// Build configuration rooted at this environment.
    pub fn config(&self) -> Config {
        Config::load(&self.base)
    }

    /// Write a module into the shared firmware root.
    pub fn core_module(&self, name: &str, source: &str) {
        write(&self.base.join("firmware").join(format!("{name}.lua")), source);
    }

    /// Write a file into a library root, creating the library if needed.
    pub fn lib_file(&self, lib: &str, file: &str, content: &str) {
        write(&self.base.join("site/lib").join(lib).join(file), content);
    }

    /// Create a device root with the given firmware.json content.
    pub fn device(&self, name: &str, definition: &str) {
        write(
            &self.base.join("site/devices").join(name).join("firmware.json"),
            definition,
        );
    }

    /// Write a device-specific file.
    pub fn device_file(&self, device: &str, file: &str, content: &str) {
        write(&self.base.join("site/devices").join(device).join(file), content);
    }

    /// Path to the output directory.
    pub fn dist(&self) -> PathBuf {
        self.base.join("dist")
    }

    /// Install a fake bytecode compiler that records every invocation in
    /// a counter file and writes its inputs to the output path. Returns
    /// the command to put in `Config::luac_path`.
    pub fn fake_luac(&self) -> String {
        let counter = self.base.join("luac-calls");
        let script_path = self.base.join("fake-luac");
        let script = format!(
            "#!/bin/sh\n# usage: fake-luac -o <out> -f <sources...>\nout=\"$2\"\nshift 3\ncat \"$@\" > \"$out\"\necho run >> \"{}\"\n",
            counter.display()
        );
        write(&script_path, &script);
        let mut perms = fs::metadata(&script_path)
            .expect("Failed to stat fake luac")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).expect("Failed to chmod fake luac");
        script_path.display().to_string()
    }

    /// Install a broken bytecode compiler that writes partial output to
    /// its target and then fails. Returns the command to put in
    /// `Config::luac_path`.
    pub fn fake_failing_luac(&self) -> String {
        let script_path = self.base.join("fake-failing-luac");
        let script = "#!/bin/sh\n# usage: fake-failing-luac -o <out> -f <sources...>\nout=\"$2\"\necho PARTIAL > \"$out\"\nexit 1\n";
        write(&script_path, script);
        let mut perms = fs::metadata(&script_path)
            .expect("Failed to stat fake luac")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&script_path, perms).expect("Failed to chmod fake luac");
        script_path.display().to_string()
    }

    /// Number of times the fake compiler ran.
    pub fn luac_calls(&self) -> usize {
        fs::read_to_string(self.base.join("luac-calls"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(path, content).expect("Failed to write test file");
}
