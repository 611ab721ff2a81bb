//! Script annotation scanning.
//!
//! Lua sources declare module dependencies with ordinary `require("a.b")`
//! calls and auxiliary resources with `-- datafile: <token>` comment lines.
//! The scanner extracts both as deduplicated sets; a file with no
//! declarations is perfectly valid. Datafile tokens are opaque strings
//! passed through to the image verbatim, never resolved as dependencies.

use crate::error::{BuildError, Result};
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static REQUIRE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:^require|\s+require)\s*\(\s*"([^"]*)"\s*\)"#).expect("valid require regex")
});

static DATAFILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^--\s*datafile:\s*(.*)$").expect("valid datafile regex")
});

/// Declarations extracted from one script file.
#[derive(Debug, Default, Clone)]
pub struct Annotations {
    /// Dotted module names this script requires.
    pub dependencies: BTreeSet<String>,
    /// Datafile tokens this script declares.
    pub datafiles: BTreeSet<String>,
}

/// Scan script source text for dependency and datafile declarations.
pub fn scan_source(source: &str) -> Annotations {
    let mut annotations = Annotations::default();
    for capture in REQUIRE_RE.captures_iter(source) {
        annotations.dependencies.insert(capture[1].to_string());
    }
    for capture in DATAFILE_RE.captures_iter(source) {
        annotations.datafiles.insert(capture[1].trim().to_string());
    }
    annotations
}

/// Scan a script file on disk. Fails only if the file cannot be read.
pub fn scan_file(path: &Path) -> Result<Annotations> {
    let source = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    Ok(scan_source(&source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_require_calls() {
        let source = r#"
local log = require("core.log")
require("net.wifi")
print("hello")
"#;
        let annotations = scan_source(source);
        assert!(annotations.dependencies.contains("core.log"));
        assert!(annotations.dependencies.contains("net.wifi"));
        assert_eq!(annotations.dependencies.len(), 2);
    }

    #[test]
    fn require_must_be_a_call_boundary() {
        // A name that merely ends in "require" is not a declaration.
        let annotations = scan_source(r#"myrequire("not.a.dep")"#);
        assert!(annotations.dependencies.is_empty());
    }

    #[test]
    fn extracts_datafile_comments() {
        let source = "-- datafile: calibration.dat\n--datafile: map.bin\nlocal x = 1\n";
        let annotations = scan_source(source);
        assert!(annotations.datafiles.contains("calibration.dat"));
        assert!(annotations.datafiles.contains("map.bin"));
    }

    #[test]
    fn datafile_comment_must_start_the_line() {
        let annotations = scan_source("local y = 2 -- datafile: nope.dat\n");
        assert!(annotations.datafiles.is_empty());
    }

    #[test]
    fn duplicate_declarations_collapse() {
        let source = "require(\"a.b\")\nrequire(\"a.b\")\n-- datafile: d\n-- datafile: d\n";
        let annotations = scan_source(source);
        assert_eq!(annotations.dependencies.len(), 1);
        assert_eq!(annotations.datafiles.len(), 1);
    }

    #[test]
    fn empty_source_is_valid() {
        let annotations = scan_source("");
        assert!(annotations.dependencies.is_empty());
        assert!(annotations.datafiles.is_empty());
    }
}
