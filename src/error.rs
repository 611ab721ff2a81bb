//! Error types for the firmware build pipeline.
//!
//! Every resolution failure is wrapped with the module, library, or device
//! in whose context it occurred, so a failed build reads as a breadcrumb
//! trail from the root cause up to the device being built.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for build pipeline operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Errors that can occur while building firmware manifests and images.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A referenced library or device root was never indexed.
    #[error("cannot find firmware root {0:?}")]
    RootNotFound(String),

    /// A module is absent from every searched root.
    #[error("cannot find module {module:?} in any firmware root for device {device:?}")]
    FileNotFoundInRoots { module: String, device: String },

    /// A library declared a malformed include pattern.
    #[error("bad include pattern {pattern:?} in library {library:?}: {source}")]
    GlobSyntax {
        library: String,
        pattern: String,
        source: glob::PatternError,
    },

    /// A device definition document could not be parsed.
    #[error("cannot parse firmware definition for device {device:?}: {source}")]
    DefinitionParse {
        device: String,
        source: serde_json::Error,
    },

    /// Read, write, or hash failure against the filesystem.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to serialize a structured document.
    #[error("cannot serialize {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The external bytecode compiler failed.
    #[error("{command} failed: {detail}")]
    ExternalTool { command: String, detail: String },

    /// An image file does not follow the expected record framing.
    #[error("malformed image {}: {reason}", path.display())]
    MalformedImage { path: PathBuf, reason: String },

    /// Breadcrumb wrapper added by the resolver while walking dependencies.
    #[error("cannot resolve dependency {module:?} of {path}: {source}")]
    Dependency {
        module: String,
        path: String,
        source: Box<BuildError>,
    },

    /// Breadcrumb wrapper added by the driver around a whole device build.
    #[error("building device {device:?}: {source}")]
    Device {
        device: String,
        source: Box<BuildError>,
    },
}

impl BuildError {
    /// Attach the offending path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
