//! fwforge - modular Lua firmware image builder.
//!
//! Resolves which source and asset files each device needs (including
//! transitive module dependencies), assembles them into a reproducible
//! manifest, and packs them into a single deterministic image file.

pub mod annotations;
pub mod build;
pub mod config;
pub mod error;
pub mod firmware;
pub mod fsutil;
pub mod image;
pub mod lfs;
pub mod process;
pub mod resolve;
pub mod root;

pub use error::{BuildError, Result};
