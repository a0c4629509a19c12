//! Layout registry
//!
//! One [`VersionProfile`] per supported build, plus the structural offsets
//! that every build shares. Profiles are plain data: supporting a new build
//! means adding a variant and its profile, nothing else.

pub mod offsets;
mod profile;

pub use profile::{Detection, GameVersion, VersionProfile, detect_version, profiles};
