//! SoC profile registry
//!
//! Each supported SoC is described by a [`Profile`]: how its combined boot
//! image splits into boot stages, which BL tar members staging needs, and which
//! extra files follow the boot stages. Profiles are keyed by the exact product
//! string the ROM reports over USB.

mod registry;
mod types;

pub use registry::ProfileRegistry;
pub use types::{decompressed_name, Profile, Region, COMPRESSED_EXTENSION};
