//! hubble-core - Transfer engine for Exynos download-mode recovery
//!
//! This crate holds everything about a recovery run that does not touch USB
//! or archives directly:
//!
//! - [`profile`]: per-SoC boot image layout and staging table
//! - [`block`]: the header + payload + checksum wire framing
//! - [`image`]: cutting the combined boot image into per-stage blocks
//! - [`poll`]: the blocking device discovery loop
//! - [`transfer`] and [`session`]: the fail-fast session state machine
//!
//! USB access and tar/LZ4 staging plug in through the traits in [`device`] and
//! [`staging`].
//!
//! # Example
//!
//! ```
//! use hubble_core::block::Framer;
//! use hubble_core::profile::ProfileRegistry;
//!
//! let registry = ProfileRegistry::builtin()?;
//! let profile = registry.lookup("Exynos9830\0")?;
//! assert_eq!(profile.regions[0].label, "fwbl1.img");
//!
//! let block = Framer::new(profile.header).frame(&[1, 2, 3]);
//! assert_eq!(block.len(), 3 + 10);
//! assert_eq!(block.checksum(), 6);
//! # Ok::<(), hubble_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod block;
pub mod device;
pub mod error;
pub mod image;
pub mod poll;
pub mod profile;
pub mod session;
pub mod staging;
pub mod transfer;

pub use error::{Error, Result};
