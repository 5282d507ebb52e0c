//! Staged files and the cleanup contract

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::profile::Profile;

/// Files staging left on disk for one profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSet {
    /// Combined boot image the regions are cut from
    pub boot_image: PathBuf,
    /// Flash files in send order
    pub flash_files: Vec<PathBuf>,
    /// Every file staging created and did not already delete
    pub files: Vec<PathBuf>,
}

impl StagedSet {
    /// Describe the files staging produces for `profile` inside `dir`
    ///
    /// Does not touch the filesystem; stagers use this to build their result
    /// once extraction and decompression have finished.
    pub fn for_profile(profile: &Profile, dir: &Path) -> Self {
        Self {
            boot_image: dir.join(&profile.boot_image),
            flash_files: profile.flash_files.iter().map(|f| dir.join(f)).collect(),
            files: profile.staged_names().iter().map(|f| dir.join(f)).collect(),
        }
    }

    /// Delete every staged file, returning the ones that could not be removed
    ///
    /// Files already gone are skipped.
    pub fn cleanup(&self) -> Vec<Error> {
        let mut failures = Vec::new();

        for path in &self.files {
            if !path.exists() {
                log::debug!("Already gone: {}", path.display());
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => log::info!("Deleted: {}", path.display()),
                Err(source) => failures.push(Error::Cleanup {
                    path: path.clone(),
                    source,
                }),
            }
        }

        failures
    }
}

/// Produces the on-disk inputs for a transfer
pub trait Stager {
    /// Extract and decompress everything `profile` needs
    ///
    /// Compressed intermediates must be gone before this returns.
    fn stage(&mut self, profile: &Profile) -> Result<StagedSet>;
}
