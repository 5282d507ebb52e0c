//! Staging a profile's files out of a BL tar

use std::fs;
use std::path::PathBuf;

use hubble_core::profile::{decompressed_name, Profile};
use hubble_core::staging::{StagedSet, Stager};

use crate::archive;
use crate::error::{Result, StagingError};

/// Stages files from a BL tar into a working directory
#[derive(Debug, Clone)]
pub struct TarStager {
    archive: PathBuf,
    work_dir: PathBuf,
}

impl TarStager {
    /// Stage from `archive` into `work_dir`
    pub fn new(archive: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            work_dir: work_dir.into(),
        }
    }

    /// Extract, decompress and drop compressed intermediates
    pub fn stage_profile(&self, profile: &Profile) -> Result<StagedSet> {
        for member in &profile.archive_members {
            if !archive::is_plain_name(member) {
                return Err(StagingError::UnsafeMember(member.clone()));
            }
        }

        // Check everything is there before writing anything
        let members = archive::list_members(&self.archive)?;
        if let Some(missing) = profile
            .archive_members
            .iter()
            .find(|m| !members.contains(m))
        {
            return Err(StagingError::MissingMember(missing.clone()));
        }

        archive::extract(&self.archive, |name| profile.wants_member(name), &self.work_dir)?;

        for member in &profile.compressed_members {
            let src = self.work_dir.join(member);
            let dest = self.work_dir.join(decompressed_name(member));

            archive::decompress_file(&src, &dest)?;
            log::info!("Extracted: {}", decompressed_name(member));

            fs::remove_file(&src).map_err(|source| StagingError::Io {
                path: src.clone(),
                source,
            })?;
            log::info!("Deleted: {}", member);
        }

        Ok(StagedSet::for_profile(profile, &self.work_dir))
    }
}

impl Stager for TarStager {
    fn stage(&mut self, profile: &Profile) -> hubble_core::Result<StagedSet> {
        log::info!(
            "Staging {} members from {}",
            profile.archive_members.len(),
            self.archive.display()
        );
        Ok(self.stage_profile(profile)?)
    }
}
