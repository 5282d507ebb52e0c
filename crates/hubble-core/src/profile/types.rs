//! SoC profile types

use serde::Deserialize;

use crate::block::{HeaderFormat, DOWNLOAD_ADDRESS};

/// Extension stripped from compressed archive members once decompressed
pub const COMPRESSED_EXTENSION: &str = ".lz4";

/// A named slice of the combined boot image
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Region {
    /// Name of the boot stage (e.g. "fwbl1.img")
    pub label: String,
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
}

impl Region {
    /// Create a new region
    pub fn new(label: impl Into<String>, start: u32, end: u32) -> Self {
        Self {
            label: label.into(),
            start,
            end,
        }
    }

    /// Size of this region in bytes
    pub fn size(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }
}

/// Layout and extraction metadata for one supported SoC
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Product string as the device reports it, NUL terminator included
    pub name: String,
    /// Staged file the regions index into
    pub boot_image: String,
    /// Boot stages in the order they must reach the device
    pub regions: Vec<Region>,
    /// Members pulled from the BL tar; everything else is ignored
    pub archive_members: Vec<String>,
    /// Members that are LZ4 frames and get decompressed during staging
    #[serde(default)]
    pub compressed_members: Vec<String>,
    /// Files sent whole after the boot image regions
    #[serde(default)]
    pub flash_files: Vec<String>,
    /// Header shape expected by this SoC's download-mode ROM
    #[serde(default = "default_header")]
    pub header: HeaderFormat,
}

fn default_header() -> HeaderFormat {
    HeaderFormat::Addressed {
        address: DOWNLOAD_ADDRESS,
    }
}

impl Profile {
    /// Human-readable SoC name (product string without the NUL padding)
    pub fn display_name(&self) -> &str {
        self.name.trim_end_matches('\0')
    }

    /// Whether `member` is one of the archive members this profile needs
    pub fn wants_member(&self, member: &str) -> bool {
        self.archive_members.iter().any(|m| m == member)
    }

    /// Whether `member` must be decompressed after extraction
    pub fn is_compressed(&self, member: &str) -> bool {
        self.compressed_members.iter().any(|m| m == member)
    }

    /// Names of all files staging leaves on disk, in archive order
    ///
    /// Compressed members are replaced by their decompressed siblings.
    pub fn staged_names(&self) -> Vec<String> {
        self.archive_members
            .iter()
            .map(|m| {
                if self.is_compressed(m) {
                    decompressed_name(m).to_string()
                } else {
                    m.clone()
                }
            })
            .collect()
    }

    /// Check the table invariants for this profile
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("profile with empty name".into());
        }

        for member in &self.compressed_members {
            if !self.wants_member(member) {
                return Err(format!(
                    "{}: compressed member {} is not an archive member",
                    self.display_name(),
                    member
                ));
            }
            if !member.ends_with(COMPRESSED_EXTENSION) {
                return Err(format!(
                    "{}: compressed member {} lacks the {} extension",
                    self.display_name(),
                    member,
                    COMPRESSED_EXTENSION
                ));
            }
        }

        for file in &self.flash_files {
            if self.is_compressed(file) {
                return Err(format!(
                    "{}: flash file {} is a compressed member",
                    self.display_name(),
                    file
                ));
            }
        }

        let staged = self.staged_names();
        for file in self.flash_files.iter().chain([&self.boot_image]) {
            if !staged.contains(file) {
                return Err(format!(
                    "{}: {} is never produced by staging",
                    self.display_name(),
                    file
                ));
            }
        }

        for region in &self.regions {
            if region.start >= region.end {
                return Err(format!(
                    "{}: region {} has empty range 0x{:X}-0x{:X}",
                    self.display_name(),
                    region.label,
                    region.start,
                    region.end
                ));
            }
        }

        Ok(())
    }
}

/// Name of a compressed member once its extension is dropped
pub fn decompressed_name(member: &str) -> &str {
    member
        .strip_suffix(COMPRESSED_EXTENSION)
        .unwrap_or(member)
}
