//! Profile registry: exact product-string lookup over the SoC table

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;

use super::types::Profile;
use crate::error::{Error, Result};

/// Profiles shipped with the tool
const BUILTIN_PROFILES: &str = include_str!("../../profiles/exynos.ron");

static BUILTIN: Lazy<Result<ProfileRegistry>> = Lazy::new(|| {
    let mut registry = ProfileRegistry::new();
    registry.load_ron(BUILTIN_PROFILES)?;
    Ok(registry)
});

/// Read-only mapping from device product string to SoC profile
#[derive(Debug, Clone, Default)]
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// The built-in table, parsed once per process
    pub fn builtin() -> Result<&'static ProfileRegistry> {
        BUILTIN
            .as_ref()
            .map_err(|e| Error::ProfileDb(format!("built-in profiles: {}", e)))
    }

    /// Load profiles from a RON string containing a list of profiles
    pub fn load_ron(&mut self, content: &str) -> Result<usize> {
        let profiles: Vec<Profile> = ron::from_str(content)?;
        let count = profiles.len();

        for profile in profiles {
            self.insert(profile)?;
        }

        Ok(count)
    }

    /// Load profiles from a RON file
    pub fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        self.load_ron(&content)
    }

    /// Add a single profile after checking its invariants
    pub fn insert(&mut self, profile: Profile) -> Result<()> {
        profile.validate().map_err(Error::ProfileDb)?;

        if self.profiles.contains_key(&profile.name) {
            return Err(Error::ProfileDb(format!(
                "duplicate profile for {}",
                profile.display_name()
            )));
        }

        self.profiles.insert(profile.name.clone(), profile);
        Ok(())
    }

    /// Find the profile whose name equals `name` exactly
    pub fn lookup(&self, name: &str) -> Result<&Profile> {
        self.profiles
            .get(name)
            .ok_or_else(|| Error::UnsupportedDevice {
                name: name.to_string(),
            })
    }

    /// Iterate over all profiles in name order
    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    /// Number of profiles
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::HeaderFormat;
    use crate::profile::Region;

    #[test]
    fn test_builtin_lookup() {
        let registry = ProfileRegistry::builtin().unwrap();
        let profile = registry.lookup("Exynos9830\0").unwrap();

        assert_eq!(profile.regions[0], Region::new("fwbl1.img", 0x0, 0x3000));
        assert_eq!(profile.regions.len(), 5);
        assert_eq!(profile.boot_image, "sboot.bin");
        assert_eq!(profile.flash_files, ["ldfw.img.lz4", "tzsw.img.lz4"]);
    }

    #[test]
    fn test_unknown_is_unsupported() {
        let registry = ProfileRegistry::builtin().unwrap();
        assert!(matches!(
            registry.lookup("Unknown\0"),
            Err(Error::UnsupportedDevice { .. })
        ));
        // No built-in table for this one; it needs a --profiles file
        assert!(matches!(
            registry.lookup("Exynos9611\0"),
            Err(Error::UnsupportedDevice { .. })
        ));
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = ProfileRegistry::builtin().unwrap();
        // Without the NUL the device string does not match
        assert!(registry.lookup("Exynos9830").is_err());
        assert!(registry.lookup("Exynos98").is_err());
        assert!(registry.lookup("exynos9830\0").is_err());
    }

    #[test]
    fn test_builtin_invariants() {
        let registry = ProfileRegistry::builtin().unwrap();
        assert!(!registry.is_empty());

        for profile in registry.iter() {
            for member in &profile.compressed_members {
                assert!(profile.archive_members.contains(member));
            }
            for file in &profile.flash_files {
                assert!(!profile.compressed_members.contains(file));
            }
        }
    }

    #[test]
    fn test_load_ron_with_compact_header() {
        let ron = r#"
        [
            (
                name: "Exynos850\0",
                boot_image: "sboot.bin",
                regions: [(label: "bl1", start: 0x0, end: 0x2000)],
                archive_members: ["sboot.bin"],
                header: Compact,
            ),
        ]
        "#;

        let mut registry = ProfileRegistry::new();
        assert_eq!(registry.load_ron(ron).unwrap(), 1);

        let profile = registry.lookup("Exynos850\0").unwrap();
        assert_eq!(profile.header, HeaderFormat::Compact);
        assert!(profile.compressed_members.is_empty());
        assert!(profile.flash_files.is_empty());
    }

    #[test]
    fn test_rejects_compressed_flash_file() {
        let ron = r#"
        [
            (
                name: "Bad\0",
                boot_image: "sboot.bin",
                regions: [],
                archive_members: ["sboot.bin.lz4"],
                compressed_members: ["sboot.bin.lz4"],
                flash_files: ["sboot.bin.lz4"],
            ),
        ]
        "#;

        let mut registry = ProfileRegistry::new();
        assert!(matches!(registry.load_ron(ron), Err(Error::ProfileDb(_))));
    }

    #[test]
    fn test_rejects_compressed_outside_archive() {
        let ron = r#"
        [
            (
                name: "Bad\0",
                boot_image: "sboot.bin",
                regions: [],
                archive_members: ["sboot.bin"],
                compressed_members: ["tzsw.img.lz4"],
            ),
        ]
        "#;

        let mut registry = ProfileRegistry::new();
        assert!(registry.load_ron(ron).is_err());
    }

    #[test]
    fn test_rejects_duplicate() {
        let registry = ProfileRegistry::builtin().unwrap();
        let mut copy = registry.clone();
        let profile = registry.lookup("Exynos9830\0").unwrap().clone();
        assert!(copy.insert(profile).is_err());
    }
}
