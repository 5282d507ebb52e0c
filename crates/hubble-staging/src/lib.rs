//! BL archive staging for hubble
//!
//! Pulls the members a [`Profile`](hubble_core::profile::Profile) needs out of
//! a Samsung BL tar (`.tar` or `.tar.md5`), decodes the LZ4 frames it marks as
//! compressed and leaves the results in a working directory for the transfer.
//!
//! ```no_run
//! use hubble_core::profile::ProfileRegistry;
//! use hubble_core::staging::Stager;
//! use hubble_staging::TarStager;
//!
//! let registry = ProfileRegistry::builtin()?;
//! let profile = registry.lookup("Exynos9830\0")?;
//! let staged = TarStager::new("BL_A515F.tar.md5", ".").stage(profile)?;
//! println!("boot image at {}", staged.boot_image.display());
//! # Ok::<(), hubble_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod archive;
mod error;
mod stager;

pub use error::{Result, StagingError};
pub use stager::TarStager;

#[cfg(test)]
pub(crate) mod tests_util {
    use std::fs::{self, File, OpenOptions};
    use std::io::Write;
    use std::path::{Path, PathBuf};

    use lz4_flex::frame::FrameEncoder;

    /// Fresh empty directory under the system temp dir
    pub fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "hubble-staging-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Write a tar holding `members`, optionally followed by a text trailer
    pub fn build_tar(path: &Path, members: &[(&str, &[u8])], trailer: Option<&str>) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(file);
        for (name, data) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.into_inner().unwrap().sync_all().unwrap();

        if let Some(text) = trailer {
            let mut file = OpenOptions::new().append(true).open(path).unwrap();
            file.write_all(text.as_bytes()).unwrap();
        }
    }

    /// LZ4 frame holding `data`
    pub fn lz4(data: &[u8]) -> Vec<u8> {
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }
}
