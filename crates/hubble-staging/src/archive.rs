//! Tar member access and LZ4 frame decoding
//!
//! BL archives come as plain tars or as `.tar.md5`, which is the same tar with
//! an MD5 line appended after the end-of-archive blocks. The tar reader stops at
//! the end-of-archive marker, so both forms read the same way.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use lz4_flex::frame::FrameDecoder;

use crate::error::{Result, StagingError};

fn open(path: &Path) -> Result<tar::Archive<File>> {
    let file = File::open(path).map_err(|source| StagingError::Archive {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tar::Archive::new(file))
}

fn archive_err(path: &Path) -> impl Fn(io::Error) -> StagingError + '_ {
    move |source| StagingError::Archive {
        path: path.to_path_buf(),
        source,
    }
}

/// Member names must be bare file names to be staged
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

/// List the names of all regular file members
pub fn list_members(path: &Path) -> Result<Vec<String>> {
    let mut archive = open(path)?;
    let mut names = Vec::new();

    for entry in archive.entries().map_err(archive_err(path))? {
        let entry = entry.map_err(archive_err(path))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path().map_err(archive_err(path))?;
        names.push(name.to_string_lossy().into_owned());
    }

    log::debug!("{} members in {}", names.len(), path.display());
    Ok(names)
}

/// Write every regular member whose name passes `wanted` into `dest_dir`
///
/// Returns the paths written, in archive order.
pub fn extract<F>(path: &Path, wanted: F, dest_dir: &Path) -> Result<Vec<PathBuf>>
where
    F: Fn(&str) -> bool,
{
    let mut archive = open(path)?;
    let mut written = Vec::new();

    for entry in archive.entries().map_err(archive_err(path))? {
        let mut entry = entry.map_err(archive_err(path))?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let name = entry
            .path()
            .map_err(archive_err(path))?
            .to_string_lossy()
            .into_owned();
        if !wanted(&name) {
            log::trace!("Skipping member {}", name);
            continue;
        }
        if !is_plain_name(&name) {
            return Err(StagingError::UnsafeMember(name));
        }

        let target = dest_dir.join(&name);
        let mut out = File::create(&target).map_err(|source| StagingError::Io {
            path: target.clone(),
            source,
        })?;
        io::copy(&mut entry, &mut out).map_err(archive_err(path))?;

        log::info!("Extracted: {}", name);
        written.push(target);
    }

    Ok(written)
}

/// Decode a single LZ4 frame
pub fn decompress_frame(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut decoder = FrameDecoder::new(data);
    let mut out = Vec::with_capacity(data.len() * 2);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Decompress `src` into `dest`
pub fn decompress_file(src: &Path, dest: &Path) -> Result<()> {
    let member = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let compressed = fs::read(src).map_err(|source| StagingError::Io {
        path: src.to_path_buf(),
        source,
    })?;
    let data = decompress_frame(&compressed)
        .map_err(|source| StagingError::Decompress { member, source })?;
    fs::write(dest, &data).map_err(|source| StagingError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    log::debug!(
        "Decompressed {} -> {} ({} bytes)",
        src.display(),
        dest.display(),
        data.len()
    );
    Ok(())
}
