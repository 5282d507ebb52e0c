//! Sending boot stages and flash files to the device
//!
//! Blocks go out strictly in table order. The first block the device does not
//! fully accept ends the transfer: nothing is retried, since the ROM's state
//! is unknown after a partial block.

use std::fs::{self, File};
use std::path::Path;

use crate::block::{Block, Framer};
use crate::device::{DeviceIdentity, Transport};
use crate::error::{Error, Result};
use crate::image;
use crate::poll::PollEvent;
use crate::profile::Region;

/// Steps of a recovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing started yet
    Idle,
    /// Waiting for a download-mode device to enumerate
    Discovering,
    /// Reading device strings and matching a profile
    Identifying,
    /// Extracting and decompressing the BL tar
    Staging,
    /// Sending the boot image regions
    SendingRegions,
    /// Sending the extra flash files
    SendingFlashFiles,
    /// Deleting staged files
    Cleanup,
    /// Session finished
    Done,
    /// Session hit a fatal error
    Aborted,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Idle => "Idle",
            Stage::Discovering => "Waiting for device",
            Stage::Identifying => "Identifying device",
            Stage::Staging => "Extracting files",
            Stage::SendingRegions => "Sending boot image",
            Stage::SendingFlashFiles => "Sending flash files",
            Stage::Cleanup => "Cleaning up",
            Stage::Done => "Done",
            Stage::Aborted => "Aborted",
        };
        write!(f, "{}", name)
    }
}

/// Callbacks for reporting session progress
///
/// All methods have empty defaults so callers only implement what they show.
pub trait TransferProgress {
    /// A new stage started
    fn stage(&mut self, _stage: Stage) {}

    /// The discovery loop missed or wants to show the plug-in hint
    fn poll(&mut self, _event: PollEvent) {}

    /// Device strings were read
    fn identified(&mut self, _identity: &DeviceIdentity) {}

    /// A block is about to be written
    fn sending(&mut self, _label: &str, _block: &Block) {}

    /// A block was fully accepted
    fn sent(&mut self, _label: &str, _written: usize) {}

    /// A staged file could not be deleted
    fn cleanup_failed(&mut self, _error: &Error) {}
}

/// Progress sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl TransferProgress for NoProgress {}

/// Totals for the blocks sent in a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    /// Blocks fully accepted
    pub blocks: usize,
    /// Bytes accepted, headers and checksums included
    pub bytes: usize,
}

/// Writes framed blocks through a claimed transport
pub struct Orchestrator<'a, T: Transport, P: TransferProgress + ?Sized> {
    port: &'a mut T,
    framer: Framer,
    progress: &'a mut P,
    stats: TransferStats,
}

impl<'a, T: Transport, P: TransferProgress + ?Sized> Orchestrator<'a, T, P> {
    /// Create an orchestrator writing to `port`
    pub fn new(port: &'a mut T, framer: Framer, progress: &'a mut P) -> Self {
        Self {
            port,
            framer,
            progress,
            stats: TransferStats::default(),
        }
    }

    /// Totals so far
    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    /// The progress sink this orchestrator reports to
    pub fn progress_mut(&mut self) -> &mut P {
        &mut *self.progress
    }

    /// Send one block and check the device took all of it
    pub fn send_block(&mut self, label: &str, block: &Block) -> Result<usize> {
        log::info!(
            "Downloading {} bytes to 0x{:08X} ({}), checksum {:04X}",
            block.len(),
            block.address(),
            label,
            block.checksum()
        );
        self.progress.sending(label, block);

        let written = self.port.write(block.as_bytes())?;
        log::debug!("{} bytes written", written);

        if written != block.len() {
            return Err(Error::TransferShortWrite {
                label: label.to_string(),
                expected: block.len(),
                written,
            });
        }

        self.stats.blocks += 1;
        self.stats.bytes += written;
        self.progress.sent(label, written);
        Ok(written)
    }

    /// Cut `regions` out of the boot image and send them in order
    pub fn send_regions(&mut self, image_path: &Path, regions: &[Region]) -> Result<()> {
        let mut file = File::open(image_path).map_err(|e| Error::io(image_path, e))?;

        for region in regions {
            log::info!(
                "Sending file part {} (0x{:X} - 0x{:X})",
                region.label,
                region.start,
                region.end
            );
            let block = image::read_region(&mut file, region, &self.framer)
                .map_err(|e| Error::io(image_path, e))?;
            self.send_block(&region.label, &block)?;
        }

        Ok(())
    }

    /// Send each file whole, in order
    pub fn send_files<Q: AsRef<Path>>(&mut self, files: &[Q]) -> Result<()> {
        for path in files {
            let path = path.as_ref();
            let label = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            log::info!("Sending file {}", label);
            let data = fs::read(path).map_err(|e| Error::io(path, e))?;
            let block = self.framer.frame(&data);
            self.send_block(&label, &block)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::HeaderFormat;

    /// Transport that records blocks and can be told to truncate one
    struct RecordingPort {
        blocks: Vec<Vec<u8>>,
        short_on: Option<usize>,
    }

    impl Transport for RecordingPort {
        fn write(&mut self, data: &[u8]) -> Result<usize> {
            let index = self.blocks.len();
            self.blocks.push(data.to_vec());
            if self.short_on == Some(index) {
                Ok(data.len() - 1)
            } else {
                Ok(data.len())
            }
        }
    }

    #[test]
    fn test_send_block_counts() {
        let mut port = RecordingPort {
            blocks: Vec::new(),
            short_on: None,
        };
        let mut progress = NoProgress;
        let framer = Framer::new(HeaderFormat::Compact);
        let mut orch = Orchestrator::new(&mut port, framer, &mut progress);

        let block = framer.frame(&[1, 2, 3, 4]);
        assert_eq!(orch.send_block("a", &block).unwrap(), 10);
        assert_eq!(orch.send_block("b", &block).unwrap(), 10);
        assert_eq!(
            orch.stats(),
            TransferStats {
                blocks: 2,
                bytes: 20
            }
        );
        assert_eq!(port.blocks.len(), 2);
    }

    #[test]
    fn test_short_write_is_fatal() {
        let mut port = RecordingPort {
            blocks: Vec::new(),
            short_on: Some(0),
        };
        let mut progress = NoProgress;
        let framer = Framer::default();
        let mut orch = Orchestrator::new(&mut port, framer, &mut progress);

        let err = orch.send_block("fwbl1.img", &framer.frame(&[0u8; 16])).unwrap_err();
        match err {
            Error::TransferShortWrite {
                label,
                expected,
                written,
            } => {
                assert_eq!(label, "fwbl1.img");
                assert_eq!(expected, 26);
                assert_eq!(written, 25);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(orch.stats().blocks, 0);
    }

    #[test]
    fn test_missing_image_is_io_error() {
        let mut port = RecordingPort {
            blocks: Vec::new(),
            short_on: None,
        };
        let mut progress = NoProgress;
        let mut orch = Orchestrator::new(&mut port, Framer::default(), &mut progress);

        let err = orch
            .send_regions(
                Path::new("/nonexistent/hubble/sboot.bin"),
                &[Region::new("fwbl1.img", 0, 0x10)],
            )
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
        assert!(port.blocks.is_empty());
    }
}
