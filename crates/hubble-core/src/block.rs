//! Download-mode block framing
//!
//! Every boot stage travels as a single block:
//!
//! ```text
//! Addressed: [u32 LE address][u32 LE total length][payload][u16 LE checksum]
//! Compact:                   [u32 LE total length][payload][u16 LE checksum]
//! ```
//!
//! The length field counts the whole block, header and checksum included. The
//! checksum is the 16-bit wrapping sum of the payload bytes.

use serde::Deserialize;

/// Destination address the ROM treats as "load wherever the next stage goes"
pub const DOWNLOAD_ADDRESS: u32 = 0xFFFF_FFFE;

/// Size of the trailing checksum
pub const CHECKSUM_LEN: usize = 2;

/// Header shape expected by a firmware generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HeaderFormat {
    /// Destination address followed by the block length
    Addressed {
        /// Load address written into the header
        address: u32,
    },
    /// Block length only; the ROM implies the download address
    Compact,
}

impl HeaderFormat {
    /// Header size in bytes
    pub const fn header_len(&self) -> usize {
        match self {
            HeaderFormat::Addressed { .. } => 8,
            HeaderFormat::Compact => 4,
        }
    }

    /// Header plus checksum
    pub const fn overhead(&self) -> usize {
        self.header_len() + CHECKSUM_LEN
    }

    /// Address the payload lands at
    pub const fn address(&self) -> u32 {
        match self {
            HeaderFormat::Addressed { address } => *address,
            HeaderFormat::Compact => DOWNLOAD_ADDRESS,
        }
    }
}

impl Default for HeaderFormat {
    fn default() -> Self {
        HeaderFormat::Addressed {
            address: DOWNLOAD_ADDRESS,
        }
    }
}

/// Additive checksum over a payload
pub fn checksum(payload: &[u8]) -> u16 {
    payload
        .iter()
        .fold(0u16, |sum, &b| sum.wrapping_add(u16::from(b)))
}

/// A framed block ready for one bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    data: Vec<u8>,
    format: HeaderFormat,
}

impl Block {
    /// Raw bytes to put on the wire
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Total block length (what the length field says)
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Blocks always carry a header, so this is never true
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The payload slice between header and checksum
    pub fn payload(&self) -> &[u8] {
        &self.data[self.format.header_len()..self.data.len() - CHECKSUM_LEN]
    }

    /// Checksum stored in the trailing two bytes
    pub fn checksum(&self) -> u16 {
        let n = self.data.len();
        u16::from_le_bytes([self.data[n - 2], self.data[n - 1]])
    }

    /// Destination address of this block
    pub fn address(&self) -> u32 {
        self.format.address()
    }
}

/// Builds blocks for one header format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Framer {
    format: HeaderFormat,
}

impl Framer {
    /// Create a framer for the given header format
    pub fn new(format: HeaderFormat) -> Self {
        Self { format }
    }

    /// Allocate a staging buffer with room for the header and checksum
    ///
    /// The payload region is zeroed and starts at [`Framer::payload_offset`].
    pub fn staging_buffer(&self, payload_len: usize) -> Vec<u8> {
        vec![0u8; payload_len + self.format.overhead()]
    }

    /// Offset of the payload inside a staging buffer
    pub fn payload_offset(&self) -> usize {
        self.format.header_len()
    }

    /// Copy `payload` into a fresh buffer and frame it
    pub fn frame(&self, payload: &[u8]) -> Block {
        let mut buf = self.staging_buffer(payload.len());
        let start = self.payload_offset();
        buf[start..start + payload.len()].copy_from_slice(payload);
        self.frame_in_place(buf)
    }

    /// Write header and checksum into a buffer from [`Framer::staging_buffer`]
    ///
    /// `buf` must be at least header plus checksum long.
    pub fn frame_in_place(&self, mut buf: Vec<u8>) -> Block {
        debug_assert!(
            buf.len() >= self.format.overhead(),
            "buffer has no room for header and checksum"
        );

        let total = buf.len() as u32;
        match self.format {
            HeaderFormat::Addressed { address } => {
                buf[0..4].copy_from_slice(&address.to_le_bytes());
                buf[4..8].copy_from_slice(&total.to_le_bytes());
            }
            HeaderFormat::Compact => {
                buf[0..4].copy_from_slice(&total.to_le_bytes());
            }
        }

        let end = buf.len() - CHECKSUM_LEN;
        let sum = checksum(&buf[self.format.header_len()..end]);
        buf[end..].copy_from_slice(&sum.to_le_bytes());

        Block {
            data: buf,
            format: self.format,
        }
    }
}
