//! Slicing the combined boot image into per-stage blocks

use std::io::{self, Read, Seek, SeekFrom};

use crate::block::{Block, Framer};
use crate::profile::Region;

/// Read one region from the boot image and frame it
///
/// The region bytes are read straight into a staging buffer behind the header
/// space, so the payload is never copied twice.
pub fn read_region<R: Read + Seek>(
    image: &mut R,
    region: &Region,
    framer: &Framer,
) -> io::Result<Block> {
    let len = region.size() as usize;
    let mut buf = framer.staging_buffer(len);
    let off = framer.payload_offset();

    image.seek(SeekFrom::Start(u64::from(region.start)))?;
    image.read_exact(&mut buf[off..off + len]).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "boot image ends before region {} (0x{:X}-0x{:X})",
                    region.label, region.start, region.end
                ),
            )
        } else {
            e
        }
    })?;

    Ok(framer.frame_in_place(buf))
}

/// Frame every region of `regions` in table order
pub fn slice_regions<R: Read + Seek>(
    image: &mut R,
    regions: &[Region],
    framer: &Framer,
) -> io::Result<Vec<Block>> {
    regions
        .iter()
        .map(|region| read_region(image, region, framer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileRegistry;
    use std::io::Cursor;

    fn image(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i ^ (i >> 8)) as u8).collect()
    }

    #[test]
    fn test_exynos9830_block_count() {
        let registry = ProfileRegistry::builtin().unwrap();
        let profile = registry.lookup("Exynos9830\0").unwrap();
        let framer = Framer::new(profile.header);

        let mut cursor = Cursor::new(image(0x39B000));
        let blocks = slice_regions(&mut cursor, &profile.regions, &framer).unwrap();

        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[0].payload().len(), 0x3000);
        assert_eq!(blocks[0].len(), 0x3000 + 10);
        assert_eq!(blocks[4].payload().len(), 0x40000);
    }

    #[test]
    fn test_slicing_is_idempotent() {
        let registry = ProfileRegistry::builtin().unwrap();
        let profile = registry.lookup("Exynos9830\0").unwrap();
        let framer = Framer::new(profile.header);
        let mut cursor = Cursor::new(image(0x39B000));

        let first = slice_regions(&mut cursor, &profile.regions, &framer).unwrap();
        let second = slice_regions(&mut cursor, &profile.regions, &framer).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_region_payload_matches_image() {
        let data = image(0x100);
        let framer = Framer::default();
        let region = Region::new("mid", 0x10, 0x30);

        let block = read_region(&mut Cursor::new(&data), &region, &framer).unwrap();
        assert_eq!(block.payload(), &data[0x10..0x30]);
    }

    #[test]
    fn test_region_past_end_fails() {
        let framer = Framer::default();
        let region = Region::new("lk.bin", 0x80, 0x200);

        let err = read_region(&mut Cursor::new(image(0x100)), &region, &framer).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(err.to_string().contains("lk.bin"));
    }
}
