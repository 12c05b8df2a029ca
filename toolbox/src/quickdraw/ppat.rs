//! `ppat` (color pattern): a `PixMap` whose pixel plane and trailing `clut`
//! are addressed by absolute byte offsets within the resource, rather than
//! immediately following one another. Only `pat_type == 1` (pixmap-based
//! patterns) is represented; the older 8-byte monochrome `Pattern` form and
//! the RGB variant are not emitted by any encoder we model this on.

use libcommon::{Reader, Writer};

use super::color::ColorTable;
use super::pixmap::{self, PixMap};
use super::Rect;
use crate::resources::{Error, Result};

const PAT_TYPE_PIXMAP: u16 = 1;

/// Pixel-based pattern header size up to and including `pat_base_addr`,
/// followed by the 18-byte legacy monochrome-pattern placeholder the
/// reference encoder writes ahead of the `PixMap` descriptor.
const PIXMAP_BASE_ADDR: u32 = 28;
const PIXMAP_DESCRIPTOR_SIZE: u32 = 50;

fn bpp_for_color_count(count: usize) -> u16 {
    if count > 16 {
        8
    } else if count > 4 {
        4
    } else if count > 2 {
        2
    } else {
        1
    }
}

/// Decodes a `ppat` resource body into its tiled pattern surface. Offsets
/// are absolute positions within the resource, so the reader's cursor jumps
/// around rather than advancing monotonically.
pub fn decode(reader: &mut Reader<'_>) -> Result<super::Surface> {
    let pat_type = reader.read_short()?;
    if pat_type != PAT_TYPE_PIXMAP {
        return Err(Error::UnsupportedPatternType(pat_type));
    }

    let pmap_base_addr = reader.read_long()?;
    let pat_base_addr = reader.read_long()?;

    reader.set_position(pmap_base_addr as usize)?;
    let _pixmap_base_address = reader.read_long()?;
    let (pixmap, table_offset) = PixMap::read_with_table_offset(reader)?;

    reader.set_position(pat_base_addr as usize)?;
    let pmap_data_size = usize::from(pixmap.row_bytes) * pixmap.height() as usize;
    let pmap_data = reader.read_bytes(pmap_data_size)?;

    reader.set_position(table_offset as usize)?;
    let clut = ColorTable::decode(reader)?;

    pixmap::expand_indexed(
        &pmap_data,
        usize::from(pixmap.row_bytes),
        pixmap.width(),
        pixmap.height(),
        pixmap.pixel_size,
        &clut,
        None,
    )
}

/// Encodes a surface as a pixmap-based `ppat`, brute-force-reducing color
/// depth until the rebuilt palette fits under 256 entries.
pub fn encode(surface: &super::Surface) -> Result<Vec<u8>> {
    let width = surface.width();
    let height = surface.height();

    let mut reduced = surface.clone();
    let mut clut = ColorTable::new();
    let mut color_values = Vec::new();
    let mut pass: u32 = 0;
    loop {
        if pass > 0 {
            for y in 0..height {
                for x in 0..width {
                    let c = reduced.at(x, y);
                    let bit = 1u8 << pass.min(7);
                    reduced.set(x, y, super::Color::rgba(c.r & !bit, c.g & !bit, c.b & !bit, c.a));
                }
            }
        }
        pass += 1;

        clut = ColorTable::new();
        color_values.clear();
        for y in 0..height {
            for x in 0..width {
                color_values.push(clut.set(reduced.at(x, y)));
            }
        }
        if clut.len() < 256 || pass > 7 {
            break;
        }
    }
    if clut.len() > 256 {
        return Err(Error::FormatOverflow { format: "ppat clut", value: clut.len() as i64 });
    }

    let bpp = bpp_for_color_count(clut.len());
    let pmap_data = pixmap::build_pixel_data(&color_values, width, height, bpp);
    let row_bytes = pixmap::row_bytes_for(width, bpp);

    let pat_base_addr = PIXMAP_BASE_ADDR + PIXMAP_DESCRIPTOR_SIZE;
    let table_offset = pat_base_addr + pmap_data.len() as u32;

    let pixmap = PixMap {
        row_bytes: row_bytes as u16,
        bounds: Rect::of_size(width as i32, height as i32),
        pack_type: pixmap::PackType::None,
        pack_size: 0,
        h_res: 72.0,
        v_res: 72.0,
        pixel_type: 0,
        pixel_size: bpp,
        component_count: 1,
        component_size: bpp,
        pixel_format: 0,
    };

    let mut writer = Writer::new(libcommon::ByteOrder::Big);
    writer.write_short(PAT_TYPE_PIXMAP)?;
    writer.write_long(PIXMAP_BASE_ADDR)?;
    writer.write_long(pat_base_addr)?;
    // Legacy 8-byte monochrome `Pattern` placeholder, padded to match the
    // reference encoder's fixed 18-byte gap before the PixMap descriptor.
    writer.write_long(0)?;
    writer.write_short(0)?;
    writer.write_long(0)?;
    writer.write_quad(0)?;
    writer.write_long(0)?; // pixmap base_address placeholder
    pixmap.write_with_table_offset(&mut writer, table_offset)?;
    writer.write_raw(&pmap_data)?;
    clut.encode(&mut writer)?;

    Ok(writer.into_block().as_slice().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quickdraw::Color;

    #[test]
    fn two_color_checkerboard_round_trips_through_encode_decode() {
        let mut surface = super::super::Surface::new(2, 2);
        surface.set(0, 0, Color::rgba(255, 0, 0, 255));
        surface.set(1, 0, Color::rgba(0, 0, 255, 255));
        surface.set(0, 1, Color::rgba(0, 0, 255, 255));
        surface.set(1, 1, Color::rgba(255, 0, 0, 255));

        let encoded = encode(&surface).unwrap();
        let block = libcommon::Block::from_vec(encoded, libcommon::ByteOrder::Big);
        let mut reader = Reader::new(&block);
        let decoded = decode(&mut reader).unwrap();

        assert_eq!(decoded.width(), 2);
        assert_eq!(decoded.height(), 2);
        assert_eq!(decoded.at(0, 0), Color::rgba(255, 0, 0, 255));
        assert_eq!(decoded.at(1, 0), Color::rgba(0, 0, 255, 255));
        assert_eq!(decoded.at(0, 1), Color::rgba(0, 0, 255, 255));
        assert_eq!(decoded.at(1, 1), Color::rgba(255, 0, 0, 255));
    }

    #[test]
    fn unsupported_pattern_type_is_rejected() {
        let mut writer = Writer::new(libcommon::ByteOrder::Big);
        writer.write_short(2).unwrap();
        writer.write_long(0).unwrap();
        writer.write_long(0).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        assert!(matches!(decode(&mut reader), Err(Error::UnsupportedPatternType(2))));
    }
}
