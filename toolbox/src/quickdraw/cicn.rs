//! `cicn` (color icon): an indexed [`PixMap`] plus a 1-bit mask plane and a
//! 1-bit legacy fallback icon, decoded together into one [`Surface`].
//!
//! The fallback `ICON`-style bitmap plane is read but carries no information
//! that a BGRA surface can represent and is discarded; only the mask and the
//! color pixel plane feed the decoded image.

use libcommon::{Reader, Writer};

use super::color::ColorTable;
use super::pixmap::{self, PixMap};
use super::surface::Surface;
use super::Rect;
use crate::resources::{Error, Result};

/// Component `(size, count)` pairs `cicn` is known to carry, and the
/// effective bits-per-pixel each unpacks to.
fn effective_bpp(component_size: u16, component_count: u16) -> Option<u16> {
    match (component_size, component_count) {
        (1, 1) => Some(1),
        (1, 2) | (2, 1) => Some(2),
        (1, 4) | (4, 1) => Some(4),
        (1, 8) | (8, 1) => Some(8),
        _ => None,
    }
}

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

/// Decodes a `cicn` resource body into its color surface. The base address
/// placeholder, mask/fallback-icon base addresses and the trailing
/// handle/reserved field are all disk artefacts of a loaded `Handle` and
/// carry no information here; they are read and discarded.
pub fn decode(reader: &mut Reader<'_>) -> Result<Surface> {
    let _pixmap_base_addr = reader.read_long()?;
    let pixmap = PixMap::read(reader)?;

    let _mask_base_addr = reader.read_long()?;
    let mask_row_bytes = usize::from(reader.read_short()?);
    let mask_bounds = Rect::read(reader)?;

    let _bmap_base_addr = reader.read_long()?;
    let bmap_row_bytes = usize::from(reader.read_short()?);
    let bmap_bounds = Rect::read(reader)?;

    reader.read_bytes(4)?; // icon data handle, reserved

    let mask_data_size = mask_row_bytes * mask_bounds.height().max(0) as usize;
    let bmap_data_size = bmap_row_bytes * bmap_bounds.height().max(0) as usize;
    let pmap_data_size = usize::from(pixmap.row_bytes) * pixmap.bounds.height().max(0) as usize;

    let mask_data = reader.read_bytes(mask_data_size)?;
    let _bmap_data = reader.read_bytes(bmap_data_size)?;
    let clut = ColorTable::decode(reader)?;
    let pmap_data = reader.read_bytes(pmap_data_size)?;

    let bpp = effective_bpp(pixmap.component_size, pixmap.component_count).ok_or(Error::UnsupportedPixelConfig {
        component_size: pixmap.component_size,
        component_count: pixmap.component_count,
    })?;

    pixmap::expand_indexed(
        &pmap_data,
        usize::from(pixmap.row_bytes),
        pixmap.width(),
        pixmap.height(),
        bpp,
        &clut,
        Some((&mask_data, mask_row_bytes)),
    )
}

/// Encodes a surface as a `cicn`, brute-force-reducing color depth (masking
/// off successively more low bits per channel) until the rebuilt palette
/// fits in 256 entries, matching the reference encoder's iterative approach.
pub fn encode(surface: &Surface) -> Result<Vec<u8>> {
    let width = surface.width();
    let height = surface.height();

    let mut reduced = surface.clone();
    let mut clut = ColorTable::new();
    let mut color_values = Vec::new();
    let mut mask_values = Vec::new();
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
        mask_values.clear();
        for y in 0..height {
            for x in 0..width {
                let c = reduced.at(x, y);
                mask_values.push(c.a & 0x80 != 0);
                color_values.push(clut.set(c));
            }
        }
        if clut.len() <= 256 || pass > 7 {
            break;
        }
    }

    let mask_row_bytes = (width.max(1) as usize - 1) / 8 + 1;
    let bmap_row_bytes = mask_row_bytes;

    let mut mask_data = Vec::with_capacity(mask_row_bytes * height as usize);
    for y in 0..height {
        let mut scratch = 0u8;
        for x in 0..width {
            let bit_offset = x % 8;
            if bit_offset == 0 && x != 0 {
                mask_data.push(scratch);
                scratch = 0;
            }
            let value: u8 = if mask_values[(y * width + x) as usize] { 1 } else { 0 };
            scratch |= value << (7 - bit_offset);
        }
        mask_data.push(scratch);
    }
    let bmap_data = vec![0u8; bmap_row_bytes * height as usize];

    let bpp = bpp_for_color_count(clut.len());
    let pmap_data = pixmap::build_pixel_data(&color_values, width, height, bpp);
    let row_bytes = pixmap::row_bytes_for(width, bpp);

    let bounds = Rect::of_size(width as i32, height as i32);
    let pixmap = PixMap {
        row_bytes: row_bytes as u16,
        bounds,
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

    let mask_base_addr = 4u32;
    let bmap_base_addr = mask_base_addr + mask_data.len() as u32;

    let mut writer = Writer::new(libcommon::ByteOrder::Big);
    writer.write_long(0)?; // base_address placeholder
    pixmap.write(&mut writer)?;
    writer.write_long(mask_base_addr)?;
    writer.write_short(mask_row_bytes as u16)?;
    bounds.write(&mut writer)?;
    writer.write_long(bmap_base_addr)?;
    writer.write_short(bmap_row_bytes as u16)?;
    bounds.write(&mut writer)?;
    writer.write_long(0)?; // icon data handle / reserved
    writer.write_raw(&mask_data)?;
    writer.write_raw(&bmap_data)?;
    clut.encode(&mut writer)?;
    writer.write_raw(&pmap_data)?;

    Ok(writer.into_block().as_slice().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quickdraw::Color;

    #[test]
    fn four_color_icon_round_trips_through_encode_decode() {
        let colors = [
            Color::rgba(255, 0, 0, 255),
            Color::rgba(0, 255, 0, 255),
            Color::rgba(0, 0, 255, 255),
            Color::rgba(255, 255, 0, 0),
        ];
        let mut surface = Surface::new(4, 1);
        for (x, &c) in colors.iter().enumerate() {
            surface.set(x as u32, 0, c);
        }

        let encoded = encode(&surface).unwrap();
        let block = libcommon::Block::from_vec(encoded, libcommon::ByteOrder::Big);
        let mut reader = Reader::new(&block);
        let decoded = decode(&mut reader).unwrap();

        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 1);
        for (x, &c) in colors.iter().enumerate() {
            let got = decoded.at(x as u32, 0);
            if c.a & 0x80 == 0 {
                assert_eq!(got.a, 0);
            } else {
                assert_eq!((got.r, got.g, got.b), (c.r, c.g, c.b));
            }
        }
    }

    #[test]
    fn unsupported_component_configuration_is_rejected() {
        let mut writer = Writer::new(libcommon::ByteOrder::Big);
        writer.write_long(0).unwrap();
        let pixmap = PixMap {
            row_bytes: 1,
            bounds: Rect::of_size(1, 1),
            pack_type: pixmap::PackType::None,
            pack_size: 0,
            h_res: 72.0,
            v_res: 72.0,
            pixel_type: 0,
            pixel_size: 3,
            component_count: 3,
            component_size: 3,
            pixel_format: 0,
        };
        pixmap.write(&mut writer).unwrap();
        writer.write_long(0).unwrap();
        writer.write_short(1).unwrap();
        Rect::of_size(1, 1).write(&mut writer).unwrap();
        writer.write_long(0).unwrap();
        writer.write_short(1).unwrap();
        Rect::of_size(1, 1).write(&mut writer).unwrap();
        writer.write_long(0).unwrap();
        writer.write_raw(&[0u8]).unwrap(); // mask data
        writer.write_raw(&[0u8]).unwrap(); // bmap data
        ColorTable::with_entries(vec![Color::rgba(0, 0, 0, 255)]).encode(&mut writer).unwrap();
        writer.write_raw(&[0u8]).unwrap(); // pmap data

        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        assert!(matches!(decode(&mut reader), Err(Error::UnsupportedPixelConfig { .. })));
    }
}
