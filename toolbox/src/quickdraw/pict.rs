//! `PICT` v2 opcode stream interpreter and emitter.
//!
//! The decoder is a finite-state walk over a closed set of opcodes: drawing
//! commands with no raster effect (pen state, text, regions) are skipped by
//! their known fixed or length-prefixed size; the bitmap/pixmap blit opcodes
//! are decoded into the picture's [`Surface`]. `PICT` v1 is accepted on read
//! but never emitted -- the encoder always produces v2.

use libcommon::{Reader, Writer};

use super::color::ColorTable;
use super::packbits;
use super::pixmap::{self, PackType, PixMap};
use super::quicktime;
use super::surface::Surface;
use super::{Point, Rect};
use crate::resources::{Error, Result};

const OP_V1_VERSION: u16 = 0x1101;

/// Skips a region: `size u16` (itself included), an 8-byte bounding rect,
/// then whatever non-rectangular region data remains.
fn skip_region(reader: &mut Reader<'_>) -> Result<()> {
    let size = reader.read_short()?;
    let _rect = Rect::read(reader)?;
    let remaining = usize::from(size).saturating_sub(10);
    reader.read_bytes(remaining)?;
    Ok(())
}

fn scanline_len(reader: &mut Reader<'_>, row_bytes: u16) -> Result<usize> {
    Ok(if row_bytes > 250 { usize::from(reader.read_short()?) } else { usize::from(reader.read_byte()?) })
}

fn write_scanline_len(writer: &mut Writer, row_bytes: u16, len: usize) -> Result<()> {
    if row_bytes > 250 {
        writer.write_short(len as u16)?;
    } else {
        writer.write_byte(len as u8)?;
    }
    Ok(())
}

/// Fields shared by both the full `PixMap` and legacy 1-bit `BitMap` forms
/// of an indirect-bits plane header.
struct PlaneDescriptor {
    row_bytes: u16,
    bounds: Rect,
    palette: ColorTable,
    pixel_size: u16,
}

/// Peeks the top bit of the next word to tell a full `PixMap` descriptor
/// (bit set, row_bytes stored with `0x8000` on) from a legacy `BitMap`
/// (bit clear, implicit black/white two-entry color table).
fn read_indirect_bits_header(reader: &mut Reader<'_>) -> Result<PlaneDescriptor> {
    let peek = reader.read_short_at(0, libcommon::ReadMode::Peek)?;
    if peek & 0x8000 != 0 {
        let pix_map = PixMap::read(reader)?;
        let palette = if pix_map.pixel_size <= 8 { ColorTable::decode(reader)? } else { ColorTable::new() };
        Ok(PlaneDescriptor { row_bytes: pix_map.row_bytes, bounds: pix_map.bounds, palette, pixel_size: pix_map.pixel_size })
    } else {
        let row_bytes = reader.read_short()?;
        let bounds = Rect::read(reader)?;
        let palette = ColorTable::with_entries(vec![super::color::Color::rgba(0, 0, 0, 255), super::color::Color::rgba(255, 255, 255, 255)]);
        Ok(PlaneDescriptor { row_bytes, bounds, palette, pixel_size: 1 })
    }
}

fn read_indirect_bits(reader: &mut Reader<'_>, packed: bool, has_region: bool, frame_origin: Point, picture: &mut Surface) -> Result<()> {
    let PlaneDescriptor { row_bytes, bounds, palette, pixel_size } = read_indirect_bits_header(reader)?;
    let _source = Rect::read(reader)?;
    let dest = Rect::read(reader)?;
    let _transfer_mode = reader.read_short()?;
    if has_region {
        skip_region(reader)?;
    }

    let width = bounds.width().max(0) as u32;
    let height = bounds.height().max(0) as u32;
    let plane = if packed {
        let mut out = Vec::with_capacity(row_bytes as usize * height as usize);
        for _ in 0..height {
            let len = scanline_len(reader, row_bytes)?;
            let row = packbits::decompress(reader, 1, len)?;
            out.extend_from_slice(&row);
        }
        out
    } else {
        reader.read_bytes(row_bytes as usize * height as usize)?
    };

    let surface = pixmap::expand_indexed(&plane, row_bytes as usize, width, height, pixel_size, &palette, None)?;
    picture.blit(&surface, i32::from(dest.left) - i32::from(frame_origin.x), i32::from(dest.top) - i32::from(frame_origin.y));
    Ok(())
}

fn read_direct_bits(reader: &mut Reader<'_>, has_region: bool, frame_origin: Point, picture: &mut Surface) -> Result<()> {
    // Unlike the indirect-bits pixmap, direct bits carries its base_address
    // on disk (it is never omitted the way the handle form is).
    let _base_address = reader.read_long()?;
    let pix_map = PixMap::read(reader)?;
    let _source = Rect::read(reader)?;
    let dest = Rect::read(reader)?;
    let _transfer_mode = reader.read_short()?;
    if has_region {
        skip_region(reader)?;
    }

    let width = pix_map.width();
    let height = pix_map.height();
    let mut surface = Surface::new(width, height);

    match pix_map.pack_type {
        PackType::None | PackType::Argb => {
            for y in 0..height {
                for x in 0..width {
                    let a = reader.read_byte()?;
                    let r = reader.read_byte()?;
                    let g = reader.read_byte()?;
                    let b = reader.read_byte()?;
                    surface.set(x, y, super::color::Color { r, g, b, a });
                }
            }
        }
        PackType::Rgb => {
            for y in 0..height {
                for x in 0..width {
                    let r = reader.read_byte()?;
                    let g = reader.read_byte()?;
                    let b = reader.read_byte()?;
                    surface.set(x, y, super::color::Color::rgba(r, g, b, 0xFF));
                }
            }
        }
        PackType::PackBitsWord => {
            for y in 0..height {
                let row: Vec<u8> = if pix_map.row_bytes >= 8 {
                    let len = scanline_len(reader, pix_map.row_bytes)?;
                    packbits::decompress(reader, 2, len)?
                } else {
                    reader.read_bytes(pix_map.row_bytes as usize)?
                };
                for x in 0..width {
                    let word = u16::from_be_bytes([row[(x as usize) * 2], row[(x as usize) * 2 + 1]]);
                    surface.set(x, y, super::color::Color::from_rgb555(word));
                }
            }
        }
        PackType::PackBitsComponent => {
            let components = usize::from(pix_map.component_count).max(3);
            for y in 0..height {
                let len = scanline_len(reader, pix_map.row_bytes)?;
                let planes = packbits::decompress(reader, 1, len)?;
                let plane_width = width as usize;
                for x in 0..width {
                    let (a, r, g, b) = if components == 4 {
                        (planes[x as usize], planes[plane_width + x as usize], planes[2 * plane_width + x as usize], planes[3 * plane_width + x as usize])
                    } else {
                        (0xFF, planes[x as usize], planes[plane_width + x as usize], planes[2 * plane_width + x as usize])
                    };
                    surface.set(x, y, super::color::Color { r, g, b, a });
                }
            }
        }
    }

    picture.blit(&surface, i32::from(dest.left) - i32::from(frame_origin.x), i32::from(dest.top) - i32::from(frame_origin.y));
    Ok(())
}

struct ExtHeader {
    frame: Rect,
}

fn read_ext_header(reader: &mut Reader<'_>, frame: Rect) -> Result<ExtHeader> {
    let marker = reader.read_long()?;
    let (h_ratio_num, h_ratio_den, v_ratio_num, v_ratio_den, optimal) = if marker >> 16 == 0xFFFE {
        let _reserved0 = reader.read_long()?;
        let _reserved1 = reader.read_long()?;
        let optimal = Rect::read(reader)?;
        (f64::from(frame.width()), f64::from(optimal.width()), f64::from(frame.height()), f64::from(optimal.height()), optimal)
    } else {
        let top = f64::from(marker as i32) / 65536.0;
        let left = reader.read_fixed_point()?;
        let bottom = reader.read_fixed_point()?;
        let right = reader.read_fixed_point()?;
        let w = right - left;
        let h = bottom - top;
        (f64::from(frame.width()), w, f64::from(frame.height()), h, Rect::of_size(w as i32, h as i32))
    };
    if h_ratio_den <= 0.0 || v_ratio_den <= 0.0 || h_ratio_num <= 0.0 || v_ratio_num <= 0.0 {
        return Err(Error::MalformedResourceFile("PICT header dpi ratio must be positive".into()));
    }
    Ok(ExtHeader { frame: optimal })
}

/// Decodes a `PICT` resource's drawing opcodes into a fully-composited
/// surface sized to the picture's frame.
pub fn decode(reader: &mut Reader<'_>) -> Result<Surface> {
    let _pic_size = reader.read_short()?;
    let mut frame = Rect::read(reader)?;

    let is_v1 = reader.read_short_at(0, libcommon::ReadMode::Peek)? == OP_V1_VERSION;
    if is_v1 {
        let _version_op = reader.read_short()?;
        return decode_v1(reader, frame);
    }

    let version_marker = reader.read_long()?;
    if version_marker != 0x0011_02FF {
        return Err(Error::MalformedResourceFile("expected PICT v2 version marker".into()));
    }
    let header_op = reader.read_short()?;
    if header_op != 0x0C00 {
        return Err(Error::MalformedResourceFile("expected PICT v2 extended header opcode".into()));
    }
    frame = read_ext_header(reader, frame)?.frame;

    let mut surface = Surface::new(frame.width().max(0) as u32, frame.height().max(0) as u32);
    let origin = Point::new(frame.left, frame.top);
    let mut current_origin = origin;

    loop {
        if reader.position() % 2 != 0 {
            reader.read_byte()?;
        }
        if reader.eof() {
            break;
        }
        let opcode = reader.read_short()?;
        match opcode {
            0x0000 | 0x0C00 | 0x001C | 0x001E => {}
            0x00FF => break,
            0x0001 | 0x0050..=0x0054 => skip_region(reader)?,
            0x000C => {
                let point = Point::read(reader)?;
                current_origin = Point::new(current_origin.x + point.x, current_origin.y + point.y);
            }
            0x001A | 0x001B | 0x001D | 0x001F => {
                reader.read_bytes(6)?;
            }
            0x0007 => {
                reader.read_bytes(4)?;
            }
            0x0008 => {
                reader.read_bytes(2)?;
            }
            0x0009 | 0x000A => {
                reader.read_bytes(8)?;
            }
            0x0020 => {
                reader.read_bytes(8)?;
            }
            0x0021 => {
                reader.read_bytes(4)?;
            }
            0x0022 => {
                reader.read_bytes(6)?;
            }
            0x0023 => {
                reader.read_bytes(2)?;
            }
            0x0030..=0x0034 => {
                reader.read_bytes(8)?;
            }
            0x0035..=0x0039 => {}
            0x00A0 => {
                reader.read_bytes(2)?;
            }
            0x00A1 => {
                let _kind = reader.read_short()?;
                let size = reader.read_short()?;
                reader.read_bytes(usize::from(size))?;
            }
            0x0090 => read_indirect_bits(reader, false, false, current_origin, &mut surface)?,
            0x0098 => read_indirect_bits(reader, true, false, current_origin, &mut surface)?,
            0x0091 => read_indirect_bits(reader, false, true, current_origin, &mut surface)?,
            0x0099 => read_indirect_bits(reader, true, true, current_origin, &mut surface)?,
            0x009A => read_direct_bits(reader, false, current_origin, &mut surface)?,
            0x009B => read_direct_bits(reader, true, current_origin, &mut surface)?,
            0x8200 => {
                let blit = quicktime::decode_compressed_pict_op(reader)?;
                surface.blit(&blit, 0, 0);
            }
            0x8201 => {
                let _version = reader.read_short()?;
                let matte_size = reader.read_long()?;
                if matte_size > 0 {
                    let _matte_rect = Rect::read(reader)?;
                    reader.read_bytes(matte_size as usize)?;
                }
                let blit = decode(reader)?;
                surface.blit(&blit, 0, 0);
            }
            _ => return Err(Error::UnsupportedOpcode(opcode)),
        }
    }

    Ok(surface)
}

/// A pragmatic subset of `PICT` v1: 1-byte opcodes, no word alignment.
/// Covers the region/bits/end-of-picture opcodes that are byte-identical
/// between v1 and v2; anything else is a fatal [`Error::UnsupportedOpcode`].
fn decode_v1(reader: &mut Reader<'_>, frame: Rect) -> Result<Surface> {
    let mut surface = Surface::new(frame.width().max(0) as u32, frame.height().max(0) as u32);
    let origin = Point::new(frame.left, frame.top);
    loop {
        if reader.eof() {
            break;
        }
        let opcode = reader.read_byte()?;
        match opcode {
            0x00 => {}
            0xFF => break,
            0x01 => skip_region(reader)?,
            0x90 => read_indirect_bits(reader, false, false, origin, &mut surface)?,
            0x98 => read_indirect_bits(reader, true, false, origin, &mut surface)?,
            _ => return Err(Error::UnsupportedOpcode(u16::from(opcode))),
        }
    }
    Ok(surface)
}

fn pad_to_even(writer: &mut Writer) -> Result<()> {
    if writer.position() % 2 != 0 {
        writer.write_byte(0)?;
    }
    Ok(())
}

/// Encodes a surface as a v2 `PICT`: extended header, `def_hilite`,
/// `clip_region` set to the frame, a single `direct_bits_rect` packed with
/// `packbits_component`, and a trailing `eof`.
pub fn encode(surface: &Surface, with_alpha: bool) -> Result<Vec<u8>> {
    let mut writer = Writer::new(libcommon::ByteOrder::Big);
    let frame = Rect::of_size(surface.width() as i32, surface.height() as i32);

    writer.write_short(0)?; // pic size, unknown up front
    frame.write(&mut writer)?;
    writer.write_long(0x0011_02FF)?;
    writer.write_short(0x0C00)?;
    writer.write_long(0xFFFE_0000u32)?;
    writer.write_long(0)?;
    writer.write_long(0)?;
    frame.write(&mut writer)?;

    writer.write_short(0x001E)?; // def_hilite
    writer.write_short(0x0001)?; // clip_region = frame
    writer.write_short(10)?;
    frame.write(&mut writer)?;

    writer.write_short(0x009A)?; // direct_bits_rect
    let component_count: u16 = if with_alpha { 4 } else { 3 };
    let pix_map = PixMap {
        row_bytes: (surface.width() * component_count as u32) as u16,
        bounds: frame,
        pack_type: PackType::PackBitsComponent,
        pack_size: 0,
        h_res: 72.0,
        v_res: 72.0,
        pixel_type: 16,
        pixel_size: if with_alpha { 32 } else { 24 },
        component_count,
        component_size: 8,
        pixel_format: 0,
    };
    writer.write_long(0)?; // base_address, meaningless off-disk
    pix_map.write(&mut writer)?;
    frame.write(&mut writer)?; // source
    frame.write(&mut writer)?; // dest
    writer.write_short(0)?; // transfer mode

    let width = surface.width() as usize;
    for y in 0..surface.height() {
        let mut planes = vec![0u8; width * component_count as usize];
        for x in 0..surface.width() {
            let color = surface.at(x, y);
            if with_alpha {
                planes[x as usize] = color.a;
                planes[width + x as usize] = color.r;
                planes[2 * width + x as usize] = color.g;
                planes[3 * width + x as usize] = color.b;
            } else {
                planes[x as usize] = color.r;
                planes[width + x as usize] = color.g;
                planes[2 * width + x as usize] = color.b;
            }
        }
        let compressed = packbits::compress(&planes, 1);
        write_scanline_len(&mut writer, pix_map.row_bytes, compressed.len())?;
        writer.write_raw(&compressed)?;
    }

    pad_to_even(&mut writer)?;
    writer.write_short(0x00FF)?; // eof

    let mut block = writer.into_block();
    let size = block.len() as u16;
    let mut header_writer = Writer::new(libcommon::ByteOrder::Big);
    header_writer.write_short(size)?;
    let header = header_writer.into_block();
    block.as_mut_slice()[0..2].copy_from_slice(header.as_slice());
    Ok(block.as_slice().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcommon::Block;

    #[test]
    fn uniform_color_round_trips_through_encode_decode() {
        let color = super::super::color::Color::rgba(128, 64, 32, 255);
        let surface = Surface::filled(4, 4, color);
        let bytes = encode(&surface, false).unwrap();
        let block = Block::from_vec(bytes, libcommon::ByteOrder::Big);
        let mut reader = Reader::new(&block);
        let decoded = decode(&mut reader).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 4);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(decoded.at(x, y).rgb(), (128, 64, 32));
            }
        }
    }
}
