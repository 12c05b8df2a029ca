//! QuickTime `image_description` parsing and the handful of video
//! sub-codecs that turn up inside `PICT`'s `compressed_quicktime` opcode
//! and in standalone compressed-image resources: the `rle ` animation
//! codec, `8BPS` planar Photoshop-style compression, uncompressed `raw `,
//! and `qdrw` (a nested `PICT`).

use libcommon::{Block, ByteOrder, Reader};

use super::color::{Color, ColorTable};
use super::packbits;
use super::pict;
use super::pixmap;
use super::surface::Surface;
use crate::resources::{Error, OsType, OsTypeReadExt, Result};

const CHCT_ATOM: u32 = u32::from_be_bytes(*b"chct");

/// The fixed 86-byte `ImageDescription` header that precedes every
/// QuickTime compressed sample.
#[derive(Clone, Debug)]
pub struct ImageDescription {
    pub compressor: OsType,
    pub version: u32,
    pub width: u16,
    pub height: u16,
    pub data_size: u32,
    /// Bit depth after stripping the grayscale marker (values above 32
    /// denote a grayscale image at `depth - 32`).
    pub depth: u16,
    pub grayscale: bool,
    /// `0` means an inline `clut` immediately follows this header in the
    /// stream; a positive value names a `clut` resource to resolve externally.
    pub clut_id: i16,
}

impl ImageDescription {
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        let _length = reader.read_signed_long()?;
        let compressor = reader.read_os_type()?;
        reader.read_bytes(8)?;
        let version = reader.read_long()?;
        reader.read_bytes(12)?;
        let width = reader.read_short()?;
        let height = reader.read_short()?;
        reader.read_bytes(8)?;
        let data_size = reader.read_long()?;
        reader.read_bytes(34)?;
        let raw_depth = reader.read_short()?;
        let (depth, grayscale) = if raw_depth > 32 { (raw_depth - 32, true) } else { (raw_depth, false) };
        let clut_id = reader.read_signed_short()?;
        Ok(Self { compressor, version, width, height, data_size, depth, grayscale, clut_id })
    }
}

/// Decodes a compressed sample against its description, dispatching on the
/// compressor's four-character code. `clut` supplies the palette for
/// indexed compressors when the description carries no inline table.
pub fn decode_image_description(desc: &ImageDescription, data: &[u8], clut: Option<&ColorTable>) -> Result<Surface> {
    match desc.compressor.as_bytes() {
        b"rle " => decode_rle(desc, data, clut),
        b"8BPS" => decode_8bps(desc, data, clut),
        b"raw " => decode_raw(desc, data, clut),
        b"qdrw" => {
            let block = Block::from_vec(data.to_vec(), ByteOrder::Big);
            let mut reader = Reader::new(&block);
            pict::decode(&mut reader)
        }
        _ => Err(Error::UnsupportedCompressor(desc.compressor)),
    }
}

/// The `compressed_quicktime` `PICT` opcode: a matte/mask/accuracy prelude
/// around one embedded `ImageDescription`, its optional inline `clut`, and
/// the compressed sample itself.
pub fn decode_compressed_pict_op(reader: &mut Reader<'_>) -> Result<Surface> {
    let size = reader.read_long()? as usize;
    let start = reader.position();
    let _version = reader.read_short()?;
    let matte_size = reader.read_long()? as usize;
    let _matte_rect = super::Rect::read(reader)?;
    let _mode = reader.read_short()?;
    let _src_rect = super::Rect::read(reader)?;
    let _accuracy = reader.read_long()?;
    let mask_size = reader.read_long()? as usize;
    if matte_size > 0 {
        reader.read_bytes(matte_size)?;
    }

    let desc = ImageDescription::read(reader)?;
    let inline_clut = if desc.clut_id == 0 { Some(ColorTable::decode(reader)?) } else { None };

    let consumed = reader.position() - start;
    let data_len = size.saturating_sub(consumed).saturating_sub(mask_size);
    let data = reader.read_bytes(data_len)?;
    if mask_size > 0 {
        reader.read_bytes(mask_size)?;
    }

    decode_image_description(&desc, &data, inline_clut.as_ref())
}

fn read_pixel(reader: &mut Reader<'_>, depth: u16, clut: Option<&ColorTable>) -> Result<Color> {
    match depth {
        8 => {
            let index = reader.read_byte()?;
            Ok(clut.and_then(|c| c.at(u16::from(index))).unwrap_or_default())
        }
        16 => Ok(Color::from_rgb555(reader.read_short()?)),
        24 => {
            let bytes = reader.read_bytes(3)?;
            Ok(Color::rgba(bytes[0], bytes[1], bytes[2], 0xFF))
        }
        32 => {
            let a = reader.read_byte()?;
            let r = reader.read_byte()?;
            let g = reader.read_byte()?;
            let b = reader.read_byte()?;
            Ok(Color { r, g, b, a })
        }
        other => Err(Error::UnsupportedPixelConfig { component_size: other, component_count: 1 }),
    }
}

/// Apple's "Animation" codec. A `chunk_size`/`header` prelude (the header's
/// `0x0008` bit carries an explicit starting row), then a skip/code opcode
/// stream: a zero skip byte ends the frame; a signed code byte of `0` ends
/// the current skip/code pair and returns to reading another skip byte,
/// `-1` advances to the next scanline, `>0` is a literal run (`4x` for 8-bit
/// indices, `x` words/triples/quads at wider depths), and `<0` repeats one
/// pixel `-x` times.
fn decode_rle(desc: &ImageDescription, data: &[u8], clut: Option<&ColorTable>) -> Result<Surface> {
    let width = u32::from(desc.width);
    let height = u32::from(desc.height);
    let mut surface = Surface::new(width, height);
    let block = Block::from_vec(data.to_vec(), ByteOrder::Big);
    let mut reader = Reader::new(&block);

    let _chunk_size = reader.read_long()?;
    let header = reader.read_short()?;
    let mut y: i32 = 0;
    if header & 0x0008 != 0 {
        y = i32::from(reader.read_signed_short()?);
        reader.read_bytes(6)?;
    }

    'outer: loop {
        if reader.eof() {
            break;
        }
        let skip = reader.read_byte()?;
        if skip == 0 {
            break;
        }
        let mut x = i32::from(skip) - 1;

        loop {
            if reader.eof() {
                break 'outer;
            }
            let code = reader.read_signed_byte()?;
            if code == 0 {
                break;
            } else if code == -1 {
                x = 0;
                y += 1;
            } else if code > 0 {
                let count = match desc.depth {
                    8 => 4 * u32::from(code as u8),
                    16 | 24 | 32 => u32::from(code as u8),
                    other => return Err(Error::UnsupportedPixelConfig { component_size: other, component_count: 1 }),
                };
                for _ in 0..count {
                    let color = read_pixel(&mut reader, desc.depth, clut)?;
                    set_if_in_bounds(&mut surface, x, y, width, height, color);
                    x += 1;
                }
            } else {
                let color = read_pixel(&mut reader, desc.depth, clut)?;
                let run = u32::from((-code) as u8);
                for _ in 0..run {
                    set_if_in_bounds(&mut surface, x, y, width, height, color);
                    x += 1;
                }
            }
        }
    }
    Ok(surface)
}

fn set_if_in_bounds(surface: &mut Surface, x: i32, y: i32, width: u32, height: u32, color: Color) {
    if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
        surface.set(x as u32, y as u32, color);
    }
}

/// Planar `8BPS`: a leading run of fixed 10-byte `(atom_size, atom_type,
/// atom_value)` triples (a `chct` atom's value gives the channel count),
/// then either raw `row_bytes * height` bytes per channel (`version == 0`)
/// or, for every channel, `height` PackBits-compressed scanlines whose
/// byte-lengths are all pre-stored as one `height * channel_count` array
/// ahead of the compressed data itself.
fn decode_8bps(desc: &ImageDescription, data: &[u8], clut: Option<&ColorTable>) -> Result<Surface> {
    let width = u32::from(desc.width);
    let height = u32::from(desc.height);
    let block = Block::from_vec(data.to_vec(), ByteOrder::Big);
    let mut reader = Reader::new(&block);

    let mut channel_count = default_channel_count(desc.depth)?;
    while reader.bytes_left() >= 10 {
        reader.save_position();
        let atom_size = reader.read_long()?;
        if atom_size != 10 {
            reader.restore_position()?;
            break;
        }
        let atom_type = reader.read_long()?;
        let atom_value = reader.read_short()?;
        if atom_type == CHCT_ATOM {
            channel_count = usize::from(atom_value);
        }
    }

    // At 1 bpp a "channel" is a packed bit row, not one byte per pixel; every
    // other depth here stores one byte per pixel per channel.
    let on_disk_row_bytes = if desc.depth == 1 { ((width + 7) / 8) as usize } else { width as usize };

    let mut planes = vec![vec![0u8; (width * height) as usize]; channel_count];
    if desc.version == 0 {
        for channel in &mut planes {
            for row in 0..height as usize {
                let bytes = reader.read_bytes(on_disk_row_bytes)?;
                let start = row * width as usize;
                if desc.depth == 1 {
                    channel[start..start + width as usize].copy_from_slice(&expand_bit_row(&bytes, width));
                } else {
                    channel[start..start + on_disk_row_bytes].copy_from_slice(&bytes);
                }
            }
        }
    } else {
        let mut lengths = vec![vec![0u16; height as usize]; channel_count];
        for channel_lengths in &mut lengths {
            for len in channel_lengths.iter_mut() {
                *len = reader.read_short()?;
            }
        }
        for (channel, channel_lengths) in planes.iter_mut().zip(lengths.iter()) {
            for (row, &len) in channel_lengths.iter().enumerate() {
                let decompressed = packbits::decompress(&mut reader, 1, usize::from(len))?;
                let start = row * width as usize;
                if desc.depth == 1 {
                    channel[start..start + width as usize].copy_from_slice(&expand_bit_row(&decompressed[..on_disk_row_bytes], width));
                } else {
                    channel[start..start + width as usize].copy_from_slice(&decompressed[..width as usize]);
                }
            }
        }
    }

    let mut surface = Surface::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let i = (y * width + x) as usize;
            let color = if desc.depth == 1 {
                if planes[0][i] != 0 { Color::rgba(0, 0, 0, 0xFF) } else { Color::rgba(255, 255, 255, 0xFF) }
            } else if channel_count == 1 {
                if desc.grayscale {
                    let v = planes[0][i];
                    Color::rgba(v, v, v, 0xFF)
                } else {
                    clut.and_then(|c| c.at(u16::from(planes[0][i]))).unwrap_or_default()
                }
            } else {
                let a = if channel_count == 4 { planes[3][i] } else { 0xFF };
                Color { r: planes[0][i], g: planes[1][i], b: planes[2][i], a }
            };
            surface.set(x, y, color);
        }
    }
    Ok(surface)
}

/// Expands one packed, MSB-first bit row into one byte per pixel (0 or 1).
fn expand_bit_row(bytes: &[u8], width: u32) -> Vec<u8> {
    (0..width).map(|x| (bytes[(x / 8) as usize] >> (7 - (x % 8))) & 1).collect()
}

fn default_channel_count(depth: u16) -> Result<usize> {
    match depth {
        1 | 8 => Ok(1),
        24 => Ok(3),
        32 => Ok(4),
        other => Err(Error::UnsupportedPixelConfig { component_size: other, component_count: 0 }),
    }
}

/// Uncompressed samples: indexed rows for `depth <= 8`, raw interleaved
/// bytes-per-pixel rows otherwise.
fn decode_raw(desc: &ImageDescription, data: &[u8], clut: Option<&ColorTable>) -> Result<Surface> {
    let width = u32::from(desc.width);
    let height = u32::from(desc.height);
    if desc.depth <= 8 {
        let palette = clut.cloned().unwrap_or_default();
        let row_bytes = pixmap::row_bytes_for(width, desc.depth);
        pixmap::expand_indexed(data, row_bytes, width, height, desc.depth, &palette, None)
    } else {
        let bytes_per_pixel = usize::from(desc.depth) / 8;
        let mut surface = Surface::new(width, height);
        let mut pos = 0usize;
        for y in 0..height {
            for x in 0..width {
                let pixel = &data[pos..pos + bytes_per_pixel];
                let color = match bytes_per_pixel {
                    2 => Color::from_rgb555(u16::from_be_bytes([pixel[0], pixel[1]])),
                    3 => Color::rgba(pixel[0], pixel[1], pixel[2], 0xFF),
                    4 => Color { a: pixel[0], r: pixel[1], g: pixel[2], b: pixel[3] },
                    other => return Err(Error::UnsupportedPixelConfig { component_size: other as u16, component_count: 1 }),
                };
                surface.set(x, y, color);
                pos += bytes_per_pixel;
            }
        }
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_description(compressor: &[u8; 4], width: u16, height: u16, depth: u16) -> ImageDescription {
        ImageDescription {
            compressor: OsType::new(*compressor),
            version: 0,
            width,
            height,
            data_size: 0,
            depth,
            grayscale: false,
            clut_id: 0,
        }
    }

    #[test]
    fn raw_8bpp_dispatches_through_indexed_expansion() {
        let palette = ColorTable::with_entries(vec![Color::rgba(10, 20, 30, 255), Color::rgba(40, 50, 60, 255)]);
        let desc = image_description(b"raw ", 2, 1, 8);
        let data = [0u8, 1u8];
        let surface = decode_image_description(&desc, &data, Some(&palette)).unwrap();
        assert_eq!(surface.at(0, 0), Color::rgba(10, 20, 30, 255));
        assert_eq!(surface.at(1, 0), Color::rgba(40, 50, 60, 255));
    }

    #[test]
    fn unknown_compressor_is_rejected() {
        let desc = image_description(b"xxxx", 1, 1, 8);
        assert!(matches!(decode_image_description(&desc, &[0], None), Err(Error::UnsupportedCompressor(_))));
    }

    #[test]
    fn rle_literal_run_then_skip_to_end_of_frame() {
        let desc = image_description(b"rle ", 3, 1, 16);
        let mut writer = libcommon::Writer::new(ByteOrder::Big);
        writer.write_long(0).unwrap(); // chunk_size, unused
        writer.write_short(0).unwrap(); // header, no starting-row flag
        writer.write_byte(1).unwrap(); // skip = 1 -> x stays at 0
        writer.write_signed_byte(3).unwrap(); // literal run of 3 words
        writer.write_short(0x7C00).unwrap(); // red
        writer.write_short(0x03E0).unwrap(); // green
        writer.write_short(0x001F).unwrap(); // blue
        writer.write_signed_byte(0).unwrap(); // end this skip/code pair
        writer.write_byte(0).unwrap(); // end of frame
        let block = writer.into_block();
        let surface = decode_image_description(&desc, block.as_slice(), None).unwrap();
        assert_eq!(surface.at(0, 0).rgb(), (255, 0, 0));
        assert_eq!(surface.at(1, 0).rgb(), (0, 255, 0));
        assert_eq!(surface.at(2, 0).rgb(), (0, 0, 255));
    }

    #[test]
    fn bps_single_channel_raw_round_trips_through_clut() {
        let palette = ColorTable::with_entries(vec![Color::rgba(1, 2, 3, 255), Color::rgba(4, 5, 6, 255)]);
        let desc = image_description(b"8BPS", 2, 1, 8);
        let data = vec![0u8, 1u8];
        let surface = decode_image_description(&desc, &data, Some(&palette)).unwrap();
        assert_eq!(surface.at(0, 0), Color::rgba(1, 2, 3, 255));
        assert_eq!(surface.at(1, 0), Color::rgba(4, 5, 6, 255));
    }
}
