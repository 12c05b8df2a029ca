//! The 50-byte `PixMap` descriptor and the byte-plane <-> [`Surface`]
//! expansion/packing routines that every indexed-color resource
//! (`PICT`'s indirect bits, `cicn`, `ppat`) is built from.

use libcommon::{Reader, Writer};

use super::{color::ColorTable, surface::Surface, Rect};
use crate::resources::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PackType {
    None,
    Argb,
    Rgb,
    PackBitsWord,
    PackBitsComponent,
}

impl PackType {
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0 | 1 => Some(Self::Argb),
            2 => Some(Self::Rgb),
            3 => Some(Self::PackBitsWord),
            4 => Some(Self::PackBitsComponent),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u16(self) -> u16 {
        match self {
            Self::None | Self::Argb => 1,
            Self::Rgb => 2,
            Self::PackBitsWord => 3,
            Self::PackBitsComponent => 4,
        }
    }
}

/// A QuickDraw `PixMap`: geometry, packing mode and palette reference for a
/// rectangular pixel plane. `base_address` and the color-table handle are
/// not meaningful off-disk and are not represented here; callers that need
/// to consume or emit the leading `base_address` word (`PICT`'s direct-bits
/// opcodes do, its indirect-bits and `cicn`/`ppat` do not) do so themselves
/// around the calls to [`Self::read`]/[`Self::write`].
#[derive(Clone, Debug)]
pub struct PixMap {
    pub row_bytes: u16,
    pub bounds: Rect,
    pub pack_type: PackType,
    pub pack_size: u32,
    pub h_res: f64,
    pub v_res: f64,
    pub pixel_type: u16,
    pub pixel_size: u16,
    pub component_count: u16,
    pub component_size: u16,
    pub pixel_format: u32,
}

impl PixMap {
    /// Reads a full (50-byte) `PixMap`, having already consumed the 4-byte
    /// `base_address` placeholder that the `PICT` indirect-bits reader
    /// handles itself (it differs between the inline and handle forms).
    pub fn read(reader: &mut Reader<'_>) -> Result<Self> {
        Self::read_with_table_offset(reader).map(|(pixmap, _)| pixmap)
    }

    /// As [`Self::read`], but also returns the raw `CTabHandle` field.
    /// Normally meaningless off-disk, `ppat` repurposes it as an absolute
    /// byte offset to its trailing `clut`.
    pub fn read_with_table_offset(reader: &mut Reader<'_>) -> Result<(Self, u32)> {
        let row_bytes = reader.read_short()? & 0x7FFF;
        let bounds = Rect::read(reader)?;
        let pm_version = reader.read_short()?;
        let pack_type_raw = reader.read_short()?;
        let pack_size = reader.read_long()?;
        let h_res = reader.read_fixed_point()?;
        let v_res = reader.read_fixed_point()?;
        let pixel_type = reader.read_short()?;
        let pixel_size = reader.read_short()?;
        let component_count = reader.read_short()?;
        let component_size = reader.read_short()?;
        let pixel_format = reader.read_long()?;
        let table_offset = reader.read_long()?;
        let _ct_seed = reader.read_long()?;
        let _ = pm_version;

        let pack_type = PackType::from_u16(pack_type_raw).ok_or(Error::UnsupportedPackType(pack_type_raw))?;

        Ok((
            Self {
                row_bytes,
                bounds,
                pack_type,
                pack_size,
                h_res,
                v_res,
                pixel_type,
                pixel_size,
                component_count,
                component_size,
                pixel_format,
            },
            table_offset,
        ))
    }

    pub fn write(&self, writer: &mut Writer) -> Result<()> {
        self.write_with_table_offset(writer, 0)
    }

    /// As [`Self::write`], but stores `table_offset` in the `CTabHandle`
    /// field instead of zero.
    pub fn write_with_table_offset(&self, writer: &mut Writer, table_offset: u32) -> Result<()> {
        writer.write_short(self.row_bytes | 0x8000)?;
        self.bounds.write(writer)?;
        writer.write_short(0)?; // pm_version
        writer.write_short(self.pack_type.as_u16())?;
        writer.write_long(self.pack_size)?;
        writer.write_fixed_point(self.h_res)?;
        writer.write_fixed_point(self.v_res)?;
        writer.write_short(self.pixel_type)?;
        writer.write_short(self.pixel_size)?;
        writer.write_short(self.component_count)?;
        writer.write_short(self.component_size)?;
        writer.write_long(self.pixel_format)?;
        writer.write_long(table_offset)?; // ct_handle / ct_table offset
        writer.write_long(0)?; // ct_seed
        Ok(())
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.bounds.width().max(0) as u32
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.bounds.height().max(0) as u32
    }
}

/// The bit offset, within a byte, of the `pixel_size`-bit index for pixel
/// `x`, MSB-first: `diff - (x % pixels_per_byte) * pixel_size`.
#[must_use]
fn bit_offset(x: u32, pixel_size: u32) -> u32 {
    let per_byte = 8 / pixel_size;
    let diff = 8 - pixel_size;
    diff - (x % per_byte) * pixel_size
}

/// Expands a row-major byte plane at 1/2/4/8 bits per pixel into a
/// [`Surface`], looking each index up in `palette`. An optional mask plane
/// of identical geometry (bit set = opaque) is ANDed in, for `cicn`'s
/// monochrome mask.
pub fn expand_indexed(
    plane: &[u8],
    row_bytes: usize,
    width: u32,
    height: u32,
    pixel_size: u16,
    palette: &ColorTable,
    mask: Option<(&[u8], usize)>,
) -> Result<Surface> {
    if !matches!(pixel_size, 1 | 2 | 4 | 8) {
        return Err(Error::UnsupportedPixelConfig { component_size: pixel_size, component_count: 1 });
    }
    let pixel_size = u32::from(pixel_size);
    let mut surface = Surface::new(width, height);
    for y in 0..height {
        let row = &plane[(y as usize) * row_bytes..];
        let mask_row = mask.map(|(data, mask_row_bytes)| &data[(y as usize) * mask_row_bytes..]);
        for x in 0..width {
            let byte_index = (x * pixel_size / 8) as usize;
            let byte = row[byte_index];
            let offset = bit_offset(x, pixel_size);
            let mask = ((1u16 << pixel_size) - 1) as u8;
            let index = (byte >> offset) & mask;
            let mut color = palette.at(u16::from(index)).unwrap_or_default();
            if let Some(mask_row) = mask_row {
                let mask_byte = mask_row[(x / 8) as usize];
                let bit = (mask_byte >> (7 - (x % 8))) & 1;
                if bit == 0 {
                    color.a = 0;
                }
            }
            surface.set(x, y, color);
        }
    }
    Ok(surface)
}

/// Row bytes required to hold `width` pixels at `bpp` bits per pixel.
#[must_use]
pub fn row_bytes_for(width: u32, bpp: u16) -> usize {
    let per_byte = 8 / u32::from(bpp);
    ((width + per_byte - 1) / per_byte) as usize
}

/// Packs a row-major stream of palette indices into an MSB-first byte plane
/// at `target_bpp` bits per pixel.
#[must_use]
pub fn build_pixel_data(indices: &[u16], width: u32, height: u32, target_bpp: u16) -> Vec<u8> {
    let row_bytes = row_bytes_for(width, target_bpp);
    let mut out = vec![0u8; row_bytes * height as usize];
    let pixel_size = u32::from(target_bpp);
    for y in 0..height {
        for x in 0..width {
            let index = indices[(y * width + x) as usize];
            let byte_index = (y as usize) * row_bytes + (x * pixel_size / 8) as usize;
            let offset = bit_offset(x, pixel_size);
            let mask = ((1u16 << pixel_size) - 1) as u8;
            out[byte_index] |= ((index as u8) & mask) << offset;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quickdraw::color::Color;

    #[test]
    fn expand_1bpp_msb_first() {
        let palette = ColorTable::with_entries(vec![Color::rgba(0, 0, 0, 255), Color::rgba(255, 255, 255, 255)]);
        // 0b1010_0000 -> pixels [1,0,1,0,0,0,0,0]
        let plane = [0b1010_0000u8];
        let surface = expand_indexed(&plane, 1, 4, 1, 1, &palette, None).unwrap();
        assert_eq!(surface.at(0, 0), Color::rgba(255, 255, 255, 255));
        assert_eq!(surface.at(1, 0), Color::rgba(0, 0, 0, 255));
        assert_eq!(surface.at(2, 0), Color::rgba(255, 255, 255, 255));
        assert_eq!(surface.at(3, 0), Color::rgba(0, 0, 0, 255));
    }

    #[test]
    fn build_pixel_data_round_trips_expand_indexed() {
        let palette = ColorTable::with_entries(vec![Color::rgba(0, 0, 0, 255), Color::rgba(255, 255, 255, 255)]);
        let indices = vec![1u16, 0, 1, 1, 0, 0, 1, 0];
        let width = 8;
        let height = 1;
        let plane = build_pixel_data(&indices, width, height, 1);
        let row_bytes = row_bytes_for(width, 1);
        let surface = expand_indexed(&plane, row_bytes, width, height, 1, &palette, None).unwrap();
        for (x, &index) in indices.iter().enumerate() {
            assert_eq!(surface.at(x as u32, 0), palette.at(index).unwrap());
        }
    }

    #[test]
    fn unsupported_pixel_config_is_rejected() {
        let palette = ColorTable::new();
        let plane = [0u8; 8];
        assert!(matches!(
            expand_indexed(&plane, 8, 8, 1, 3, &palette, None),
            Err(Error::UnsupportedPixelConfig { .. })
        ));
    }
}
