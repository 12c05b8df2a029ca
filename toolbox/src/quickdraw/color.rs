//! 48-bit QuickDraw `RGBColor`, 32-bit BGRA surface colors, and the `clut`
//! color lookup table that bridges between them.

use libcommon::{Reader, Writer};

use crate::resources::{Error, Result};

/// A QuickDraw `RGBColor`: three 16-bit channels, full white at `0xFFFF`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

impl RgbColor {
    pub const SIZE: usize = 6;

    pub fn read(reader: &mut Reader<'_>) -> libcommon::Result<Self> {
        Ok(Self { r: reader.read_short()?, g: reader.read_short()?, b: reader.read_short()? })
    }

    pub fn write(self, writer: &mut Writer) -> libcommon::Result<()> {
        writer.write_short(self.r)?;
        writer.write_short(self.g)?;
        writer.write_short(self.b)
    }
}

/// An 8-bit-per-channel BGRA color as stored in a [`super::Surface`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Color {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Color {
    #[must_use]
    pub fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    #[must_use]
    pub fn to_u32(self) -> u32 {
        u32::from_le_bytes([self.b, self.g, self.r, self.a])
    }

    #[must_use]
    pub fn from_u32(value: u32) -> Self {
        let [b, g, r, a] = value.to_le_bytes();
        Self { b, g, r, a }
    }

    /// Widens a 16-bit-per-channel `RGBColor` to 8-bit BGRA, opaque.
    #[must_use]
    pub fn from_rgb16(color: RgbColor) -> Self {
        Self {
            r: scale_16_to_8(color.r),
            g: scale_16_to_8(color.g),
            b: scale_16_to_8(color.b),
            a: 0xFF,
        }
    }

    /// Expands a 15-bit (5-5-5) word to 8-bit-per-channel BGRA, opaque.
    #[must_use]
    pub fn from_rgb555(word: u16) -> Self {
        let r5 = ((word >> 10) & 0x1F) as u8;
        let g5 = ((word >> 5) & 0x1F) as u8;
        let b5 = (word & 0x1F) as u8;
        Self {
            r: (r5 << 3) | (r5 >> 2),
            g: (g5 << 3) | (g5 >> 2),
            b: (b5 << 3) | (b5 >> 2),
            a: 0xFF,
        }
    }
}

#[must_use]
fn scale_16_to_8(word: u16) -> u8 {
    (u32::from(word) * 255 / 65535) as u8
}

#[must_use]
fn scale_8_to_16(byte: u8) -> u16 {
    (u32::from(byte) * 65535 / 255) as u16
}

const DEVICE_FLAG: u16 = 0x8000;

/// An ordered `clut` color table: `(index, color)` pairs plus a seed and a
/// flag word distinguishing a pixmap-owned table from a device-dependent one.
#[derive(Clone, Debug, Default)]
pub struct ColorTable {
    pub seed: u32,
    pub flags: u16,
    entries: Vec<(u16, Color)>,
}

impl ColorTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entries(entries: Vec<Color>) -> Self {
        Self {
            seed: 0,
            flags: 0,
            entries: entries.into_iter().enumerate().map(|(i, c)| (i as u16, c)).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn is_device(&self) -> bool {
        self.flags & DEVICE_FLAG != 0
    }

    /// O(n) lookup by stored index; when the table is device-dependent the
    /// index is instead taken to be the table position.
    #[must_use]
    pub fn at(&self, index: u16) -> Option<Color> {
        if self.is_device() {
            self.entries.get(index as usize).map(|&(_, c)| c)
        } else {
            self.entries.iter().find(|&&(i, _)| i == index).map(|&(_, c)| c)
        }
    }

    /// Returns the existing index for an exact 32-bit color match, or
    /// appends the color under the next free index.
    pub fn set(&mut self, color: Color) -> u16 {
        if let Some(&(index, _)) = self.entries.iter().find(|&&(_, c)| c.to_u32() == color.to_u32()) {
            return index;
        }
        let next = self.entries.iter().map(|&(i, _)| i).max().map_or(0, |m| m + 1);
        self.entries.push((next, color));
        next
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let seed = reader.read_long()?;
        let flags = reader.read_short()?;
        let count = u32::from(reader.read_short()?) + 1;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let index = reader.read_short()?;
            let rgb = RgbColor::read(reader)?;
            entries.push((index, Color::from_rgb16(rgb)));
        }
        Ok(Self { seed, flags, entries })
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        if self.entries.len() > usize::from(u16::MAX) + 1 {
            return Err(Error::FormatOverflow { format: "clut", value: self.entries.len() as i64 });
        }
        writer.write_long(self.seed)?;
        writer.write_short(self.flags)?;
        writer.write_short((self.entries.len().max(1) - 1) as u16)?;
        for &(index, color) in &self.entries {
            writer.write_short(index)?;
            let rgb = RgbColor { r: scale_8_to_16(color.r), g: scale_8_to_16(color.g), b: scale_8_to_16(color.b) };
            rgb.write(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcommon::ByteOrder;

    #[test]
    fn decode_two_entry_table() {
        let mut writer = Writer::new(ByteOrder::Big);
        writer.write_long(0).unwrap();
        writer.write_short(0).unwrap();
        writer.write_short(1).unwrap(); // count - 1
        writer.write_short(0).unwrap();
        RgbColor { r: 0xFFFF, g: 0, b: 0 }.write(&mut writer).unwrap();
        writer.write_short(1).unwrap();
        RgbColor { r: 0, g: 0xFFFF, b: 0 }.write(&mut writer).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        let table = ColorTable::decode(&mut reader).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.at(0).unwrap(), Color::rgba(255, 0, 0, 255));
        assert_eq!(table.at(1).unwrap(), Color::rgba(0, 255, 0, 255));
    }

    #[test]
    fn set_is_idempotent_on_exact_match() {
        let mut table = ColorTable::new();
        let red = Color::rgba(255, 0, 0, 255);
        let first = table.set(red);
        let second = table.set(red);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn from_rgb555_round_trips_full_intensity() {
        let word = 0x7FFF;
        let color = Color::from_rgb555(word);
        assert_eq!(color, Color::rgba(255, 255, 255, 255));
    }
}
