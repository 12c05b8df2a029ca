//! `FOND` (font family descriptor), decoded only as far as its
//! style-to-`sfnt`/`NFNT` id associations — enough for a caller to resolve
//! which glyph resource a given style renders with, without pulling in a
//! toolbox font or style manager. The width table, kerning pairs and
//! PostScript name table that follow the association list on disk are not
//! parsed; per the `FOND`/`sfnt` Non-goal, glyph rendering is out of scope.

use libcommon::{Reader, Writer};

use crate::resources::Result;

bitflags::bitflags! {
    /// The classic QuickDraw character style bits, as carried in a `FOND`
    /// association record and in `TextStyle`/`Style` elsewhere in the toolbox.
    #[derive(Default)]
    pub struct FontStyle: u16 {
        const BOLD      = 0x01;
        const ITALIC    = 0x02;
        const UNDERLINE = 0x04;
        const OUTLINE   = 0x08;
        const SHADOW    = 0x10;
        const CONDENSE  = 0x20;
        const EXTEND    = 0x40;
    }
}

/// One `(style, sfnt/NFNT id)` association from a `FOND`'s association table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontAssociation {
    pub style: FontStyle,
    pub id: i16,
}

/// A `FOND` family descriptor, decoded down to its header metrics and
/// style associations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontFamily {
    pub fixed_width: bool,
    pub family_id: u16,
    pub first_char: u16,
    pub last_char: u16,
    pub ascent: u16,
    pub descent: i16,
    pub leading: u16,
    pub max_width: u16,
    pub associations: Vec<FontAssociation>,
}

/// Reserved header bytes between the metrics block and the association
/// count: the `glyph-width table offset`/`kerning table offset`/`style
/// mapping table offset` longs are read but not followed (they describe
/// tables this type does not model), plus 9 reserved shorts, a reserved
/// long and a reserved short.
const RESERVED_SHORTS: usize = 9;

impl FontFamily {
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let flags = reader.read_short()?;
        let fixed_width = flags & 0x8000 != 0;
        let family_id = reader.read_short()?;
        let first_char = reader.read_short()?;
        let last_char = reader.read_short()?;

        let ascent = reader.read_short()?;
        let descent = reader.read_signed_short()?;
        let leading = reader.read_short()?;
        let max_width = reader.read_short()?;

        let _width_table_offset = reader.read_signed_long()?;
        let _kern_table_offset = reader.read_signed_long()?;
        let _style_table_offset = reader.read_signed_long()?;

        reader.read_bytes(RESERVED_SHORTS * 2)?;
        reader.read_bytes(4)?;
        reader.read_bytes(2)?;

        let count = u32::from(reader.read_short()?) + 1;
        let mut associations = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let _size = reader.read_short()?;
            let style = FontStyle::from_bits_truncate(reader.read_short()?);
            let id = reader.read_signed_short()?;
            associations.push(FontAssociation { style, id });
        }

        Ok(Self {
            fixed_width,
            family_id,
            first_char,
            last_char,
            ascent,
            descent,
            leading,
            max_width,
            associations,
        })
    }

    /// Writes back the header and association table this type models.
    /// The three table offsets are written as zero: this type does not
    /// carry the width/kerning/style-name tables they would otherwise
    /// point at.
    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        let flags = if self.fixed_width { 0x8000 } else { 0 };
        writer.write_short(flags)?;
        writer.write_short(self.family_id)?;
        writer.write_short(self.first_char)?;
        writer.write_short(self.last_char)?;

        writer.write_short(self.ascent)?;
        writer.write_signed_short(self.descent)?;
        writer.write_short(self.leading)?;
        writer.write_short(self.max_width)?;

        writer.write_signed_long(0)?;
        writer.write_signed_long(0)?;
        writer.write_signed_long(0)?;

        writer.write_raw(&vec![0u8; RESERVED_SHORTS * 2])?;
        writer.write_raw(&[0u8; 4])?;
        writer.write_raw(&[0u8; 2])?;

        writer.write_short((self.associations.len().max(1) - 1) as u16)?;
        for assoc in &self.associations {
            writer.write_short(0)?; // point size, not modelled
            writer.write_short(assoc.style.bits())?;
            writer.write_signed_short(assoc.id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcommon::ByteOrder;

    #[test]
    fn round_trips_plain_and_bold_associations() {
        let family = FontFamily {
            fixed_width: false,
            family_id: 128,
            first_char: 0x20,
            last_char: 0x7E,
            ascent: 12,
            descent: -3,
            leading: 1,
            max_width: 14,
            associations: vec![
                FontAssociation { style: FontStyle::empty(), id: 300 },
                FontAssociation { style: FontStyle::BOLD | FontStyle::ITALIC, id: 301 },
            ],
        };

        let mut writer = Writer::new(ByteOrder::Big);
        family.encode(&mut writer).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        let decoded = FontFamily::decode(&mut reader).unwrap();

        assert_eq!(decoded, family);
        assert!(decoded.associations[1].style.contains(FontStyle::BOLD));
        assert!(decoded.associations[1].style.contains(FontStyle::ITALIC));
        assert!(!decoded.associations[1].style.contains(FontStyle::UNDERLINE));
    }
}
