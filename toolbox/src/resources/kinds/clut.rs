//! `clut`: the standalone color-lookup-table resource. Identical wire
//! layout to the inline `clut` used by `PixMap`s and QuickTime
//! `image_description`s (see [`crate::quickdraw::ColorTable`]), exposed
//! here as its own loadable kind so callers can `File::find(b"clut", id)`
//! independent of any bitmap.

pub use crate::quickdraw::ColorTable as ClutTable;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quickdraw::Color;
    use libcommon::{ByteOrder, Reader, Writer};

    #[test]
    fn round_trips_as_a_standalone_resource() {
        let table = ClutTable::with_entries(vec![Color::rgba(255, 0, 0, 255), Color::rgba(0, 255, 0, 255)]);
        let mut writer = Writer::new(ByteOrder::Big);
        table.encode(&mut writer).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        let decoded = ClutTable::decode(&mut reader).unwrap();
        assert_eq!(decoded.len(), table.len());
        assert_eq!(decoded.at(0), table.at(0));
        assert_eq!(decoded.at(1), table.at(1));
    }
}
