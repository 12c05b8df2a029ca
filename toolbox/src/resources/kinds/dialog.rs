//! `DLOG` (dialog template) and `DITL` (dialog item list).

use libcommon::{Reader, Writer};

use crate::quickdraw::Rect;
use crate::resources::Result;

/// The `DLOG` template: window geometry, dialog proc ID, and the `DITL`
/// resource ID that supplies its item list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DialogTemplate {
    pub bounds: Rect,
    pub proc_id: i16,
    pub visible: bool,
    pub go_away: bool,
    pub ref_con: i32,
    pub items_id: i16,
}

impl DialogTemplate {
    pub fn decode(reader: &mut Reader<'_>) -> Result<(Self, String)> {
        let bounds = Rect::read(reader)?;
        let proc_id = reader.read_signed_short()?;
        let visible = reader.read_signed_short()? != 0;
        let go_away = reader.read_signed_short()? != 0;
        let ref_con = reader.read_signed_long()?;
        let items_id = reader.read_signed_short()?;
        let title = reader.read_pstr()?;
        Ok((Self { bounds, proc_id, visible, go_away, ref_con, items_id }, title))
    }

    pub fn encode(&self, title: &str, writer: &mut Writer) -> Result<()> {
        self.bounds.write(writer)?;
        writer.write_signed_short(self.proc_id)?;
        writer.write_signed_short(self.visible as i16)?;
        writer.write_signed_short(self.go_away as i16)?;
        writer.write_signed_long(self.ref_con)?;
        writer.write_signed_short(self.items_id)?;
        writer.write_pstr(title)?;
        Ok(())
    }
}

/// A single `DITL` entry: its bounds, a toolbox control/text type code
/// (the high bit marks it disabled), and the associated text or seed data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DialogItem {
    pub bounds: Rect,
    pub item_type: u8,
    pub disabled: bool,
    pub data: Vec<u8>,
}

impl DialogItem {
    #[must_use]
    pub fn text(&self) -> String {
        libcommon::encodings::MAC_ROMAN.decode(&self.data)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogItemList(Vec<DialogItem>);

impl DialogItemList {
    #[must_use]
    pub fn new(items: Vec<DialogItem>) -> Self {
        Self(items)
    }

    #[must_use]
    pub fn items(&self) -> &[DialogItem] {
        &self.0
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_short()? + 1;
        let mut items = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let _placeholder = reader.read_long()?;
            let bounds = Rect::read(reader)?;
            let raw_type = reader.read_byte()?;
            let item_type = raw_type & 0x7F;
            let disabled = raw_type & 0x80 != 0;
            let len = usize::from(reader.read_byte()?);
            let data = reader.read_bytes(len)?;
            if len % 2 == 1 {
                reader.read_byte()?;
            }
            items.push(DialogItem { bounds, item_type, disabled, data });
        }
        Ok(Self(items))
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_short((self.0.len().max(1) - 1) as u16)?;
        for item in &self.0 {
            writer.write_long(0)?;
            item.bounds.write(writer)?;
            let raw_type = item.item_type | if item.disabled { 0x80 } else { 0 };
            writer.write_byte(raw_type)?;
            writer.write_byte(item.data.len() as u8)?;
            writer.write_raw(&item.data)?;
            if item.data.len() % 2 == 1 {
                writer.write_byte(0)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcommon::ByteOrder;

    #[test]
    fn dialog_template_round_trips() {
        let template = DialogTemplate {
            bounds: Rect::new(40, 40, 140, 300),
            proc_id: 1,
            visible: true,
            go_away: true,
            ref_con: 0,
            items_id: 128,
        };
        let mut writer = Writer::new(ByteOrder::Big);
        template.encode("Hello", &mut writer).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        let (decoded, title) = DialogTemplate::decode(&mut reader).unwrap();
        assert_eq!(decoded, template);
        assert_eq!(title, "Hello");
    }

    #[test]
    fn item_list_round_trips_odd_length_text() {
        let items = DialogItemList::new(vec![
            DialogItem { bounds: Rect::new(0, 0, 20, 80), item_type: 4, disabled: false, data: b"OK".to_vec() },
            DialogItem { bounds: Rect::new(0, 0, 20, 80), item_type: 8, disabled: false, data: b"odd".to_vec() },
        ]);
        let mut writer = Writer::new(ByteOrder::Big);
        items.encode(&mut writer).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        let decoded = DialogItemList::decode(&mut reader).unwrap();
        assert_eq!(decoded, items);
        assert_eq!(decoded.items()[1].text(), "odd");
    }
}
