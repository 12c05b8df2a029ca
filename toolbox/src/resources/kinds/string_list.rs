//! `STR#`: an ordered list of Pascal strings, count-prefixed.

use libcommon::{Reader, Writer};

use crate::resources::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringList(Vec<String>);

impl StringList {
    #[must_use]
    pub fn new(strings: Vec<String>) -> Self {
        Self(strings)
    }

    /// 0-based, unlike the Toolbox's `GetIndString`, which counts from 1.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_short()?;
        let mut strings = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            strings.push(reader.read_pstr()?);
        }
        Ok(Self(strings))
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_short(self.0.len() as u16)?;
        for string in &self.0 {
            writer.write_pstr(string)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcommon::ByteOrder;

    #[test]
    fn round_trips_through_encode_decode() {
        let list = StringList::new(vec!["one".into(), "two".into(), String::new()]);
        let mut writer = Writer::new(ByteOrder::Big);
        list.encode(&mut writer).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        let decoded = StringList::decode(&mut reader).unwrap();
        assert_eq!(decoded, list);
    }

    #[test]
    fn empty_list_is_just_a_zero_count() {
        let mut writer = Writer::new(ByteOrder::Big);
        StringList::default().encode(&mut writer).unwrap();
        let block = writer.into_block();
        assert_eq!(block.as_slice(), [0, 0]);
    }
}
