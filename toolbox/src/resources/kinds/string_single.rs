//! `STR `: a single Pascal string, with no count prefix. A thin wrapper so
//! callers do not have to special-case `STR#` vs `STR ` when both exist in
//! a file.

use libcommon::{Reader, Writer};

use crate::resources::Result;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SingleString(pub String);

impl SingleString {
    pub fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        Ok(Self(reader.read_pstr()?))
    }

    pub fn encode(&self, writer: &mut Writer) -> Result<()> {
        writer.write_pstr(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libcommon::ByteOrder;

    #[test]
    fn round_trips_through_encode_decode() {
        let value = SingleString("a greeting".into());
        let mut writer = Writer::new(ByteOrder::Big);
        value.encode(&mut writer).unwrap();
        let block = writer.into_block();
        let mut reader = Reader::new(&block);
        assert_eq!(SingleString::decode(&mut reader).unwrap(), value);
    }
}
