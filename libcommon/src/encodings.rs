//! Table-driven MacRoman/WinRoman byte <-> UTF-8 conversion.
//!
//! This is deliberately minimal: a `Decoder` is nothing more than a 256-entry
//! lookup table for the upper half of the code page (the lower 128 code
//! points are ASCII in every encoding this crate cares about) plus the
//! reverse mapping for encoding. Text encoding in general is out of scope;
//! this exists only so resource names and `STR#`/`STR ` payloads come back as
//! readable UTF-8.

pub trait Decoder: Sync {
    fn decode(&self, bytes: &[u8]) -> String;
    fn encode(&self, text: &str) -> Vec<u8>;
}

pub struct Table {
    /// `high[i]` is the `char` represented by byte `0x80 + i`.
    high: &'static [char; 128],
}

impl Decoder for Table {
    fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| {
            if b < 0x80 {
                char::from(b)
            } else {
                self.high[usize::from(b) - 0x80]
            }
        }).collect()
    }

    fn encode(&self, text: &str) -> Vec<u8> {
        text.chars().map(|c| {
            if c.is_ascii() {
                c as u8
            } else {
                self.high.iter().position(|&hc| hc == c).map_or(b'?', |i| (0x80 + i) as u8)
            }
        }).collect()
    }
}

#[rustfmt::skip]
pub static MAC_ROMAN: Table = Table { high: &[
    'Ä','Å','Ç','É','Ñ','Ö','Ü','á','à','â','ä','ã','å','ç','é','è',
    'ê','ë','í','ì','î','ï','ñ','ó','ò','ô','ö','õ','ú','ù','û','ü',
    '†','°','¢','£','§','•','¶','ß','®','©','™','´','¨','≠','Æ','Ø',
    '∞','±','≤','≥','¥','µ','∂','∑','∏','π','∫','ª','º','Ω','æ','ø',
    '¿','¡','¬','√','ƒ','≈','∆','«','»','…','\u{a0}','À','Ã','Õ','Œ','œ',
    '–','—','“','”','‘','’','÷','◊','ÿ','Ÿ','⁄','€','‹','›','ﬁ','ﬂ',
    '‡','·','‚','„','‰','Â','Ê','Á','Ë','È','Í','Î','Ï','Ì','Ó','Ô',
    '\u{f8ff}','Ò','Ú','Û','Ù','ı','ˆ','˜','¯','˘','˙','˚','¸','˝','˛','ˇ',
]};

#[rustfmt::skip]
pub static WIN_ROMAN: Table = Table { high: &[
    '€','\u{81}','‚','ƒ','„','…','†','‡','ˆ','‰','Š','‹','Œ','\u{8d}','Ž','\u{8f}',
    '\u{90}','‘','’','“','”','•','–','—','˜','™','š','›','œ','\u{9d}','ž','Ÿ',
    '\u{a0}','¡','¢','£','¤','¥','¦','§','¨','©','ª','«','¬','\u{ad}','®','¯',
    '°','±','²','³','´','µ','¶','·','¸','¹','º','»','¼','½','¾','¿',
    'À','Á','Â','Ã','Ä','Å','Æ','Ç','È','É','Ê','Ë','Ì','Í','Î','Ï',
    'Ð','Ñ','Ò','Ó','Ô','Õ','Ö','×','Ø','Ù','Ú','Û','Ü','Ý','Þ','ß',
    'à','á','â','ã','ä','å','æ','ç','è','é','ê','ë','ì','í','î','ï',
    'ð','ñ','ò','ó','ô','õ','ö','÷','ø','ù','ú','û','ü','ý','þ','ÿ',
]};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        assert_eq!(MAC_ROMAN.decode(b"ok"), "ok");
        assert_eq!(MAC_ROMAN.encode("ok"), b"ok");
    }

    #[test]
    fn mac_roman_high_byte_decodes() {
        assert_eq!(MAC_ROMAN.decode(&[0x80]), "Ä");
        assert_eq!(MAC_ROMAN.encode("Ä"), vec![0x80]);
    }
}
