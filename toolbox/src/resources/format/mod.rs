//! The three on-disk resource container layouts this crate can read and
//! write: classic (24-bit offsets), extended (64-bit), and Rez.

mod classic;
mod extended;
mod rez;

use libcommon::Block;
use super::container::File;
use super::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Classic,
    Extended,
    Rez,
}

/// Tries each persistence driver in turn (`extended`, `rez`, `classic`); the
/// first whose fixed signature matches wins. A signature match followed by
/// an internal inconsistency is a fatal, propagated error -- only the
/// signature check itself is allowed to fall through to the next driver.
pub fn detect_and_parse(block: &Block) -> Result<(File, Format)> {
    if extended::sniff(block) {
        return extended::parse(block).map(|file| (file, Format::Extended));
    }
    if rez::sniff(block) {
        return rez::parse(block).map(|file| (file, Format::Rez));
    }
    if classic::sniff(block) {
        return classic::parse(block).map(|file| (file, Format::Classic));
    }
    Err(super::Error::NotAResourceFile)
}

pub fn write(file: &File, format: Format) -> Result<Block> {
    match format {
        Format::Classic => classic::write(file),
        Format::Extended => extended::write(file),
        Format::Rez => rez::write(file),
    }
}
