use super::{OsType, ResourceId};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("bad OSType size")]
    BadOsTypeSize,

    #[error(transparent)]
    Common(#[from] libcommon::Error),

    #[error("resource {0} not found")]
    ResourceNotFound(ResourceId),

    #[error("file is not a recognised resource container")]
    NotAResourceFile,

    #[error("malformed resource file: {0}")]
    MalformedResourceFile(String),

    #[error("value {value} does not fit in the {format} format")]
    FormatOverflow { format: &'static str, value: i64 },

    #[error("the {format} format cannot represent bucket attributes, refusing to write type {code:?} and drop them")]
    AttributesNotRepresentable { format: &'static str, code: OsType },

    #[error("type code {0:?} is not exactly 4 MacRoman bytes")]
    InvalidTypeCode(String),

    #[error("unsupported pixel configuration: {component_size}x{component_count}")]
    UnsupportedPixelConfig { component_size: u16, component_count: u16 },

    #[error("unsupported PixMap pack type {0}")]
    UnsupportedPackType(u16),

    #[error("unsupported ppat pattern type {0}, only the pixmap-based type 1 is supported")]
    UnsupportedPatternType(u16),

    #[error("unsupported PICT opcode 0x{0:04x}")]
    UnsupportedOpcode(u16),

    #[error("unsupported QuickTime compressor {0:?}")]
    UnsupportedCompressor(OsType),

    #[error("PackBits stream truncated")]
    PackbitsTruncated,

    #[error("{0} is not a valid 'snd ' resource: {1}")]
    InvalidSoundFormat(ResourceId, &'static str),
}

pub type Result<T> = core::result::Result<T, Error>;
