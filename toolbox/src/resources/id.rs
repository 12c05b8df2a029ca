//! Type definitions for identifying resources.

use core::{char, fmt};
use derive_more::Display;
use libcommon::Reader;
use super::Error;

/// A 4-byte data format identifier (`'PICT'`, `'snd '`, `'rlëD'`, ...).
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct OsType([u8; 4]);

impl OsType {
    #[must_use]
    pub fn new(os_type: impl Into<[u8; 4]>) -> Self {
        Self(os_type.into())
    }

    /// Builds an `OsType` from a `const` byte-string literal, for use in
    /// `typed_resource!`-style static tables.
    #[must_use]
    pub const fn from_raw(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    #[inline]
    fn fmt_write(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{}", char::from_u32((*b).into()).unwrap_or(char::REPLACEMENT_CHARACTER))?;
        }
        Ok(())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl core::str::FromStr for OsType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == 4 {
            let mut value = [0; 4];
            value.copy_from_slice(s.as_bytes());
            Ok(Self(value))
        } else {
            Err(Error::BadOsTypeSize)
        }
    }
}

impl From<&[u8; 4]> for OsType {
    fn from(value: &[u8; 4]) -> Self {
        Self(*value)
    }
}

impl From<[u8; 4]> for OsType {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl From<u32> for OsType {
    fn from(value: u32) -> Self {
        Self(value.to_be_bytes())
    }
}

impl From<OsType> for u32 {
    fn from(value: OsType) -> Self {
        Self::from_be_bytes(value.0)
    }
}

impl Default for OsType {
    fn default() -> Self {
        Self::new([0; 4])
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_write(f)
    }
}

impl fmt::Debug for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OsType(")?;
        self.fmt_write(f)?;
        write!(f, ")")
    }
}

pub trait OsTypeReadExt {
    fn read_os_type(&mut self) -> libcommon::Result<OsType>;
}

impl<'b> OsTypeReadExt for Reader<'b> {
    #[inline]
    fn read_os_type(&mut self) -> libcommon::Result<OsType> {
        Ok(OsType::from(self.read_long()?))
    }
}

/// A resource identifier, widened to `i64` so it can address classic (`i16`),
/// extended and Rez (`i64`) identifier spaces uniformly.
#[derive(Copy, Clone, Display, Hash, PartialEq, Eq)]
#[display(fmt = "{}({})", _0, _1)]
pub struct ResourceId(OsType, i64);

impl ResourceId {
    #[must_use]
    pub fn new(os_type: impl Into<OsType>, id: i64) -> Self {
        Self(os_type.into(), id)
    }

    #[must_use]
    pub fn id(self) -> i64 {
        self.1
    }

    #[must_use]
    pub fn os_type(self) -> OsType {
        self.0
    }
}

impl From<(OsType, i64)> for ResourceId {
    fn from(value: (OsType, i64)) -> Self {
        Self(value.0, value.1)
    }
}

impl From<(&[u8; 4], i64)> for ResourceId {
    fn from(value: (&[u8; 4], i64)) -> Self {
        Self(value.0.into(), value.1)
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceId({}({}))", self.0, self.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn os_type_round_trips_through_u32() {
        let os_type = OsType::from_str("PICT").unwrap();
        assert_eq!(os_type.to_string(), "PICT");
        assert_eq!(u32::from(os_type), 0x5049_4354);
    }

    #[test]
    fn bad_length_is_rejected() {
        assert!(matches!("abc".parse::<OsType>(), Err(Error::BadOsTypeSize)));
    }
}
