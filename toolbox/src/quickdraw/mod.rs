//! QuickDraw payload codecs: PackBits, pixel surfaces and color tables,
//! the `PICT` opcode interpreter/emitter, the indexed-color `cicn`/`ppat`
//! icon and pattern formats, SpriteWorld `rlëD`/`rlëX` sheets, and the
//! QuickTime `image_description` sub-codecs.
//!
//! None of this operates a live QuickDraw graphics port; there is no screen,
//! no pen state, no region arithmetic beyond what a codec needs to parse its
//! own wire format. Everything here is a pure decode/encode pass between a
//! resource's bytes and an in-memory [`Surface`].

pub mod cicn;
pub mod color;
pub mod packbits;
pub mod pict;
pub mod pixmap;
pub mod ppat;
pub mod quicktime;
pub mod sprite;
pub mod surface;

pub use color::{Color, ColorTable, RgbColor};
pub use pixmap::PixMap;
pub use quicktime::{decode_image_description, ImageDescription};
pub use surface::Surface;

/// A signed 16-bit pixel coordinate, as used throughout Mac OS geometry.
pub type Pixels = i16;

/// A QuickDraw point: `v` (y) then `h` (x) on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: Pixels,
    pub y: Pixels,
}

impl Point {
    #[must_use]
    pub fn new(x: Pixels, y: Pixels) -> Self {
        Self { x, y }
    }

    pub fn read(reader: &mut libcommon::Reader<'_>) -> libcommon::Result<Self> {
        let y = reader.read_signed_short()?;
        let x = reader.read_signed_short()?;
        Ok(Self { x, y })
    }

    pub fn write(self, writer: &mut libcommon::Writer) -> libcommon::Result<()> {
        writer.write_signed_short(self.y)?;
        writer.write_signed_short(self.x)
    }
}

/// A QuickDraw rectangle: `top, left, bottom, right` on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub top: Pixels,
    pub left: Pixels,
    pub bottom: Pixels,
    pub right: Pixels,
}

impl Rect {
    #[must_use]
    pub fn new(top: Pixels, left: Pixels, bottom: Pixels, right: Pixels) -> Self {
        Self { top, left, bottom, right }
    }

    #[must_use]
    pub fn of_size(width: i32, height: i32) -> Self {
        Self { top: 0, left: 0, bottom: height as Pixels, right: width as Pixels }
    }

    #[must_use]
    pub fn width(self) -> i32 {
        i32::from(self.right) - i32::from(self.left)
    }

    #[must_use]
    pub fn height(self) -> i32 {
        i32::from(self.bottom) - i32::from(self.top)
    }

    pub fn read(reader: &mut libcommon::Reader<'_>) -> libcommon::Result<Self> {
        let top = reader.read_signed_short()?;
        let left = reader.read_signed_short()?;
        let bottom = reader.read_signed_short()?;
        let right = reader.read_signed_short()?;
        Ok(Self { top, left, bottom, right })
    }

    pub fn write(self, writer: &mut libcommon::Writer) -> libcommon::Result<()> {
        writer.write_signed_short(self.top)?;
        writer.write_signed_short(self.left)?;
        writer.write_signed_short(self.bottom)?;
        writer.write_signed_short(self.right)
    }
}

/// Signed 32-bit, 16.16 fixed-point, as used for DPI fields.
pub type Fixed = f64;
