//! Toolbox resource kinds that decode to a plain Rust value rather than
//! routing through the graphics or sound codec suites: string lists and
//! single strings, dialog templates, `FOND` family descriptors, and the
//! standalone `clut` color table.

mod clut;
mod dialog;
mod font;
mod string_list;
mod string_single;

pub use clut::ClutTable;
pub use dialog::{DialogItem, DialogItemList, DialogTemplate};
pub use font::{FontAssociation, FontFamily, FontStyle};
pub use string_list::StringList;
pub use string_single::SingleString;

/// `FOND` is decoded only as far as its style-to-`sfnt`/`NFNT` id
/// associations ([`FontFamily`]); `sfnt` and `NFNT` resources themselves
/// are not decoded, and callers get their raw bytes straight out of
/// [`super::File::find`] to hand to a font shaper unchanged.
