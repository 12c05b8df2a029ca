//! The resource-file engine: typed containers, three on-disk layouts, and
//! the small set of toolbox resource kinds that are decoded generically
//! rather than through the graphics/sound codec suites.

pub mod container;
mod error;
pub mod format;
mod id;
pub mod kinds;

pub use container::{File, Resource, TypeBucket};
pub use error::Error;
pub use format::Format;
pub use id::{OsType, OsTypeReadExt, ResourceId};

pub type Result<T> = core::result::Result<T, Error>;
