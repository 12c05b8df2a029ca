#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::map_err_ignore,
    clippy::missing_errors_doc,
    clippy::non_ascii_literal,
    clippy::option_if_let_else,
    clippy::struct_excessive_bools,
    clippy::verbose_bit_mask,
)]
#![warn(rust_2018_idioms)]

pub mod block;
pub mod encodings;
pub mod error;
pub mod stream;

pub use block::{Block, ByteOrder};
pub use error::{flatten_errors, Error, ReasonsExt, Result};
pub use stream::{ReadMode, Reader, Writer};
