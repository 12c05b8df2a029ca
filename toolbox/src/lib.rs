// https://github.com/rust-lang/cargo/issues/5034
#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::map_err_ignore,
    clippy::missing_errors_doc,
    clippy::non_ascii_literal,
    clippy::option_if_let_else,
    clippy::similar_names,
    clippy::many_single_char_names,
    clippy::verbose_bit_mask,
    clippy::module_name_repetitions,
)]
#![warn(rust_2018_idioms)]

pub mod quickdraw;
pub mod resources;
pub mod sound;
