// https://github.com/rust-lang/cargo/issues/5034
#![warn(clippy::pedantic)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions,
    clippy::non_ascii_literal,
)]
#![warn(rust_2018_idioms)]

pub mod files;
pub mod quickdraw;
pub mod resources;
mod types;

pub use types::{OsType, OsTypeReadExt, PString};
