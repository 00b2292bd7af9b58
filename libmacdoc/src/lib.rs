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

pub mod event;
pub mod fonts;
pub mod input;
pub mod model;
pub mod ole;
pub mod parser;
pub mod parsers;
pub mod probe;

pub use input::InputFile;
pub use probe::{Detection, FileKind};
