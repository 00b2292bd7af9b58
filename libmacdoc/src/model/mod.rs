//! The portable document model: the value types parsers build and sinks
//! consume.

mod border;
mod font;
mod length;
mod list;
mod paragraph;
mod section;

pub use border::{Border, BorderStyle};
pub use font::{Font, FontFlags, Script, UnderlineStyle};
pub use length::{Length, Unit};
pub use list::{List, ListId, ListLevel, NumberingType, MAX_LIST_LEVELS};
pub use paragraph::{Edge, Justification, Paragraph, TabAlignment, TabStop};
pub use section::{Column, Section};

pub use libmactoolbox::quickdraw::Color;
