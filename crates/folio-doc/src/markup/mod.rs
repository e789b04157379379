//! HTML-subset markup, the durable form of a document.

mod entities;
mod parser;
mod serializer;

pub use entities::unescape_html;
pub use parser::parse_blocks;
pub(crate) use parser::finish_inlines;
pub use serializer::{render, serialize_blocks};
