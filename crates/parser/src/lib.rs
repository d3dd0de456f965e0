//! Parser for the arietta-ir text format.
//!
//! The text format is what [`ir::writer`] emits; parsing is hand-written
//! (byte-level lexer + recursive descent) and exists chiefly so that passes
//! can be tested against readable source instead of hand-built node trees.

mod error;
mod lexer;
mod parser;

pub use error::ParseError;
pub use parser::{parse_block, parse_object};
