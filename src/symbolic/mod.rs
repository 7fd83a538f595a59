//! Decoding and storing source programs.

pub mod parser;
pub mod program;
pub mod token;

pub use self::parser::Parser;
pub use self::program::{LabelTable, Program};
