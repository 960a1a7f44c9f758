//! Reader for CalcFS result exports.

mod attrs;
mod parser;
pub mod records;

pub use parser::{parse_document, parse_file};
pub use records::*;
