//! CSV tokenizing utilities

mod parser;

pub use parser::CsvParser;
