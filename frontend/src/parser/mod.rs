pub mod core;
pub mod error;
pub mod expr;
pub mod stmt;
pub mod token_stream;

#[cfg(test)]
mod tests;

pub use core::{Parser, parse};
pub use error::{ParserError, ParserErrorKind, ParserResult};
