//! # Program Syntax
//!
//! Nested-expression parser producing operation trees.
//! Pure functions with no I/O and no access to the context.

pub mod ast;
pub mod lexer;
pub mod parser;

use crate::Result;
use ast::Operation;

pub use parser::MAX_NESTING;

/// Parse program text into its ordered top-level operation trees.
pub fn parse(source: &str) -> Result<Vec<Operation>> {
    let tokens = lexer::tokenize(source)?;
    parser::parse_program(&tokens)
}
