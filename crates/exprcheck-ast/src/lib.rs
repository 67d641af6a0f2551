//! exprcheck AST - expression parser and AST types

pub mod ast;
pub mod parser;

pub use ast::*;
pub use parser::{parse, ParseError, MAX_NESTING};
