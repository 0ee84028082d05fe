//! Frontend module - Lexer and Parser

pub mod token;
pub mod lexer;
pub mod parser;

use crate::syntax::SyntaxNode;
use crate::utils::Result;

/// Lex and parse a source file into its syntax tree
pub fn parse_source(source: &str) -> Result<SyntaxNode> {
    let lexer = lexer::Lexer::new(source);
    let mut parser = parser::Parser::new(lexer)?;
    parser.parse_program()
}
