// SQL Parser Module
//
// This module is responsible for parsing SQL statements and converting them
// into an abstract syntax tree (AST) representation.

pub mod lexer;
pub mod ast;
pub mod parser;

// Export key types
pub use self::parser::{parse, ParseError, ParseResult, Parser};
pub use self::lexer::{Lexer, Token, TokenType};
pub use self::ast::Statement;
