// SQL Parser Implementation
//
// Recursive-descent parser over the token stream produced by the lexer.

use std::iter::Peekable;
use std::vec::IntoIter;
use thiserror::Error;

use crate::query::executor::expression::{Constant, Expression, Predicate, Term};
use crate::query::parser::ast::*;
use crate::query::parser::lexer::{Lexer, Token, TokenType};
use crate::record::Schema;

/// SQL Parsing errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected token {0}")]
    UnexpectedToken(Token),

    #[error("Expected {expected}, found {found}")]
    ExpectedToken { expected: String, found: Token },

    #[error("Invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("Unexpected end of input")]
    EndOfInput,
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// SQL Parser for constructing an AST from SQL tokens
pub struct Parser {
    tokens: Peekable<IntoIter<Token>>,
    current_token: Token,
}

impl Parser {
    /// Create a new parser from a SQL query string
    pub fn new(input: &str) -> Self {
        let mut tokens = Lexer::new(input).tokenize().into_iter().peekable();
        let current_token = tokens.next().unwrap_or(Token {
            token_type: TokenType::EOF,
            literal: String::new(),
            line: 1,
            column: 0,
        });
        Parser {
            tokens,
            current_token,
        }
    }

    /// Parse exactly one statement, optionally followed by a semicolon
    pub fn parse_statement(&mut self) -> ParseResult<Statement> {
        let statement = match self.current_token.token_type {
            TokenType::SELECT => Statement::Query(self.parse_query()?),
            TokenType::INSERT => Statement::Insert(self.parse_insert()?),
            TokenType::DELETE => Statement::Delete(self.parse_delete()?),
            TokenType::UPDATE => Statement::Modify(self.parse_modify()?),
            TokenType::CREATE => Statement::CreateTable(self.parse_create_table()?),
            _ => return Err(self.unexpected()),
        };
        if self.current_is(&TokenType::SEMICOLON) {
            self.next_token();
        }
        if !self.current_is(&TokenType::EOF) {
            return Err(self.unexpected());
        }
        Ok(statement)
    }

    /// <Query> := SELECT <SelectList> FROM <TableList> [ WHERE <Predicate> ]
    pub fn parse_query(&mut self) -> ParseResult<QueryData> {
        self.expect(TokenType::SELECT, "SELECT")?;
        let fields = if self.current_is(&TokenType::MULTIPLY) {
            self.next_token();
            Vec::new()
        } else {
            self.parse_identifier_list()?
        };
        self.expect(TokenType::FROM, "FROM")?;
        let tables = self.parse_identifier_list()?;
        let predicate = self.parse_optional_where()?;
        Ok(QueryData {
            fields,
            tables,
            predicate,
        })
    }

    /// <Insert> := INSERT INTO id ( <FieldList> ) VALUES ( <ConstList> )
    fn parse_insert(&mut self) -> ParseResult<InsertData> {
        self.expect(TokenType::INSERT, "INSERT")?;
        self.expect(TokenType::INTO, "INTO")?;
        let table = self.parse_identifier()?;
        self.expect(TokenType::LeftParen, "(")?;
        let fields = self.parse_identifier_list()?;
        self.expect(TokenType::RightParen, ")")?;
        self.expect(TokenType::VALUES, "VALUES")?;
        self.expect(TokenType::LeftParen, "(")?;
        let mut values = vec![self.parse_constant()?];
        while self.current_is(&TokenType::COMMA) {
            self.next_token();
            values.push(self.parse_constant()?);
        }
        self.expect(TokenType::RightParen, ")")?;
        Ok(InsertData {
            table,
            fields,
            values,
        })
    }

    /// <Delete> := DELETE FROM id [ WHERE <Predicate> ]
    fn parse_delete(&mut self) -> ParseResult<DeleteData> {
        self.expect(TokenType::DELETE, "DELETE")?;
        self.expect(TokenType::FROM, "FROM")?;
        let table = self.parse_identifier()?;
        let predicate = self.parse_optional_where()?;
        Ok(DeleteData { table, predicate })
    }

    /// <Modify> := UPDATE id SET id = <Expression> [ WHERE <Predicate> ]
    fn parse_modify(&mut self) -> ParseResult<ModifyData> {
        self.expect(TokenType::UPDATE, "UPDATE")?;
        let table = self.parse_identifier()?;
        self.expect(TokenType::SET, "SET")?;
        let field = self.parse_identifier()?;
        self.expect(TokenType::EQUALS, "=")?;
        let new_value = self.parse_expression()?;
        let predicate = self.parse_optional_where()?;
        Ok(ModifyData {
            table,
            field,
            new_value,
            predicate,
        })
    }

    /// <Create> := CREATE TABLE id ( <FieldDef> [, <FieldDef>]* )
    fn parse_create_table(&mut self) -> ParseResult<CreateTableData> {
        self.expect(TokenType::CREATE, "CREATE")?;
        self.expect(TokenType::TABLE, "TABLE")?;
        let table = self.parse_identifier()?;
        self.expect(TokenType::LeftParen, "(")?;
        let mut schema = Schema::new();
        self.parse_field_def(&mut schema)?;
        while self.current_is(&TokenType::COMMA) {
            self.next_token();
            self.parse_field_def(&mut schema)?;
        }
        self.expect(TokenType::RightParen, ")")?;
        Ok(CreateTableData { table, schema })
    }

    /// <FieldDef> := id INT | id VARCHAR ( int )
    fn parse_field_def(&mut self, schema: &mut Schema) -> ParseResult<()> {
        let name = self.parse_identifier()?;
        match self.current_token.token_type {
            TokenType::INT => {
                self.next_token();
                schema.add_int_field(name);
            }
            TokenType::VARCHAR => {
                self.next_token();
                self.expect(TokenType::LeftParen, "(")?;
                let length = match self.current_token.token_type {
                    TokenType::INTEGER(n) if n >= 0 => n as usize,
                    TokenType::INTEGER(n) => return Err(ParseError::InvalidLiteral(n.to_string())),
                    _ => return Err(self.expected("a length")),
                };
                self.next_token();
                self.expect(TokenType::RightParen, ")")?;
                schema.add_string_field(name, length);
            }
            _ => return Err(self.expected("INT or VARCHAR")),
        }
        Ok(())
    }

    fn parse_optional_where(&mut self) -> ParseResult<Predicate> {
        if self.current_is(&TokenType::WHERE) {
            self.next_token();
            self.parse_predicate()
        } else {
            Ok(Predicate::new())
        }
    }

    /// <Predicate> := <Term> [ AND <Predicate> ]
    pub fn parse_predicate(&mut self) -> ParseResult<Predicate> {
        let mut predicate = Predicate::with_term(self.parse_term()?);
        while self.current_is(&TokenType::AND) {
            self.next_token();
            predicate.conjoin_with(Predicate::with_term(self.parse_term()?));
        }
        Ok(predicate)
    }

    /// <Term> := <Expression> = <Expression>
    fn parse_term(&mut self) -> ParseResult<Term> {
        let lhs = self.parse_expression()?;
        self.expect(TokenType::EQUALS, "=")?;
        let rhs = self.parse_expression()?;
        Ok(Term::new(lhs, rhs))
    }

    /// <Expression> := id | <Constant>
    fn parse_expression(&mut self) -> ParseResult<Expression> {
        if let TokenType::IDENTIFIER(_) = self.current_token.token_type {
            Ok(Expression::Field(self.parse_identifier()?))
        } else {
            Ok(Expression::Constant(self.parse_constant()?))
        }
    }

    /// <Constant> := string | int
    fn parse_constant(&mut self) -> ParseResult<Constant> {
        let constant = match &self.current_token.token_type {
            TokenType::STRING(s) => Constant::Str(s.clone()),
            TokenType::INTEGER(n) => Constant::Int(*n),
            TokenType::ILLEGAL(text) => return Err(ParseError::InvalidLiteral(text.clone())),
            _ => return Err(self.expected("a constant")),
        };
        self.next_token();
        Ok(constant)
    }

    fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut names = vec![self.parse_identifier()?];
        while self.current_is(&TokenType::COMMA) {
            self.next_token();
            names.push(self.parse_identifier()?);
        }
        Ok(names)
    }

    fn parse_identifier(&mut self) -> ParseResult<String> {
        if let TokenType::IDENTIFIER(name) = &self.current_token.token_type {
            let name = name.clone();
            self.next_token();
            Ok(name)
        } else {
            Err(self.expected("an identifier"))
        }
    }

    fn next_token(&mut self) {
        if let Some(token) = self.tokens.next() {
            self.current_token = token;
        }
    }

    fn current_is(&self, token_type: &TokenType) -> bool {
        &self.current_token.token_type == token_type
    }

    fn expect(&mut self, token_type: TokenType, description: &str) -> ParseResult<()> {
        if self.current_is(&token_type) {
            self.next_token();
            Ok(())
        } else {
            Err(self.expected(description))
        }
    }

    fn expected(&self, description: &str) -> ParseError {
        if self.current_token.token_type == TokenType::EOF {
            return ParseError::EndOfInput;
        }
        ParseError::ExpectedToken {
            expected: description.to_string(),
            found: self.current_token.clone(),
        }
    }

    fn unexpected(&self) -> ParseError {
        if self.current_token.token_type == TokenType::EOF {
            return ParseError::EndOfInput;
        }
        ParseError::UnexpectedToken(self.current_token.clone())
    }
}

/// Parse one SQL statement
pub fn parse(sql: &str) -> ParseResult<Statement> {
    Parser::new(sql).parse_statement()
}
