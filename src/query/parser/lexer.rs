// SQL Lexer Implementation
//
// This module implements a lexer for SQL that tokenizes input queries.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

/// SQL Token types
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum TokenType {
    // Keywords
    SELECT,
    FROM,
    WHERE,
    AND,
    INSERT,
    INTO,
    VALUES,
    DELETE,
    UPDATE,
    SET,
    CREATE,
    TABLE,
    INT,
    VARCHAR,

    // Literals
    STRING(String),
    INTEGER(i32),

    // Identifiers
    IDENTIFIER(String),

    // Operators and punctuation
    EQUALS,     // =
    MULTIPLY,   // *
    SEMICOLON,  // ;
    COMMA,      // ,
    LeftParen,  // (
    RightParen, // )

    // Special
    EOF,
    ILLEGAL(String),
}

/// A Token represents a lexical unit in the SQL query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    pub literal: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}' at {}:{}", self.literal, self.line, self.column)
    }
}

/// SQL Lexer for breaking a query string into tokens
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
    ch: Option<char>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer from a SQL query string
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer {
            input: input.chars().peekable(),
            line: 1,
            column: 0,
            ch: None,
        };
        lexer.read_char();
        lexer
    }

    /// Read the whole input, ending with a single EOF token
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.token_type == TokenType::EOF;
            tokens.push(token);
            if is_eof {
                return tokens;
            }
        }
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.next();
        self.ch = ch;

        if let Some(c) = ch {
            self.column += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 0;
            }
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.ch {
            if ch.is_whitespace() {
                self.read_char();
            } else {
                break;
            }
        }
    }

    /// Read while `pred` holds, starting with the current character
    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut text = String::new();
        while let Some(ch) = self.ch {
            if !pred(ch) {
                break;
            }
            text.push(ch);
            self.read_char();
        }
        text
    }

    /// Read a string literal; `quote` is the opening delimiter
    fn read_string(&mut self, quote: char) -> Option<String> {
        let mut string = String::new();
        self.read_char();
        while let Some(ch) = self.ch {
            self.read_char();
            if ch == quote {
                return Some(string);
            }
            string.push(ch);
        }
        None
    }

    fn lookup_identifier(ident: &str) -> TokenType {
        match ident.to_uppercase().as_str() {
            "SELECT" => TokenType::SELECT,
            "FROM" => TokenType::FROM,
            "WHERE" => TokenType::WHERE,
            "AND" => TokenType::AND,
            "INSERT" => TokenType::INSERT,
            "INTO" => TokenType::INTO,
            "VALUES" => TokenType::VALUES,
            "DELETE" => TokenType::DELETE,
            "UPDATE" => TokenType::UPDATE,
            "SET" => TokenType::SET,
            "CREATE" => TokenType::CREATE,
            "TABLE" => TokenType::TABLE,
            "INT" | "INTEGER" => TokenType::INT,
            "VARCHAR" => TokenType::VARCHAR,
            _ => TokenType::IDENTIFIER(ident.to_lowercase()),
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let line = self.line;
        let column = self.column;
        let make = |token_type: TokenType, literal: String| Token {
            token_type,
            literal,
            line,
            column,
        };

        let Some(ch) = self.ch else {
            return make(TokenType::EOF, String::new());
        };

        let single = match ch {
            '=' => Some(TokenType::EQUALS),
            '*' => Some(TokenType::MULTIPLY),
            ';' => Some(TokenType::SEMICOLON),
            ',' => Some(TokenType::COMMA),
            '(' => Some(TokenType::LeftParen),
            ')' => Some(TokenType::RightParen),
            _ => None,
        };
        if let Some(token_type) = single {
            self.read_char();
            return make(token_type, ch.to_string());
        }

        match ch {
            '\'' | '"' => match self.read_string(ch) {
                Some(value) => make(TokenType::STRING(value.clone()), format!("{}{}{}", ch, value, ch)),
                None => make(TokenType::ILLEGAL("unterminated string".to_string()), ch.to_string()),
            },
            c if c.is_ascii_digit() || c == '-' => {
                let mut number = String::new();
                if c == '-' {
                    number.push(c);
                    self.read_char();
                }
                number.push_str(&self.read_while(|c| c.is_ascii_digit()));
                match number.parse::<i32>() {
                    Ok(value) => make(TokenType::INTEGER(value), number),
                    Err(_) => make(TokenType::ILLEGAL(number.clone()), number),
                }
            }
            c if is_letter(c) => {
                let ident = self.read_while(|c| is_letter(c) || c.is_ascii_digit());
                make(Self::lookup_identifier(&ident), ident)
            }
            c => {
                self.read_char();
                make(TokenType::ILLEGAL(c.to_string()), c.to_string())
            }
        }
    }
}

fn is_letter(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}
