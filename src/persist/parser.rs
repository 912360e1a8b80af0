//! Parser for saved networks.
//!
//! ```text
//! document = { line }
//! line     = [ record ] newline
//! record   = "class" ':' word { ';' field }
//! field    = word ':' value
//! value    = number | word | '[' number ',' number ']'
//! ```

use super::lexer::{parse_value, Lexer, Token, TokenKind};
use super::record::{Record, Value};
use crate::error::{NetworkError, Result};
use crate::graph::Point;

/// Parser for the saved-network format.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser, reading the first token.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse every component line in the document.
    pub fn parse(&mut self) -> Result<Vec<Record>> {
        let mut records = Vec::new();

        while self.current.kind != TokenKind::Eof {
            // Skip empty lines
            if self.current.kind == TokenKind::Newline {
                self.advance()?;
                continue;
            }

            records.push(self.parse_record()?);

            match self.current.kind {
                TokenKind::Newline => self.advance()?,
                TokenKind::Eof => {}
                _ => {
                    return Err(NetworkError::parse(
                        self.current.line,
                        format!("expected end of line, got {:?}", self.current.text),
                    ));
                }
            }
        }

        Ok(records)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(NetworkError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    fn parse_record(&mut self) -> Result<Record> {
        let line = self.current.line;
        let key = self.expect(TokenKind::Word)?;
        if key.text != "class" {
            return Err(NetworkError::parse(
                line,
                format!("first field must be 'class', got '{}'", key.text),
            ));
        }
        self.expect(TokenKind::Colon)?;
        let class = self.expect(TokenKind::Word)?;
        let mut record = Record::new(class.text, line);

        while self.current.kind == TokenKind::Semicolon {
            self.advance()?;
            // Tolerate a trailing separator
            if matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof) {
                break;
            }
            let key = self.expect(TokenKind::Word)?;
            self.expect(TokenKind::Colon)?;
            let value = self.parse_value()?;
            record.fields.push((key.text, value));
        }

        Ok(record)
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.current.kind {
            TokenKind::Number => Ok(Value::Number(self.number()?)),
            TokenKind::Word => {
                let word = self.current.text.clone();
                self.advance()?;
                Ok(Value::Word(word))
            }
            TokenKind::OpenBracket => {
                self.advance()?;
                let x = self.number()?;
                self.expect(TokenKind::Comma)?;
                let y = self.number()?;
                self.expect(TokenKind::CloseBracket)?;
                Ok(Value::Point(Point::new(x, y)))
            }
            _ => Err(NetworkError::parse(
                self.current.line,
                format!("expected a value, got {:?}", self.current.text),
            )),
        }
    }

    fn number(&mut self) -> Result<f64> {
        let tok = self.expect(TokenKind::Number)?;
        parse_value(&tok.text).ok_or_else(|| {
            NetworkError::parse(tok.line, format!("invalid number '{}'", tok.text))
        })
    }
}
