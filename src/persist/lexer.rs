//! Lexer (tokenizer) for saved networks.

use crate::error::{NetworkError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the saved-network format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    /// A field key or a class name
    Word,
    /// A decimal number, optionally with a unit suffix
    Number,
    /// Key/value separator ':'
    Colon,
    /// Field separator ';'
    Semicolon,
    /// '['
    OpenBracket,
    /// ']'
    CloseBracket,
    /// ','
    Comma,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing saved-network input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let token = |kind: TokenKind, text: String| Token {
            kind,
            text,
            line,
            column,
        };

        let ch = match self.chars.peek().copied() {
            Some(ch) => ch,
            None => return Ok(token(TokenKind::Eof, String::new())),
        };

        let single = match ch {
            '\n' => Some(TokenKind::Newline),
            ':' => Some(TokenKind::Colon),
            ';' => Some(TokenKind::Semicolon),
            '[' => Some(TokenKind::OpenBracket),
            ']' => Some(TokenKind::CloseBracket),
            ',' => Some(TokenKind::Comma),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Ok(token(kind, ch.to_string()));
        }

        match ch {
            '-' | '+' | '.' | '0'..='9' => {
                let text = self.read_number();
                if parse_value(&text).is_none() {
                    return Err(NetworkError::lexer(line, column, format!("malformed number '{}'", text)));
                }
                Ok(token(TokenKind::Number, text))
            }
            _ if ch.is_alphabetic() || ch == '_' => Ok(token(TokenKind::Word, self.read_word())),
            _ => Err(NetworkError::lexer(
                line,
                column,
                format!("unexpected character '{}'", ch),
            )),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else if ch == '#' {
                // Skip comment until end of line
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_word(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();

        // Optional sign
        if let Some(&ch) = self.chars.peek() {
            if ch == '-' || ch == '+' {
                text.push(ch);
                self.advance();
            }
        }

        self.read_digits(&mut text);

        // Decimal part
        if let Some(&'.') = self.chars.peek() {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        // Exponent part
        if let Some(&ch) = self.chars.peek() {
            if ch == 'e' || ch == 'E' {
                text.push(ch);
                self.advance();
                if let Some(&sign) = self.chars.peek() {
                    if sign == '-' || sign == '+' {
                        text.push(sign);
                        self.advance();
                    }
                }
                self.read_digits(&mut text);
            }
        }

        // Unit suffix (p, n, u, m, k, M, G)
        if let Some(&ch) = self.chars.peek() {
            if matches!(ch, 'p' | 'n' | 'u' | 'µ' | 'm' | 'k' | 'K' | 'M' | 'G') {
                text.push(ch);
                self.advance();
            }
        }

        text
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }
}

/// Parse a number string with optional unit suffix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let last = text.chars().last()?;
    let multiplier = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => 1.0,
    };
    let digits = if multiplier != 1.0 {
        &text[..text.len() - last.len_utf8()]
    } else {
        text
    };
    digits.parse::<f64>().ok().map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_parse_value() {
        assert_relative_eq!(parse_value("10k").unwrap(), 10_000.0);
        assert_relative_eq!(parse_value("4.7u").unwrap(), 4.7e-6);
        assert_relative_eq!(parse_value("-2.5").unwrap(), -2.5);
        assert_relative_eq!(parse_value("1e-9").unwrap(), 1e-9);
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("-"), None);
    }

    #[test]
    fn test_lexer_line() {
        use TokenKind::*;
        assert_eq!(
            kinds("class: Wire; input: [0, -1.5]\n"),
            vec![
                Word, Colon, Word, Semicolon, Word, Colon, OpenBracket, Number, Comma, Number,
                CloseBracket, Newline, Eof
            ]
        );
    }

    #[test]
    fn test_lexer_comment_and_position() {
        let mut lexer = Lexer::new("# saved by phasor\n  class");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Newline);
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.text, "class");
        assert_eq!((tok.line, tok.column), (2, 3));
    }

    #[test]
    fn test_lexer_rejects_garbage() {
        let mut lexer = Lexer::new("class: $");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(NetworkError::Lexer { column: 8, .. })
        ));
    }
}
