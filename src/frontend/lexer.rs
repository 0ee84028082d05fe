//! Lexer for annotated Squirrel
//!
//! Converts source code into a stream of tokens. Every token keeps its
//! source text so the parse tree can reconstruct node text.

use crate::frontend::token::{Token, TokenKind};
use crate::utils::{Error, Position, Result, Span};

/// The lexer state
pub struct Lexer {
    /// Source code as chars
    source: Vec<char>,
    /// Current position in source
    pos: usize,
    /// Start position of current token
    start: usize,
    /// Current line (1-based)
    line: u32,
    /// Offset of the first char of the current line
    line_start: usize,
    /// Position of the current token's first char
    token_position: Position,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            pos: 0,
            start: 0,
            line: 1,
            line_start: 0,
            token_position: Position::new(1, 0),
        }
    }

    /// Get the current character without advancing
    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    /// Get the next character without advancing
    fn peek_next(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    /// Advance to the next character
    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        if c == Some('\n') {
            self.line += 1;
            self.line_start = self.pos;
        }
        c
    }

    fn advance_if(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Check if we've reached the end of input
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, (self.pos - self.line_start) as u32)
    }

    /// Create a span from start to current position
    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos, self.token_position)
    }

    /// Create a token with the current span and text
    fn make_token(&self, kind: TokenKind) -> Token {
        let text: String = self.source[self.start..self.pos].iter().collect();
        Token::new(kind, text, self.make_span())
    }

    /// Skip whitespace and comments
    fn skip_whitespace(&mut self) -> Result<()> {
        while let Some(c) = self.peek() {
            match c {
                // Whitespace
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                // Line comment
                '/' if self.peek_next() == Some('/') => self.skip_line(),
                '#' => self.skip_line(),
                // Block comment
                '/' if self.peek_next() == Some('*') => self.skip_block_comment()?,
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        self.start = self.pos;
        self.token_position = self.current_position();
        self.advance(); // skip /
        self.advance(); // skip *
        loop {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(Error::UnterminatedComment { span: self.make_span() }),
            }
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        // Check if it's a keyword
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Ident(text));

        self.make_token(kind)
    }

    /// Read a number literal (integer or float)
    fn read_number(&mut self) -> Token {
        // Check for hex literal
        if self.peek() == Some('0') && matches!(self.peek_next(), Some('x') | Some('X')) {
            self.advance(); // 0
            self.advance(); // x

            while let Some(c) = self.peek() {
                if c.is_ascii_hexdigit() {
                    self.advance();
                } else {
                    break;
                }
            }

            let text: String = self.source[self.start + 2..self.pos].iter().collect();
            let value = i64::from_str_radix(&text, 16).unwrap_or(0);
            return self.make_token(TokenKind::IntLit(value));
        }

        // Regular decimal number
        let mut is_float = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.advance();
            } else {
                break;
            }
        }

        // Check for decimal point
        if self.peek() == Some('.') && self.peek_next().map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            self.advance(); // consume '.'

            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Check for exponent
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_float = true;
            self.advance();

            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }

            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        let text: String = self.source[self.start..self.pos].iter().collect();

        if is_float {
            let value = text.parse().unwrap_or(0.0);
            self.make_token(TokenKind::FloatLit(value))
        } else {
            let value = text.parse().unwrap_or(0);
            self.make_token(TokenKind::IntLit(value))
        }
    }

    /// Read a string literal; `verbatim` strings (`@"..."`) have no escapes
    /// and may span lines, with `""` standing for one quote
    fn read_string(&mut self, verbatim: bool) -> Result<Token> {
        self.advance(); // consume opening quote

        let mut value = String::new();

        loop {
            match self.peek() {
                None => return Err(Error::UnterminatedString { span: self.make_span() }),
                Some('"') => {
                    self.advance();
                    if verbatim && self.peek() == Some('"') {
                        self.advance();
                        value.push('"');
                        continue;
                    }
                    break;
                }
                Some('\n') if !verbatim => {
                    return Err(Error::UnterminatedString { span: self.make_span() });
                }
                Some('\\') if !verbatim => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some('0') => value.push('\0'),
                        Some(c) => value.push(c),
                        None => return Err(Error::UnterminatedString { span: self.make_span() }),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        Ok(self.make_token(TokenKind::StringLit(value)))
    }

    /// Read a character literal
    fn read_char(&mut self) -> Result<Token> {
        self.advance(); // consume opening quote

        let c = match self.advance() {
            Some('\\') => match self.advance() {
                Some('n') => '\n',
                Some('r') => '\r',
                Some('t') => '\t',
                Some('0') => '\0',
                Some(c) => c,
                None => return Err(Error::UnterminatedString { span: self.make_span() }),
            },
            Some(c) => c,
            None => return Err(Error::UnterminatedString { span: self.make_span() }),
        };

        if !self.advance_if('\'') {
            return Err(Error::UnterminatedString { span: self.make_span() });
        }

        Ok(self.make_token(TokenKind::CharLit(c)))
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace()?;
        self.start = self.pos;
        self.token_position = self.current_position();

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::eof(self.make_span())),
        };

        // Identifiers and keywords
        if c.is_alphabetic() || c == '_' {
            return Ok(self.read_identifier());
        }

        // Numbers
        if c.is_ascii_digit() {
            return Ok(self.read_number());
        }

        // String literals
        if c == '"' {
            return self.read_string(false);
        }
        if c == '@' && self.peek_next() == Some('"') {
            self.advance(); // consume '@'
            return self.read_string(true);
        }

        // Character literals
        if c == '\'' {
            return self.read_char();
        }

        self.advance();

        // Operators and punctuation
        let kind = match c {
            '+' => {
                if self.advance_if('=') {
                    TokenKind::PlusEq
                } else if self.advance_if('+') {
                    TokenKind::PlusPlus
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.advance_if('=') {
                    TokenKind::MinusEq
                } else if self.advance_if('-') {
                    TokenKind::MinusMinus
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.advance_if('=') {
                    TokenKind::StarEq
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.advance_if('=') {
                    TokenKind::SlashEq
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.advance_if('=') {
                    TokenKind::PercentEq
                } else {
                    TokenKind::Percent
                }
            }
            '=' => {
                if self.advance_if('=') {
                    TokenKind::EqEq
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.advance_if('=') {
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.advance_if('=') {
                    if self.advance_if('>') {
                        TokenKind::Cmp
                    } else {
                        TokenKind::Le
                    }
                } else if self.advance_if('<') {
                    TokenKind::Shl
                } else if self.advance_if('-') {
                    TokenKind::NewSlot
                } else {
                    TokenKind::Lt
                }
            }
            '>' => {
                if self.advance_if('=') {
                    TokenKind::Ge
                } else if self.advance_if('>') {
                    if self.advance_if('>') {
                        TokenKind::UShr
                    } else {
                        TokenKind::Shr
                    }
                } else {
                    TokenKind::Gt
                }
            }
            '&' => {
                if self.advance_if('&') {
                    TokenKind::AndAnd
                } else {
                    TokenKind::And
                }
            }
            '|' => {
                if self.advance_if('|') {
                    TokenKind::OrOr
                } else {
                    TokenKind::Or
                }
            }
            '^' => TokenKind::Caret,
            '~' => TokenKind::Tilde,
            '.' => {
                if self.peek() == Some('.') && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            ':' => {
                if self.advance_if(':') {
                    TokenKind::ColonColon
                } else {
                    TokenKind::Colon
                }
            }
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '?' => TokenKind::Question,
            other => {
                return Err(Error::UnexpectedChar {
                    ch: other,
                    span: self.make_span(),
                })
            }
        };

        Ok(self.make_token(kind))
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_local_declaration() {
        let tokens = kinds("local x: int = 5;");

        assert!(matches!(tokens[0], TokenKind::Local));
        assert!(matches!(tokens[1], TokenKind::Ident(ref s) if s == "x"));
        assert!(matches!(tokens[2], TokenKind::Colon));
        assert!(matches!(tokens[3], TokenKind::Ident(ref s) if s == "int"));
        assert!(matches!(tokens[4], TokenKind::Eq));
        assert!(matches!(tokens[5], TokenKind::IntLit(5)));
        assert!(matches!(tokens[6], TokenKind::Semicolon));
        assert!(matches!(tokens[7], TokenKind::Eof));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 3.14 0xFF 1e3");

        assert!(matches!(tokens[0], TokenKind::IntLit(42)));
        assert!(matches!(tokens[1], TokenKind::FloatLit(f) if (f - 3.14).abs() < 0.001));
        assert!(matches!(tokens[2], TokenKind::IntLit(0xFF)));
        assert!(matches!(tokens[3], TokenKind::FloatLit(f) if (f - 1000.0).abs() < 0.001));
    }

    #[test]
    fn test_strings_keep_source_text() {
        let tokens = Lexer::new(r#""hello\nworld" @"C:\dir""#).tokenize().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::StringLit(ref s) if s == "hello\nworld"));
        assert_eq!(tokens[0].text, r#""hello\nworld""#);
        assert!(matches!(tokens[1].kind, TokenKind::StringLit(ref s) if s == r"C:\dir"));
        assert_eq!(tokens[1].text, r#"@"C:\dir""#);
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("a <- b <=> c >>> d ... ::e ++");

        assert!(matches!(tokens[1], TokenKind::NewSlot));
        assert!(matches!(tokens[3], TokenKind::Cmp));
        assert!(matches!(tokens[5], TokenKind::UShr));
        assert!(matches!(tokens[7], TokenKind::DotDotDot));
        assert!(matches!(tokens[8], TokenKind::ColonColon));
        assert!(matches!(tokens[10], TokenKind::PlusPlus));
    }

    #[test]
    fn test_comments_and_positions() {
        let source = "// header\n# hash comment\n/* block\n */ local y";
        let tokens = Lexer::new(source).tokenize().unwrap();

        assert!(matches!(tokens[0].kind, TokenKind::Local));
        assert_eq!(tokens[0].span.position, Position::new(4, 4));
        assert_eq!(tokens[1].span.position, Position::new(4, 10));
    }

    #[test]
    fn test_lex_errors() {
        assert!(matches!(
            Lexer::new("\"open").tokenize(),
            Err(Error::UnterminatedString { .. })
        ));
        assert!(matches!(
            Lexer::new("local $x").tokenize(),
            Err(Error::UnexpectedChar { ch: '$', .. })
        ));
        match Lexer::new("local x\n/* never closed\n local y").tokenize() {
            Err(err @ Error::UnterminatedComment { .. }) => {
                assert_eq!(err.position(), Some(Position::new(2, 0)));
            }
            other => panic!("expected unterminated comment, got {:?}", other),
        }
    }
}
