use std::fmt;

use ir::{Ident, U256};
use smol_str::SmolStr;

use crate::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    Ident(Ident),
    Number(U256),
    Str(SmolStr),
    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
    Arrow,
    Walrus,
    Object,
    Code,
    Function,
    Let,
    If,
    For,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "{name}"),
            Self::Number(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "\"{value}\""),
            Self::LBrace => write!(f, "{{"),
            Self::RBrace => write!(f, "}}"),
            Self::LParen => write!(f, "("),
            Self::RParen => write!(f, ")"),
            Self::Comma => write!(f, ","),
            Self::Arrow => write!(f, "->"),
            Self::Walrus => write!(f, ":="),
            Self::Object => write!(f, "object"),
            Self::Code => write!(f, "code"),
            Self::Function => write!(f, "function"),
            Self::Let => write!(f, "let"),
            Self::If => write!(f, "if"),
            Self::For => write!(f, "for"),
        }
    }
}

pub(crate) struct Lexer<'a> {
    input: &'a [u8],
    cur: usize,
    peek: Option<(Token, usize)>,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            cur: 0,
            peek: None,
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Option<(Token, usize)>, ParseError> {
        self.peek_token()?;
        Ok(self.peek.take())
    }

    pub(crate) fn peek_token(&mut self) -> Result<Option<&(Token, usize)>, ParseError> {
        if self.peek.is_none() {
            self.peek = self.lex()?;
        }
        Ok(self.peek.as_ref())
    }

    fn lex(&mut self) -> Result<Option<(Token, usize)>, ParseError> {
        self.skip_trivia();
        let start = self.cur;
        let Some(&byte) = self.input.get(self.cur) else {
            return Ok(None);
        };

        let token = match byte {
            b'{' => self.single(Token::LBrace),
            b'}' => self.single(Token::RBrace),
            b'(' => self.single(Token::LParen),
            b')' => self.single(Token::RParen),
            b',' => self.single(Token::Comma),
            b'-' if self.input.get(self.cur + 1) == Some(&b'>') => {
                self.cur += 2;
                Token::Arrow
            }
            b':' if self.input.get(self.cur + 1) == Some(&b'=') => {
                self.cur += 2;
                Token::Walrus
            }
            b'"' => self.lex_string(start)?,
            b'0'..=b'9' => self.lex_number(start)?,
            b if is_ident_start(b) => self.lex_ident(),
            _ => {
                return Err(ParseError::UnexpectedChar {
                    ch: byte as char,
                    at: start,
                })
            }
        };
        Ok(Some((token, start)))
    }

    fn single(&mut self, token: Token) -> Token {
        self.cur += 1;
        token
    }

    fn skip_trivia(&mut self) {
        loop {
            while self
                .input
                .get(self.cur)
                .is_some_and(|b| b.is_ascii_whitespace())
            {
                self.cur += 1;
            }
            if self.input.get(self.cur) == Some(&b'/') && self.input.get(self.cur + 1) == Some(&b'/')
            {
                while self.input.get(self.cur).is_some_and(|&b| b != b'\n') {
                    self.cur += 1;
                }
            } else {
                return;
            }
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Token, ParseError> {
        self.cur += 1;
        let content_start = self.cur;
        while let Some(&b) = self.input.get(self.cur) {
            if b == b'"' {
                let content = self.text(content_start, self.cur);
                self.cur += 1;
                return Ok(Token::Str(SmolStr::from(content)));
            }
            self.cur += 1;
        }
        Err(ParseError::UnterminatedString { at: start })
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, ParseError> {
        let value = if self.input[self.cur] == b'0' && self.input.get(self.cur + 1) == Some(&b'x') {
            self.cur += 2;
            let digits_start = self.cur;
            while self
                .input
                .get(self.cur)
                .is_some_and(|b| b.is_ascii_hexdigit())
            {
                self.cur += 1;
            }
            U256::from_str_radix(self.text(digits_start, self.cur), 16).map_err(|_| ())
        } else {
            while self.input.get(self.cur).is_some_and(|b| b.is_ascii_digit()) {
                self.cur += 1;
            }
            U256::from_dec_str(self.text(start, self.cur)).map_err(|_| ())
        }
        .map_err(|_| ParseError::NumberOutOfBounds { at: start })?;
        Ok(Token::Number(value))
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.cur;
        while self.input.get(self.cur).is_some_and(|&b| is_ident_cont(b)) {
            self.cur += 1;
        }
        match self.text(start, self.cur) {
            "object" => Token::Object,
            "code" => Token::Code,
            "function" => Token::Function,
            "let" => Token::Let,
            "if" => Token::If,
            "for" => Token::For,
            ident => Token::Ident(Ident::from(ident)),
        }
    }

    fn text(&self, start: usize, end: usize) -> &'a str {
        // The lexer only slices at ascii boundaries it has itself advanced
        // over, so the range is always valid utf-8.
        std::str::from_utf8(&self.input[start..end]).unwrap_or_default()
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_cont(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b == b'.'
}
