use logos::Logos;
use thiserror::Error;
use tracing::trace;

use crate::token::{Position, Token, TokenKind, TokenValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal ({0})")]
    UnterminatedString(Position),

    #[error("empty character literal ({0})")]
    EmptyCharacterLiteral(Position),

    #[error("malformed boolean ({0})")]
    MalformedBoolean(Position),

    #[error("illegal identifier `{text}` ({position})")]
    IllegalIdentifier { text: String, position: Position },

    #[error("unknown character {ch:?} ({position})")]
    UnknownCharacter { ch: char, position: Position },

    #[error("integer literal {text} out of range ({position})")]
    IntegerOverflow { text: String, position: Position },
}

impl LexError {
    pub fn position(&self) -> Position {
        match self {
            LexError::UnterminatedString(position)
            | LexError::EmptyCharacterLiteral(position)
            | LexError::MalformedBoolean(position) => *position,
            LexError::IllegalIdentifier { position, .. }
            | LexError::UnknownCharacter { position, .. }
            | LexError::IntegerOverflow { position, .. } => *position,
        }
    }
}

/// What went wrong inside the scanner, before a position is attached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum Fault {
    #[default]
    UnknownCharacter,
    UnterminatedString,
    EmptyCharacterLiteral,
    MalformedBoolean,
    IllegalIdentifier,
    IntegerOverflow,
}

impl Fault {
    fn at(self, slice: &str, position: Position) -> LexError {
        match self {
            Fault::UnknownCharacter => LexError::UnknownCharacter {
                ch: slice.chars().next().unwrap_or_default(),
                position,
            },
            Fault::UnterminatedString => LexError::UnterminatedString(position),
            Fault::EmptyCharacterLiteral => LexError::EmptyCharacterLiteral(position),
            Fault::MalformedBoolean => LexError::MalformedBoolean(position),
            Fault::IllegalIdentifier => LexError::IllegalIdentifier {
                text: slice.to_owned(),
                position,
            },
            Fault::IntegerOverflow => LexError::IntegerOverflow {
                text: slice.to_owned(),
                position,
            },
        }
    }
}

// Only `\"` and `\\` are escapes; any other backslash pair is kept as written.
fn unescape_string(input: &str) -> String {
    let mut result = String::new();
    let mut chars = input.chars();

    chars.next();
    chars.next_back();

    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                match escaped {
                    '"' => result.push('"'),
                    '\\' => result.push('\\'),
                    _ => {
                        result.push('\\');
                        result.push(escaped);
                    }
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = Fault)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r";[^\n]*")]
enum Lexeme {
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token("'")]
    Quote,

    #[token("#(")]
    VectorStart,

    #[token("begin")]
    Begin,

    #[token("let-syntax")]
    LetSyntax,

    #[token("letrec-syntax")]
    LetrecSyntax,

    #[token("define")]
    Define,

    #[token("define-syntax")]
    DefineSyntax,

    #[token("quote")]
    QuoteKeyword,

    #[token("lambda")]
    Lambda,

    #[token("if")]
    If,

    #[token("set!")]
    Set,

    #[token("#t", |_| true)]
    #[token("#f", |_| false)]
    Boolean(bool),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().map_err(|_| Fault::IntegerOverflow))]
    Number(i64),

    #[regex(r"#\\(.|\n)", |lex| lex.slice()[2..].chars().next())]
    Character(char),

    #[regex(r#""([^"\\]|\\(.|\n))*""#, |lex| unescape_string(lex.slice()))]
    String(String),

    #[regex(r"[A-Za-z+\-*/?<>=%_][A-Za-z0-9+\-*/?<>=%_!$&:.@^~]*")]
    #[token("...")]
    Identifier,

    #[regex(r#""([^"\\]|\\(.|\n))*\\?"#, |_| { Err::<(), Fault>(Fault::UnterminatedString) })]
    #[token("#\\", |_| { Err::<(), Fault>(Fault::EmptyCharacterLiteral) })]
    #[token("#", |_| { Err::<(), Fault>(Fault::MalformedBoolean) })]
    #[regex(r"\.[A-Za-z0-9+\-*/?<>=%_!$&:.@^~]*", |_| { Err::<(), Fault>(Fault::IllegalIdentifier) })]
    Invalid,
}

/// `logos` scanner with a LIFO pushback stack.
///
/// The parser reads ahead with [`Lexer::next_token`] and returns tokens it
/// does not want yet with [`Lexer::unread`], most recently read first.
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Lexeme>,
    line_starts: Vec<usize>,
    pushback: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(index, _)| index + 1))
            .collect();

        Lexer {
            source,
            inner: Lexeme::lexer(source),
            line_starts,
            pushback: Vec::new(),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(token) = self.pushback.pop() {
            return Ok(token);
        }

        self.scan()
    }

    pub fn unread(&mut self, token: Token) {
        trace!(kind = %token.kind, position = %token.position, "unread token");
        self.pushback.push(token);
    }

    fn position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|start| *start <= offset);
        let start = self.line_starts[line - 1];

        Position::new(line, self.source[start..offset].chars().count() + 1)
    }

    fn scan(&mut self) -> Result<Token, LexError> {
        let lexeme = match self.inner.next() {
            Some(lexeme) => lexeme,
            None => {
                let end = self.position(self.source.len());
                return Ok(Token::new(TokenKind::Eof, String::new(), end));
            }
        };

        let slice = self.inner.slice().to_owned();
        let position = self.position(self.inner.span().start);
        let lexeme = lexeme.map_err(|fault| fault.at(&slice, position))?;

        let (kind, value) = match lexeme {
            Lexeme::LeftParen => (TokenKind::LeftParen, TokenValue::None),
            Lexeme::RightParen => (TokenKind::RightParen, TokenValue::None),
            Lexeme::Quote => (TokenKind::Quote, TokenValue::None),
            Lexeme::VectorStart => (TokenKind::VectorStart, TokenValue::None),
            Lexeme::Begin => (TokenKind::Begin, TokenValue::None),
            Lexeme::LetSyntax => (TokenKind::LetSyntax, TokenValue::None),
            Lexeme::LetrecSyntax => (TokenKind::LetrecSyntax, TokenValue::None),
            Lexeme::Define => (TokenKind::Define, TokenValue::None),
            Lexeme::DefineSyntax => (TokenKind::DefineSyntax, TokenValue::None),
            Lexeme::QuoteKeyword => (TokenKind::QuoteKeyword, TokenValue::None),
            Lexeme::Lambda => (TokenKind::Lambda, TokenValue::None),
            Lexeme::If => (TokenKind::If, TokenValue::None),
            Lexeme::Set => (TokenKind::Set, TokenValue::None),
            Lexeme::Boolean(b) => (TokenKind::Boolean, TokenValue::Boolean(b)),
            Lexeme::Number(n) => (TokenKind::Number, TokenValue::Number(n)),
            Lexeme::Character(c) => (TokenKind::Character, TokenValue::Character(c)),
            Lexeme::String(s) => (TokenKind::String, TokenValue::String(s)),
            Lexeme::Identifier => (TokenKind::Identifier, TokenValue::None),
            Lexeme::Invalid => return Err(Fault::UnknownCharacter.at(&slice, position)),
        };

        Ok(Token::with_value(kind, slice, value, position))
    }
}
