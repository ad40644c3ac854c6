use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Eof,

  LeftParen,
  RightParen,
  Quote,
  VectorStart,

  Begin,
  LetSyntax,
  LetrecSyntax,
  Define,
  DefineSyntax,
  QuoteKeyword,
  Lambda,
  If,
  Set,

  Boolean,
  Number,
  Character,
  String,

  Identifier,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TokenKind::Eof => "EOF",
      TokenKind::LeftParen => "LPAREN",
      TokenKind::RightParen => "RPAREN",
      TokenKind::Quote => "QUOT",
      TokenKind::VectorStart => "VSTART",
      TokenKind::Begin => "BEGIN",
      TokenKind::LetSyntax => "LET_SYNTAX",
      TokenKind::LetrecSyntax => "LETREC_SYNTAX",
      TokenKind::Define => "DEFINE",
      TokenKind::DefineSyntax => "DEFINE_SYNTAX",
      TokenKind::QuoteKeyword => "QUOTE",
      TokenKind::Lambda => "LAMBDA",
      TokenKind::If => "IF",
      TokenKind::Set => "SET",
      TokenKind::Boolean => "BOOLEAN",
      TokenKind::Number => "NUMBER",
      TokenKind::Character => "CHARACTER",
      TokenKind::String => "STRING",
      TokenKind::Identifier => "IDENT",
    };
    f.write_str(name)
  }
}

/// 1-based source location of a token's first character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
  pub line: usize,
  pub col: usize,
}

impl Position {
  pub fn new(line: usize, col: usize) -> Self {
    Position { line, col }
  }
}

impl fmt::Display for Position {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.line, self.col)
  }
}

/// Decoded payload of a literal token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
  None,
  Number(i64),
  Boolean(bool),
  Character(char),
  String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
  pub kind: TokenKind,
  pub slice: String,
  pub value: TokenValue,
  pub position: Position,
}

impl Token {
  pub fn new(kind: TokenKind, slice: String, position: Position) -> Token {
    Token {
      kind,
      slice,
      value: TokenValue::None,
      position,
    }
  }

  pub fn with_value(kind: TokenKind, slice: String, value: TokenValue, position: Position) -> Token {
    Token {
      kind,
      slice,
      value,
      position,
    }
  }
}
