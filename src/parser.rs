use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::ast::{Datum, Expression, Form, Lambda, Program};
use crate::lexer::{LexError, Lexer};
use crate::token::{Position, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unexpected {} ({})", .token.kind, .token.position)]
    UnexpectedToken { token: Token },

    #[error("expected {expected}, got {} ({})", .got.kind, .got.position)]
    ExpectedToken { expected: TokenKind, got: Token },

    #[error(transparent)]
    Lex(#[from] LexError),
}

impl ParseError {
    pub fn position(&self) -> Position {
        match self {
            ParseError::UnexpectedToken { token } => token.position,
            ParseError::ExpectedToken { got, .. } => got.position,
            ParseError::Lex(err) => err.position(),
        }
    }
}

fn starts_datum(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Boolean
            | TokenKind::Number
            | TokenKind::Identifier
            | TokenKind::String
            | TokenKind::Character
            | TokenKind::LeftParen
    )
}

fn starts_expression(kind: TokenKind) -> bool {
    starts_datum(kind) || kind == TokenKind::Quote
}

/// Recursive-descent parser.
///
/// Forms starting with `(` are told apart by reading the token after the
/// parenthesis, pushing both back, and letting the chosen rule re-read them.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    /// Parentheses opened by `expect` and not yet closed in the current form.
    depth: usize,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            depth: 0,
            errors: Vec::new(),
        }
    }

    /// Parses every top-level form, skipping forms that fail to parse.
    ///
    /// Failures are recorded and available from [`Parser::errors`].
    pub fn parse(&mut self) -> Program {
        let mut forms = Vec::new();

        loop {
            match self.parse_form() {
                Ok(Some(form)) => forms.push(form),
                Ok(None) => break,
                Err(err) => self.recover(err),
            }
        }

        Program { forms }
    }

    /// Parses one top-level form, returning `None` at end of input.
    pub fn parse_form(&mut self) -> Result<Option<Form>, ParseError> {
        self.depth = 0;

        if let Some(form) = self.next_form()? {
            return Ok(Some(form));
        }

        let token = self.lexer.next_token()?;
        if token.kind == TokenKind::Eof {
            Ok(None)
        } else {
            Err(self.unexpected(token))
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    fn recover(&mut self, err: ParseError) {
        debug!("recovering from parse error: {}", err);

        let open = std::mem::take(&mut self.depth);
        let lexical = matches!(err, ParseError::Lex(_));
        self.errors.push(err);
        self.synchronize(open, lexical);
    }

    /// Discards the rest of the failed top-level form: everything up to and
    /// including the `)` matching its first `(`, or up to end of input.
    fn synchronize(&mut self, mut open: usize, lexical: bool) {
        if open == 0 {
            // A lexical error has already consumed its input; any other
            // error pushed the offending token back.
            if lexical {
                return;
            }

            match self.lexer.next_token() {
                Ok(token) if matches!(token.kind, TokenKind::LeftParen | TokenKind::VectorStart) => open = 1,
                _ => return,
            }
        }

        loop {
            match self.lexer.next_token() {
                Ok(token) => match token.kind {
                    TokenKind::LeftParen | TokenKind::VectorStart => open += 1,
                    TokenKind::RightParen => {
                        open -= 1;
                        if open == 0 {
                            return;
                        }
                    }
                    TokenKind::Eof => {
                        self.lexer.unread(token);
                        return;
                    }
                    _ => {}
                },
                Err(err) => debug!("skipping during recovery: {}", err),
            }
        }
    }

    fn next_form(&mut self) -> Result<Option<Form>, ParseError> {
        let token = self.lexer.next_token()?;

        if token.kind != TokenKind::LeftParen {
            self.lexer.unread(token);
            return Ok(self.next_expression()?.map(Form::Expression));
        }

        let next = self.second_token()?;
        let kind = next.kind;
        self.lexer.unread(next);
        self.lexer.unread(token);

        match kind {
            TokenKind::Define => self.variable_definition().map(Some),
            _ => self.expression().map(|expression| Some(Form::Expression(expression))),
        }
    }

    fn variable_definition(&mut self) -> Result<Form, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        self.expect(TokenKind::Define)?;
        let name = self.expect(TokenKind::Identifier)?;
        let value = self.expression()?;
        self.expect(TokenKind::RightParen)?;

        Ok(Form::Definition { name, value })
    }

    fn next_expression(&mut self) -> Result<Option<Expression>, ParseError> {
        let token = self.lexer.next_token()?;
        let kind = token.kind;
        self.lexer.unread(token);

        if starts_expression(kind) {
            self.expression().map(Some)
        } else {
            Ok(None)
        }
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let token = self.lexer.next_token()?;

        match token.kind {
            TokenKind::Boolean
            | TokenKind::Number
            | TokenKind::Identifier
            | TokenKind::String
            | TokenKind::Character => Ok(Expression::Literal(token)),
            TokenKind::Quote => {
                self.lexer.unread(token);
                self.quoted()
            }
            TokenKind::LeftParen => {
                let next = self.second_token()?;
                let kind = next.kind;
                self.lexer.unread(next);
                self.lexer.unread(token);

                match kind {
                    TokenKind::Lambda => self.lambda(),
                    TokenKind::If => self.if_expression(),
                    TokenKind::QuoteKeyword => self.quote_form(),
                    _ => self.application(),
                }
            }
            _ => Err(self.unexpected(token)),
        }
    }

    fn application(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        let head = self.expression()?;

        let mut arguments = Vec::new();
        while let Some(argument) = self.next_expression()? {
            arguments.push(argument);
        }
        self.expect(TokenKind::RightParen)?;

        Ok(Expression::Application {
            head: Box::new(head),
            arguments,
        })
    }

    fn if_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        self.expect(TokenKind::If)?;
        let predicate = self.expression()?;
        let consequent = self.expression()?;
        let alternative = self.expression()?;
        self.expect(TokenKind::RightParen)?;

        Ok(Expression::If {
            predicate: Box::new(predicate),
            consequent: Box::new(consequent),
            alternative: Box::new(alternative),
        })
    }

    fn lambda(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        self.expect(TokenKind::Lambda)?;
        let formals = self.formals()?;
        let body = self.body()?;
        self.expect(TokenKind::RightParen)?;

        Ok(Expression::Lambda(Rc::new(Lambda { formals, body })))
    }

    fn formals(&mut self) -> Result<Vec<Token>, ParseError> {
        self.expect(TokenKind::LeftParen)?;

        let mut formals = Vec::new();
        while let Some(token) = self.matches(TokenKind::Identifier)? {
            formals.push(token);
        }
        self.expect(TokenKind::RightParen)?;

        Ok(formals)
    }

    fn body(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut body = vec![self.expression()?];

        while let Some(expression) = self.next_expression()? {
            body.push(expression);
        }

        Ok(body)
    }

    fn quoted(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::Quote)?;
        let datum = self.datum()?;

        Ok(Expression::Quoted(datum))
    }

    fn quote_form(&mut self) -> Result<Expression, ParseError> {
        self.expect(TokenKind::LeftParen)?;
        self.expect(TokenKind::QuoteKeyword)?;
        let datum = self.datum()?;
        self.expect(TokenKind::RightParen)?;

        Ok(Expression::Quoted(datum))
    }

    fn next_datum(&mut self) -> Result<Option<Datum>, ParseError> {
        let token = self.lexer.next_token()?;
        let kind = token.kind;
        self.lexer.unread(token);

        if starts_datum(kind) {
            self.datum().map(Some)
        } else {
            Ok(None)
        }
    }

    fn datum(&mut self) -> Result<Datum, ParseError> {
        let token = self.lexer.next_token()?;

        match token.kind {
            TokenKind::Boolean
            | TokenKind::Number
            | TokenKind::Identifier
            | TokenKind::String
            | TokenKind::Character => Ok(Datum::Atom(token)),
            TokenKind::LeftParen => {
                self.lexer.unread(token);
                self.list()
            }
            _ => Err(self.unexpected(token)),
        }
    }

    fn list(&mut self) -> Result<Datum, ParseError> {
        self.expect(TokenKind::LeftParen)?;

        let mut data = Vec::new();
        while let Some(datum) = self.next_datum()? {
            data.push(datum);
        }
        self.expect(TokenKind::RightParen)?;

        Ok(Datum::List(data))
    }

    /// Reads the token after an opening parenthesis. On failure the
    /// parenthesis is already consumed, so it counts as open.
    fn second_token(&mut self) -> Result<Token, ParseError> {
        match self.lexer.next_token() {
            Ok(token) => Ok(token),
            Err(err) => {
                self.depth += 1;
                Err(err.into())
            }
        }
    }

    fn unexpected(&mut self, token: Token) -> ParseError {
        self.lexer.unread(token.clone());
        ParseError::UnexpectedToken { token }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.lexer.next_token()?;

        if token.kind != kind {
            self.lexer.unread(token.clone());
            return Err(ParseError::ExpectedToken { expected: kind, got: token });
        }

        match kind {
            TokenKind::LeftParen => self.depth += 1,
            TokenKind::RightParen => self.depth = self.depth.saturating_sub(1),
            _ => {}
        }

        Ok(token)
    }

    fn matches(&mut self, kind: TokenKind) -> Result<Option<Token>, ParseError> {
        let token = self.lexer.next_token()?;

        if token.kind == kind {
            Ok(Some(token))
        } else {
            self.lexer.unread(token);
            Ok(None)
        }
    }
}
