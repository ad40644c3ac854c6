use std::rc::Rc;

use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub forms: Vec<Form>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    Definition {
        name: Token,
        value: Expression,
    },
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Boolean, number, character, string or identifier token.
    Literal(Token),
    Quoted(Datum),
    If {
        predicate: Box<Expression>,
        consequent: Box<Expression>,
        alternative: Box<Expression>,
    },
    Lambda(Rc<Lambda>),
    Application {
        head: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

/// Shared by every closure created from the same lambda expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub formals: Vec<Token>,
    /// Never empty.
    pub body: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Atom(Token),
    List(Vec<Datum>),
}
