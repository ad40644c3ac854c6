use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, trace};

use crate::ast::{Datum, Expression, Form, Program};
use crate::env::Env;
use crate::token::{Token, TokenKind, TokenValue};
use crate::value::{Closure, Function, Value, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
  Exactly(usize),
  AtLeast(usize),
}

impl fmt::Display for Arity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Arity::Exactly(n) => write!(f, "{}", n),
      Arity::AtLeast(n) => write!(f, "at least {}", n),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
  #[error("undefined identifier: {0}")]
  UndefinedIdentifier(String),

  #[error("{0} is not callable")]
  NotCallable(String),

  #[error("arity mismatch: expected {expected} arguments, got {got}")]
  ArityMismatch { expected: Arity, got: usize },

  #[error("type mismatch in {context}: expected {expected}, got {found}")]
  TypeMismatch {
    expected: ValueKind,
    found: ValueKind,
    context: String,
  },

  #[error("list error: passed '() to {0}")]
  EmptyList(&'static str),

  #[error("division by zero")]
  DivisionByZero,

  #[error("integer overflow in {0}")]
  Overflow(&'static str),
}

fn literal(token: &Token) -> Value {
  match &token.value {
    TokenValue::Number(n) => Value::Number(*n),
    TokenValue::Boolean(b) => Value::Boolean(*b),
    TokenValue::Character(c) => Value::Character(*c),
    TokenValue::String(s) => Value::string(s),
    TokenValue::None => Value::Nil,
  }
}

/// Tree-walking evaluator over a single global environment.
///
/// Definitions made by earlier forms stay in `env` across calls, also when a
/// later form fails.
#[derive(Debug)]
pub struct Evaluator {
  pub env: Rc<RefCell<Env>>,
}

impl Default for Evaluator {
  fn default() -> Self {
    Evaluator::new(Env::global().shared())
  }
}

impl Evaluator {
  pub fn new(env: Rc<RefCell<Env>>) -> Self {
    Evaluator {
      env
    }
  }

  /// Evaluates forms in order, stopping at the first error.
  pub fn evaluate_program(&self, program: &Program) -> Result<(), EvalError> {
    for form in &program.forms {
      self.evaluate_form(form)?;
    }

    Ok(())
  }

  pub fn evaluate_form(&self, form: &Form) -> Result<Value, EvalError> {
    self.eval_form(form, &self.env)
  }

  pub fn apply(&self, function: &Function, args: &[Value]) -> Result<Value, EvalError> {
    match function {
      Function::Primitive(primitive) => (primitive.call)(args),
      Function::Closure(closure) => self.call_closure(closure, args),
    }
  }

  fn eval_form(&self, form: &Form, env: &Rc<RefCell<Env>>) -> Result<Value, EvalError> {
    match form {
      Form::Definition { name, value } => {
        let value = self.eval_expression(value, env)?;
        debug!(name = %name.slice, kind = %value.kind(), "define");
        env.borrow_mut().set(&name.slice, value);
        Ok(Value::Nil)
      }
      Form::Expression(expression) => self.eval_expression(expression, env),
    }
  }

  fn eval_expression(&self, expression: &Expression, env: &Rc<RefCell<Env>>) -> Result<Value, EvalError> {
    match expression {
      Expression::Literal(token) if token.kind == TokenKind::Identifier => self.eval_identifier(&token.slice, env),
      Expression::Literal(token) => Ok(literal(token)),
      Expression::Quoted(datum) => self.eval_datum(datum, env),
      Expression::If { predicate, consequent, alternative } => {
        match self.eval_expression(predicate, env)? {
          Value::Boolean(true) => self.eval_expression(consequent, env),
          Value::Boolean(false) => self.eval_expression(alternative, env),
          other => Err(EvalError::TypeMismatch {
            expected: ValueKind::Boolean,
            found: other.kind(),
            context: "if predicate".to_owned(),
          }),
        }
      }
      Expression::Lambda(lambda) => Ok(Value::Function(Function::Closure(Rc::new(Closure {
        lambda: Rc::clone(lambda),
        env: Rc::clone(env),
      })))),
      Expression::Application { head, arguments } => self.eval_application(head, arguments, env),
    }
  }

  fn eval_identifier(&self, name: &str, env: &Rc<RefCell<Env>>) -> Result<Value, EvalError> {
    env
      .borrow()
      .get(name)
      .ok_or_else(|| EvalError::UndefinedIdentifier(name.to_owned()))
  }

  fn eval_application(&self, head: &Expression, arguments: &[Expression], env: &Rc<RefCell<Env>>) -> Result<Value, EvalError> {
    let function = match self.eval_expression(head, env)? {
      Value::Function(function) => function,
      other => return Err(EvalError::NotCallable(other.to_string())),
    };

    let args = arguments
      .iter()
      .map(|argument| self.eval_expression(argument, env))
      .collect::<Result<Vec<_>, _>>()?;

    self.apply(&function, &args)
  }

  fn call_closure(&self, closure: &Closure, args: &[Value]) -> Result<Value, EvalError> {
    let formals = &closure.lambda.formals;

    if args.len() < formals.len() {
      return Err(EvalError::ArityMismatch {
        expected: Arity::AtLeast(formals.len()),
        got: args.len(),
      });
    }

    trace!(formals = ?closure.formal_names(), "call closure");

    let mut local = Env::new_with_parent(&closure.env.borrow());
    for (formal, arg) in formals.iter().zip(args) {
      local.set(&formal.slice, arg.clone());
    }
    let local = local.shared();

    let mut result = Value::Nil;
    for expression in &closure.lambda.body {
      result = self.eval_expression(expression, &local)?;
    }

    Ok(result)
  }

  fn eval_datum(&self, datum: &Datum, env: &Rc<RefCell<Env>>) -> Result<Value, EvalError> {
    match datum {
      Datum::Atom(token) if token.kind == TokenKind::Identifier => {
        Ok(Value::Symbol(env.borrow_mut().intern(&token.slice)))
      }
      Datum::Atom(token) => Ok(literal(token)),
      Datum::List(items) => {
        let values = items
          .iter()
          .map(|item| self.eval_datum(item, env))
          .collect::<Result<Vec<_>, _>>()?;

        Ok(Value::List(values.into_iter().collect()))
      }
    }
  }
}
