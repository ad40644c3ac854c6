use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ast::Lambda;
use crate::env::Env;
use crate::evaluator::EvalError;
use crate::list::List;

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Nil,
  Number(i64),
  Boolean(bool),
  Character(char),
  String(Rc<str>),
  Symbol(Symbol),
  List(List),
  Function(Function),
}

impl Value {
  pub fn string(text: &str) -> Value {
    Value::String(Rc::from(text))
  }

  pub fn kind(&self) -> ValueKind {
    match self {
      Value::Nil => ValueKind::Nil,
      Value::Number(_) => ValueKind::Number,
      Value::Boolean(_) => ValueKind::Boolean,
      Value::Character(_) => ValueKind::Character,
      Value::String(_) => ValueKind::String,
      Value::Symbol(_) => ValueKind::Symbol,
      Value::List(_) => ValueKind::List,
      Value::Function(_) => ValueKind::Function,
    }
  }

  /// `eq?`: compound values compare by identity, atoms by value.
  pub fn is_eq(&self, other: &Value) -> bool {
    match (self, other) {
      (Value::List(a), Value::List(b)) => a.ptr_eq(b),
      (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
      _ => self == other,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
  Nil,
  Number,
  Boolean,
  Character,
  String,
  Symbol,
  List,
  Function,
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ValueKind::Nil => "nil",
      ValueKind::Number => "number",
      ValueKind::Boolean => "boolean",
      ValueKind::Character => "character",
      ValueKind::String => "string",
      ValueKind::Symbol => "symbol",
      ValueKind::List => "list",
      ValueKind::Function => "function",
    };
    f.write_str(name)
  }
}

/// Interned identifier. Equality is identity: two symbols with the same
/// name minted by separate `Env::symset` calls are different symbols.
#[derive(Debug, Clone)]
pub struct Symbol {
  name: Rc<str>,
  identity: u64,
}

impl Symbol {
  pub fn fresh(name: &str) -> Self {
    Symbol {
      name: Rc::from(name),
      identity: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl PartialEq for Symbol {
  fn eq(&self, other: &Symbol) -> bool {
    self.identity == other.identity
  }
}

impl Eq for Symbol {}

pub type NativeFn = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

pub struct Primitive {
  pub name: String,
  pub call: NativeFn,
}

pub struct Closure {
  pub lambda: Rc<Lambda>,
  pub env: Rc<RefCell<Env>>,
}

impl Closure {
  pub fn formal_names(&self) -> Vec<&str> {
    self.lambda.formals.iter().map(|token| token.slice.as_str()).collect()
  }
}

#[derive(Clone)]
pub enum Function {
  Primitive(Rc<Primitive>),
  Closure(Rc<Closure>),
}

impl Function {
  pub fn primitive(name: &str, call: NativeFn) -> Self {
    Function::Primitive(Rc::new(Primitive {
      name: name.to_owned(),
      call,
    }))
  }

  pub fn ptr_eq(&self, other: &Function) -> bool {
    match (self, other) {
      (Function::Primitive(a), Function::Primitive(b)) => Rc::ptr_eq(a, b),
      (Function::Closure(a), Function::Closure(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl PartialEq for Function {
  fn eq(&self, other: &Function) -> bool {
    self.ptr_eq(other)
  }
}

// Closures reach their environment, which usually holds the closure itself.
impl fmt::Debug for Function {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Function::Primitive(primitive) => write!(f, "Primitive({})", primitive.name),
      Function::Closure(closure) => write!(f, "Closure({:?})", closure.formal_names()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_symbols_compare_by_identity() {
    let a = Symbol::fresh("a");
    let b = Symbol::fresh("a");
    assert_eq!(a.name(), b.name());
    assert_ne!(a, b);
    assert_eq!(a, a.clone());
  }

  #[test]
  fn test_is_eq() {
    assert!(Value::Number(1).is_eq(&Value::Number(1)));
    assert!(Value::string("x").is_eq(&Value::string("x")));
    assert!(Value::List(List::NIL).is_eq(&Value::List(List::NIL)));

    let a: List = vec![Value::Number(1)].into_iter().collect();
    let b: List = vec![Value::Number(1)].into_iter().collect();
    assert!(!Value::List(a.clone()).is_eq(&Value::List(b.clone())));
    assert!(Value::List(a.clone()).is_eq(&Value::List(a)));
    assert_eq!(Value::List(b.clone()), Value::List(b));
  }

  #[test]
  fn test_kinds() {
    assert_eq!(Value::Nil.kind(), ValueKind::Nil);
    assert_eq!(Value::Character('a').kind().to_string(), "character");
    assert_eq!(Value::List(List::NIL).kind().to_string(), "list");
  }
}
