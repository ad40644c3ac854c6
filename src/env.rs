use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::builtin::builtin;
use crate::value::{Symbol, Value};

type Bindings = HashMap<String, Value>;
type Symbols = HashMap<String, Symbol>;

/// Identifier bindings plus the symbol table for quoted identifiers.
///
/// A child environment starts as a copy of its parent and never looks back
/// at it: later changes on either side stay local.
#[derive(Debug, Clone, Default)]
pub struct Env {
  bindings: Bindings,
  symbols: Symbols,
}

impl Env {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from(bindings: Bindings) -> Self {
    Self {
      bindings,
      symbols: HashMap::new(),
    }
  }

  /// Global environment seeded with the primitive functions.
  pub fn global() -> Self {
    Self::from(builtin())
  }

  pub fn new_with_parent(parent: &Env) -> Self {
    Self {
      bindings: parent.bindings.clone(),
      symbols: parent.symbols.clone(),
    }
  }

  pub fn shared(self) -> Rc<RefCell<Env>> {
    Rc::new(RefCell::new(self))
  }

  pub fn get(&self, name: &str) -> Option<Value> {
    self.bindings.get(name).cloned()
  }

  pub fn set(&mut self, name: &str, value: Value) {
    self.bindings.insert(name.to_owned(), value);
  }

  pub fn symget(&self, name: &str) -> Option<Symbol> {
    self.symbols.get(name).cloned()
  }

  pub fn symset(&mut self, name: &str) -> Symbol {
    let symbol = Symbol::fresh(name);
    self.symbols.insert(name.to_owned(), symbol.clone());
    symbol
  }

  pub fn intern(&mut self, name: &str) -> Symbol {
    match self.symget(name) {
      Some(symbol) => symbol,
      None => self.symset(name),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_set_and_get() {
    let mut env = Env::new();
    assert_eq!(env.get("x"), None);

    env.set("x", Value::Number(1));
    env.set("x", Value::Number(2));
    assert_eq!(env.get("x"), Some(Value::Number(2)));
  }

  #[test]
  fn test_child_is_a_snapshot() {
    let mut parent = Env::new();
    parent.set("x", Value::Number(1));

    let mut child = Env::new_with_parent(&parent);
    parent.set("y", Value::Number(2));
    child.set("x", Value::Number(10));

    assert_eq!(child.get("y"), None);
    assert_eq!(parent.get("x"), Some(Value::Number(1)));
    assert_eq!(child.get("x"), Some(Value::Number(10)));
  }

  #[test]
  fn test_interning() {
    let mut env = Env::new();
    assert!(env.symget("a").is_none());

    let first = env.intern("a");
    let second = env.intern("a");
    assert_eq!(first, second);

    let mut child = Env::new_with_parent(&env);
    assert_eq!(child.intern("a"), first);

    let mut other = Env::new();
    assert_ne!(other.intern("a"), first);
  }

  #[test]
  fn test_symset_always_mints() {
    let mut env = Env::new();
    let first = env.symset("a");
    let second = env.symset("a");
    assert_ne!(first, second);
    assert_eq!(env.symget("a"), Some(second));
  }

  #[test]
  fn test_global_has_primitives() {
    let env = Env::global();
    for name in ["+", "-", "*", "/", "=", ">=", "<=", ">", "<", "and", "or", "not", "car", "cdr", "null?", "eq?"] {
      assert!(matches!(env.get(name), Some(Value::Function(_))), "{}", name);
    }
  }
}
