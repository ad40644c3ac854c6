use std::fmt;
use std::fmt::{Formatter, Write};

use crate::list::List;
use crate::value::{Function, Value};

pub fn to_text(value: &Value) -> String {
  value.to_string()
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Value::Nil => f.write_str("nil"),
      Value::Number(n) => write!(f, "{}", n),
      Value::Boolean(true) => f.write_str("#t"),
      Value::Boolean(false) => f.write_str("#f"),
      Value::Character(c) => f.write_char(*c),
      Value::String(s) => f.write_str(s),
      Value::Symbol(symbol) => f.write_str(symbol.name()),
      Value::List(list) => write!(f, "{}", list),
      Value::Function(function) => write!(f, "{}", function),
    }
  }
}

impl fmt::Display for List {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_char('(')?;
    for (index, value) in self.iter().enumerate() {
      if index > 0 {
        f.write_char(' ')?;
      }
      write!(f, "{}", value)?;
    }
    f.write_char(')')
  }
}

impl fmt::Display for Function {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Function::Primitive(primitive) => write!(f, "{}() {{ [native code] }}", primitive.name),
      Function::Closure(closure) => write!(f, "lambda({}) {{ ... }}", closure.formal_names().join(" ")),
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::evaluator::Evaluator;
  use crate::list::List;
  use crate::printer::to_text;
  use crate::value::{Symbol, Value};

  fn eval(input: &str) -> String {
    let value = crate::run(&Evaluator::default(), input).unwrap();
    to_text(&value)
  }

  #[test]
  fn test_atoms() {
    assert_eq!(to_text(&Value::Nil), "nil");
    assert_eq!(to_text(&Value::Number(-12)), "-12");
    assert_eq!(to_text(&Value::Boolean(true)), "#t");
    assert_eq!(to_text(&Value::Boolean(false)), "#f");
    assert_eq!(to_text(&Value::Character('x')), "x");
    assert_eq!(to_text(&Value::string("hi there")), "hi there");
    assert_eq!(to_text(&Value::Symbol(Symbol::fresh("foo"))), "foo");
  }

  #[test]
  fn test_lists() {
    assert_eq!(to_text(&Value::List(List::NIL)), "()");
    assert_eq!(eval("'(1 2 3)"), "(1 2 3)");
    assert_eq!(eval("'(1 (2 (3 ())) #t a)"), "(1 (2 (3 ())) #t a)");
    assert_eq!(eval("(cdr '(1))"), "()");
  }

  #[test]
  fn test_functions() {
    assert_eq!(eval("car"), "car() { [native code] }");
    assert_eq!(eval("(lambda (x y) x)"), "lambda(x y) { ... }");
    assert_eq!(eval("(lambda () 1)"), "lambda() { ... }");
  }

  #[test]
  fn test_definition_prints_nil() {
    assert_eq!(eval("(define x 1)"), "nil");
  }

  #[test]
  fn test_long_lists_print_without_deep_recursion() {
    let list: List = (0..10_000).map(Value::Number).collect();
    let text = to_text(&Value::List(list));
    assert!(text.starts_with("(0 1 2 "));
    assert!(text.ends_with(" 9999)"));
  }
}
