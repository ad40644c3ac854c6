use std::collections::HashMap;
use std::rc::Rc;

use chrono::Local;

use crate::evaluator::{Arity, EvalError};
use crate::list::List;
use crate::value::{Function, NativeFn, Value, ValueKind};

pub fn builtin() -> HashMap<String, Value> {
  let mut builtins = HashMap::new();
  let mut define = |name: &str, call: NativeFn| {
    builtins.insert(name.to_owned(), Value::Function(Function::primitive(name, call)));
  };

  define("+", num_only(builtin_add));
  define("-", at_least(1, num_only(builtin_subtract)));
  define("*", num_only(builtin_multiply));
  define("/", at_least(1, num_only(builtin_divide)));
  define("=", compare(i64::eq));
  define(">=", compare(i64::ge));
  define("<=", compare(i64::le));
  define(">", compare(i64::gt));
  define("<", compare(i64::lt));
  define("and", bool_only(|args| Ok(Value::Boolean(args.iter().all(|b| *b)))));
  define("or", bool_only(|args| Ok(Value::Boolean(args.iter().any(|b| *b)))));
  define("not", arity(1, bool_only(|args| Ok(Value::Boolean(!args[0])))));
  define("car", arity(1, native(builtin_car)));
  define("cdr", arity(1, native(builtin_cdr)));
  define("null?", arity(1, native(builtin_is_null)));
  define("eq?", arity(2, native(|args| Ok(Value::Boolean(args[0].is_eq(&args[1]))))));
  define("p", native(builtin_print));
  define("time", arity(0, native(builtin_time)));

  builtins
}

pub fn native(call: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static) -> NativeFn {
  Rc::new(call)
}

/// Rejects calls with anything but exactly `n` arguments.
pub fn arity(n: usize, call: NativeFn) -> NativeFn {
  Rc::new(move |args: &[Value]| {
    if args.len() != n {
      return Err(EvalError::ArityMismatch { expected: Arity::Exactly(n), got: args.len() });
    }
    call(args)
  })
}

pub fn at_least(n: usize, call: NativeFn) -> NativeFn {
  Rc::new(move |args: &[Value]| {
    if args.len() < n {
      return Err(EvalError::ArityMismatch { expected: Arity::AtLeast(n), got: args.len() });
    }
    call(args)
  })
}

pub fn num_only(call: impl Fn(&[i64]) -> Result<Value, EvalError> + 'static) -> NativeFn {
  Rc::new(move |args: &[Value]| {
    let numbers = args
      .iter()
      .enumerate()
      .map(|(index, arg)| match arg {
        Value::Number(n) => Ok(*n),
        other => Err(mismatch(ValueKind::Number, other, index)),
      })
      .collect::<Result<Vec<_>, _>>()?;
    call(&numbers)
  })
}

pub fn bool_only(call: impl Fn(&[bool]) -> Result<Value, EvalError> + 'static) -> NativeFn {
  Rc::new(move |args: &[Value]| {
    let booleans = args
      .iter()
      .enumerate()
      .map(|(index, arg)| match arg {
        Value::Boolean(b) => Ok(*b),
        other => Err(mismatch(ValueKind::Boolean, other, index)),
      })
      .collect::<Result<Vec<_>, _>>()?;
    call(&booleans)
  })
}

fn mismatch(expected: ValueKind, found: &Value, index: usize) -> EvalError {
  EvalError::TypeMismatch {
    expected,
    found: found.kind(),
    context: format!("argument {}", index + 1),
  }
}

fn compare(op: fn(&i64, &i64) -> bool) -> NativeFn {
  arity(2, num_only(move |args| Ok(Value::Boolean(op(&args[0], &args[1])))))
}

fn sum(args: &[i64], op: &'static str) -> Result<i64, EvalError> {
  args
    .iter()
    .try_fold(0i64, |acc, n| acc.checked_add(*n))
    .ok_or(EvalError::Overflow(op))
}

fn product(args: &[i64], op: &'static str) -> Result<i64, EvalError> {
  args
    .iter()
    .try_fold(1i64, |acc, n| acc.checked_mul(*n))
    .ok_or(EvalError::Overflow(op))
}

fn builtin_add(args: &[i64]) -> Result<Value, EvalError> {
  sum(args, "+").map(Value::Number)
}

fn builtin_multiply(args: &[i64]) -> Result<Value, EvalError> {
  product(args, "*").map(Value::Number)
}

fn builtin_subtract(args: &[i64]) -> Result<Value, EvalError> {
  let rest = sum(&args[1..], "-")?;
  args[0]
    .checked_sub(rest)
    .map(Value::Number)
    .ok_or(EvalError::Overflow("-"))
}

fn builtin_divide(args: &[i64]) -> Result<Value, EvalError> {
  let divisor = product(&args[1..], "/")?;
  if divisor == 0 {
    return Err(EvalError::DivisionByZero);
  }
  args[0]
    .checked_div(divisor)
    .map(Value::Number)
    .ok_or(EvalError::Overflow("/"))
}

fn list_argument(args: &[Value]) -> Result<&List, EvalError> {
  match &args[0] {
    Value::List(list) => Ok(list),
    other => Err(mismatch(ValueKind::List, other, 0)),
  }
}

fn builtin_car(args: &[Value]) -> Result<Value, EvalError> {
  list_argument(args)?
    .car()
    .cloned()
    .ok_or(EvalError::EmptyList("car"))
}

fn builtin_cdr(args: &[Value]) -> Result<Value, EvalError> {
  list_argument(args)?
    .cdr()
    .cloned()
    .map(Value::List)
    .ok_or(EvalError::EmptyList("cdr"))
}

fn builtin_is_null(args: &[Value]) -> Result<Value, EvalError> {
  Ok(Value::Boolean(matches!(&args[0], Value::List(list) if list.is_null())))
}

fn builtin_print(args: &[Value]) -> Result<Value, EvalError> {
  println!("{}", args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(" "));

  Ok(Value::Nil)
}

fn builtin_time(_: &[Value]) -> Result<Value, EvalError> {
  Ok(Value::Number(Local::now().timestamp_millis()))
}
