use std::rc::Rc;

use crate::value::Value;

#[derive(Debug)]
pub struct Cell {
  pub value: Value,
  pub next: List,
}

// Unlinks the tail iteratively so long lists do not overflow the stack on drop.
impl Drop for Cell {
  fn drop(&mut self) {
    let mut next = std::mem::replace(&mut self.next, List::Nil);
    while let List::Cons(cell) = next {
      next = match Rc::try_unwrap(cell) {
        Ok(mut cell) => std::mem::replace(&mut cell.next, List::Nil),
        Err(_) => break,
      };
    }
  }
}

/// Singly linked, immutable cons list.
///
/// `List::Nil` is the one empty list shared by every list in the process;
/// emptiness is decided by that variant alone.
#[derive(Debug, Clone)]
pub enum List {
  Nil,
  Cons(Rc<Cell>),
}

impl List {
  pub const NIL: List = List::Nil;

  pub fn cons(value: Value, next: List) -> List {
    List::Cons(Rc::new(Cell { value, next }))
  }

  pub fn is_null(&self) -> bool {
    matches!(self, List::Nil)
  }

  pub fn car(&self) -> Option<&Value> {
    match self {
      List::Nil => None,
      List::Cons(cell) => Some(&cell.value),
    }
  }

  pub fn cdr(&self) -> Option<&List> {
    match self {
      List::Nil => None,
      List::Cons(cell) => Some(&cell.next),
    }
  }

  pub fn iter(&self) -> Iter<'_> {
    Iter { current: self }
  }

  pub fn len(&self) -> usize {
    self.iter().count()
  }

  pub fn is_empty(&self) -> bool {
    self.is_null()
  }

  /// Identity comparison: the same cell, or both the empty list.
  pub fn ptr_eq(&self, other: &List) -> bool {
    match (self, other) {
      (List::Nil, List::Nil) => true,
      (List::Cons(a), List::Cons(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl FromIterator<Value> for List {
  fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
    let values: Vec<Value> = iter.into_iter().collect();

    values
      .into_iter()
      .rev()
      .fold(List::NIL, |next, value| List::cons(value, next))
  }
}

impl PartialEq for List {
  fn eq(&self, other: &List) -> bool {
    self.ptr_eq(other) || (self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b))
  }
}

pub struct Iter<'a> {
  current: &'a List,
}

impl<'a> Iterator for Iter<'a> {
  type Item = &'a Value;

  fn next(&mut self) -> Option<Self::Item> {
    match self.current {
      List::Nil => None,
      List::Cons(cell) => {
        self.current = &cell.next;
        Some(&cell.value)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn numbers(values: &[i64]) -> List {
    values.iter().map(|n| Value::Number(*n)).collect()
  }

  #[test]
  fn test_empty_list_is_nil() {
    let empty: List = Vec::new().into_iter().collect();
    assert!(empty.is_null());
    assert!(empty.ptr_eq(&List::NIL));
    assert_eq!(empty.car(), None);
    assert!(empty.cdr().is_none());
  }

  #[test]
  fn test_car_cdr() {
    let list = numbers(&[1, 2]);
    assert!(!list.is_null());
    assert_eq!(list.car(), Some(&Value::Number(1)));

    let rest = list.cdr().unwrap();
    assert_eq!(rest.car(), Some(&Value::Number(2)));
    assert!(rest.cdr().unwrap().is_null());
  }

  #[test]
  fn test_iteration_order_and_len() {
    let list = numbers(&[3, 1, 2]);
    let collected: Vec<_> = list.iter().cloned().collect();
    assert_eq!(collected, vec![Value::Number(3), Value::Number(1), Value::Number(2)]);
    assert_eq!(list.len(), 3);
  }

  #[test]
  fn test_identity_versus_structure() {
    let a = numbers(&[1, 2]);
    let b = numbers(&[1, 2]);
    assert_eq!(a, b);
    assert!(!a.ptr_eq(&b));
    assert!(a.ptr_eq(&a.clone()));
  }

  #[test]
  fn test_dropping_a_long_list() {
    let long: List = (0..200_000).map(Value::Number).collect();
    let shared_tail = long.cdr().cloned();
    drop(long);
    assert_eq!(shared_tail.map(|tail| tail.len()), Some(199_999));
  }
}
