/// Collects interactive input until the parentheses balance.
///
/// Parentheses inside string literals, `;` comments and `#\(` or `#\)`
/// character literals do not count.
#[derive(Debug, Default)]
pub struct LineBuffer {
  lines: Vec<String>,
  depth: i64,
  in_string: bool,
}

impl LineBuffer {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a line. Returns the complete source once the depth drops to zero
  /// or below, and resets for the next entry.
  pub fn push(&mut self, line: &str) -> Option<String> {
    self.scan(line);
    self.lines.push(line.to_owned());

    if self.depth > 0 || self.in_string {
      return None;
    }

    let source = self.lines.join("\n");
    self.clear();

    if source.trim().is_empty() {
      None
    } else {
      Some(source)
    }
  }

  pub fn depth(&self) -> i64 {
    self.depth
  }

  pub fn is_empty(&self) -> bool {
    self.lines.is_empty()
  }

  pub fn clear(&mut self) {
    self.lines.clear();
    self.depth = 0;
    self.in_string = false;
  }

  /// `> ` for a fresh entry, `N? ` plus indentation while inside a form.
  pub fn prompt(&self) -> String {
    if self.is_empty() {
      "> ".to_owned()
    } else {
      let depth = self.depth.max(0) as usize;
      format!("{}? {}", depth, "  ".repeat(depth))
    }
  }

  fn scan(&mut self, line: &str) {
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
      if self.in_string {
        match c {
          '\\' => {
            chars.next();
          }
          '"' => self.in_string = false,
          _ => {}
        }
        continue;
      }

      match c {
        '(' => self.depth += 1,
        ')' => self.depth -= 1,
        '"' => self.in_string = true,
        ';' => break,
        '#' => {
          if chars.as_str().starts_with('\\') {
            chars.next();
            chars.next();
          }
        }
        _ => {}
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use crate::repl::LineBuffer;

  #[test]
  fn test_balanced_line() {
    let mut buffer = LineBuffer::new();
    assert_eq!(buffer.push("(+ 1 2)"), Some("(+ 1 2)".to_owned()));
    assert!(buffer.is_empty());
    assert_eq!(buffer.prompt(), "> ");
  }

  #[test]
  fn test_continuation() {
    let mut buffer = LineBuffer::new();
    assert_eq!(buffer.push("(define f"), None);
    assert_eq!(buffer.depth(), 1);
    assert_eq!(buffer.prompt(), "1?   ");
    assert_eq!(buffer.push("  (lambda (x)"), None);
    assert_eq!(buffer.depth(), 2);
    assert_eq!(buffer.push("    x))"), Some("(define f\n  (lambda (x)\n    x))".to_owned()));
    assert_eq!(buffer.depth(), 0);
  }

  #[test]
  fn test_ignored_parentheses() {
    let mut buffer = LineBuffer::new();
    assert_eq!(buffer.push(r#"(p "(" #\( ; )"#), None);
    assert_eq!(buffer.depth(), 1);
    assert_eq!(buffer.push(r"#\))"), Some("(p \"(\" #\\( ; )\n#\\))".to_owned()));
  }

  #[test]
  fn test_strings_span_lines() {
    let mut buffer = LineBuffer::new();
    assert_eq!(buffer.push("\"a \\\" ("), None);
    assert_eq!(buffer.push("b\""), Some("\"a \\\" (\nb\"".to_owned()));
  }

  #[test]
  fn test_extra_close_paren_flushes() {
    let mut buffer = LineBuffer::new();
    assert_eq!(buffer.push("1)"), Some("1)".to_owned()));
    assert_eq!(buffer.depth(), 0);
  }

  #[test]
  fn test_blank_lines_are_skipped() {
    let mut buffer = LineBuffer::new();
    assert_eq!(buffer.push("   "), None);
    assert!(buffer.is_empty());
  }
}
