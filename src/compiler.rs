use std::collections::HashSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;

use crate::ast::{Expression, Form, Lambda, Program};
use crate::token::{Token, TokenKind, TokenValue};

static NON_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("identifier pattern is valid"));

const RESERVED: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "import", "in", "instanceof", "let", "new", "null", "return", "static", "super", "switch",
    "this", "throw", "true", "try", "typeof", "undefined", "var", "void", "while", "with", "yield",
];

const PRELUDE: &[(&str, &str)] = &[
    ("+", "(...a) => a.reduce((x, y) => x + y, 0)"),
    ("-", "(x, ...a) => a.reduce((s, y) => s - y, x)"),
    ("*", "(...a) => a.reduce((x, y) => x * y, 1)"),
    ("/", "(x, ...a) => a.reduce((s, y) => { if (y === 0) throw new Error(\"division by zero\"); return Math.trunc(s / y); }, x)"),
    ("=", "(a, b) => a === b"),
    (">=", "(a, b) => a >= b"),
    ("<=", "(a, b) => a <= b"),
    (">", "(a, b) => a > b"),
    ("<", "(a, b) => a < b"),
    ("and", "(...a) => a.every((x) => x)"),
    ("or", "(...a) => a.some((x) => x)"),
    ("not", "(x) => !x"),
    ("eq?", "(a, b) => a === b"),
    ("p", "(...a) => { console.log(a.join(\" \")); return null; }"),
    ("time", "() => Date.now()"),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("cannot compile {0}")]
    Unsupported(&'static str),
}

/// Turns a Scheme identifier into a valid JavaScript one.
///
/// Every character outside `[A-Za-z0-9_]` becomes a `$name` segment, and
/// reserved words get a trailing `$`.
pub fn mangle(name: &str) -> String {
    let mangled = NON_IDENTIFIER.replace_all(name, |caps: &Captures| {
        let segment = match &caps[0] {
            "+" => "plus",
            "-" => "minus",
            "*" => "star",
            "/" => "slash",
            "<" => "lt",
            ">" => "gt",
            "=" => "eq",
            "?" => "p",
            "!" => "bang",
            "." => "dot",
            ":" => "colon",
            "%" => "pct",
            "&" => "amp",
            "^" => "hat",
            "~" => "tilde",
            "$" => "dollar",
            _ => "u",
        };
        format!("${}", segment)
    });

    if RESERVED.contains(&mangled.as_ref()) {
        format!("{}$", mangled)
    } else {
        mangled.into_owned()
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('"');
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}

/// Emits JavaScript source for a program, one statement per form.
#[derive(Debug, Default)]
pub struct Compiler {
    variables: HashSet<String>,
    prelude: bool,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prelude(mut self, prelude: bool) -> Self {
        self.prelude = prelude;
        self
    }

    pub fn compile(&mut self, program: &Program) -> Result<String, CompileError> {
        let mut code = String::new();

        if self.prelude {
            for (name, body) in PRELUDE {
                let name = mangle(name);
                code.push_str(&format!("let {} = {};\n", name, body));
                self.variables.insert(name);
            }
        }

        for form in &program.forms {
            code.push_str(&self.compile_form(form)?);
            code.push('\n');
        }

        Ok(code)
    }

    fn compile_form(&mut self, form: &Form) -> Result<String, CompileError> {
        match form {
            Form::Definition { name, value } => {
                let value = self.compile_expression(value)?;
                let name = mangle(&name.slice);
                debug!(name = %name, "compile definition");

                if self.variables.insert(name.clone()) {
                    Ok(format!("let {} = {};", name, value))
                } else {
                    Ok(format!("{} = {};", name, value))
                }
            }
            Form::Expression(expression) => Ok(format!("{};", self.compile_expression(expression)?)),
        }
    }

    fn compile_expression(&self, expression: &Expression) -> Result<String, CompileError> {
        match expression {
            Expression::Literal(token) => Ok(self.compile_token(token)),
            Expression::Quoted(_) => Err(CompileError::Unsupported("quoted datum")),
            Expression::If { predicate, consequent, alternative } => Ok(format!(
                "({} ? {} : {})",
                self.compile_expression(predicate)?,
                self.compile_expression(consequent)?,
                self.compile_expression(alternative)?,
            )),
            Expression::Lambda(lambda) => self.compile_lambda(lambda),
            Expression::Application { head, arguments } => {
                let head = self.compile_expression(head)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.compile_expression(argument))
                    .collect::<Result<Vec<_>, _>>()?;

                Ok(format!("{}({})", head, arguments.join(", ")))
            }
        }
    }

    fn compile_token(&self, token: &Token) -> String {
        if token.kind == TokenKind::Identifier {
            return mangle(&token.slice);
        }

        match &token.value {
            TokenValue::Number(n) => n.to_string(),
            TokenValue::Boolean(b) => b.to_string(),
            TokenValue::Character(c) => escape(&c.to_string()),
            TokenValue::String(s) => escape(s),
            TokenValue::None => "null".to_owned(),
        }
    }

    fn compile_lambda(&self, lambda: &Lambda) -> Result<String, CompileError> {
        let formals = lambda
            .formals
            .iter()
            .map(|formal| mangle(&formal.slice))
            .collect::<Vec<_>>()
            .join(", ");

        let mut body = lambda
            .body
            .iter()
            .map(|expression| self.compile_expression(expression))
            .collect::<Result<Vec<_>, _>>()?;

        let last = body.pop().ok_or(CompileError::Unsupported("empty lambda body"))?;
        let mut statements = String::new();
        for statement in body {
            statements.push_str(&statement);
            statements.push_str("; ");
        }

        Ok(format!("(function({}) {{ {}return {}; }})", formals, statements, last))
    }
}

#[cfg(test)]
mod tests {
    use crate::compiler::{mangle, CompileError, Compiler};

    fn compile(input: &str) -> Result<String, CompileError> {
        let program = crate::parse(input).unwrap();
        Compiler::new().compile(&program)
    }

    #[test]
    fn test_mangle() {
        assert_eq!(mangle("x1"), "x1");
        assert_eq!(mangle("null?"), "null$p");
        assert_eq!(mangle("+"), "$plus");
        assert_eq!(mangle(">="), "$gt$eq");
        assert_eq!(mangle("list->vector"), "list$minus$gtvector");
        assert_eq!(mangle("set-car!"), "set$minuscar$bang");
        assert_eq!(mangle("new"), "new$");
        assert_eq!(mangle("function"), "function$");
    }

    #[test]
    fn test_literals() {
        assert_eq!(compile("1 #t #f").unwrap(), "1;\ntrue;\nfalse;\n");
        assert_eq!(compile(r#""a \"b\"""#).unwrap(), "\"a \\\"b\\\"\";\n");
        assert_eq!(compile(r"#\c").unwrap(), "\"c\";\n");
    }

    #[test]
    fn test_if() {
        assert_eq!(compile("(if (< a b) a b)").unwrap(), "($lt(a, b) ? a : b);\n");
    }

    #[test]
    fn test_definitions() {
        assert_eq!(
            compile("(define x 1) (define x (+ x 1))").unwrap(),
            "let x = 1;\nx = $plus(x, 1);\n"
        );
    }

    #[test]
    fn test_lambda() {
        assert_eq!(
            compile("(define f (lambda (a b) (p a) b))").unwrap(),
            "let f = (function(a, b) { p(a); return b; });\n"
        );
        assert_eq!(compile("((lambda () 1))").unwrap(), "(function() { return 1; })();\n");
    }

    #[test]
    fn test_recursive_definition() {
        let code = compile("(define fact (lambda (n) (if (= n 0) 1 (* n (fact (- n 1))))))").unwrap();
        assert_eq!(
            code,
            "let fact = (function(n) { return ($eq(n, 0) ? 1 : $star(n, fact($minus(n, 1)))); });\n"
        );
    }

    #[test]
    fn test_quoted_data_is_rejected() {
        assert_eq!(compile("(car '(1 2))"), Err(CompileError::Unsupported("quoted datum")));
        assert_eq!(compile("(quote a)"), Err(CompileError::Unsupported("quoted datum")));
    }

    #[test]
    fn test_prelude() {
        let program = crate::parse("(define p 1) (null? x)").unwrap();
        let code = Compiler::new().with_prelude(true).compile(&program).unwrap();

        assert!(code.starts_with("let $plus = "));
        assert!(code.contains("let eq$p = (a, b) => a === b;\n"));
        assert!(code.ends_with("p = 1;\nnull$p(x);\n"));
    }
}
