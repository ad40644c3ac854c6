pub mod ast;
pub mod token;
pub mod lexer;
pub mod parser;
pub mod list;
pub mod value;
pub mod env;
pub mod builtin;
pub mod evaluator;
pub mod printer;
pub mod compiler;
pub mod repl;

use thiserror::Error;

use crate::ast::Program;
use crate::compiler::CompileError;
use crate::evaluator::{EvalError, Evaluator};
use crate::parser::{ParseError, Parser};
use crate::value::Value;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{}", join_errors(.0))]
    Syntax(Vec<ParseError>),

    #[error("{}\n{eval}", join_errors(.syntax))]
    SyntaxAndEval {
        syntax: Vec<ParseError>,
        eval: EvalError,
    },

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|err| err.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses a whole source text, failing if any form is malformed.
pub fn parse(source: &str) -> Result<Program, Error> {
    let mut parser = Parser::new(source);
    let program = parser.parse();
    let errors = parser.take_errors();

    if errors.is_empty() {
        Ok(program)
    } else {
        Err(Error::Syntax(errors))
    }
}

/// Evaluates every well-formed form of `source` in order and returns the
/// last value.
///
/// Evaluation stops at the first failing form. Syntax errors are reported
/// after the good forms have run, together with the evaluation error if
/// there was one.
pub fn run(evaluator: &Evaluator, source: &str) -> Result<Value, Error> {
    let mut parser = Parser::new(source);
    let program = parser.parse();

    let result = program
        .forms
        .iter()
        .try_fold(Value::Nil, |_, form| evaluator.evaluate_form(form));

    let syntax = parser.take_errors();
    match result {
        Ok(_) if !syntax.is_empty() => Err(Error::Syntax(syntax)),
        Err(eval) if !syntax.is_empty() => Err(Error::SyntaxAndEval { syntax, eval }),
        result => Ok(result?),
    }
}

#[cfg(test)]
mod tests {
    use crate::evaluator::{EvalError, Evaluator};
    use crate::printer::to_text;
    use crate::value::Value;
    use crate::Error;

    fn run(input: &str) -> Result<String, Error> {
        crate::run(&Evaluator::default(), input).map(|value| to_text(&value))
    }

    #[test]
    fn test_programs() {
        let tests = vec![
            ("(+ 1 2 3)", "6"),
            ("(- 10 1 2)", "7"),
            ("(* 2 3 4)", "24"),
            ("(/ 20 2 5)", "2"),
            ("(and #t (> 2 1))", "#t"),
            ("(or #f (= 1 2))", "#f"),
            ("(not #f)", "#t"),
            ("'(a (b c) \"s\" #\\x)", "(a (b c) s x)"),
            ("(define sq (lambda (x) (* x x))) (sq 12)", "144"),
            ("(define x 1) x (define y 2)", "nil"),
            ("", "nil"),
        ];

        for (input, expected) in tests {
            assert_eq!(run(input).unwrap(), expected, "{}", input);
        }
    }

    #[test]
    fn test_recursive_list_walk() {
        let program = "
            ; counts the elements of a list
            (define length
              (lambda (l)
                (if (null? l)
                    0
                    (+ 1 (length (cdr l))))))
            (length '(1 2 3 4 5))
        ";
        assert_eq!(run(program).unwrap(), "5");
    }

    #[test]
    fn test_syntax_errors_are_collected() {
        match run("(define) (+ 1 2) ) (if") {
            Err(Error::Syntax(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected syntax errors, got {:?}", other),
        }
    }

    #[test]
    fn test_good_forms_run_despite_syntax_errors() {
        let evaluator = Evaluator::default();
        assert!(matches!(
            crate::run(&evaluator, "(define a 1) (define) (define b 2)"),
            Err(Error::Syntax(_))
        ));
        assert_eq!(evaluator.env.borrow().get("a"), Some(Value::Number(1)));
        assert_eq!(evaluator.env.borrow().get("b"), Some(Value::Number(2)));
    }

    #[test]
    fn test_eval_errors() {
        assert!(matches!(run("(car 1)"), Err(Error::Eval(EvalError::TypeMismatch { .. }))));
        assert!(matches!(run("(/ 1 0)"), Err(Error::Eval(EvalError::DivisionByZero))));
        assert_eq!(run("(undefined 1)").unwrap_err().to_string(), "undefined identifier: undefined");
    }

    #[test]
    fn test_state_persists_across_runs() {
        let evaluator = Evaluator::default();
        crate::run(&evaluator, "(define counter 41)").unwrap();
        assert_eq!(crate::run(&evaluator, "(+ counter 1)").unwrap(), Value::Number(42));
    }

    #[test]
    fn test_eval_error_is_kept_alongside_syntax_errors() {
        let err = crate::run(&Evaluator::default(), "(car '()) )").unwrap_err();
        let text = err.to_string();
        assert!(text.contains("unexpected RPAREN (1:11)"), "{}", text);
        assert!(text.contains("list error: passed '() to car"), "{}", text);

        match err {
            Error::SyntaxAndEval { syntax, eval } => {
                assert_eq!(syntax.len(), 1);
                assert_eq!(eval, EvalError::EmptyList("car"));
            }
            other => panic!("expected both errors, got {:?}", other),
        }
    }
}
