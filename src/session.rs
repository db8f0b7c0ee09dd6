//! The embedding boundary: feed source text in, get printed lines and a
//! structured outcome back.
//!
//! A [`Session`] owns one interpreter instance.  Definitions placed in the
//! global scope persist across [`Session::run`] calls for the session's
//! lifetime; everything else about a run is independent.

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::QuillError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;

/// Everything one `run` call produced.
///
/// `errors` holds the accumulated scan and parse errors — these are
/// recoverable, and the statements that did parse are still executed.
/// `failure` is the runtime error that aborted execution, if any; printed
/// lines emitted before it stand.
#[derive(Debug)]
pub struct RunReport {
    pub printed: Vec<String>,
    pub errors: Vec<QuillError>,
    pub failure: Option<QuillError>,
}

impl RunReport {
    /// True when the unit scanned, parsed, and ran to completion.
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty() && self.failure.is_none()
    }
}

/// A persistent interpreter instance behind the `run(source)` interface.
pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// A session whose interpreter treats unbound variable reads as errors
    /// instead of `nil`.
    pub fn with_strict_variables(strict: bool) -> Self {
        Self {
            interpreter: Interpreter::with_strict_variables(strict),
        }
    }

    /// Scan, parse, and interpret one source unit.
    pub fn run(&mut self, source: &str) -> RunReport {
        info!("Running a {}-byte source unit", source.len());

        let (tokens, mut errors) = Scanner::new(source).scan_tokens();

        let (parsed, parse_errors) = Parser::new(&tokens).parse();
        errors.extend(parse_errors);

        // Failed statements left `None` placeholders; the rest still run.
        let statements: Vec<Stmt> = parsed.into_iter().flatten().collect();

        debug!(
            "Executing {} statements ({} errors so far)",
            statements.len(),
            errors.len()
        );

        let failure = self.interpreter.interpret(&statements).err();

        RunReport {
            printed: self.interpreter.take_output(),
            errors,
            failure,
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
