//! Runtime value representation.  Untyped at this level; every operation
//! checks the variants it needs at its use site.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Stmt;
use crate::environment::Environment;
use crate::token::Token;

/// A user-defined function: its declaration (shared read-only with the AST)
/// and the environment snapshot captured when the `fun` statement executed.
/// Immutable after construction.
pub struct QuillFunction {
    pub name: String,
    pub params: Vec<Token>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<RefCell<Environment>>,
}

impl fmt::Debug for QuillFunction {
    // The closure holds the function value back, so a derived Debug would
    // chase the cycle; print the identity fields only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuillFunction")
            .field("name", &self.name)
            .field("arity", &self.params.len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Value {
    Nil,

    Bool(bool),

    Number(f64),

    String(String),

    NativeFunction {
        name: String,
        arity: usize,
        func: fn(&[Value]) -> Result<Value, String>,
    },

    /// A user-defined function.  Cheap to clone; calls share the one
    /// declaration and closure behind the `Rc`.
    Function(Rc<QuillFunction>),

    /// A wrapped environment snapshot, produced only by the function-kind
    /// assignment re-parenting rule.  Not callable.
    Env(Rc<RefCell<Environment>>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // 3.0 prints as 3; the fractional path falls back to the
                // shortest std formatting.
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buf: itoa::Buffer = itoa::Buffer::new();
                    write!(f, "{}", buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::NativeFunction { name, .. } => write!(f, "<native fn {}>", name),

            Value::Function(fun) => write!(f, "<fn {}>", fun.name),

            Value::Env(_) => write!(f, "<environment>"),
        }
    }
}
