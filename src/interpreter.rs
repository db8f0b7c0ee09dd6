//! Tree-walking evaluator.  Holds the active scope chain, executes
//! statements, evaluates expressions, and implements the calling convention
//! and runtime errors.
//!
//! Non-local `return` travels on the error channel as
//! [`InterpretError::Return`], threaded through `execute`/`evaluate` with
//! `?`; the nearest active call frame absorbs it and turns it into the
//! call's result.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Expr, LiteralValue, Stmt};
use crate::environment::{BindingKind, Environment};
use crate::error::QuillError;
use crate::token::{Token, TokenType};
use crate::value::{QuillFunction, Value};

/// Ceiling on nested user-function calls.  Exceeding it raises a
/// "Stack exhausted" runtime error instead of overrunning the host stack.
pub const MAX_CALL_DEPTH: usize = 255;

/// Either a genuine failure or the `return` unwind signal.
#[derive(Error, Debug)]
pub enum InterpretError {
    #[error(transparent)]
    Failure(#[from] QuillError),

    #[error("return signal carrying {0}")]
    Return(Value),
}

/// Convenient alias for evaluator results.
pub type IResult<T> = Result<T, InterpretError>;

pub struct Interpreter {
    /// The current scope.  Starts as the global scope and is swapped for a
    /// call scope for the duration of each user-function invocation.
    environment: Rc<RefCell<Environment>>,

    /// Lines produced by `print`, in execution order.
    output: Vec<String>,

    /// When set, an unbound variable read is an error instead of `nil`.
    strict_variables: bool,

    /// Current user-call nesting, bounded by [`MAX_CALL_DEPTH`].
    depth: usize,
}

impl Interpreter {
    /// Creates a new Interpreter with lenient variable lookup and defines
    /// native functions such as `Clock`.
    pub fn new() -> Self {
        Self::with_strict_variables(false)
    }

    /// As [`Interpreter::new`], with the undefined-variable strictness
    /// chosen by the caller.
    pub fn with_strict_variables(strict_variables: bool) -> Self {
        info!("Initializing Interpreter (strict_variables={strict_variables})");

        let environment = Rc::new(RefCell::new(Environment::new()));

        debug!("Defining native function 'Clock'");

        let clock = Value::NativeFunction {
            name: "Clock".to_string(),
            arity: 0,
            func: |_args: &[Value]| {
                let millis: u32 = chrono::Local::now().timestamp_subsec_millis();
                Ok(Value::Number(f64::from(millis) / 1000.0))
            },
        };

        Environment::assign(&environment, "Clock", clock, BindingKind::Normal);

        Self {
            environment,
            output: Vec::new(),
            strict_variables,
            depth: 0,
        }
    }

    /// Drain the lines printed so far, in order.
    pub fn take_output(&mut self) -> Vec<String> {
        mem::take(&mut self.output)
    }

    /// Interprets a list of statements (a "program").  Stops at the first
    /// runtime error; output produced before the failure stands.
    pub fn interpret(&mut self, statements: &[Stmt]) -> crate::error::Result<()> {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            match self.execute(stmt) {
                Ok(()) => {}

                Err(InterpretError::Failure(err)) => return Err(err),

                // The depth guard in `Stmt::Return` keeps the signal from
                // ever reaching this level; kept total for the type.
                Err(InterpretError::Return(_)) => {
                    return Err(QuillError::runtime(0, "Cannot return from top-level code"));
                }
            }
        }

        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<()> {
        match stmt {
            Stmt::Function { name, params, body } => {
                debug!("Defining function '{}'", name.lexeme);

                // The closure is a parentless snapshot of the defining
                // scope's local map, taken here, once.
                let closure = Rc::new(RefCell::new(Environment::from_snapshot(
                    self.environment.borrow().snapshot(),
                    None,
                )));

                let function = Value::Function(Rc::new(QuillFunction {
                    name: name.lexeme.clone(),
                    params: params.clone(),
                    body: Rc::clone(body),
                    closure: Rc::clone(&closure),
                }));

                // The closure can resolve the function's own name, so
                // recursive calls work from inside the body.
                Environment::assign(
                    &closure,
                    &name.lexeme,
                    function.clone(),
                    BindingKind::Function,
                );

                Environment::assign(
                    &self.environment,
                    &name.lexeme,
                    function,
                    BindingKind::Function,
                );

                info!(
                    "Function '{}' defined with {} parameters",
                    name.lexeme,
                    params.len()
                );
                Ok(())
            }

            Stmt::Expression(expr) => {
                debug!("Evaluating expression statement");
                let _ = self.evaluate(expr)?;
                Ok(())
            }

            Stmt::Print(expr) => {
                debug!("Evaluating print statement");
                let value = self.evaluate(expr)?;
                info!("Printed value: {}", value);
                self.output.push(value.to_string());
                Ok(())
            }

            Stmt::Var { name, initializer } => {
                debug!("Declaring variable '{}'", name.lexeme);
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                // Declarations run through the assign path, so re-declaring
                // an existing name follows the reassignment rules.
                Environment::assign(&self.environment, &name.lexeme, value, BindingKind::Normal);
                Ok(())
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());

                // A leading `var` executes once against the current scope
                // before the body runs; the body then executes it a second
                // time.  Blocks do not open a scope of their own.
                if let Some(first) = statements.first() {
                    if matches!(first, Stmt::Var { .. }) {
                        self.execute(first)?;
                    }
                }

                for stmt in statements {
                    self.execute(stmt)?;
                }

                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                debug!("Evaluating if condition");
                let cond_value = self.evaluate(condition)?;

                if is_truthy(&cond_value) {
                    self.execute(then_branch)?;
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");

                while is_truthy(&self.evaluate(condition)?) {
                    self.execute(body)?;
                }

                debug!("Exited while loop");
                Ok(())
            }

            Stmt::Return { keyword, value } => {
                debug!("Executing return statement");

                if self.depth == 0 {
                    return Err(QuillError::runtime(
                        keyword.line,
                        "Cannot return from top-level code",
                    )
                    .into());
                }

                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(InterpretError::Return(value))
            }
        }
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        let value = match expr {
            Expr::Literal(lit) => match lit {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            },

            Expr::Grouping(inner) => self.evaluate(inner)?,

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right)?,

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right)?,

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right)?,

            Expr::Variable(name) => self.evaluate_variable(name)?,

            Expr::Assign { name, value } => {
                debug!("Assigning to variable '{}'", name.lexeme);
                let value = self.evaluate(value)?;
                Environment::assign(
                    &self.environment,
                    &name.lexeme,
                    value.clone(),
                    BindingKind::Normal,
                );
                value
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                debug!("Evaluating function call");
                let callee_val = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.invoke_callable(&callee_val, paren, &arg_values)?
            }
        };

        Ok(value)
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> IResult<Value> {
        debug!("Evaluating unary operation: {}", op.lexeme);
        let right_val = self.evaluate(expr)?;

        match &op.token_type {
            TokenType::MINUS => {
                if let Value::Number(n) = right_val {
                    Ok(Value::Number(-n))
                } else {
                    Err(QuillError::runtime(op.line, "Operand must be a number").into())
                }
            }

            TokenType::BANG => Ok(Value::Bool(!is_truthy(&right_val))),

            _ => Err(QuillError::runtime(op.line, "Invalid unary operator").into()),
        }
    }

    /// Evaluates a binary expression.  The compound-assignment operator
    /// kinds appear here because `x += e` desugars to a `Binary` node that
    /// keeps the compound token; they behave as their base operation.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        debug!("Evaluating binary operation: {}", op.lexeme);

        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match &op.token_type {
            TokenType::PLUS | TokenType::PLUS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                _ => Err(QuillError::runtime(
                    op.line,
                    "Operands must be two numbers or two strings",
                )
                .into()),
            },

            TokenType::MINUS | TokenType::MINUS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),
                _ => Err(QuillError::runtime(op.line, "Operands must be numbers").into()),
            },

            TokenType::STAR | TokenType::STAR_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),
                _ => Err(QuillError::runtime(op.line, "Operands must be numbers").into()),
            },

            TokenType::SLASH | TokenType::SLASH_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => {
                    if b == 0.0 {
                        Err(QuillError::DivideByZero { line: op.line }.into())
                    } else {
                        Ok(Value::Number(a / b))
                    }
                }
                _ => Err(QuillError::runtime(op.line, "Operands must be numbers").into()),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(is_equal(&left_val, &right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!is_equal(&left_val, &right_val))),

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),
                _ => Err(QuillError::runtime(op.line, "Operands must be numbers").into()),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),
                _ => Err(QuillError::runtime(op.line, "Operands must be numbers").into()),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),
                _ => Err(QuillError::runtime(op.line, "Operands must be numbers").into()),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),
                _ => Err(QuillError::runtime(op.line, "Operands must be numbers").into()),
            },

            _ => Err(QuillError::runtime(op.line, "Invalid binary operator").into()),
        }
    }

    /// Short-circuiting `and` / `or`: the determining operand is returned
    /// as-is, without boolean coercion.
    fn evaluate_logical(&mut self, left: &Expr, op: &Token, right: &Expr) -> IResult<Value> {
        debug!("Evaluating logical operation: {}", op.lexeme);

        let left_val = self.evaluate(left)?;

        match &op.token_type {
            TokenType::OR => {
                if is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            TokenType::AND => {
                if !is_truthy(&left_val) {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            _ => Err(QuillError::runtime(op.line, "Invalid logical operator").into()),
        }
    }

    /// Evaluates a variable reference.  An unbound name reads as `nil`
    /// unless strict lookup was requested.
    fn evaluate_variable(&self, name: &Token) -> IResult<Value> {
        debug!("Looking up variable '{}'", name.lexeme);

        match self.environment.borrow().get(&name.lexeme) {
            Some(value) => Ok(value),

            None if self.strict_variables => Err(QuillError::runtime(
                name.line,
                format!("Undefined variable '{}'", name.lexeme),
            )
            .into()),

            None => Ok(Value::Nil),
        }
    }

    /// Invokes a callable (native or user-defined function).
    fn invoke_callable(
        &mut self,
        callee_val: &Value,
        paren: &Token,
        arg_values: &[Value],
    ) -> IResult<Value> {
        match callee_val {
            Value::NativeFunction { name, arity, func } => {
                debug!("Calling native function '{}'", name);

                if arg_values.len() != *arity {
                    return Err(QuillError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}",
                            arity,
                            arg_values.len()
                        ),
                    )
                    .into());
                }

                let result = func(arg_values).map_err(|msg| QuillError::runtime(paren.line, msg))?;

                info!("Native function '{}' returned: {}", name, result);
                Ok(result)
            }

            Value::Function(fun) => {
                debug!("Calling user-defined function '{}'", fun.name);

                if arg_values.len() != fun.params.len() {
                    return Err(QuillError::runtime(
                        paren.line,
                        format!(
                            "Expected {} arguments but got {}",
                            fun.params.len(),
                            arg_values.len()
                        ),
                    )
                    .into());
                }

                if self.depth >= MAX_CALL_DEPTH {
                    return Err(QuillError::runtime(paren.line, "Stack exhausted").into());
                }

                // The call scope is a fresh snapshot of the closure's map,
                // parented by the closure itself, with parameters bound by
                // position.  A parameter colliding with a snapshot binding
                // is the double-definition error.
                let env = Rc::new(RefCell::new(Environment::from_snapshot(
                    fun.closure.borrow().snapshot(),
                    Some(Rc::clone(&fun.closure)),
                )));

                for (param, arg) in fun.params.iter().zip(arg_values.iter()) {
                    env.borrow_mut()
                        .define(&param.lexeme, arg.clone(), BindingKind::Normal)
                        .map_err(|msg| QuillError::runtime(param.line, msg))?;
                }

                let saved: Rc<RefCell<Environment>> = mem::replace(&mut self.environment, env);
                self.depth += 1;

                let mut outcome: IResult<()> = Ok(());
                for stmt in fun.body.iter() {
                    outcome = self.execute(stmt);
                    if outcome.is_err() {
                        break;
                    }
                }

                self.depth -= 1;
                self.environment = saved;

                match outcome {
                    Ok(()) => {
                        info!("Function '{}' returned nil", fun.name);
                        Ok(Value::Nil)
                    }

                    Err(InterpretError::Return(value)) => {
                        info!("Function '{}' returned: {}", fun.name, value);
                        Ok(value)
                    }

                    Err(err) => Err(err),
                }
            }

            _ => Err(QuillError::runtime(paren.line, "Can only call functions").into()),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// `nil` and `false` are falsy; every other value, including `0` and the
/// empty string, is truthy.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Nil => false,
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Value equality: `nil` equals only `nil`; functions and wrapped
/// environments compare by identity.
fn is_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Nil, Value::Nil) => true,
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::NativeFunction { name: a, .. }, Value::NativeFunction { name: b, .. }) => a == b,
        (Value::Env(a), Value::Env(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}
