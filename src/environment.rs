//! Scope chain with **copy-on-write closure semantics**.
//!
//! An [`Environment`] owns a flat name→binding map and an optional reference
//! to an enclosing environment used only for delegation; it never mutates its
//! parent's structure, only individual slots through [`Environment::assign`].
//! Environments are created at three points only: once as the global scope,
//! once per function definition (a parentless snapshot of the defining
//! scope's map), and once per function call (a snapshot of the closure's map
//! parented by the closure).  Blocks reuse the current environment.
//!
//! The assignment rules are deliberately unusual and load-bearing:
//!
//! - assigning an **unbound** name creates it in the current scope, not the
//!   outermost one;
//! - assigning a bound name with no enclosing scope overwrites in place;
//! - assigning a bound name with an enclosing scope updates the local slot
//!   **and** keeps delegating upward, so the write lands in every scope along
//!   the chain up to the outermost one that was reachable when the chain was
//!   built — this is what makes a counter captured by a snapshot closure
//!   still tick;
//! - assigning over a bound name whose binding was declared by a `fun`
//!   statement does not touch the local slot at all: the local map is
//!   re-snapshotted with the name rebound, wrapped as a child environment,
//!   and that wrapped environment is itself assigned upward under the same
//!   name.
//!
//! Lookup via [`Environment::get`] is conventional: local first, then the
//! chain.  A miss at the root is reported as `None`; the evaluator maps it
//! to `nil` unless strict variable lookup was requested.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// How a binding was introduced.  `fun` declarations produce
/// [`BindingKind::Function`]; everything else is [`BindingKind::Normal`].
/// The kind is fixed at creation and survives reassignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Normal,
    Function,
}

/// A single slot in an environment's local map.
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub kind: BindingKind,
}

#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Binding>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    /// A fresh, empty, parentless environment (the global scope).
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    /// Build an environment from an existing binding map, optionally
    /// parented.  This is how closures (parentless snapshots) and call
    /// scopes (closure snapshot + closure parent) come to exist.
    pub fn from_snapshot(
        values: HashMap<String, Binding>,
        enclosing: Option<Rc<RefCell<Environment>>>,
    ) -> Self {
        Environment { values, enclosing }
    }

    /// Shallow copy of the local map.  Values are `Rc`-backed where it
    /// matters, so this clones slots, not object graphs.
    pub fn snapshot(&self) -> HashMap<String, Binding> {
        self.values.clone()
    }

    /// Insert a brand-new binding.  The first definition wins: a duplicate
    /// name is rejected and the existing slot is left untouched.
    pub fn define(&mut self, name: &str, value: Value, kind: BindingKind) -> Result<(), String> {
        if self.values.contains_key(name) {
            return Err(format!("'{}' is already defined in this scope", name));
        }

        self.insert(name, value, kind);
        Ok(())
    }

    /// Resolve `name` against this scope, then the chain.  `None` means the
    /// name is unbound everywhere reachable.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(binding) = self.values.get(name) {
            return Some(binding.value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),
            None => None,
        }
    }

    /// Declared kind of a local binding, if one exists.
    pub fn kind_of(&self, name: &str) -> Option<BindingKind> {
        self.values.get(name).map(|binding| binding.kind)
    }

    /// Does the *local* map contain `name`?
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Assignment through the scope chain; see the module docs for the full
    /// rule set.  Takes the `Rc` handle because the function-kind branch
    /// needs to parent a wrapped snapshot onto the current environment.
    pub fn assign(this: &Rc<RefCell<Environment>>, name: &str, value: Value, kind: BindingKind) {
        let (present, local_kind, enclosing) = {
            let env = this.borrow();
            (env.contains(name), env.kind_of(name), env.enclosing.clone())
        };

        match (present, enclosing) {
            // Function-kind rebinding: re-parent a modified snapshot into
            // the chain instead of touching the local slot.
            (true, Some(enclosing)) if local_kind == Some(BindingKind::Function) => {
                let mut snapshot = this.borrow().snapshot();
                if let Some(slot) = snapshot.get_mut(name) {
                    slot.value = value;
                }

                let wrapped = Rc::new(RefCell::new(Environment::from_snapshot(
                    snapshot,
                    Some(Rc::clone(this)),
                )));

                Environment::assign(&enclosing, name, Value::Env(wrapped), kind);
            }

            // Unbound: create the binding here, in the current scope.
            (false, _) => {
                this.borrow_mut().insert(name, value, kind);
            }

            // Bound, outermost scope: plain overwrite.
            (true, None) => {
                this.borrow_mut().overwrite(name, value);
            }

            // Bound with a parent: update the local slot so the current
            // call observes its own write, and keep walking up so the
            // shared closure does too.
            (true, Some(enclosing)) => {
                this.borrow_mut().overwrite(name, value.clone());
                Environment::assign(&enclosing, name, value, kind);
            }
        }
    }

    fn insert(&mut self, name: &str, value: Value, kind: BindingKind) {
        self.values.insert(name.to_owned(), Binding { value, kind });
    }

    /// Replace a slot's value, preserving its declared kind.
    fn overwrite(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.values.get_mut(name) {
            slot.value = value;
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}
