//! Lexical scopes managing variable and function bindings

mod prelude;

pub use prelude::default_builtins;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::EnvironmentError;
use crate::value::{release, Value};

struct Scope {
    bindings: IndexMap<String, Value>,
    parent: Option<Env>,
}

impl Drop for Scope {
    fn drop(&mut self) {
        release(std::mem::take(&mut self.bindings).into_values());
    }
}

/// A shared handle to one scope in the environment tree.
///
/// Each scope owns its bindings and holds a shared handle to its parent, so
/// sibling scopes (for example two calls of the same closure) can share one
/// parent. Cloning an `Env` clones the handle, not the scope.
///
/// Only function calls create child scopes; `if`/`while`/`for` bodies run in
/// the scope of the statement that contains them.
///
/// # Example
///
/// ```
/// use microscript::{Env, Value};
///
/// let global = Env::new();
/// global.set("x", Value::Int(1));
///
/// let local = global.new_child();
/// local.set("x", Value::Int(2)); // x already exists outside: mutate it
/// local.set("y", Value::Int(3)); // new name: define locally
///
/// assert_eq!(global.get("x").unwrap(), Value::Int(2));
/// assert!(global.get("y").is_err());
/// assert_eq!(local.get("y").unwrap(), Value::Int(3));
/// ```
#[derive(Clone)]
pub struct Env(Rc<RefCell<Scope>>);

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    /// Create a root (global) scope.
    pub fn new() -> Self {
        Env(Rc::new(RefCell::new(Scope {
            bindings: IndexMap::new(),
            parent: None,
        })))
    }

    /// Create a child scope of this one.
    pub fn new_child(&self) -> Self {
        Env(Rc::new(RefCell::new(Scope {
            bindings: IndexMap::new(),
            parent: Some(self.clone()),
        })))
    }

    /// The enclosing scope, if any.
    pub fn parent(&self) -> Option<Env> {
        self.0.borrow().parent.clone()
    }

    /// Number of scopes between this one and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut current = self.parent();
        while let Some(env) = current {
            depth += 1;
            current = env.parent();
        }
        depth
    }

    /// True if both handles point at the same scope.
    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Lookup and Assignment
    // ═══════════════════════════════════════════════════════════════════

    /// Find the innermost scope in the chain that binds `name`.
    pub fn resolve(&self, name: &str) -> Option<Env> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            if env.0.borrow().bindings.contains_key(name) {
                return Some(env);
            }
            current = env.parent();
        }
        None
    }

    /// Look up a variable through the scope chain.
    ///
    /// # Errors
    ///
    /// Returns `UndefinedVariable` if no scope binds `name`.
    pub fn get(&self, name: &str) -> Result<Value, EnvironmentError> {
        self.resolve(name)
            .and_then(|env| env.lookup_local(name))
            .ok_or_else(|| EnvironmentError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    /// Assign a variable: mutate the scope that already binds it, or define
    /// it in this scope if none does.
    pub fn set(&self, name: &str, value: Value) {
        match self.resolve(name) {
            Some(env) => env.define(name, value),
            None => self.define(name, value),
        }
    }

    /// Bind a variable in this scope, shadowing any outer binding.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        let previous = self.0.borrow_mut().bindings.insert(name.into(), value);
        release(previous);
    }

    /// Look up a binding in this scope only.
    pub fn lookup_local(&self, name: &str) -> Option<Value> {
        let scope = self.0.borrow();
        scope.bindings.get(name).cloned()
    }

    /// Check for a binding in this scope only.
    pub fn contains_local(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    /// Bindings of this scope only, in definition order.
    pub fn locals(&self) -> IndexMap<String, Value> {
        self.0.borrow().bindings.clone()
    }

    /// All visible bindings, innermost shadowing outer.
    pub fn flatten(&self) -> IndexMap<String, Value> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(Env::parent) {
            chain.push(parent);
        }

        let mut visible = IndexMap::new();
        for env in chain.iter().rev() {
            for (name, value) in env.0.borrow().bindings.iter() {
                visible.insert(name.clone(), value.clone());
            }
        }
        visible
    }

    /// Number of bindings in this scope.
    pub fn len(&self) -> usize {
        self.0.borrow().bindings.len()
    }

    /// True if this scope has no bindings.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().bindings.is_empty()
    }

    /// Remove every binding from this scope.
    ///
    /// Function values hold their defining scope, and a scope holds the
    /// functions defined in it, so dropping a runtime clears its globals to
    /// release those cycles.
    pub fn clear(&self) {
        let bindings = std::mem::take(&mut self.0.borrow_mut().bindings);
        release(bindings.into_values());
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        f.debug_struct("Env")
            .field("names", &scope.bindings.keys().collect::<Vec<_>>())
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_unbound() {
        let env = Env::new();
        assert_eq!(
            env.get("z"),
            Err(EnvironmentError::UndefinedVariable {
                name: "z".to_string()
            })
        );
    }

    #[test]
    fn test_resolve_finds_defining_scope() {
        let global = Env::new();
        global.define("x", Value::Int(1));
        let child = global.new_child().new_child();
        let found = child.resolve("x").unwrap();
        assert!(found.ptr_eq(&global));
        assert!(child.resolve("nope").is_none());
    }

    #[test]
    fn test_define_shadows() {
        let global = Env::new();
        global.define("x", Value::Int(1));
        let child = global.new_child();
        child.define("x", Value::Int(2));
        assert_eq!(child.get("x").unwrap(), Value::Int(2));
        assert_eq!(global.get("x").unwrap(), Value::Int(1));
    }

    #[test]
    fn test_siblings_share_parent() {
        let global = Env::new();
        let a = global.new_child();
        let b = global.new_child();
        a.set("shared", Value::Int(1));
        global.set("counter", Value::Int(0));
        b.set("counter", Value::Int(5));
        assert_eq!(a.get("counter").unwrap(), Value::Int(5));
        assert!(b.get("shared").is_err());
    }

    #[test]
    fn test_flatten_innermost_wins() {
        let global = Env::new();
        global.define("x", Value::Int(1));
        global.define("g", Value::Int(9));
        let child = global.new_child();
        child.define("x", Value::Int(2));
        let visible = child.flatten();
        assert_eq!(visible.get("x"), Some(&Value::Int(2)));
        assert_eq!(visible.get("g"), Some(&Value::Int(9)));
        assert_eq!(child.locals().len(), 1);
    }

    #[test]
    fn test_depth() {
        let global = Env::new();
        assert_eq!(global.depth(), 0);
        assert_eq!(global.new_child().new_child().depth(), 2);
    }

    #[test]
    fn test_clear() {
        let env = Env::new();
        env.define("x", Value::Int(1));
        env.clear();
        assert!(env.is_empty());
    }
}
