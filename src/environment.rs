use crate::evaluator::{EvalResult, LispError};
use crate::primitives;
use crate::types::{BuiltinFn, Value, ValueKind};
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Write;
use std::rc::{Rc, Weak};
use tracing::debug;

/// Shared handle to an environment frame.
pub type EnvRef = Rc<RefCell<Environment>>;

// --- Environment Definition ---

#[derive(Debug, Clone, Default)]
pub struct Environment {
    // Non-owning: a frame never keeps its parent alive.
    outer: Option<Weak<RefCell<Environment>>>,
    // Insertion ordered; names are unique within a frame.
    bindings: Vec<(String, Value)>,
}

// Frames compare by their local bindings only.
impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        self.bindings == other.bindings
    }
}

impl Environment {
    /// Creates a new, top-level (global) environment.
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Environment::default()))
    }

    pub fn new_global_populated() -> EnvRef {
        let env_ptr = Environment::new();
        {
            let mut env = env_ptr.borrow_mut();
            // List functions
            env.add_builtin("list", primitives::prim_list);
            env.add_builtin("head", primitives::prim_head);
            env.add_builtin("tail", primitives::prim_tail);
            env.add_builtin("eval", primitives::prim_eval);
            env.add_builtin("join", primitives::prim_join);
            env.add_builtin("cons", primitives::prim_cons);
            env.add_builtin("len", primitives::prim_len);
            env.add_builtin("init", primitives::prim_init);

            // Mathematical functions
            env.add_builtin("+", primitives::prim_add);
            env.add_builtin("-", primitives::prim_sub);
            env.add_builtin("*", primitives::prim_mul);
            env.add_builtin("/", primitives::prim_div);
            env.add_builtin("%", primitives::prim_mod);
            env.add_builtin("^", primitives::prim_pow);

            // Variable functions
            env.add_builtin("def", primitives::prim_def);
            env.add_builtin("=", primitives::prim_put);
            env.add_builtin("\\", primitives::prim_lambda);

            env.add_builtin("exit", primitives::prim_exit);
            env.add_builtin("penv", primitives::prim_penv);
        }
        env_ptr
    }

    fn add_builtin(&mut self, name: &str, func: BuiltinFn) {
        self.put(name, Value::builtin(name, func));
    }

    /// Upgrades the parent reference, if the parent frame is still alive.
    pub fn outer(&self) -> Option<EnvRef> {
        self.outer.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_outer(&mut self, outer: &EnvRef) {
        self.outer = Some(Rc::downgrade(outer));
    }

    /// Looks up a symbol in this frame, then along the parent chain.
    /// The returned value is an independent copy of the stored one.
    pub fn get(&self, name: &str) -> EvalResult<Value> {
        if let Some((_, value)) = self.bindings.iter().find(|(key, _)| key == name) {
            return Ok(value.clone());
        }
        match self.outer() {
            Some(outer_env_ptr) => outer_env_ptr.borrow().get(name),
            None => Err(LispError::UnboundSymbol(name.to_string())),
        }
    }

    /// Binds `name` in *this* frame, replacing any existing local binding.
    pub fn put(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.bindings.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.bindings.push((name, value)),
        }
    }

    /// Binds `name` in the outermost frame reachable from `env`.
    pub fn define_global(env: &EnvRef, name: impl Into<String>, value: Value) {
        let mut current = env.clone();
        loop {
            let outer = current.borrow().outer();
            match outer {
                Some(outer_env_ptr) => current = outer_env_ptr,
                None => break,
            }
        }
        let name = name.into();
        debug!(%name, "global definition");
        current.borrow_mut().put(name, value);
    }

    /// Reverse lookup: the name a builtin function is bound under.
    pub fn lookup_by_builtin(&self, func: BuiltinFn) -> EvalResult<String> {
        let found = self.bindings.iter().find(|(_, value)| {
            matches!(&value.kind, ValueKind::Builtin(builtin) if std::ptr::fn_addr_eq(builtin.func, func))
        });
        if let Some((name, _)) = found {
            return Ok(name.clone());
        }
        match self.outer() {
            Some(outer_env_ptr) => outer_env_ptr.borrow().lookup_by_builtin(func),
            None => Err(LispError::UnknownBuiltin),
        }
    }

    /// Drops every binding in this frame.
    pub fn clear(&mut self) {
        debug!(count = self.bindings.len(), "clearing environment frame");
        self.bindings.clear();
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Table of this frame's names and value types, as printed by `penv`.
    pub fn frame_summary(&self) -> String {
        let mut out = String::from("    <name>  --    <type>\n");
        for (name, value) in &self.bindings {
            let _ = writeln!(out, "{:>10}  --  {:>10}", name, value.type_name());
        }
        let _ = writeln!(out, "total: {}", self.bindings.len());
        out
    }

    /// Gets a list of all identifiers visible from this environment
    pub fn get_identifiers(&self) -> HashSet<String> {
        let mut identifiers: HashSet<String> =
            self.bindings.iter().map(|(name, _)| name.clone()).collect();
        if let Some(outer_env_ptr) = self.outer() {
            identifiers.extend(outer_env_ptr.borrow().get_identifiers());
        }
        identifiers
    }
}
