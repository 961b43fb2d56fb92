//! Dynamic function registry.
//!
//! Maps a string identifier to a callable taking and returning JSON.
//! Host-side scripts reach optional extension points through here; the
//! notification pipeline itself never goes through the registry.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::notifier::template;

/// A registered callable. Arguments arrive positionally.
pub type RegisteredFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// Registry of callables, indexed by name.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, RegisteredFn>,
}

impl FunctionRegistry {
    /// Create an empty registry with no functions.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry preloaded with the notifier's message templates.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("approval_subject", |args| {
            let doctype = str_arg(args, 0, "doctype")?;
            let name = str_arg(args, 1, "name")?;
            Ok(Value::String(template::approval_subject(doctype, name)))
        });
        registry.register("todo_description", |args| {
            let action = str_arg(args, 0, "action")?;
            let doctype = str_arg(args, 1, "doctype")?;
            let name = str_arg(args, 2, "name")?;
            let state = str_arg(args, 3, "state")?;
            Ok(Value::String(template::todo_description(
                action, doctype, name, state,
            )))
        });
        registry
    }

    /// Register `func` under `name`, replacing any earlier registration.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F)
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(func));
    }

    /// Call a registered function by name.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let func = self
            .functions
            .get(name)
            .ok_or_else(|| Error::NotRegistered(name.to_string()))?;
        func(args)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

fn str_arg<'a>(args: &'a [Value], index: usize, name: &str) -> Result<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidValue(format!("argument {index} ({name}) must be a string")))
}
