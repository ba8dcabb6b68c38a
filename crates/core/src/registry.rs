//! Function registry.
//!
//! A matched [`Invocation`] names its target as a dotted string such as
//! `file_utils.copy`. A [`FunctionRegistry`] turns that name into something
//! callable. [`Registry`] is the in-process implementation: a map of closures
//! that also tries each `use` import as a prefix.

use std::collections::HashMap;

use log::debug;

use crate::error::{Error, Result};
use crate::matcher::Invocation;
use crate::value::Value;

pub trait FunctionRegistry {
    /// Calls `target` with `arguments` in binding order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownTarget`] if nothing is registered under
    /// `target`, or whatever error the called function reports.
    fn call(&self, target: &str, arguments: &[Option<Value>]) -> Result<Option<Value>>;
}

type Function = Box<dyn Fn(&[Option<Value>]) -> Result<Option<Value>> + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    imports: Vec<String>,
    functions: HashMap<String, Function>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that also resolves targets relative to `imports`.
    #[must_use]
    pub fn with_imports(imports: &[String]) -> Self {
        Self {
            imports: imports.to_vec(),
            functions: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[Option<Value>]) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.functions.insert(name.to_string(), Box::new(function));
    }

    /// Finds the registered name for `target`: the target itself, else the
    /// first import it resolves under.
    #[must_use]
    pub fn resolve(&self, target: &str) -> Option<&str> {
        if let Some((name, _)) = self.functions.get_key_value(target) {
            return Some(name);
        }

        self.imports.iter().find_map(|import| {
            let qualified = format!("{import}.{target}");
            self.functions
                .get_key_value(&qualified)
                .map(|(name, _)| name.as_str())
        })
    }
}

impl FunctionRegistry for Registry {
    fn call(&self, target: &str, arguments: &[Option<Value>]) -> Result<Option<Value>> {
        let name = self
            .resolve(target)
            .ok_or_else(|| Error::UnknownTarget(target.to_string()))?;
        debug!("Calling {name} with {} arguments", arguments.len());

        match self.functions.get(name) {
            Some(function) => function(arguments),
            None => Err(Error::UnknownTarget(target.to_string())),
        }
    }
}

/// Forwards a matched invocation to `registry`.
///
/// # Arguments
///
/// * `registry` - Where targets are looked up and called
/// * `invocation` - A matched invocation
///
/// # Returns
///
/// Whatever the called function returned, or `None` if it returns nothing.
///
/// # Errors
///
/// Propagates the registry's error for an unknown target or a failed call.
pub fn dispatch<R: FunctionRegistry + ?Sized>(
    registry: &R,
    invocation: &Invocation,
) -> Result<Option<Value>> {
    registry.call(&invocation.target, &invocation.arguments)
}
