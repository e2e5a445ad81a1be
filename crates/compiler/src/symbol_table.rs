//! Lexical scope stack
//!
//! A stack of name-to-value scopes shared by the type checker (values
//! are types) and the IR generator (values are IR variable names).
//! Lookup searches innermost-first; declaration targets the innermost
//! scope and rejects redefinition within it.

use std::collections::HashMap;

#[derive(Debug)]
pub struct SymbolTable<T> {
    scopes: Vec<HashMap<String, T>>,
}

impl<T> SymbolTable<T> {
    /// A table with a single root scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![HashMap::new()],
        }
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn exit_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "cannot exit the root scope");
        self.scopes.pop();
    }

    /// Bind `name` in the innermost scope. Shadowing an outer scope is
    /// allowed; redefining within the same scope is not.
    pub fn declare(&mut self, name: &str, value: T) -> Result<(), String> {
        let scope = self
            .scopes
            .last_mut()
            .expect("symbol table always has a root scope");
        if scope.contains_key(name) {
            return Err(format!("'{}' is already declared in this scope", name));
        }
        scope.insert(name.to_string(), value);
        Ok(())
    }

    /// Innermost binding for `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&T> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

impl<T> Default for SymbolTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
