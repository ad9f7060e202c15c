//! Variable environment.
//!
//! Variables are written by `Read` and by loop induction-variable
//! binding, and nowhere else. Loop bodies get their own scope: a map is
//! pushed when a `rep` iteration starts and popped when it ends, so names
//! introduced inside the iteration vanish afterwards. Writes update an
//! existing binding wherever it lives; otherwise they define the name in
//! the innermost scope.

use std::collections::HashMap;

use crate::command;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// A stack of name→value scopes; the last entry is the innermost.
#[derive(Debug, Clone)]
pub struct Variables {
    scopes: Vec<HashMap<String, f64>>,
}

impl Variables {
    /// Create an environment with a single (global) scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![HashMap::new()],
        }
    }

    /// Resolve a name, innermost scope first.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name).copied())
    }

    /// Update an existing binding wherever it lives, or define the name
    /// in the innermost scope.
    pub fn set(&mut self, name: &str, value: f64) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.define(name, value);
    }

    /// Define the name in the innermost scope, shadowing any outer
    /// binding of the same name.
    pub fn define(&mut self, name: &str, value: f64) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_owned(), value);
        }
    }

    /// Open a fresh innermost scope.
    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Drop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }
}

impl Default for Variables {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Identifier validation
// ---------------------------------------------------------------------------

/// Whether `name` is usable as a variable name: `[A-Za-z_][A-Za-z0-9_]*`
/// and not a reserved keyword.
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !command::is_reserved(name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- scoping --

    #[test]
    fn get_and_set_in_global_scope() {
        let mut vars = Variables::new();
        assert_eq!(vars.get("x"), None);
        vars.set("x", 5.0);
        assert_eq!(vars.get("x"), Some(5.0));
        vars.set("x", 6.0);
        assert_eq!(vars.get("x"), Some(6.0));
    }

    #[test]
    fn inner_definitions_vanish_on_pop() {
        let mut vars = Variables::new();
        vars.push_scope();
        vars.set("tmp", 1.0);
        assert_eq!(vars.get("tmp"), Some(1.0));
        vars.pop_scope();
        assert_eq!(vars.get("tmp"), None);
    }

    #[test]
    fn set_updates_outer_binding_from_inner_scope() {
        let mut vars = Variables::new();
        vars.set("n", 1.0);
        vars.push_scope();
        vars.set("n", 2.0);
        vars.pop_scope();
        assert_eq!(vars.get("n"), Some(2.0));
    }

    #[test]
    fn define_shadows_outer_binding() {
        let mut vars = Variables::new();
        vars.set("i", 9.0);
        vars.push_scope();
        vars.define("i", 0.0);
        assert_eq!(vars.get("i"), Some(0.0));
        vars.pop_scope();
        assert_eq!(vars.get("i"), Some(9.0));
    }

    #[test]
    fn global_scope_survives_extra_pops() {
        let mut vars = Variables::new();
        vars.set("x", 1.0);
        vars.pop_scope();
        assert_eq!(vars.get("x"), Some(1.0));
    }

    // -- names --

    #[test]
    fn valid_names() {
        assert!(is_valid_name("x"));
        assert!(is_valid_name("_tmp"));
        assert!(is_valid_name("row2"));
        assert!(is_valid_name("snake_case"));
    }

    #[test]
    fn invalid_names() {
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("2x"));
        assert!(!is_valid_name("a-b"));
        assert!(!is_valid_name("a.b"));
    }

    #[test]
    fn keywords_are_not_names() {
        assert!(!is_valid_name("rep"));
        assert!(!is_valid_name("Point"));
        assert!(!is_valid_name("BREAK"));
    }
}
