//! Function signature table
//!
//! Written by the code generator, read by the VM when a call is resolved by
//! name at run time.

use std::collections::HashMap;

/// Entry point and declared parameter count of a user function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub label: String,
    pub arity: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    entries: HashMap<String, FunctionSignature>,
}

impl FunctionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace the signature for `name`
    pub fn register(&mut self, name: &str, signature: FunctionSignature) {
        self.entries.insert(name.to_string(), signature);
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
