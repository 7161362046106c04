//! Name-to-descriptor registry for coverage operations.
//!
//! The registry is an explicit value passed into the executor and cache at
//! construction time. There is no process-wide instance; tests and
//! embedders build isolated registries freely.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::descriptor::OperationDescriptor;
use crate::error::{ProcessingError, Result};
use crate::ops;

/// Maps operation names to their descriptors.
pub struct OperationRegistry {
    ops: RwLock<HashMap<String, Arc<OperationDescriptor>>>,
}

impl OperationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            ops: RwLock::new(HashMap::new()),
        }
    }

    /// A registry pre-populated with the builtin operations.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        ops::register_defaults(&registry);
        registry
    }

    /// Register a descriptor under its name.
    ///
    /// Registering over an existing name replaces the previous descriptor;
    /// callers use this to substitute their own implementation of a
    /// builtin operation.
    pub fn register(&self, descriptor: OperationDescriptor) {
        let name = descriptor.name().to_string();
        let mut ops = self.ops.write().expect("registry lock poisoned");
        if ops.insert(name.clone(), Arc::new(descriptor)).is_some() {
            debug!(operation = %name, "Replaced registered operation");
        }
    }

    /// Look up a descriptor by name.
    pub fn lookup(&self, name: &str) -> Result<Arc<OperationDescriptor>> {
        let ops = self.ops.read().expect("registry lock poisoned");
        ops.get(name)
            .cloned()
            .ok_or_else(|| ProcessingError::operation_not_found(name))
    }

    /// Check whether an operation is registered.
    pub fn contains(&self, name: &str) -> bool {
        let ops = self.ops.read().expect("registry lock poisoned");
        ops.contains_key(name)
    }

    /// Registered operation names, sorted.
    pub fn names(&self) -> Vec<String> {
        let ops = self.ops.read().expect("registry lock poisoned");
        let mut names: Vec<String> = ops.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.ops.read().expect("registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
