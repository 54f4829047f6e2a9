//! Explicit registration of become methods by name.

use std::collections::BTreeMap;

use log::debug;

use crate::devel_su::{self, DevelSu};
use crate::error::{BecomeError, BecomeResult};
use crate::method::BecomeMethod;

/// Creates a fresh method instance for one escalation attempt.
pub type MethodFactory = fn() -> Box<dyn BecomeMethod>;

/// Name-keyed table of become method factories.
#[derive(Debug, Clone, Default)]
pub struct BecomeRegistry {
    factories: BTreeMap<String, MethodFactory>,
}

impl BecomeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every method this crate ships.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .factories
            .insert(devel_su::NAME.to_string(), DevelSu::boxed);
        registry
    }

    /// Register `factory` under `name`. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, factory: MethodFactory) -> BecomeResult<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(BecomeError::DuplicateMethod(name));
        }
        debug!("registered become method {name}");
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Instantiate the method registered under `name`.
    pub fn create(&self, name: &str) -> BecomeResult<Box<dyn BecomeMethod>> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| BecomeError::UnknownMethod(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
