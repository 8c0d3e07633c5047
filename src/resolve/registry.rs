// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Domain registry correlation.
//!
//! The engine never discovers models itself; the host hands it a
//! [`DomainRegistry`] that answers "is this name a known domain type".

use std::collections::HashMap;

/// Outcome of a registry lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correlation {
    pub confirmed: bool,
    pub canonical_name: String,
}

/// Membership test for domain-object types.
///
/// An unknown name is the common case (helpers, free functions, closures) and
/// must come back as `None`, never as a failure.
pub trait DomainRegistry: Send + Sync {
    /// Canonical name of `name` if it is a known domain type.
    fn lookup(&self, name: &str) -> Option<String>;

    /// Correlate `name` against the registry.
    fn is_known_domain_type(&self, name: &str) -> Correlation {
        match self.lookup(name) {
            Some(canonical_name) => Correlation {
                confirmed: true,
                canonical_name,
            },
            None => Correlation {
                confirmed: false,
                canonical_name: name.to_string(),
            },
        }
    }
}

impl<F> DomainRegistry for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn lookup(&self, name: &str) -> Option<String> {
        self(name)
    }
}

/// Registry that knows no types.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyRegistry;

impl DomainRegistry for EmptyRegistry {
    fn lookup(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Fixed set of model names, with optional aliases.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    names: HashMap<String, String>,
}

impl StaticRegistry {
    /// Registry containing exactly `models`.
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        models.into_iter().collect()
    }

    /// Register an alias that resolves to `canonical`.
    pub fn with_alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.names.insert(alias.into(), canonical.into());
        self
    }

    /// Number of registered names, aliases included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for StaticRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let names = iter
            .into_iter()
            .map(|name| {
                let name = name.into();
                (name.clone(), name)
            })
            .collect();
        Self { names }
    }
}

impl DomainRegistry for StaticRegistry {
    fn lookup(&self, name: &str) -> Option<String> {
        // `::User` and `User` name the same top-level type
        self.names.get(name.trim_start_matches("::")).cloned()
    }
}
