//! Index targets and index definitions.
//!
//! An [`IndexDefinition`] is built once per index and passed wherever criteria
//! are created. It owns the default scopes applied to every fresh criteria and
//! a registry of named scopes looked up explicitly by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::criteria::Criteria;
use crate::error::ScopeError;

/// The index (and optional mapping type) a criteria searches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    name: String,
    type_name: Option<String>,
    prefix: Option<String>,
}

impl IndexTarget {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: None,
            prefix: None,
        }
    }

    /// Set the mapping type used by engines that still have types.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the prefix joined in front of the index name with `-`.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// The index name including the prefix, e.g. `"test-products"`.
    pub fn index_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}-{}", prefix, self.name),
            None => self.name.clone(),
        }
    }

    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Path of the index, or of the type within it when a type is set.
    pub fn path(&self) -> String {
        match &self.type_name {
            Some(type_name) => format!("/{}/{}", self.index_name(), type_name),
            None => format!("/{}", self.index_name()),
        }
    }
}

/// A scope applied to every criteria created from a definition.
pub type DefaultScope = Arc<dyn Fn(Criteria) -> Criteria + Send + Sync>;

/// A named scope taking positional arguments.
pub type NamedScope = Arc<dyn Fn(Criteria, &[Value]) -> Criteria + Send + Sync>;

/// Immutable per-index configuration: target, default scopes and named scopes.
#[derive(Clone)]
pub struct IndexDefinition {
    target: Arc<IndexTarget>,
    default_scopes: Vec<DefaultScope>,
    scopes: HashMap<String, NamedScope>,
}

impl IndexDefinition {
    pub fn new(target: IndexTarget) -> Self {
        Self {
            target: Arc::new(target),
            default_scopes: Vec::new(),
            scopes: HashMap::new(),
        }
    }

    pub fn with_default_scope(
        mut self,
        scope: impl Fn(Criteria) -> Criteria + Send + Sync + 'static,
    ) -> Self {
        self.default_scopes.push(Arc::new(scope));
        self
    }

    pub fn with_scope(
        mut self,
        name: impl Into<String>,
        scope: impl Fn(Criteria, &[Value]) -> Criteria + Send + Sync + 'static,
    ) -> Self {
        self.scopes.insert(name.into(), Arc::new(scope));
        self
    }

    pub fn target(&self) -> &Arc<IndexTarget> {
        &self.target
    }

    /// A fresh criteria for this index with all default scopes applied in
    /// registration order.
    pub fn criteria(&self) -> Criteria {
        self.default_scopes
            .iter()
            .fold(Criteria::for_target(self.target.clone()), |criteria, scope| {
                scope(criteria)
            })
    }

    /// Apply the named scope to a fresh criteria.
    pub fn scope(&self, name: &str, args: &[Value]) -> Result<Criteria, ScopeError> {
        self.apply_scope(&self.criteria(), name, args)
    }

    /// Apply the named scope on top of an existing criteria.
    pub fn apply_scope(
        &self,
        criteria: &Criteria,
        name: &str,
        args: &[Value],
    ) -> Result<Criteria, ScopeError> {
        let scope = self
            .scopes
            .get(name)
            .ok_or_else(|| ScopeError::unknown(name))?;
        Ok(scope(criteria.clone(), args))
    }

    pub fn has_scope(&self, name: &str) -> bool {
        self.scopes.contains_key(name)
    }
}

impl fmt::Debug for IndexDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut scope_names: Vec<&String> = self.scopes.keys().collect();
        scope_names.sort();
        f.debug_struct("IndexDefinition")
            .field("target", &self.target)
            .field("default_scopes", &self.default_scopes.len())
            .field("scopes", &scope_names)
            .finish()
    }
}
