//! # Declarative Registry Definitions
//!
//! A registry can be described in YAML and bound to handler functions by
//! name at startup:
//!
//! ```yaml
//! default_group: default
//! groups:
//!   - namespace: /
//!     methods:
//!       GET: { handler: boom }
//!   - namespace: /foo
//!     name: Bar
//!     cors: true
//!     methods:
//!       GET:
//!         handler: show
//!         required: [one]
//!         optional:
//!           - { name: two, default: null }
//!         variadic_keyword: true
//!       POST:
//!         handler: update
//!         required: [one]
//!         coerce: { count: integer }
//!         choices: { mode: [fast, slow] }
//!         require: [count]
//! versions:
//!   v1:
//!     - namespace: /
//!       methods:
//!         GET: { handler: boom_v1 }
//! ```
//!
//! A group without `name` is the fallback group of its namespace. Validator
//! steps are attached in a fixed order: every `coerce` entry, then every
//! `choices` entry, then every `require` entry.

use anyhow::{Context, Result};
use http::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use crate::binder::{Coerce, OneOf, ParamType, RequireParam};
use crate::echo::echo_handler;
use crate::error::RegistryError;
use crate::registry::{
    Handler, HandlerDescriptor, HandlerGroupBuilder, HandlerRegistry, HandlerResult, RootBuilder,
    DEFAULT_GROUP,
};
use crate::BoundArguments;

/// Whole registry document
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryDefinition {
    /// Fallback group name; `None` uses [`DEFAULT_GROUP`]
    pub default_group: Option<String>,
    /// Groups of the unversioned root
    pub groups: Vec<GroupDefinition>,
    /// Alternate roots keyed by version id
    pub versions: BTreeMap<String, Vec<GroupDefinition>>,
}

/// One handler group at a namespace
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupDefinition {
    #[serde(default = "root_namespace")]
    pub namespace: String,
    /// `None` for the namespace's fallback group
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cors: bool,
    /// HTTP method name to handler signature
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDefinition>,
}

fn root_namespace() -> String {
    "/".to_string()
}

/// Signature of one method's handler
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MethodDefinition {
    /// Name looked up in the [`HandlerTable`]
    pub handler: String,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<OptionalDefinition>,
    #[serde(default)]
    pub variadic_keyword: bool,
    #[serde(default)]
    pub rest: Option<String>,
    #[serde(default)]
    pub coerce: BTreeMap<String, ParamType>,
    #[serde(default)]
    pub choices: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    pub require: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionalDefinition {
    pub name: String,
    #[serde(default)]
    pub default: Value,
}

/// Handler functions available to definitions, by name
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Arc<dyn Handler>>,
    echo_fallback: bool,
}

impl HandlerTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table where every unknown name resolves to [`echo_handler`]
    #[must_use]
    pub fn with_echo_fallback() -> Self {
        Self {
            handlers: HashMap::new(),
            echo_fallback: true,
        }
    }

    #[must_use]
    pub fn register<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(BoundArguments) -> HandlerResult + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Handler>> {
        match self.handlers.get(name) {
            Some(handler) => Some(Arc::clone(handler)),
            None if self.echo_fallback => Some(Arc::new(echo_handler)),
            None => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerTable")
            .field("handlers", &names)
            .field("echo_fallback", &self.echo_fallback)
            .finish()
    }
}

impl RegistryDefinition {
    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse registry definition")
    }

    /// Read a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry definition {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid registry definition {}", path.display()))
    }

    /// Bind every method to a handler from `table` and freeze the registry.
    pub fn build(&self, table: &HandlerTable) -> Result<HandlerRegistry, RegistryError> {
        let mut builder = HandlerRegistry::builder()
            .default_group(self.default_group.as_deref().unwrap_or(DEFAULT_GROUP));
        for group in &self.groups {
            builder = builder.group(&group.namespace, group.to_builder(table)?);
        }
        for (id, groups) in &self.versions {
            let mut root = RootBuilder::default();
            for group in groups {
                root = root.group(&group.namespace, group.to_builder(table)?);
            }
            builder = builder.version(id, |_| root);
        }
        builder.build()
    }
}

impl GroupDefinition {
    fn location(&self, method: &str) -> String {
        format!(
            "{method} {} {}",
            self.namespace,
            self.name.as_deref().unwrap_or("<fallback>")
        )
    }

    fn to_builder(&self, table: &HandlerTable) -> Result<HandlerGroupBuilder, RegistryError> {
        let mut group = match &self.name {
            Some(name) => HandlerGroupBuilder::new(name),
            None => HandlerGroupBuilder::fallback(),
        }
        .cors(self.cors);

        for (method_name, def) in &self.methods {
            let method = Method::from_bytes(method_name.to_ascii_uppercase().as_bytes())
                .map_err(|_| RegistryError::InvalidMethod {
                    method: method_name.clone(),
                    location: self.location(method_name),
                })?;
            let handler = table
                .get(&def.handler)
                .ok_or_else(|| RegistryError::UnknownHandler {
                    name: def.handler.clone(),
                    location: self.location(method_name),
                })?;
            group = group.handler(def.to_descriptor(method, handler));
        }
        Ok(group)
    }
}

impl MethodDefinition {
    fn to_descriptor(&self, method: Method, handler: Arc<dyn Handler>) -> HandlerDescriptor {
        let mut desc = HandlerDescriptor::from_arc(method, handler)
            .named(&self.handler)
            .required(&self.required);
        for opt in &self.optional {
            desc = desc.optional(&opt.name, opt.default.clone());
        }
        if self.variadic_keyword {
            desc = desc.variadic_keyword();
        }
        if let Some(rest) = &self.rest {
            desc = desc.rest(rest);
        }
        for (name, ty) in &self.coerce {
            desc = desc.validator(Coerce::new(name, *ty));
        }
        for (name, choices) in &self.choices {
            desc = desc.validator(OneOf::new(name, choices.iter().cloned()));
        }
        for name in &self.require {
            desc = desc.validator(RequireParam::new(name));
        }
        desc
    }
}
