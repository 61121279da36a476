use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::core::{lookup_key, HandlerGroup, HandlerRegistry, Namespace, DEFAULT_GROUP};
use super::descriptor::HandlerDescriptor;
use crate::error::RegistryError;
use crate::transport::split_path;

/// Collects the handlers of one group before the registry is frozen.
#[derive(Debug)]
pub struct HandlerGroupBuilder {
    /// `None` stands for the registry's fallback group
    name: Option<String>,
    cors: bool,
    handlers: Vec<HandlerDescriptor>,
}

impl HandlerGroupBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            cors: false,
            handlers: Vec::new(),
        }
    }

    /// The fallback group of whatever namespace it is added to
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            name: None,
            cors: false,
            handlers: Vec::new(),
        }
    }

    /// Let the CORS policy handle preflight and decorate responses
    #[must_use]
    pub fn cors(mut self, enabled: bool) -> Self {
        self.cors = enabled;
        self
    }

    #[must_use]
    pub fn handler(mut self, descriptor: HandlerDescriptor) -> Self {
        self.handlers.push(descriptor);
        self
    }

    fn finish(self, namespace: &str, default_group: &str) -> Result<HandlerGroup, RegistryError> {
        let name = self.name.unwrap_or_else(|| default_group.to_string());
        if name.is_empty() {
            return Err(RegistryError::EmptyName {
                what: format!("group name at '{namespace}'"),
            });
        }
        let mut methods = HashMap::with_capacity(self.handlers.len());
        for descriptor in self.handlers {
            descriptor.check(&name)?;
            let method = descriptor.method().clone();
            if methods.contains_key(&method) {
                return Err(RegistryError::DuplicateMethod {
                    namespace: namespace.to_string(),
                    group: name,
                    method,
                });
            }
            methods.insert(method, Arc::new(descriptor));
        }
        Ok(HandlerGroup::new(name, methods, self.cors))
    }
}

/// Groups destined for one root (the unversioned root or a version root)
#[derive(Debug, Default)]
pub struct RootBuilder {
    groups: Vec<(String, HandlerGroupBuilder)>,
}

impl RootBuilder {
    /// Add a group under a `/`-separated namespace prefix (`""` or `"/"` is the root)
    #[must_use]
    pub fn group(mut self, prefix: &str, group: HandlerGroupBuilder) -> Self {
        self.groups.push((prefix.to_string(), group));
        self
    }

    fn finish(self, label: &str, default_group: &str) -> Result<Namespace, RegistryError> {
        let mut root = Namespace::new(String::new(), Arc::from("/"));
        for (prefix, group) in self.groups {
            let segments: Vec<String> = split_path(&prefix)
                .into_iter()
                .map(|s| s.to_ascii_lowercase())
                .collect();
            let node = descend_or_create(&mut root, &segments);
            let ns_path = node.path().to_string();
            let group = group.finish(&ns_path, default_group)?;
            let key = group.key().to_string();
            if node.groups_mut().contains_key(&key) {
                return Err(RegistryError::DuplicateGroup {
                    namespace: ns_path,
                    group: group.name().to_string(),
                });
            }
            debug!(
                root = %label,
                namespace = %ns_path,
                group = %group.name(),
                methods = ?group.allowed_methods(),
                cors = group.cors_enabled(),
                "Handler group registered"
            );
            node.groups_mut().insert(key, Arc::new(group));
        }
        check_shadowing(&root)?;
        Ok(root)
    }
}

fn descend_or_create<'a>(root: &'a mut Namespace, segments: &[String]) -> &'a mut Namespace {
    let mut node = root;
    for segment in segments {
        let path = if node.path().as_ref() == "/" {
            format!("/{segment}")
        } else {
            format!("{}/{segment}", node.path())
        };
        node = node
            .children_mut()
            .entry(segment.clone())
            .or_insert_with(|| Namespace::new(segment.clone(), Arc::from(path)));
    }
    node
}

/// A group keyed like a sibling namespace could never be reached, because the
/// resolver always prefers descending.
fn check_shadowing(node: &Namespace) -> Result<(), RegistryError> {
    for group in node.groups() {
        if node.child(group.key()).is_some() {
            return Err(RegistryError::ShadowedGroup {
                namespace: node.path().to_string(),
                group: group.name().to_string(),
            });
        }
    }
    node.children().try_for_each(check_shadowing)
}

/// Assembles a [`HandlerRegistry`]; [`build`](Self::build) freezes it.
#[derive(Debug)]
pub struct RegistryBuilder {
    default_group: String,
    root: RootBuilder,
    versions: Vec<(String, RootBuilder)>,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            default_group: DEFAULT_GROUP.to_string(),
            root: RootBuilder::default(),
            versions: Vec::new(),
        }
    }

    /// Override the reserved fallback group name
    #[must_use]
    pub fn default_group(mut self, name: &str) -> Self {
        self.default_group = lookup_key(name).into_owned();
        self
    }

    /// Add a group to the unversioned root
    #[must_use]
    pub fn group(mut self, prefix: &str, group: HandlerGroupBuilder) -> Self {
        self.root = self.root.group(prefix, group);
        self
    }

    /// Register an alternate root selected by `Accept: */*;version=<id>`
    #[must_use]
    pub fn version<F>(mut self, id: &str, f: F) -> Self
    where
        F: FnOnce(RootBuilder) -> RootBuilder,
    {
        self.versions.push((id.to_string(), f(RootBuilder::default())));
        self
    }

    pub fn build(self) -> Result<HandlerRegistry, RegistryError> {
        if self.default_group.is_empty() {
            return Err(RegistryError::EmptyName {
                what: "default group name".to_string(),
            });
        }
        let root = self.root.finish("unversioned", &self.default_group)?;
        let mut versions = HashMap::with_capacity(self.versions.len());
        for (id, builder) in self.versions {
            if id.is_empty() {
                return Err(RegistryError::EmptyName {
                    what: "version id".to_string(),
                });
            }
            if versions.contains_key(&id) {
                return Err(RegistryError::DuplicateVersion { version: id });
            }
            let ns = builder.finish(&id, &self.default_group)?;
            versions.insert(id, ns);
        }

        let registry = HandlerRegistry::new(root, versions, self.default_group);
        info!(
            handlers = registry.walk().len(),
            versions = ?registry.version_ids(),
            default_group = %registry.default_group(),
            depth = registry.root().depth(),
            "Handler registry built"
        );
        Ok(registry)
    }
}
