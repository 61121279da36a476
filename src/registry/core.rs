use http::Method;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use super::builder::RegistryBuilder;
use super::descriptor::HandlerDescriptor;

/// Reserved name of the fallback group consulted when no path segment names
/// an existing group.
pub const DEFAULT_GROUP: &str = "default";

/// Canonical ordering for method listings (`Allow`, CORS preflight)
const METHOD_ORDER: [Method; 9] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
    Method::TRACE,
    Method::CONNECT,
];

fn method_rank(method: &Method) -> usize {
    METHOD_ORDER
        .iter()
        .position(|m| m == method)
        .unwrap_or(METHOD_ORDER.len())
}

/// Lower-case a lookup key, borrowing when it already is.
pub(crate) fn lookup_key(segment: &str) -> Cow<'_, str> {
    if segment.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(segment.to_ascii_lowercase())
    } else {
        Cow::Borrowed(segment)
    }
}

/// Named bundle of per-method handlers living at one namespace.
#[derive(Debug)]
pub struct HandlerGroup {
    name: String,
    key: String,
    methods: HashMap<Method, Arc<HandlerDescriptor>>,
    cors: bool,
}

impl HandlerGroup {
    pub(crate) fn new(
        name: String,
        methods: HashMap<Method, Arc<HandlerDescriptor>>,
        cors: bool,
    ) -> Self {
        let key = name.to_ascii_lowercase();
        Self {
            name,
            key,
            methods,
            cors,
        }
    }

    /// Name as registered
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased lookup key
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the CORS policy applies to this group
    #[must_use]
    pub fn cors_enabled(&self) -> bool {
        self.cors
    }

    #[must_use]
    pub fn descriptor(&self, method: &Method) -> Option<&Arc<HandlerDescriptor>> {
        self.methods.get(method)
    }

    /// Registered methods in canonical order
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.methods.keys().cloned().collect();
        methods.sort_by(|a, b| {
            method_rank(a)
                .cmp(&method_rank(b))
                .then_with(|| a.as_str().cmp(b.as_str()))
        });
        methods
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Arc<HandlerDescriptor>> {
        self.methods.values()
    }
}

/// Tree node reachable by consuming one path segment per level.
#[derive(Debug)]
pub struct Namespace {
    name: String,
    path: Arc<str>,
    children: HashMap<String, Namespace>,
    groups: HashMap<String, Arc<HandlerGroup>>,
}

impl Namespace {
    pub(crate) fn new(name: String, path: Arc<str>) -> Self {
        Self {
            name,
            path,
            children: HashMap::new(),
            groups: HashMap::new(),
        }
    }

    /// Segment this namespace is keyed by (empty for a root)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full path from the root, e.g. `/foo/bar`
    #[must_use]
    pub fn path(&self) -> &Arc<str> {
        &self.path
    }

    /// Child namespace for a path segment (case-insensitive)
    #[must_use]
    pub fn child(&self, segment: &str) -> Option<&Namespace> {
        self.children.get(lookup_key(segment).as_ref())
    }

    /// Handler group by name (case-insensitive)
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Arc<HandlerGroup>> {
        self.groups.get(lookup_key(name).as_ref())
    }

    pub fn children(&self) -> impl Iterator<Item = &Namespace> {
        self.children.values()
    }

    pub fn groups(&self) -> impl Iterator<Item = &Arc<HandlerGroup>> {
        self.groups.values()
    }

    /// Nesting depth below this node (0 for a leaf)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.children
            .values()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn children_mut(&mut self) -> &mut HashMap<String, Namespace> {
        &mut self.children
    }

    pub(crate) fn groups_mut(&mut self) -> &mut HashMap<String, Arc<HandlerGroup>> {
        &mut self.groups
    }

    fn collect(&self, version: Option<&str>, out: &mut Vec<RouteEntry>) {
        for group in self.groups.values() {
            for method in group.allowed_methods() {
                if let Some(desc) = group.descriptor(&method) {
                    out.push(RouteEntry {
                        version: version.map(str::to_string),
                        namespace: self.path.to_string(),
                        group: group.name().to_string(),
                        method: method.clone(),
                        signature: desc.signature(),
                        handler: desc.name().map(str::to_string),
                        cors: group.cors_enabled(),
                    });
                }
            }
        }
        for child in self.children.values() {
            child.collect(version, out);
        }
    }
}

/// One line of a registry listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub version: Option<String>,
    pub namespace: String,
    pub group: String,
    pub method: Method,
    pub signature: String,
    pub handler: Option<String>,
    pub cors: bool,
}

/// Frozen namespace tree plus alternate roots keyed by version id.
#[derive(Debug)]
pub struct HandlerRegistry {
    root: Namespace,
    versions: HashMap<String, Namespace>,
    default_group: String,
}

impl HandlerRegistry {
    pub(crate) fn new(
        root: Namespace,
        versions: HashMap<String, Namespace>,
        default_group: String,
    ) -> Self {
        Self {
            root,
            versions,
            default_group,
        }
    }

    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Unversioned root
    #[must_use]
    pub fn root(&self) -> &Namespace {
        &self.root
    }

    /// Root registered under a version id (exact match)
    #[must_use]
    pub fn version(&self, id: &str) -> Option<&Namespace> {
        self.versions.get(id)
    }

    /// Like [`version`](Self::version), also returning the stored id
    #[must_use]
    pub fn version_entry(&self, id: &str) -> Option<(&str, &Namespace)> {
        self.versions
            .get_key_value(id)
            .map(|(k, ns)| (k.as_str(), ns))
    }

    /// Registered version ids, sorted
    #[must_use]
    pub fn version_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.versions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Lower-cased name of the fallback group
    #[must_use]
    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    /// Every registered handler, unversioned root first, sorted for stable output
    #[must_use]
    pub fn walk(&self) -> Vec<RouteEntry> {
        let mut out = Vec::new();
        self.root.collect(None, &mut out);
        for id in self.version_ids() {
            if let Some(ns) = self.versions.get(id) {
                ns.collect(Some(id), &mut out);
            }
        }
        out.sort_by(|a, b| {
            (&a.version, &a.namespace, &a.group, method_rank(&a.method)).cmp(&(
                &b.version,
                &b.namespace,
                &b.group,
                method_rank(&b.method),
            ))
        });
        out
    }

    /// Write the registry listing, one handler per line
    pub fn write_routes(&self, out: &mut impl Write) -> io::Result<()> {
        let entries = self.walk();
        writeln!(
            out,
            "[registry] default_group={} versions={:?} handlers={}",
            self.default_group,
            self.version_ids(),
            entries.len()
        )?;
        for e in entries {
            writeln!(
                out,
                "[handler] {}{} {} -> {}{}{}",
                e.version
                    .as_deref()
                    .map(|v| format!("({v}) "))
                    .unwrap_or_default(),
                e.namespace,
                e.group,
                e.signature,
                e.handler
                    .as_deref()
                    .map(|h| format!(" via {h}"))
                    .unwrap_or_default(),
                if e.cors { " [cors]" } else { "" }
            )?;
        }
        Ok(())
    }

    /// Print the registry to stdout
    pub fn dump_routes(&self) -> io::Result<()> {
        self.write_routes(&mut io::stdout().lock())
    }
}
