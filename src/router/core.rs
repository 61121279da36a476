use http::Method;
use std::sync::Arc;
use tracing::debug;

use crate::error::RouteError;
use crate::registry::{HandlerDescriptor, HandlerGroup, HandlerRegistry, Namespace};

/// Group found for a path, before the request method is considered.
///
/// The dispatcher stops here for CORS preflight; everything else goes on to
/// [`select`](Self::select).
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    /// Path of the namespace the group lives at, e.g. `/foo`
    pub namespace_path: Arc<str>,
    pub group: Arc<HandlerGroup>,
    /// Number of leading path segments spent on namespaces and the group name
    pub consumed: usize,
}

impl ResolvedGroup {
    /// Pick the handler for `method`, handing the unconsumed segments on.
    pub fn select(self, method: &Method, segments: &[String]) -> Result<ResolvedTarget, RouteError> {
        let Some(descriptor) = self.group.descriptor(method) else {
            return Err(RouteError::MethodNotAllowed {
                method: method.clone(),
                allowed: self.group.allowed_methods(),
            });
        };
        let descriptor = Arc::clone(descriptor);
        let remaining = segments.get(self.consumed..).unwrap_or_default().to_vec();
        Ok(ResolvedTarget {
            namespace_path: self.namespace_path,
            group: self.group,
            descriptor,
            remaining,
        })
    }
}

/// Handler chosen for a request plus the path segments left for binding.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub namespace_path: Arc<str>,
    pub group: Arc<HandlerGroup>,
    pub descriptor: Arc<HandlerDescriptor>,
    /// Candidate positional arguments, in request order
    pub remaining: Vec<String>,
}

/// Walks request segments against one root of the registry.
///
/// Descent is greedy: every segment naming a child namespace is consumed.
/// The first segment that does not is tried as a group name at the deepest
/// namespace reached; failing that the fallback group of that namespace
/// answers. The resolver never climbs back to a parent once it has descended.
#[derive(Debug, Clone, Copy)]
pub struct PathResolver<'r> {
    root: &'r Namespace,
    default_group: &'r str,
}

impl<'r> PathResolver<'r> {
    #[must_use]
    pub fn new(root: &'r Namespace, default_group: &'r str) -> Self {
        Self {
            root,
            default_group,
        }
    }

    /// Resolver over the unversioned root of `registry`
    #[must_use]
    pub fn for_registry(registry: &'r HandlerRegistry) -> Self {
        Self::new(registry.root(), registry.default_group())
    }

    /// Deepest namespace reachable by consuming segments, and how many were consumed
    #[must_use]
    pub fn descend(&self, segments: &[String]) -> (&'r Namespace, usize) {
        let mut node = self.root;
        let mut consumed = 0;
        while let Some(child) = segments.get(consumed).and_then(|s| node.child(s)) {
            node = child;
            consumed += 1;
        }
        (node, consumed)
    }

    /// Resolve the handler group for a path.
    pub fn resolve_group(&self, segments: &[String]) -> Result<ResolvedGroup, RouteError> {
        let (node, mut consumed) = self.descend(segments);

        let group = match segments.get(consumed).and_then(|s| node.group(s)) {
            Some(group) => {
                consumed += 1;
                group
            }
            None => node.group(self.default_group).ok_or_else(|| {
                debug!(
                    namespace = %node.path(),
                    consumed,
                    "No group and no fallback group at namespace"
                );
                RouteError::NotFound {
                    path: format!("/{}", segments.join("/")),
                }
            })?,
        };

        debug!(
            namespace = %node.path(),
            group = %group.name(),
            consumed,
            remaining = segments.len() - consumed,
            "Handler group resolved"
        );

        Ok(ResolvedGroup {
            namespace_path: Arc::clone(node.path()),
            group: Arc::clone(group),
            consumed,
        })
    }

    /// Resolve group and handler in one step.
    pub fn resolve(&self, method: &Method, segments: &[String]) -> Result<ResolvedTarget, RouteError> {
        self.resolve_group(segments)?.select(method, segments)
    }
}
