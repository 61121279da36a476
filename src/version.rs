//! Version-aware root selection.
//!
//! Clients pick an alternate namespace root with a `version` media-type
//! parameter on the `Accept` header, e.g. `Accept: */*;version=v1`. Without
//! one, the unversioned root is used.

use tracing::debug;

use crate::error::RouteError;
use crate::registry::{HandlerRegistry, Namespace};

/// Root the path resolver should walk for a request.
#[derive(Debug, Clone, Copy)]
pub struct SelectedRoot<'r> {
    /// `None` for the unversioned root
    pub version: Option<&'r str>,
    pub root: &'r Namespace,
}

/// Extract the `version` parameter from an `Accept` header value.
///
/// Every media range is scanned and the first `version` parameter wins.
/// Parameter names are matched case-insensitively and quotes around the value
/// are stripped. An empty value counts as absent.
#[must_use]
pub fn parse_accept_version(accept: &str) -> Option<&str> {
    accept
        .split(',')
        .flat_map(|range| range.split(';').skip(1))
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("version"))
        .map(|(_, value)| value.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
}

/// Chooses between the unversioned root and the registered version roots.
pub struct VersionSelector;

impl VersionSelector {
    /// Select the root for an optional `Accept` header value.
    pub fn select<'r>(
        registry: &'r HandlerRegistry,
        accept: Option<&str>,
    ) -> Result<SelectedRoot<'r>, RouteError> {
        let Some(version) = accept.and_then(parse_accept_version) else {
            return Ok(SelectedRoot {
                version: None,
                root: registry.root(),
            });
        };
        match registry.version_entry(version) {
            Some((id, root)) => {
                debug!(version = %id, "Version root selected");
                Ok(SelectedRoot {
                    version: Some(id),
                    root,
                })
            }
            None => {
                debug!(version = %version, known = ?registry.version_ids(), "Unknown version");
                Err(RouteError::VersionNotFound {
                    version: version.to_string(),
                })
            }
        }
    }
}
