//! # Configuration
//!
//! [`RouterConfig`] is read from YAML and can be overridden from the
//! environment:
//!
//! ```yaml
//! default_group: default
//! trace_requests: true
//! log_level: info
//! cors:
//!   allowed_origins: ["https://app.example.com"]
//!   origin_patterns: []
//!   allowed_headers: ["Content-Type", "Authorization"]
//!   expose_headers: ["X-Total-Count"]
//!   allow_credentials: true
//!   max_age: 3600
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Field |
//! |---|---|
//! | `NSR_DEFAULT_GROUP` | `default_group` |
//! | `NSR_CORS_ORIGINS` | `cors.allowed_origins` (comma-separated) |
//! | `NSR_CORS_MAX_AGE` | `cors.max_age` (seconds) |
//! | `NSR_TRACE_REQUESTS` | `trace_requests` (`true`/`false`) |
//!
//! Logging has its own variables; see [`crate::logging::LogConfig`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::warn;

use crate::middleware::{CorsConfigError, CorsPolicy, CorsPolicyBuilder};
use crate::registry::DEFAULT_GROUP;

/// CORS section of [`RouterConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Exact origins; `["*"]` allows every origin
    pub allowed_origins: Vec<String>,
    /// Regex patterns matched against the `Origin` header
    pub origin_patterns: Vec<String>,
    /// Empty mirrors `Access-Control-Request-Headers`
    pub allowed_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub allow_credentials: bool,
    pub max_age: Option<u32>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            origin_patterns: vec![],
            allowed_headers: vec![],
            expose_headers: vec![],
            allow_credentials: false,
            max_age: None,
        }
    }
}

impl CorsConfig {
    /// Validate and turn the section into a [`CorsPolicy`].
    pub fn build_policy(&self) -> Result<CorsPolicy, CorsConfigError> {
        let origins: Vec<&str> = self.allowed_origins.iter().map(String::as_str).collect();
        let patterns: Vec<&str> = self.origin_patterns.iter().map(String::as_str).collect();
        let headers: Vec<&str> = self.allowed_headers.iter().map(String::as_str).collect();
        let expose: Vec<&str> = self.expose_headers.iter().map(String::as_str).collect();
        let mut builder = CorsPolicyBuilder::new()
            .allowed_origins(&origins)
            .origin_patterns(&patterns)
            .allowed_headers(&headers)
            .expose_headers(&expose)
            .allow_credentials(self.allow_credentials);
        if let Some(age) = self.max_age {
            builder = builder.max_age(age);
        }
        builder.build()
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Reserved name of the fallback group
    pub default_group: String,
    pub cors: CorsConfig,
    /// Install [`TracingMiddleware`](crate::middleware::TracingMiddleware)
    pub trace_requests: bool,
    /// Log level used when neither `RUST_LOG` nor `NSR_LOG_LEVEL` is set
    pub log_level: Option<String>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_group: DEFAULT_GROUP.to_string(),
            cors: CorsConfig::default(),
            trace_requests: true,
            log_level: None,
        }
    }
}

impl RouterConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse router configuration")
    }

    /// Read a YAML file and apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults with environment overrides applied
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `NSR_*` environment variables onto this configuration.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(group) = var("NSR_DEFAULT_GROUP").filter(|g| !g.trim().is_empty()) {
            self.default_group = group.trim().to_string();
        }
        if let Some(origins) = var("NSR_CORS_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(age) = var("NSR_CORS_MAX_AGE") {
            match age.trim().parse::<u32>() {
                Ok(age) => self.cors.max_age = Some(age),
                Err(_) => warn!(value = %age, "Ignoring invalid NSR_CORS_MAX_AGE"),
            }
        }
        if let Some(trace) = var("NSR_TRACE_REQUESTS") {
            match trace.trim().parse::<bool>() {
                Ok(trace) => self.trace_requests = trace,
                Err(_) => warn!(value = %trace, "Ignoring invalid NSR_TRACE_REQUESTS"),
            }
        }
    }
}
