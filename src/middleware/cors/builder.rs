use regex::Regex;
use std::sync::Arc;

use super::{CorsConfigError, CorsPolicy, OriginValidation};

/// Builder for [`CorsPolicy`] with a fluent API
///
/// # Example
///
/// ```rust
/// use nsrouter::middleware::CorsPolicyBuilder;
///
/// let cors = CorsPolicyBuilder::new()
///     .allowed_origins(&["https://example.com", "https://api.example.com"])
///     .allowed_headers(&["Content-Type", "Authorization"])
///     .allow_credentials(true)
///     .expose_headers(&["X-Total-Count"])
///     .max_age(3600)
///     .build()
///     .expect("valid CORS configuration");
/// assert!(cors.is_origin_allowed("https://example.com"));
/// ```
pub struct CorsPolicyBuilder {
    allowed_origins: Vec<String>,
    origin_patterns: Vec<String>,
    origin_validator: Option<Arc<dyn Fn(&str) -> bool + Send + Sync>>,
    allowed_headers: Vec<String>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    max_age: Option<u32>,
}

impl CorsPolicyBuilder {
    /// Create a builder with no origins allowed.
    ///
    /// Allowed headers start empty, which makes preflight responses mirror
    /// `Access-Control-Request-Headers`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allowed_origins: vec![],
            origin_patterns: vec![],
            origin_validator: None,
            allowed_headers: vec![],
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }

    /// Exact origins (`https://example.com`); `"*"` allows every origin
    #[must_use]
    pub fn allowed_origins(mut self, origins: &[&str]) -> Self {
        self.allowed_origins = origins.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Regex patterns an origin may match (e.g. `^https://.*\.example\.com$`)
    #[must_use]
    pub fn origin_patterns(mut self, patterns: &[&str]) -> Self {
        self.origin_patterns = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Decide origins with a function instead of lists
    #[must_use]
    pub fn origin_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.origin_validator = Some(Arc::new(validator));
        self
    }

    /// Headers a preflight may request; `"*"` or empty mirrors the request
    #[must_use]
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.allowed_headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Send `Access-Control-Allow-Credentials: true`.
    ///
    /// Not allowed together with a wildcard origin.
    #[must_use]
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Headers to expose to scripts on actual (non-preflight) responses
    #[must_use]
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.expose_headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Preflight cache duration in seconds
    #[must_use]
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Validate the configuration and build the policy.
    ///
    /// # Errors
    ///
    /// - [`CorsConfigError::WildcardWithCredentials`] for `*` plus credentials
    /// - [`CorsConfigError::InvalidOriginFormat`] for an origin that is not
    ///   `scheme://host[:port]`
    /// - [`CorsConfigError::InvalidPattern`] for a pattern that does not compile
    /// - [`CorsConfigError::EmptyOriginsWithCredentials`] when credentials are
    ///   enabled but nothing could ever match
    pub fn build(self) -> Result<CorsPolicy, CorsConfigError> {
        let wildcard = self.allowed_origins.iter().any(|o| o == "*");
        if self.allow_credentials && wildcard {
            return Err(CorsConfigError::WildcardWithCredentials);
        }
        if self.allow_credentials
            && self.allowed_origins.is_empty()
            && self.origin_patterns.is_empty()
            && self.origin_validator.is_none()
        {
            return Err(CorsConfigError::EmptyOriginsWithCredentials);
        }

        let origin_validation = if let Some(validator) = self.origin_validator {
            OriginValidation::Custom(validator)
        } else if wildcard {
            OriginValidation::Wildcard
        } else {
            for origin in &self.allowed_origins {
                check_origin_format(origin)?;
            }
            if self.origin_patterns.is_empty() {
                OriginValidation::Exact(self.allowed_origins)
            } else {
                // exact origins join the patterns as anchored literals
                let mut patterns = self
                    .allowed_origins
                    .iter()
                    .map(|o| format!("^{}$", regex::escape(o)))
                    .collect::<Vec<_>>();
                patterns.extend(self.origin_patterns);
                let compiled = patterns
                    .iter()
                    .map(|p| {
                        Regex::new(p).map_err(|e| CorsConfigError::InvalidPattern {
                            pattern: p.clone(),
                            message: e.to_string(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                OriginValidation::Regex(compiled)
            }
        };

        Ok(CorsPolicy {
            origin_validation,
            allowed_headers: self.allowed_headers,
            allow_credentials: self.allow_credentials,
            expose_headers: self.expose_headers,
            max_age: self.max_age,
        })
    }
}

impl Default for CorsPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn check_origin_format(origin: &str) -> Result<(), CorsConfigError> {
    let invalid = || CorsConfigError::InvalidOriginFormat {
        origin: origin.to_string(),
    };
    let url = url::Url::parse(origin).map_err(|_| invalid())?;
    let bare = url.host_str().is_some()
        && url.path() == "/"
        && url.query().is_none()
        && url.fragment().is_none()
        && !origin.ends_with('/');
    if bare {
        Ok(())
    } else {
        Err(invalid())
    }
}
