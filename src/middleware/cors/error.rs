use thiserror::Error;

/// CORS configuration error
///
/// Returned by [`CorsPolicyBuilder::build`](super::CorsPolicyBuilder::build)
/// when the configuration is invalid or would violate the CORS protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorsConfigError {
    /// Wildcard origin (`*`) cannot be used with credentials
    #[error(
        "CORS configuration error: Cannot use wildcard origin (*) with credentials. \
         When allow_credentials is true, you must specify exact origins."
    )]
    WildcardWithCredentials,

    /// The origin string is not of the form `scheme://host[:port]`
    #[error(
        "CORS configuration error: Invalid origin format '{origin}'. \
         Expected format: scheme://host:port (e.g., https://example.com)"
    )]
    InvalidOriginFormat { origin: String },

    /// An origin pattern failed to compile
    #[error("CORS configuration error: Invalid origin pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Credentials enabled but no origin can ever match
    #[error(
        "CORS configuration error: Cannot use credentials with empty origins list. \
         When allow_credentials is true, at least one origin must be specified."
    )]
    EmptyOriginsWithCredentials,
}
