mod core;
mod cors;
mod tracing;

pub use core::Middleware;
pub use cors::{CorsConfigError, CorsPolicy, CorsPolicyBuilder, OriginValidation};
pub use tracing::TracingMiddleware;
