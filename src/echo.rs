use crate::binder::BoundArguments;
use crate::registry::{HandlerResult, Reply};

/// Handler that replies with its own arguments as
/// `{"args": [...], "kwargs": {...}}`.
///
/// Backs the CLI's `resolve` command and any definition method whose handler
/// name is not in the table when the echo fallback is enabled.
pub fn echo_handler(args: BoundArguments) -> HandlerResult {
    Ok(Reply::new(args.to_json()))
}
