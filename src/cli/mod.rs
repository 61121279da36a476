//! # CLI Module
//!
//! Command-line access to a declarative registry definition.
//!
//! ## Commands
//!
//! ### `routes`
//!
//! Build the registry from a definition and list every handler:
//!
//! ```bash
//! nsrouter routes --definition registry.yaml
//! ```
//!
//! ### `resolve`
//!
//! Dispatch a single request against the definition and print the response
//! as JSON. Handler names that are not built into the binary are bound to the
//! echo handler, so the printed body shows exactly which arguments the
//! request would produce:
//!
//! ```bash
//! nsrouter resolve --definition registry.yaml GET '/foo/bar/che?two=x'
//! nsrouter resolve --definition registry.yaml POST /foo/bar --body '{"one": 1}'
//! nsrouter resolve --definition registry.yaml OPTIONS /foo \
//!     --header 'Origin: https://app.example.com' \
//!     --header 'Access-Control-Request-Method: GET'
//! ```
//!
//! `--config` points at a [`RouterConfig`](crate::config::RouterConfig) YAML
//! file (CORS policy, default group, request tracing, log level).

mod commands;


pub use commands::{run_cli, run_command, Cli, Commands};
