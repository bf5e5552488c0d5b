//! AST visitor implementations for pagegen
//!
//! Each visitor owns its results and hands them back from a `collect`
//! constructor, so callers never share state with a traversal.

mod registration_collector;
mod route_collector;
mod utils;

pub use registration_collector::{CallShape, RegistrationCandidate, RegistrationCollector};
pub use route_collector::{RouteCall, RouteCollector, RouteSyntax, SkipReason};
pub use utils::{LiteralArg, extract_string_from_expr};
