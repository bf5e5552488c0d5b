//! Static-analysis driven migration of legacy Python-routed pages into a
//! Next.js page tree.
//!
//! The pipeline reads a container index, locates each container's handler
//! registration, maps the handler to a route through the routing-table
//! modules, and renders one page file per route. See [`generator`] for the
//! orchestration.

pub mod analyzer;
pub mod config;
pub mod container_index;
pub mod errors;
pub mod generator;
pub mod manifest;
pub mod resolver;
pub mod route_map;
pub mod template;
pub mod util;
pub mod visitors;
