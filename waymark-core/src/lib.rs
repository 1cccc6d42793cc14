// Core library for the waymark router
// Route DSL compilation, route matching, method-keyed route tables and staged dispatch

pub mod dispatcher;
pub mod error;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod params;
pub mod path_compiler;
pub mod route;
pub mod route_factory;
pub mod route_table;
pub mod service_config;
pub mod status;

// Re-export commonly used types
pub use dispatcher::*;
pub use error::*;
pub use http::*;
pub use middleware::*;
pub use params::{parse_params, split_url};
pub use route::*;
pub use route_factory::*;
pub use route_table::*;
pub use service_config::*;
pub use status::*;
