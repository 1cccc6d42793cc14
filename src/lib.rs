// Waymark - a path-routing DSL compiler and staged request dispatcher
//
// Routes are declared with a small path DSL (`/users/:id`, `/:kind$user|admin`,
// `/files/*.txt`) or a regular expression, compiled once at configuration time,
// and resolved first-match-wins per HTTP method with pre/post middleware.

// Re-export core functionality
pub use waymark_core::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use waymark_config;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        BufferedResponse, CreationError, DispatchOutcome, Dispatcher, Error, HttpMethod,
        HttpStatus, IncomingRequest, ParsedRoute, ResponseSink, RouteError, RouteFactory,
        RouteMatcher, RouteStage, ServiceConfig, WebRequest, WebResponse, always, never,
    };

    pub use crate::logging::{LogConfig, LogFormat, LogLevel, debug, error, info, trace, warn};

    #[cfg(feature = "config")]
    pub use waymark_config::Settings;
}
