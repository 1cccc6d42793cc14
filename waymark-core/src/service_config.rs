//! Configuration-time route and middleware registration
//!
//! [`ServiceConfig`] collects routes, middleware and the not-found fallback,
//! then [`build`](ServiceConfig::build)s an immutable [`Dispatcher`].
//! Identical patterns are compiled once and shared between the methods and
//! handlers that use them. Registration order within a method is preserved
//! and decides which route wins when several match.
//!
//! # Examples
//!
//! ```
//! use waymark_core::*;
//!
//! let dispatcher = ServiceConfig::new()
//!     .get("/users/:id", |req, resp| {
//!         resp.write_text(format!("user {}", req.param("id").unwrap()));
//!         Ok(())
//!     })
//!     .install_middleware(RouteStage::PostHandler, always(), |_, resp| {
//!         resp.set_header("X-Served-By", "waymark");
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut sink = BufferedResponse::new();
//! dispatcher.dispatch(IncomingRequest::new("GET", "/users/42"), &mut sink);
//! assert_eq!(sink.body_str(), "user 42");
//! assert_eq!(sink.header("X-Served-By").map(String::as_str), Some("waymark"));
//! ```

use crate::dispatcher::{default_not_found, template_not_found};
use crate::logging::{debug, info};
use crate::route_table::{HandlerFn, RouteEntry, RouteTable, into_handler};
use crate::{
    Dispatcher, Error, HttpMethod, MiddlewareEntry, MiddlewarePipeline, RouteError, RouteFactory,
    RouteMatcher, RouteStage, WebRequest, WebResponse,
};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RouteSource {
    Dsl(String),
    Regex(String),
}

impl RouteSource {
    fn as_str(&self) -> &str {
        match self {
            RouteSource::Dsl(s) | RouteSource::Regex(s) => s,
        }
    }
}

struct PendingRoute {
    method: HttpMethod,
    source: RouteSource,
    handler: HandlerFn,
}

/// Builder for a [`Dispatcher`].
///
/// Owns a [`RouteFactory`], so it stays on the thread that configures it.
pub struct ServiceConfig {
    factory: RouteFactory,
    routes: Vec<PendingRoute>,
    pipeline: MiddlewarePipeline,
    not_found: Option<HandlerFn>,
    not_found_template: Option<String>,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self {
            factory: RouteFactory::new(),
            routes: Vec::new(),
            pipeline: MiddlewarePipeline::new(),
            not_found: None,
            not_found_template: None,
        }
    }

    fn register<F>(mut self, methods: &[HttpMethod], source: RouteSource, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        let handler = into_handler(handler);
        for &method in methods {
            self.routes.push(PendingRoute {
                method,
                source: source.clone(),
                handler: handler.clone(),
            });
        }
        self
    }

    /// Register a DSL route for GET
    pub fn get<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::GET], RouteSource::Dsl(path.to_string()), handler)
    }

    /// Register a DSL route for POST
    pub fn post<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::POST], RouteSource::Dsl(path.to_string()), handler)
    }

    /// Register a DSL route for PUT
    pub fn put<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::PUT], RouteSource::Dsl(path.to_string()), handler)
    }

    /// Register a DSL route for DELETE
    pub fn delete<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::DELETE], RouteSource::Dsl(path.to_string()), handler)
    }

    /// Register a DSL route for every method
    pub fn route<F>(self, path: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&HttpMethod::ALL, RouteSource::Dsl(path.to_string()), handler)
    }

    pub fn get_regex<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::GET], RouteSource::Regex(pattern.to_string()), handler)
    }

    pub fn post_regex<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::POST], RouteSource::Regex(pattern.to_string()), handler)
    }

    pub fn put_regex<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::PUT], RouteSource::Regex(pattern.to_string()), handler)
    }

    pub fn delete_regex<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&[HttpMethod::DELETE], RouteSource::Regex(pattern.to_string()), handler)
    }

    /// Register a regular expression route for every method
    pub fn route_regex<F>(self, pattern: &str, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(&HttpMethod::ALL, RouteSource::Regex(pattern.to_string()), handler)
    }

    /// Add a middleware entry; see [`always`](crate::always) and [`never`](crate::never)
    pub fn install_middleware<P, A>(mut self, stage: RouteStage, predicate: P, apply: A) -> Self
    where
        P: Fn(&WebRequest, &WebResponse) -> bool + Send + Sync + 'static,
        A: Fn(&mut WebRequest, &mut WebResponse) + Send + Sync + 'static,
    {
        self.pipeline
            .install(MiddlewareEntry::new(stage, predicate, apply));
        self
    }

    /// Replace the not-found fallback; takes precedence over any template
    pub fn not_found<F>(mut self, handler: F) -> Self
    where
        F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
    {
        self.not_found = Some(into_handler(handler));
        self
    }

    /// Keep the default fallback but render `template`; `${page}` becomes the path
    pub fn not_found_template(mut self, template: impl Into<String>) -> Self {
        self.not_found_template = Some(template.into());
        self
    }

    /// Number of registered (method, route) pairs
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Compile every route and produce the dispatcher.
    ///
    /// Fails on the first route that cannot be created; whether that aborts
    /// startup is up to the caller.
    pub fn build(self) -> Result<Dispatcher, RouteError> {
        let mut compiled: HashMap<RouteSource, Arc<RouteMatcher>> = HashMap::new();
        let mut table = RouteTable::new();

        for route in self.routes {
            let matcher = match compiled.get(&route.source) {
                Some(matcher) => matcher.clone(),
                None => {
                    let matcher = Arc::new(match &route.source {
                        RouteSource::Dsl(path) => self.factory.create(path)?,
                        RouteSource::Regex(pattern) => self.factory.create_from_pattern(pattern)?,
                    });
                    debug!(
                        route = %route.source.as_str(),
                        pattern = %matcher.regex().as_str(),
                        "Compiled route"
                    );
                    compiled.insert(route.source.clone(), matcher.clone());
                    matcher
                }
            };
            table.push(route.method, RouteEntry::new(matcher, route.handler));
        }

        let not_found = match (self.not_found, self.not_found_template) {
            (Some(handler), _) => handler,
            (None, Some(template)) => template_not_found(template),
            (None, None) => default_not_found(),
        };

        info!(
            routes = table.len(),
            patterns = compiled.len(),
            middleware = self.pipeline.len(),
            "Dispatcher built"
        );
        Ok(Dispatcher::new(table, self.pipeline, not_found))
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new()
    }
}
