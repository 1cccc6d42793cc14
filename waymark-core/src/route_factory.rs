//! Route creation from DSL paths and regular expressions
//!
//! Every creation call returns its own `Result`, so callers never depend on
//! shared error state. The factory additionally remembers the outcome of the
//! most recent call (`last_error`), which is handy when a configuration pass
//! wants to report after the fact. That record lives in a `RefCell`, which
//! keeps a factory (and anything owning one) on a single thread.
//!
//! # Examples
//!
//! ```
//! use waymark_core::{CreationError, RouteFactory};
//!
//! let factory = RouteFactory::new();
//!
//! let route = factory.create("/users/:id").unwrap();
//! let parsed = route.match_path("/users/42").unwrap();
//! assert_eq!(parsed.url_params()["id"], "42");
//!
//! let err = factory.create("/users/").unwrap_err();
//! assert_eq!(err.kind(), CreationError::SlashTerminator);
//! assert_eq!(factory.last_error(), CreationError::SlashTerminator);
//! ```

use crate::logging::{debug, trace};
use crate::path_compiler;
use crate::{CreationError, RouteError, RouteMatcher, RoutePattern};
use regex::Regex;
use std::cell::RefCell;

/// Builds [`RouteMatcher`]s, recording the last creation outcome
#[derive(Debug, Default)]
pub struct RouteFactory {
    last: RefCell<Option<RouteError>>,
}

impl RouteFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a DSL path into a matcher
    pub fn create(&self, dsl: &str) -> Result<RouteMatcher, RouteError> {
        self.clear_error();
        let result = path_compiler::compile(dsl).and_then(|compiled| {
            let regex = Regex::new(&compiled).map_err(|e| {
                RouteError::new(
                    CreationError::InvalidRegexProduced,
                    format!("Invalid Regex Produced ({e}), {{re = {compiled}, route = {dsl}}}"),
                )
            })?;
            trace!(route = %dsl, pattern = %compiled, "Compiled route DSL");
            Ok(RouteMatcher::new(
                RoutePattern::Dsl {
                    source: dsl.to_string(),
                    compiled,
                },
                regex,
            ))
        });
        self.record(result)
    }

    /// Use a regular expression as a route, anchored at both ends
    pub fn create_from_pattern(&self, pattern: &str) -> Result<RouteMatcher, RouteError> {
        self.clear_error();
        let result = if pattern.ends_with('/') || pattern.ends_with("/$") {
            Err(RouteError::new(
                CreationError::SlashTerminator,
                format!("Path can not end with /, received: {pattern}"),
            ))
        } else {
            let route = RoutePattern::Raw {
                source: pattern.to_string(),
            };
            Regex::new(&route.matching_pattern())
                .map(|regex| RouteMatcher::new(route, regex))
                .map_err(|e| {
                    RouteError::new(
                        CreationError::InvalidRegexProduced,
                        format!("Invalid Regex ({e}), {{re = {pattern}}}"),
                    )
                })
        };
        self.record(result)
    }

    /// Kind of the most recent failure, `NoError` after a success
    pub fn last_error(&self) -> CreationError {
        self.last
            .borrow()
            .as_ref()
            .map_or(CreationError::NoError, RouteError::kind)
    }

    /// Message of the most recent failure, empty after a success
    pub fn last_error_message(&self) -> String {
        self.last
            .borrow()
            .as_ref()
            .map(|e| e.message().to_string())
            .unwrap_or_default()
    }

    fn clear_error(&self) {
        self.last.replace(None);
    }

    fn record(&self, result: Result<RouteMatcher, RouteError>) -> Result<RouteMatcher, RouteError> {
        if let Err(e) = &result {
            debug!(kind = %e.kind(), message = %e.message(), "Route creation failed");
            self.last.replace(Some(e.clone()));
        }
        result
    }
}
