// Method-keyed route tables with first-match-wins resolution

use crate::logging::trace;
use crate::{Error, HttpMethod, ParsedRoute, RouteMatcher, WebRequest, WebResponse};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Type alias for handler functions
pub type HandlerFn = Arc<dyn Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync>;

/// Box a closure as a [`HandlerFn`]
pub fn into_handler<F>(handler: F) -> HandlerFn
where
    F: Fn(&WebRequest, &mut WebResponse) -> Result<(), Error> + Send + Sync + 'static,
{
    Arc::new(handler)
}

/// A compiled route and the handler it dispatches to
#[derive(Clone)]
pub struct RouteEntry {
    pub matcher: Arc<RouteMatcher>,
    pub handler: HandlerFn,
}

impl RouteEntry {
    pub fn new(matcher: Arc<RouteMatcher>, handler: HandlerFn) -> Self {
        Self { matcher, handler }
    }

    pub fn pattern(&self) -> &str {
        self.matcher.str_rep()
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.matcher.pattern())
            .finish_non_exhaustive()
    }
}

/// Ordered route lists per HTTP method.
///
/// Populated by the configuration builder and immutable once a dispatcher
/// owns it, so any number of requests can resolve against it concurrently.
#[derive(Clone, Default, Debug)]
pub struct RouteTable {
    routes: HashMap<HttpMethod, Vec<RouteEntry>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, method: HttpMethod, entry: RouteEntry) {
        self.routes.entry(method).or_default().push(entry);
    }

    /// Routes registered for `method`, in registration order
    pub fn routes_for(&self, method: HttpMethod) -> &[RouteEntry] {
        self.routes.get(&method).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Find the first route for `method` that matches `path`.
    ///
    /// Routes are tried in registration order and the scan stops at the first
    /// structural match, however specific later routes may be. Unknown methods
    /// and methods without routes resolve to `None`.
    pub fn resolve(&self, method: &str, path: &str) -> Option<(&RouteEntry, ParsedRoute)> {
        let Some(method) = HttpMethod::from_str(method) else {
            trace!(method = %method, "No route table for method");
            return None;
        };

        self.routes_for(method).iter().find_map(|entry| {
            let parsed = entry.matcher.match_path(path)?;
            trace!(route = %entry.pattern(), path = %path, "Route matched");
            Some((entry, parsed))
        })
    }
}
