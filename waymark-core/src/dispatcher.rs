//! Per-request dispatch
//!
//! A [`Dispatcher`] owns the immutable route table, the middleware pipeline
//! and the not-found fallback produced by
//! [`ServiceConfig::build`](crate::ServiceConfig::build). Each call to
//! [`Dispatcher::dispatch`] walks one request through:
//!
//! ```text
//! RECEIVED -> MATCHED | UNMATCHED -> PRE_MIDDLEWARE -> HANDLED -> POST_MIDDLEWARE -> FINALIZED
//! ```
//!
//! Dispatch never fails. An unmatched request goes to the not-found handler,
//! and a handler returning `Err` is turned into an error response, so post
//! middleware and finalization always run.

use crate::logging::{debug, error, trace};
use crate::params::{parse_params_into, split_url};
use crate::route_table::{HandlerFn, RouteTable, into_handler};
use crate::{
    HttpMethod, HttpStatus, IncomingRequest, MiddlewarePipeline, ResponseSink, RouteStage,
    WebRequest, WebResponse,
};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Body of the default not-found response; `${page}` is replaced by the path
pub const DEFAULT_404_TEMPLATE: &str = "<html> <head>   <title>404 Unknown Page</title></head><body>   <h1>404 Page Not Found</h1>   <p><b>Requested:</b> ${page}</p></body></html>\n\n";

/// Placeholder substituted in not-found templates
pub const PAGE_PLACEHOLDER: &str = "${page}";

/// Not-found handler rendering `template` with the requested path
pub fn template_not_found(template: impl Into<String>) -> HandlerFn {
    let template = template.into();
    into_handler(move |req, resp| {
        resp.set_status(HttpStatus::NotFound);
        resp.write_html(template.replace(PAGE_PLACEHOLDER, req.path()));
        Ok(())
    })
}

/// The built-in not-found handler
pub fn default_not_found() -> HandlerFn {
    template_not_found(DEFAULT_404_TEMPLATE)
}

/// Stages of a single dispatch, as reported in trace logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DispatchState {
    Received,
    Matched,
    Unmatched,
    PreMiddleware,
    Handled,
    PostMiddleware,
    Finalized,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchState::Received => "RECEIVED",
            DispatchState::Matched => "MATCHED",
            DispatchState::Unmatched => "UNMATCHED",
            DispatchState::PreMiddleware => "PRE_MIDDLEWARE",
            DispatchState::Handled => "HANDLED",
            DispatchState::PostMiddleware => "POST_MIDDLEWARE",
            DispatchState::Finalized => "FINALIZED",
        };
        f.write_str(name)
    }
}

/// Summary of a finished dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub matched: bool,
    /// Pattern of the matched route as it was registered
    pub route: Option<String>,
    pub status: u16,
    pub request_id: String,
}

/// Resolves requests against an immutable route table.
///
/// `Dispatcher` is `Send + Sync`; share it behind an `Arc` across whatever
/// threads or tasks the transport uses.
#[derive(Clone)]
pub struct Dispatcher {
    table: RouteTable,
    pipeline: MiddlewarePipeline,
    not_found: HandlerFn,
}

impl Dispatcher {
    pub fn new(table: RouteTable, pipeline: MiddlewarePipeline, not_found: HandlerFn) -> Self {
        Self {
            table,
            pipeline,
            not_found,
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn middleware(&self) -> &MiddlewarePipeline {
        &self.pipeline
    }

    /// Run one fully buffered request and write the response into `sink`
    pub fn dispatch(&self, incoming: IncomingRequest, sink: &mut dyn ResponseSink) -> DispatchOutcome {
        let request_id = Uuid::new_v4().to_string();
        let span = tracing::debug_span!(
            "dispatch",
            request_id = %request_id,
            method = %incoming.method
        );
        let _enter = span.enter();

        let IncomingRequest {
            method,
            url,
            headers,
            body,
        } = incoming;
        trace!(state = %DispatchState::Received, url = %url);

        let (path, query) = split_url(&url);
        let path = path.to_string();

        let mut params = HashMap::new();
        if let Some(query) = query {
            parse_params_into(query, &mut params);
        }
        if HttpMethod::from_str(&method) == Some(HttpMethod::POST) && !body.is_empty() {
            match std::str::from_utf8(&body) {
                Ok(form) => parse_params_into(form, &mut params),
                Err(_) => debug!("POST body is not UTF-8, skipping form parameters"),
            }
        }

        let (handler, route, url_params, splat) = match self.table.resolve(&method, &path) {
            Some((entry, parsed)) => {
                trace!(state = %DispatchState::Matched, route = %entry.pattern());
                let (url_params, splat, _) = parsed.into_parts();
                (
                    entry.handler.clone(),
                    Some(entry.pattern().to_string()),
                    url_params,
                    splat,
                )
            }
            None => {
                trace!(state = %DispatchState::Unmatched, path = %path);
                (self.not_found.clone(), None, HashMap::new(), Vec::new())
            }
        };

        let mut req = WebRequest {
            method,
            path,
            url,
            headers,
            body,
            url_params,
            splat,
            params,
            request_id: request_id.clone(),
        };
        let mut resp = WebResponse::new();

        trace!(state = %DispatchState::PreMiddleware);
        self.pipeline
            .run_stage(RouteStage::PreHandler, &mut req, &mut resp);

        if let Err(err) = handler(&req, &mut resp) {
            error!(
                error = %err,
                route = route.as_deref().unwrap_or("<not found>"),
                "Handler failed"
            );
            resp.set_status_code(err.status_code());
            if !resp.has_body() {
                resp.write_text(err.to_string());
            }
        }
        trace!(state = %DispatchState::Handled, status = resp.status());

        trace!(state = %DispatchState::PostMiddleware);
        self.pipeline
            .run_stage(RouteStage::PostHandler, &mut req, &mut resp);

        let status = resp.status();
        resp.write_to(sink);
        debug!(
            state = %DispatchState::Finalized,
            path = %req.path,
            status,
            "Request dispatched"
        );

        DispatchOutcome {
            matched: route.is_some(),
            route,
            status,
            request_id,
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("table", &self.table)
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BufferedResponse, Error, RouteEntry, RouteFactory};
    use std::sync::Arc;

    fn dispatcher_with(routes: Vec<(HttpMethod, &str, HandlerFn)>) -> Dispatcher {
        let factory = RouteFactory::new();
        let mut table = RouteTable::new();
        for (method, dsl, handler) in routes {
            table.push(
                method,
                RouteEntry::new(Arc::new(factory.create(dsl).unwrap()), handler),
            );
        }
        Dispatcher::new(table, MiddlewarePipeline::new(), default_not_found())
    }

    fn run(dispatcher: &Dispatcher, req: IncomingRequest) -> (DispatchOutcome, BufferedResponse) {
        let mut sink = BufferedResponse::new();
        let outcome = dispatcher.dispatch(req, &mut sink);
        (outcome, sink)
    }

    #[test]
    fn test_default_not_found_body() {
        let dispatcher = dispatcher_with(vec![]);
        let (outcome, sink) = run(&dispatcher, IncomingRequest::new("GET", "/missing?x=1"));

        assert!(!outcome.matched);
        assert_eq!(outcome.status, 404);
        assert_eq!(sink.status, 404);
        assert_eq!(
            sink.body_str(),
            DEFAULT_404_TEMPLATE.replace("${page}", "/missing")
        );
        assert_eq!(sink.header("Content-Type"), Some(&"text/html".to_string()));
        assert!(sink.ended);
    }

    #[test]
    fn test_custom_template() {
        let dispatcher = Dispatcher::new(
            RouteTable::new(),
            MiddlewarePipeline::new(),
            template_not_found("nothing at ${page}"),
        );
        let (_, sink) = run(&dispatcher, IncomingRequest::new("DELETE", "/gone"));
        assert_eq!(sink.body_str(), "nothing at /gone");
    }

    #[test]
    fn test_handler_sees_params() {
        let handler = into_handler(|req, resp| {
            resp.write_text(format!(
                "{} {} {}",
                req.param("id").map(String::as_str).unwrap_or("-"),
                req.query("sort").map(String::as_str).unwrap_or("-"),
                req.url()
            ));
            Ok(())
        });
        let dispatcher = dispatcher_with(vec![(HttpMethod::GET, "/users/:id", handler)]);

        let (outcome, sink) = run(&dispatcher, IncomingRequest::new("GET", "/users/7?sort=asc"));
        assert!(outcome.matched);
        assert_eq!(outcome.route.as_deref(), Some("/users/:id"));
        assert_eq!(sink.body_str(), "7 asc /users/7?sort=asc");
        assert_eq!(outcome.request_id.len(), 36);
    }

    #[test]
    fn test_post_body_params_merge_after_query() {
        let handler = into_handler(|req, resp| {
            let mut pairs: Vec<_> = req.params().iter().map(|(k, v)| format!("{k}={v}")).collect();
            pairs.sort();
            resp.write_text(pairs.join(","));
            Ok(())
        });
        let dispatcher = dispatcher_with(vec![(HttpMethod::POST, "/form", handler)]);

        let req = IncomingRequest::new("POST", "/form?a=1&b=query").with_body("b=body&c=3");
        let (_, sink) = run(&dispatcher, req);
        assert_eq!(sink.body_str(), "a=1,b=body,c=3");
    }

    #[test]
    fn test_get_body_is_not_parsed() {
        let handler = into_handler(|req, resp| {
            resp.write_text(req.params().len().to_string());
            Ok(())
        });
        let dispatcher = dispatcher_with(vec![(HttpMethod::GET, "/form", handler)]);

        let (_, sink) = run(&dispatcher, IncomingRequest::new("GET", "/form").with_body("a=1"));
        assert_eq!(sink.body_str(), "0");
    }

    #[test]
    fn test_handler_error_still_finalizes() {
        let handler = into_handler(|_, _| {
            Err(Error::BadRequest("missing field".to_string()))
        });
        let dispatcher = dispatcher_with(vec![(HttpMethod::PUT, "/items/:id", handler)]);

        let (outcome, sink) = run(&dispatcher, IncomingRequest::new("PUT", "/items/3"));
        assert!(outcome.matched);
        assert_eq!(outcome.status, 400);
        assert_eq!(sink.body_str(), "Bad Request: missing field");
        assert!(sink.ended);
    }

    #[test]
    fn test_handler_error_keeps_written_body() {
        let handler = into_handler(|_, resp| {
            resp.write_text("partial");
            Err(Error::Internal("late failure".to_string()))
        });
        let dispatcher = dispatcher_with(vec![(HttpMethod::GET, "/x", handler)]);

        let (_, sink) = run(&dispatcher, IncomingRequest::new("GET", "/x"));
        assert_eq!(sink.status, 500);
        assert_eq!(sink.body_str(), "partial");
    }

    #[test]
    fn test_unknown_method_is_unmatched() {
        let handler = into_handler(|_, _| Ok(()));
        let dispatcher = dispatcher_with(vec![(HttpMethod::GET, "/x", handler)]);

        let (outcome, sink) = run(&dispatcher, IncomingRequest::new("PATCH", "/x"));
        assert!(!outcome.matched);
        assert_eq!(sink.status, 404);
    }

    #[test]
    fn test_dispatch_state_names() {
        assert_eq!(DispatchState::Received.to_string(), "RECEIVED");
        assert_eq!(DispatchState::PostMiddleware.to_string(), "POST_MIDDLEWARE");
        assert_eq!(DispatchState::Finalized.to_string(), "FINALIZED");
    }
}
