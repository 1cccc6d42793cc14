//! Integration tests for common waymark workflows.
//!
//! These go through the facade crate the way an application would.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use waymark::prelude::*;

// =============================================================================
// Route declaration
// =============================================================================

#[test]
fn test_rest_style_service() {
    let dispatcher = ServiceConfig::new()
        .get("/users", |_, resp| {
            resp.write_text("list");
            Ok(())
        })
        .post("/users", |req, resp| {
            resp.set_status(HttpStatus::Created);
            resp.write_text(format!("created {}", req.query("name").cloned().unwrap_or_default()));
            Ok(())
        })
        .get("/users/:id", |req, resp| {
            resp.write_text(format!("show {}", req.param("id").unwrap()));
            Ok(())
        })
        .put("/users/:id", |req, resp| {
            resp.write_text(format!("update {}", req.param("id").unwrap()));
            Ok(())
        })
        .delete("/users/:id", |_, resp| {
            resp.set_status(HttpStatus::NoContent);
            Ok(())
        })
        .build()
        .unwrap();

    let cases = [
        ("GET", "/users", 200, "list"),
        ("GET", "/users/5", 200, "show 5"),
        ("PUT", "/users/5", 200, "update 5"),
        ("DELETE", "/users/5", 204, ""),
    ];
    for (method, url, status, body) in cases {
        let mut sink = BufferedResponse::new();
        dispatcher.dispatch(IncomingRequest::new(method, url), &mut sink);
        assert_eq!(sink.status, status, "{method} {url}");
        assert_eq!(sink.body_str(), body, "{method} {url}");
    }

    let mut sink = BufferedResponse::new();
    let req = IncomingRequest::new("POST", "/users").with_body("name=ada");
    dispatcher.dispatch(req, &mut sink);
    assert_eq!(sink.status, 201);
    assert_eq!(sink.body_str(), "created ada");
}

#[test]
fn test_splat_and_named_captures_reach_handler() {
    let dispatcher = ServiceConfig::new()
        .get("/static/:dir/*.css", |req, resp| {
            resp.set_header("Content-Type", "text/css");
            resp.write_text(format!("{}|{}", req.param("dir").unwrap(), req.splat().join(",")));
            Ok(())
        })
        .build()
        .unwrap();

    let mut sink = BufferedResponse::new();
    let outcome = dispatcher.dispatch(IncomingRequest::new("GET", "/static/theme/dark.css"), &mut sink);
    assert!(outcome.matched);
    assert_eq!(sink.body_str(), "theme|dark.css");
    assert_eq!(sink.header("Content-Type").map(String::as_str), Some("text/css"));
}

#[test]
fn test_bad_route_reports_kind_and_message() {
    let err = ServiceConfig::new()
        .get("/fine", |_, _| Ok(()))
        .get("/:id$$", |_, _| Ok(()))
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), CreationError::PathPartError);
    assert!(err.message().contains(":id$$"));
}

// =============================================================================
// Middleware
// =============================================================================

#[test]
fn test_cross_cutting_headers() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();

    let dispatcher = ServiceConfig::new()
        .route("/ping", |_, resp| {
            resp.write_text("pong");
            Ok(())
        })
        .install_middleware(RouteStage::PreHandler, always(), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .install_middleware(RouteStage::PostHandler, always(), |req, resp| {
            resp.set_header("X-Request-Id", req.request_id().to_string());
        })
        .build()
        .unwrap();

    for method in ["GET", "POST", "PUT", "DELETE"] {
        let mut sink = BufferedResponse::new();
        let outcome = dispatcher.dispatch(IncomingRequest::new(method, "/ping"), &mut sink);
        assert_eq!(sink.body_str(), "pong");
        assert_eq!(sink.header("X-Request-Id"), Some(&outcome.request_id));
    }
    assert_eq!(seen.load(Ordering::SeqCst), 4);
}

// =============================================================================
// Fallback
// =============================================================================

#[test]
fn test_custom_not_found() {
    let dispatcher = ServiceConfig::new()
        .not_found(|req, resp| {
            resp.set_status(HttpStatus::NotFound);
            resp.set_header("Content-Type", "application/json");
            resp.write_text(format!(r#"{{"missing":"{}"}}"#, req.path()));
            Ok(())
        })
        .build()
        .unwrap();

    let mut sink = BufferedResponse::new();
    dispatcher.dispatch(IncomingRequest::new("GET", "/nope?x=1"), &mut sink);
    assert_eq!(sink.status, 404);
    assert_eq!(sink.body_str(), r#"{"missing":"/nope"}"#);
    assert_eq!(
        sink.header("Content-Type").map(String::as_str),
        Some("application/json")
    );
}

// =============================================================================
// Transport integration
// =============================================================================

/// A sink that records the order of calls, as a transport would see them
#[derive(Default)]
struct RecordingSink {
    calls: Vec<String>,
}

impl ResponseSink for RecordingSink {
    fn write_head(&mut self, status: u16, headers: &std::collections::HashMap<String, String>) {
        self.calls.push(format!("head {status} {}", headers["Content-Length"]));
    }

    fn write_body(&mut self, body: &[u8]) {
        self.calls.push(format!("body {}", body.len()));
    }

    fn end(&mut self) {
        self.calls.push("end".to_string());
    }
}

#[test]
fn test_sink_receives_head_body_end() {
    let dispatcher = ServiceConfig::new()
        .get("/hello", |_, resp| {
            resp.write_text("hello");
            Ok(())
        })
        .build()
        .unwrap();

    let mut sink = RecordingSink::default();
    dispatcher.dispatch(IncomingRequest::new("GET", "/hello"), &mut sink);
    assert_eq!(sink.calls, ["head 200 5", "body 5", "end"]);
}
