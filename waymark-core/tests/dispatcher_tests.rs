use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use waymark_core::{
    BufferedResponse, DEFAULT_404_TEMPLATE, DispatchOutcome, Dispatcher, Error, IncomingRequest,
    RouteStage, ServiceConfig, always,
};

fn send(dispatcher: &Dispatcher, method: &str, url: &str) -> (DispatchOutcome, BufferedResponse) {
    let mut sink = BufferedResponse::new();
    let outcome = dispatcher.dispatch(IncomingRequest::new(method, url), &mut sink);
    (outcome, sink)
}

#[test]
fn test_first_match_wins_literal_first() {
    let dispatcher = ServiceConfig::new()
        .get("/one", |_, resp| {
            resp.write_text("literal");
            Ok(())
        })
        .get("/:name$one|two", |req, resp| {
            resp.write_text(format!("named:{}", req.param("name").unwrap()));
            Ok(())
        })
        .build()
        .unwrap();

    assert_eq!(send(&dispatcher, "GET", "/one").1.body_str(), "literal");
    assert_eq!(send(&dispatcher, "GET", "/two").1.body_str(), "named:two");
}

#[test]
fn test_first_match_wins_named_first() {
    let dispatcher = ServiceConfig::new()
        .get("/:name$one|two", |_, resp| {
            resp.write_text("named");
            Ok(())
        })
        .get("/one", |_, resp| {
            resp.write_text("literal");
            Ok(())
        })
        .build()
        .unwrap();

    let (outcome, sink) = send(&dispatcher, "GET", "/one");
    assert_eq!(sink.body_str(), "named");
    assert_eq!(outcome.route.as_deref(), Some("/:name$one|two"));
}

#[test]
fn test_middleware_staging() {
    let pre = Arc::new(AtomicUsize::new(0));
    let post = Arc::new(AtomicUsize::new(0));
    let (pre_count, post_count) = (pre.clone(), post.clone());

    let dispatcher = ServiceConfig::new()
        .get("/home", |_, resp| {
            resp.write_text("home");
            Ok(())
        })
        .install_middleware(RouteStage::PreHandler, always(), move |_, _| {
            pre_count.fetch_add(1, Ordering::SeqCst);
        })
        .install_middleware(RouteStage::PostHandler, always(), move |_, _| {
            post_count.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let (_, sink) = send(&dispatcher, "GET", "/home");
    assert_eq!(sink.body_str(), "home");
    assert_eq!(pre.load(Ordering::SeqCst), 1);
    assert_eq!(post.load(Ordering::SeqCst), 1);
    assert_eq!(pre.load(Ordering::SeqCst), post.load(Ordering::SeqCst));
}

#[test]
fn test_pre_middleware_feeds_handler() {
    let dispatcher = ServiceConfig::new()
        .get("/whoami", |req, resp| {
            resp.write_text(req.query("user").cloned().unwrap_or_default());
            Ok(())
        })
        .install_middleware(
            RouteStage::PreHandler,
            |req, _| req.header("Authorization").is_some(),
            |req, _| {
                req.params.insert("user".to_string(), "admin".to_string());
            },
        )
        .build()
        .unwrap();

    let mut sink = BufferedResponse::new();
    let req = IncomingRequest::new("GET", "/whoami").with_header("authorization", "token");
    dispatcher.dispatch(req, &mut sink);
    assert_eq!(sink.body_str(), "admin");

    let (_, sink) = send(&dispatcher, "GET", "/whoami");
    assert_eq!(sink.body_str(), "");
}

#[test]
fn test_post_middleware_sees_handler_result() {
    let dispatcher = ServiceConfig::new()
        .install_middleware(
            RouteStage::PostHandler,
            |_, resp| resp.status() == 404,
            |_, resp| resp.set_header("X-Missing", "1"),
        )
        .build()
        .unwrap();

    let (_, sink) = send(&dispatcher, "GET", "/nowhere");
    assert_eq!(sink.header("X-Missing").map(String::as_str), Some("1"));
}

#[test]
fn test_middleware_runs_for_unmatched_requests() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let dispatcher = ServiceConfig::new()
        .install_middleware(RouteStage::PreHandler, always(), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    send(&dispatcher, "GET", "/unknown");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn test_unmatched_fallback() {
    let dispatcher = ServiceConfig::new()
        .get("/exists", |_, _| Ok(()))
        .build()
        .unwrap();

    let (outcome, sink) = send(&dispatcher, "GET", "/does/not/exist");
    assert!(!outcome.matched);
    assert_eq!(sink.status, 404);
    assert_eq!(
        sink.body_str(),
        DEFAULT_404_TEMPLATE.replace("${page}", "/does/not/exist")
    );
    assert!(sink.body_str().contains("<b>Requested:</b> /does/not/exist"));
    assert_eq!(
        sink.header("Content-Length").map(String::as_str),
        Some(sink.body.len().to_string().as_str())
    );
}

#[test]
fn test_method_mismatch_is_unmatched() {
    let dispatcher = ServiceConfig::new()
        .post("/submit", |_, _| Ok(()))
        .build()
        .unwrap();

    let (outcome, _) = send(&dispatcher, "GET", "/submit");
    assert!(!outcome.matched);
    assert_eq!(outcome.status, 404);
}

#[test]
fn test_failing_handler_still_runs_post_middleware() {
    let post = Arc::new(AtomicUsize::new(0));
    let counter = post.clone();
    let dispatcher = ServiceConfig::new()
        .delete("/items/:id", |req, _| {
            Err(Error::NotFound(format!("item {}", req.param("id").unwrap())))
        })
        .install_middleware(RouteStage::PostHandler, always(), move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .unwrap();

    let (outcome, sink) = send(&dispatcher, "DELETE", "/items/9");
    assert!(outcome.matched);
    assert_eq!(sink.status, 404);
    assert_eq!(sink.body_str(), "Not Found: item 9");
    assert_eq!(post.load(Ordering::SeqCst), 1);
    assert!(sink.ended);
}

#[test]
fn test_regex_route_dispatch() {
    let dispatcher = ServiceConfig::new()
        .get_regex(r"/(?<year>\d{4})/(\d{2})", |req, resp| {
            resp.write_text(format!(
                "{}-{}",
                req.param("year").unwrap(),
                req.splat().join(",")
            ));
            Ok(())
        })
        .build()
        .unwrap();

    assert_eq!(send(&dispatcher, "GET", "/2024/06").1.body_str(), "2024-06");
    assert!(!send(&dispatcher, "GET", "/2024/6").0.matched);
}

#[test]
fn test_request_ids_are_unique() {
    let dispatcher = ServiceConfig::new().build().unwrap();
    let (a, _) = send(&dispatcher, "GET", "/");
    let (b, _) = send(&dispatcher, "GET", "/");
    assert_ne!(a.request_id, b.request_id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_dispatch() {
    let dispatcher = Arc::new(
        ServiceConfig::new()
            .get("/echo/:value", |req, resp| {
                resp.write_text(req.param("value").cloned().unwrap_or_default());
                Ok(())
            })
            .build()
            .unwrap(),
    );

    let mut tasks = Vec::new();
    for i in 0..64 {
        let dispatcher = dispatcher.clone();
        tasks.push(tokio::spawn(async move {
            let (outcome, sink) = send(&dispatcher, "GET", &format!("/echo/v{i}"));
            (i, outcome.matched, sink.body_str().to_string())
        }));
    }

    for task in tasks {
        let (i, matched, body) = task.await.unwrap();
        assert!(matched);
        assert_eq!(body, format!("v{i}"));
    }
}
