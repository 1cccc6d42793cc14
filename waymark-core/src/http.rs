// HTTP request and response types

use crate::HttpStatus;
use crate::logging::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// HTTP methods a route can be registered for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
}

impl HttpMethod {
    /// Every method an "all methods" registration expands into
    pub const ALL: [HttpMethod; 4] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::DELETE,
    ];

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully buffered request as handed over by the transport layer
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: String,
    /// Request target: path plus optional `?query`
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl IncomingRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// Request context seen by middleware and handlers
#[derive(Debug, Clone)]
pub struct WebRequest {
    pub method: String,
    pub path: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Named captures of the matched route
    pub url_params: HashMap<String, String>,
    /// Unnamed captures of the matched route, in pattern order
    pub splat: Vec<String>,
    /// Query string pairs, merged with form body pairs for POST
    pub params: HashMap<String, String>,
    pub request_id: String,
}

impl WebRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            method: method.into(),
            url: path.clone(),
            path,
            headers: HashMap::new(),
            body: Vec::new(),
            url_params: HashMap::new(),
            splat: Vec::new(),
            params: HashMap::new(),
            request_id: String::new(),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Header lookup, case-insensitive on the name
    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn url_params(&self) -> &HashMap<String, String> {
        &self.url_params
    }

    /// Get a named route parameter
    pub fn param(&self, name: &str) -> Option<&String> {
        self.url_params.get(name)
    }

    pub fn splat(&self) -> &[String] {
        &self.splat
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Get a query or form body parameter
    pub fn query(&self, name: &str) -> Option<&String> {
        self.params.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Response under construction by middleware and handlers
#[derive(Debug, Clone)]
pub struct WebResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl WebResponse {
    pub fn new() -> Self {
        Self {
            status: HttpStatus::Ok.code(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: HttpStatus) {
        self.status = status.code();
    }

    pub fn set_status_code(&mut self, code: u16) {
        self.status = code;
    }

    /// Set a header; empty keys are ignored
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if key.is_empty() {
            warn!(value = %value, "Tried to set empty header key");
            return;
        }
        self.headers.insert(key, value);
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(name)
    }

    /// Queue a `text/plain` body
    pub fn write_text(&mut self, text: impl Into<String>) {
        self.write_text_as(text, "text/plain");
    }

    /// Queue a text body; `Content-Type` is only set when not already present
    pub fn write_text_as(&mut self, text: impl Into<String>, content_type: &str) {
        self.body = Some(text.into().into_bytes());
        self.headers
            .entry("Content-Type".to_string())
            .or_insert_with(|| content_type.to_string());
    }

    pub fn write_html(&mut self, html: impl Into<String>) {
        self.write_text_as(html, "text/html");
    }

    pub fn write_bytes(&mut self, bytes: impl Into<Vec<u8>>) {
        self.body = Some(bytes.into());
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn body(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    /// Serialize status, headers and body into the transport sink
    pub fn write_to(self, sink: &mut dyn ResponseSink) {
        let body = self.body.unwrap_or_default();
        let mut headers = self.headers;
        headers.retain(|key, _| !key.eq_ignore_ascii_case("Content-Length"));
        headers.insert("Content-Length".to_string(), body.len().to_string());

        sink.write_head(self.status, &headers);
        sink.write_body(&body);
        sink.end();
    }
}

impl Default for WebResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a finalized response is written; implemented by the transport
pub trait ResponseSink {
    fn write_head(&mut self, status: u16, headers: &HashMap<String, String>);
    fn write_body(&mut self, body: &[u8]);
    fn end(&mut self);
}

/// A sink that records the finalized response in memory
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub ended: bool,
}

impl BufferedResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body_str(&self) -> &str {
        std::str::from_utf8(&self.body).unwrap_or_default()
    }

    pub fn header(&self, name: &str) -> Option<&String> {
        self.headers.get(name)
    }
}

impl ResponseSink for BufferedResponse {
    fn write_head(&mut self, status: u16, headers: &HashMap<String, String>) {
        self.status = status;
        self.headers = headers.clone();
    }

    fn write_body(&mut self, body: &[u8]) {
        self.body.extend_from_slice(body);
    }

    fn end(&mut self) {
        self.ended = true;
    }
}
