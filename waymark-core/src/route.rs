// Route patterns and capture extraction

use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;

/// Source of a route: a DSL path or a user-supplied regular expression.
///
/// Both variants keep their original string (`str_rep`), which is what
/// identical routes are deduplicated on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoutePattern {
    /// DSL path and the pattern it compiled to
    Dsl { source: String, compiled: String },
    /// Regular expression used as-is
    Raw { source: String },
}

impl RoutePattern {
    pub fn str_rep(&self) -> &str {
        match self {
            RoutePattern::Dsl { source, .. } | RoutePattern::Raw { source } => source,
        }
    }

    pub fn is_dsl(&self) -> bool {
        matches!(self, RoutePattern::Dsl { .. })
    }

    /// The expression handed to the regex engine, anchored at both ends
    pub fn matching_pattern(&self) -> String {
        match self {
            RoutePattern::Dsl { compiled, .. } => compiled.clone(),
            RoutePattern::Raw { source } => format!("^(?:{source})$"),
        }
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.str_rep())
    }
}

/// Result of a successful match.
///
/// `splat` holds the unnamed captures and is always the subsequence of
/// `groups` (minus the whole match at index 0) whose groups carry no name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedRoute {
    url_params: HashMap<String, String>,
    splat: Vec<String>,
    groups: Vec<String>,
}

impl ParsedRoute {
    pub fn new(
        url_params: HashMap<String, String>,
        splat: Vec<String>,
        groups: Vec<String>,
    ) -> Self {
        Self {
            url_params,
            splat,
            groups,
        }
    }

    /// Named captures
    pub fn url_params(&self) -> &HashMap<String, String> {
        &self.url_params
    }

    /// Unnamed captures in pattern order
    pub fn splat(&self) -> &[String] {
        &self.splat
    }

    /// Every capture group, the whole match first
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn into_parts(self) -> (HashMap<String, String>, Vec<String>, Vec<String>) {
        (self.url_params, self.splat, self.groups)
    }
}

/// A compiled route that can be checked against request paths
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    pattern: RoutePattern,
    regex: Regex,
}

impl RouteMatcher {
    pub(crate) fn new(pattern: RoutePattern, regex: Regex) -> Self {
        Self { pattern, regex }
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Original route string, e.g. `/profile/:userId`
    pub fn str_rep(&self) -> &str {
        self.pattern.str_rep()
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Names of the variables this route declares. Order is not guaranteed.
    pub fn variables(&self) -> Vec<&str> {
        self.regex.capture_names().flatten().collect()
    }

    /// Match the whole of `path`; a match covering only a prefix is no match.
    pub fn match_path(&self, path: &str) -> Option<ParsedRoute> {
        let caps = self.regex.captures(path)?;

        let whole = caps.get(0)?;
        if whole.start() != 0 || whole.end() != path.len() {
            return None;
        }

        let mut url_params = HashMap::new();
        let mut splat = Vec::new();
        let mut groups = Vec::with_capacity(caps.len());
        groups.push(whole.as_str().to_string());

        for (index, name) in self.regex.capture_names().enumerate().skip(1) {
            let Some(m) = caps.get(index) else {
                groups.push(String::new());
                continue;
            };

            let value = m.as_str().to_string();
            match name {
                Some(name) => {
                    url_params.insert(name.to_string(), value.clone());
                }
                None => splat.push(value.clone()),
            }
            groups.push(value);
        }

        Some(ParsedRoute::new(url_params, splat, groups))
    }
}
