//! Route DSL compiler
//!
//! Translates a declarative route path into an anchored regular expression.
//! A path is a sequence of `/`-separated segments, each following:
//!
//! ```text
//! segment := [':' name ['$' spec]] | spec
//! spec    := alt ('|' alt)*
//! alt     := name-chars with '*' (zero or more) and '+' (one or more) wildcards
//! name    := word, digit, '-' or '_' characters
//! ```
//!
//! | DSL | Compiled |
//! |---|---|
//! | `/users/:id` | `^/users/(?<id>[\w\d\-_]+)$` |
//! | `/:kind$user\|admin` | `^/(?<kind>user\|admin)$` |
//! | `/one\|two` | `^/(?:one\|two)$` |
//! | `/files/*.txt` | `^/files/([\w\d\-_]*\.txt)$` |
//!
//! Compilation is purely syntactic and deterministic: the same input always
//! produces the same pattern string.
//!
//! # Examples
//!
//! ```
//! use waymark_core::path_compiler::compile;
//!
//! let pattern = compile("/users/:id").unwrap();
//! assert_eq!(pattern, r"^/users/(?<id>[\w\d\-_]+)$");
//! ```

use crate::{CreationError, RouteError};
use regex::Regex;
use std::sync::LazyLock;

/// Characters a variable name (and a wildcard) may consist of
pub const NAME_CHARS: &str = r"[\w\d\-_]";

/// Specification used when a named segment carries no `$spec`
pub const DEFAULT_SPEC: &str = "+";

/// Per-segment grammar:
/// `^(?::(?<name>NAME+)\$?)?(?:(?<spec_one>OPT+)(?<extra_spec>(?:\|OPT+)+)?)?$`
static SEGMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    let opt_chars = r"[\w\d\-_\*\+\.]";
    let pattern = format!(
        r"^(?::(?<name>{name}+)\$?)?(?:(?<spec_one>{opt}+)(?<extra_spec>(?:\|{opt}+)+)?)?$",
        name = NAME_CHARS,
        opt = opt_chars,
    );
    Regex::new(&pattern).expect("segment grammar is a valid regex")
});

/// Compile a DSL path into an anchored pattern string.
///
/// Root and terminator checks run before any segment is looked at. Every
/// malformed segment is collected so the error names all of them.
pub fn compile(path: &str) -> Result<String, RouteError> {
    if !path.starts_with('/') {
        return Err(RouteError::new(
            CreationError::RootMissing,
            "Path Error: Path did not start with /",
        ));
    }

    if path.ends_with('/') {
        return Err(RouteError::new(
            CreationError::SlashTerminator,
            "Path Error: Path ends with /",
        ));
    }

    let mut out_parts = Vec::new();
    let mut bad_parts = Vec::new();

    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match compile_segment(segment) {
            Some(compiled) => out_parts.push(compiled),
            None => bad_parts.push(segment),
        }
    }

    if !bad_parts.is_empty() {
        return Err(RouteError::new(
            CreationError::PathPartError,
            format!(
                "Syntax failed to parse the following components:\n\t\t{}",
                bad_parts.join("\n\t\t")
            ),
        ));
    }

    Ok(format!("^/{}$", out_parts.join("/")))
}

/// Compile one segment, or `None` if it does not follow the grammar
fn compile_segment(segment: &str) -> Option<String> {
    let caps = SEGMENT_RE.captures(segment)?;

    let mut buff = String::with_capacity(segment.len() * 2);
    let mut group_started = false;

    if let Some(name) = caps.name("name") {
        buff.push_str("(?<");
        buff.push_str(name.as_str());
        buff.push('>');
        group_started = true;
    }

    let mut specs: Vec<&str> = vec![caps.name("spec_one").map_or(DEFAULT_SPEC, |m| m.as_str())];
    if let Some(extra) = caps.name("extra_spec") {
        // leading '|' is part of the capture
        for spec in extra.as_str()[1..].split('|') {
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
    }

    if !group_started {
        if segment.contains(['*', '+']) {
            // unnamed wildcard: capture it as a splat
            buff.push('(');
            group_started = true;
        } else if specs.len() >= 2 {
            buff.push_str("(?:");
            group_started = true;
        }
    }

    let alternatives: Vec<String> = specs.iter().map(|spec| expand_wildcards(spec)).collect();
    buff.push_str(&alternatives.join("|"));

    if group_started {
        buff.push(')');
    }

    Some(buff)
}

/// Escape `.` and expand `*`/`+` into name-char repetitions.
/// Runs of the same wildcard collapse into one.
fn expand_wildcards(spec: &str) -> String {
    let mut out = String::with_capacity(spec.len() * 4);
    let mut prev: Option<char> = None;

    for c in spec.chars() {
        match c {
            '*' | '+' if prev == Some(c) => continue,
            '*' | '+' => {
                out.push_str(NAME_CHARS);
                out.push(c);
            }
            '.' => out.push_str(r"\."),
            _ => out.push(c),
        }
        prev = Some(c);
    }

    out
}
