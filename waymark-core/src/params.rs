// Query string and form body key-value parsing

use std::collections::HashMap;

/// Parse `k=v&k2=v2` pairs into `out`.
///
/// Each pair is split on the first `=`. A pair without `=` maps the key to an
/// empty string, empty pairs are skipped, and the last occurrence of a key wins.
/// Values are stored exactly as received (no percent-decoding).
pub fn parse_params_into(raw: &str, out: &mut HashMap<String, String>) {
    for pair in raw.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        out.insert(key.to_string(), value.to_string());
    }
}

/// Parse a query string or urlencoded body into a fresh map
pub fn parse_params(raw: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    parse_params_into(raw, &mut params);
    params
}

/// Split a request target into its path and optional query string
pub fn split_url(url: &str) -> (&str, Option<&str>) {
    match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url, None),
    }
}
