// Environment variable loading

use std::collections::HashMap;
use std::env;

/// Prefix of every environment variable waymark reads
pub const ENV_PREFIX: &str = "WAYMARK";

/// Collects prefixed environment variables as lower-case keys with the
/// prefix stripped, so `WAYMARK_LOG_LEVEL` becomes `log_level`
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Loader for the `WAYMARK_` variables
    pub fn waymark() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }

    /// Read the process environment
    pub fn load(&self) -> HashMap<String, String> {
        self.collect(env::vars())
    }

    /// Filter and normalize an arbitrary set of variables
    pub fn collect<I, K, V>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        vars.into_iter()
            .filter_map(|(key, value)| {
                let key = key.as_ref();
                let normalized = match &self.prefix {
                    Some(prefix) => key
                        .strip_prefix(prefix.as_str())?
                        .strip_prefix('_')?
                        .to_lowercase(),
                    None => key.to_lowercase(),
                };
                Some((normalized, value.into()))
            })
            .collect()
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::waymark()
    }
}
