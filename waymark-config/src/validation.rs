// Settings validation

use crate::{ConfigError, Result};
use std::path::Path;

/// Trait for validating loaded settings
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Reusable validation rules
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{field} cannot be empty"
            )));
        }
        Ok(())
    }

    /// At most one of two alternative settings may be present
    pub fn exclusive<A, B>(a: &Option<A>, b: &Option<B>, field_a: &str, field_b: &str) -> Result<()> {
        if a.is_some() && b.is_some() {
            return Err(ConfigError::ValidationError(format!(
                "{field_a} and {field_b} cannot both be set"
            )));
        }
        Ok(())
    }

    pub fn is_file(path: &str, field: &str) -> Result<()> {
        if !Path::new(path).is_file() {
            return Err(ConfigError::ValidationError(format!(
                "{field} does not point to a readable file: {path}"
            )));
        }
        Ok(())
    }

    /// Parent directory of `path` must exist; the file itself may not yet
    pub fn parent_exists(path: &str, field: &str) -> Result<()> {
        let parent = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty());
        match parent {
            Some(dir) if !dir.is_dir() => Err(ConfigError::ValidationError(format!(
                "{field} directory does not exist: {}",
                dir.display()
            ))),
            _ => Ok(()),
        }
    }
}
