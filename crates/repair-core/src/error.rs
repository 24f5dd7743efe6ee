//! Structural errors: failures that are fatal to the current call,
//! as opposed to the in-band, per-field semantic errors carried in the trace.

use thiserror::Error;

/// Structural failures the core can raise. Adapters map these onto their own
/// transport (HTTP status, CLI exit code); the engine itself never returns
/// this type — only schema lookup does.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unsupported_schema:{0}")]
    UnsupportedSchema(String),
}

impl crate::schema::SchemaRegistry {
    /// Like [`crate::schema::SchemaRegistry::get`], but reports a structural
    /// [`CoreError`] instead of `None` on a lookup miss.
    pub fn require(&self, name: &str) -> Result<&crate::schema::Schema, CoreError> {
        self.get(name).ok_or_else(|| CoreError::UnsupportedSchema(name.to_string()))
    }
}
