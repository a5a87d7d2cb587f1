//! Error types for variable store queries

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unknown variable '{name}'")]
    UnknownVariable { name: String },
}

impl StoreError {
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        StoreError::UnknownVariable { name: name.into() }
    }
}
