// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for stack declaration and resolution

use thiserror::Error;

use crate::domain::{NameError, NetworkError, ValidationError};
use crate::provider::ProviderError;

/// Errors that can occur while declaring, validating or resolving a stack
#[derive(Debug, Error)]
pub enum StackError {
    /// Logical name failed validation
    #[error("Invalid logical name: {0}")]
    InvalidName(#[from] NameError),

    /// Network value object failed validation
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Domain invariant violated before declaration
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A declaration reused a name already present in the graph
    #[error("Duplicate declaration: {0}")]
    DuplicateName(String),

    /// An export reused a name already exported
    #[error("Duplicate export: {0}")]
    DuplicateExport(String),

    /// A reference names a resource not declared earlier in the graph
    #[error("Unresolved reference from {from} to {target}")]
    UnresolvedReference { from: String, target: String },

    /// A reference names an attribute the target kind does not produce
    #[error("Resource {resource} ({kind}) has no attribute {attribute}")]
    UnknownAttribute {
        resource: String,
        kind: String,
        attribute: String,
    },

    /// A handle minted by another builder was passed in
    #[error("Handle for {0} belongs to a different stack")]
    ForeignHandle(String),

    /// The dependency graph contains a cycle
    #[error("Dependency cycle detected at {0}")]
    Cycle(String),

    /// Provider rejected a registration or lookup
    #[error("Provider error for {resource}: {source}")]
    Provider {
        resource: String,
        #[source]
        source: ProviderError,
    },

    /// Provider result lacked an attribute the kind promises
    #[error("Resource {resource} resolved without attribute {attribute}")]
    MissingAttribute { resource: String, attribute: String },

    /// A deferred value was read before its producer resolved
    #[error("Deferred value {resource}.{attribute} is not resolved")]
    Unresolved { resource: String, attribute: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for stack operations
pub type StackResult<T> = Result<T, StackError>;

impl From<serde_json::Error> for StackError {
    fn from(err: serde_json::Error) -> Self {
        StackError::Serialization(err.to_string())
    }
}
