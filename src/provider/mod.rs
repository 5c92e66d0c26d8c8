// Copyright (c) 2025 - Cowboy AI, Inc.

//! Provider Seam
//!
//! The provider is the opaque collaborator that turns a fully resolved
//! declaration into platform state. The engine never inspects how a provider
//! works; it hands over one request per declaration, in dependency order,
//! and reads back the attributes the declaration's kind promises.
//!
//! # Contract
//!
//! ```text
//! RegisterRequest { name, kind, properties } ──register──> ResourceState { id, outputs }
//! LookupRequest   { name, kind, query }      ──lookup────> ResourceState { id, outputs }
//! ```
//!
//! Properties and queries reaching a provider contain no deferred-value
//! markers; every reference has already been substituted.
//!
//! # Example Implementation
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use cim_stack_graph::provider::{
//!     LookupRequest, Provider, ProviderError, ProviderResult, RegisterRequest, ResourceState,
//! };
//!
//! struct Rejecting;
//!
//! #[async_trait]
//! impl Provider for Rejecting {
//!     fn name(&self) -> &str {
//!         "rejecting"
//!     }
//!
//!     async fn register(&self, request: RegisterRequest) -> ProviderResult<ResourceState> {
//!         Err(ProviderError::Rejected(request.name.to_string()))
//!     }
//!
//!     async fn lookup(&self, request: LookupRequest) -> ProviderResult<ResourceState> {
//!         Err(ProviderError::NotFound(request.name.to_string()))
//!     }
//! }
//! ```

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::{LogicalName, ResourceKind};

pub use memory::{InMemoryProvider, MachineImage, ProviderRequest};

/// Request to create a declared resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: LogicalName,
    pub kind: ResourceKind,
    /// Fully resolved configuration payload
    pub properties: Value,
}

/// Request to answer a query against the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub name: LogicalName,
    pub kind: ResourceKind,
    /// Fully resolved query payload
    pub query: Value,
}

/// Attributes produced for one declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Provider-assigned identifier
    pub id: String,
    /// Produced attributes keyed by attribute name
    #[serde(default)]
    pub outputs: BTreeMap<String, Value>,
}

impl ResourceState {
    /// State whose `id` output mirrors the identifier
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut outputs = BTreeMap::new();
        outputs.insert("id".to_string(), Value::String(id.clone()));
        Self { id, outputs }
    }

    pub fn with_output(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.outputs.insert(attribute.into(), value.into());
        self
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.outputs.get(attribute)
    }
}

/// Errors reported by a provider
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ProviderError {
    /// Platform refused the request
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Lookup matched nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider cannot handle this kind
    #[error("Unsupported resource kind: {0}")]
    Unsupported(ResourceKind),

    /// Payload could not be interpreted
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider trait - platform side of declaration resolution
///
/// Implementations must be safe to call concurrently: the engine resolves
/// independent declarations of one dependency level at the same time.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Name of this provider, for logs
    fn name(&self) -> &str;

    /// Create the resource described by a resolved declaration
    async fn register(&self, request: RegisterRequest) -> ProviderResult<ResourceState>;

    /// Answer a resolved query
    async fn lookup(&self, request: LookupRequest) -> ProviderResult<ResourceState>;
}
