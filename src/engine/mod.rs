// Copyright (c) 2025 - Cowboy AI, Inc.

//! Resolution Engine
//!
//! Walks a validated [`StackGraph`] level by level and asks a [`Provider`]
//! to resolve each declaration once everything it references has resolved.
//!
//! # Ordering
//!
//! ```text
//! level 0: [vpc, ami, trust-policy]        ── joined ──┐
//! level 1: [subnet-a, subnet-b, igw, sg, role]   <─────┘ ── joined ──┐
//! level 2: [eip, route-table, profile]                        <──────┘
//! ...
//! outputs                                  computed after the last level
//! ```
//!
//! Declarations inside one level share no edges, so they are resolved
//! concurrently and joined before the next level starts. Exports are
//! computed only after every declaration has resolved.

pub mod deferred;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, info_span, Instrument};

use crate::domain::LogicalName;
use crate::errors::{StackError, StackResult};
use crate::graph::{DeclarationRecord, StackGraph};
use crate::provider::{LookupRequest, Provider, RegisterRequest, ResourceState};

pub use deferred::{resolve_input, substitute, Resolved};

/// Resolved export values keyed by export name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StackOutputs(BTreeMap<String, Value>);

impl StackOutputs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Export names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Result of evaluating a graph against a provider
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Provider state per declaration
    pub resolved: Resolved,
    /// Declaration names grouped in the order their levels resolved
    pub levels: Vec<Vec<LogicalName>>,
    pub outputs: StackOutputs,
}

impl Evaluation {
    pub fn state(&self, name: &str) -> Option<&ResourceState> {
        let name = LogicalName::new(name).ok()?;
        self.resolved.get(&name)
    }

    /// Level index at which a declaration resolved
    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.levels
            .iter()
            .position(|level| level.iter().any(|member| member.as_str() == name))
    }
}

/// Dependency-ordered resolver over a provider
pub struct Engine<P: Provider> {
    provider: Arc<P>,
}

impl<P: Provider> Engine<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(provider),
        }
    }

    /// Share a provider the caller keeps a handle to
    pub fn with_shared(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve every declaration, then compute the exports
    ///
    /// The graph is validated again before the first provider call. The
    /// first failing declaration aborts evaluation; nothing is retried or
    /// rolled back.
    pub async fn evaluate(&self, graph: &StackGraph) -> StackResult<Evaluation> {
        let span = info_span!(
            "evaluate",
            provider = self.provider.name(),
            declarations = graph.len(),
            exports = graph.exports().len()
        );

        async move {
            graph.validate()?;

            let mut resolved = Resolved::new();
            let mut levels = Vec::new();

            for (depth, level) in graph.levels().into_iter().enumerate() {
                debug!(level = depth, size = level.len(), "Resolving level");

                let states =
                    try_join_all(level.iter().map(|record| self.resolve_one(record, &resolved)))
                        .await?;

                let mut names = Vec::with_capacity(level.len());
                for (record, state) in level.iter().zip(states) {
                    names.push(record.name.clone());
                    resolved.insert(record.name.clone(), state);
                }
                levels.push(names);
            }

            let mut outputs = BTreeMap::new();
            for export in graph.exports() {
                outputs.insert(
                    export.name.to_string(),
                    resolve_input(&export.value, &resolved)?,
                );
            }

            info!(
                resolved = resolved.len(),
                levels = levels.len(),
                outputs = outputs.len(),
                "Stack evaluated"
            );

            Ok::<_, StackError>(Evaluation {
                resolved,
                levels,
                outputs: StackOutputs(outputs),
            })
        }
        .instrument(span)
        .await
    }

    async fn resolve_one(
        &self,
        record: &DeclarationRecord,
        resolved: &Resolved,
    ) -> StackResult<ResourceState> {
        let payload = substitute(&record.properties, resolved)?;

        let result = if record.is_lookup() {
            self.provider
                .lookup(LookupRequest {
                    name: record.name.clone(),
                    kind: record.kind,
                    query: payload,
                })
                .await
        } else {
            self.provider
                .register(RegisterRequest {
                    name: record.name.clone(),
                    kind: record.kind,
                    properties: payload,
                })
                .await
        };

        let state = result.map_err(|source| StackError::Provider {
            resource: record.name.to_string(),
            source,
        })?;

        for attribute in record.kind.attributes() {
            if state.get(attribute).is_none() {
                return Err(StackError::MissingAttribute {
                    resource: record.name.to_string(),
                    attribute: attribute.to_string(),
                });
            }
        }

        debug!(resource = %record.name, kind = %record.kind, id = %state.id, "Resolved");
        Ok(state)
    }
}
