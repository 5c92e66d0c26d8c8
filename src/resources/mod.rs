// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Argument Records
//!
//! Typed configuration payloads for every declarable kind. Fields that depend
//! on another declaration hold an [`Input`], which is either a literal or a
//! deferred [`OutputRef`] to an attribute of an earlier declaration.
//!
//! # Deferred value encoding
//!
//! A deferred value serializes as a single-key marker object:
//!
//! ```text
//! {"$output": {"resource": "main-vpc", "attribute": "id"}}
//! ```
//!
//! Because every record is reduced to JSON before it enters the graph, the
//! builder finds references by scanning for markers, and the engine resolves
//! them by replacing each marker with the producer's resolved value.

pub mod compute;
pub mod iam;
pub mod network;
pub mod security;
pub mod storage;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::domain::LogicalName;

pub use compute::{AmiFilter, AmiQuery, CpuCredits, CreditSpecification, InstanceArgs};
pub use iam::{
    render_policy_document, Effect, InstanceProfileArgs, PolicyDocumentArgs, PolicyStatement,
    Principal, RoleArgs,
};
pub use network::{
    AllocationScope, EipArgs, InternetGatewayArgs, NatGatewayArgs, Route, RouteTableArgs,
    RouteTableAssociationArgs, RouteTarget, SubnetArgs, Tenancy, VpcArgs,
};
pub use security::{SecurityGroupArgs, SecurityRule};
pub use storage::BucketArgs;

/// Key of the marker object a deferred value serializes to
pub const OUTPUT_MARKER: &str = "$output";

/// Resource tags, ordered for stable records
pub type Tags = BTreeMap<String, String>;

/// Tags carrying only a `Name` entry
pub fn name_tag(name: impl Into<String>) -> Tags {
    let mut tags = Tags::new();
    tags.insert("Name".to_string(), name.into());
    tags
}

/// Key inside a marker naming the builder that minted it
pub const ORIGIN_KEY: &str = "stack";

/// Reference to an attribute another declaration will produce
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutputRef {
    pub resource: LogicalName,
    pub attribute: String,
    /// Builder the reference was minted by; stripped before it is recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<Uuid>,
}

impl OutputRef {
    pub fn new(resource: LogicalName, attribute: impl Into<String>) -> Self {
        Self {
            resource,
            attribute: attribute.into(),
            stack: None,
        }
    }

    /// Tag the reference with the builder that minted it
    pub fn minted_by(mut self, stack: Uuid) -> Self {
        self.stack = Some(stack);
        self
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource, self.attribute)
    }
}

/// A configuration field that is either literal or deferred
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input<T> {
    /// Value known only after the referenced declaration resolves
    Output {
        #[serde(rename = "$output")]
        reference: OutputRef,
    },
    /// Literal value known at authoring time
    Value(T),
}

impl<T> Input<T> {
    /// Create a deferred input
    pub fn output(reference: OutputRef) -> Self {
        Self::Output { reference }
    }

    /// Get the deferred reference, if any
    pub fn reference(&self) -> Option<&OutputRef> {
        match self {
            Self::Output { reference } => Some(reference),
            Self::Value(_) => None,
        }
    }
}

impl<T> From<T> for Input<T> {
    fn from(value: T) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Input<String> {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// A reference found while scanning a serialized record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundReference {
    /// JSON pointer to the marker within the record
    pub path: String,
    pub reference: OutputRef,
}

/// Extract a reference if `value` is a deferred-value marker
pub fn as_output_ref(value: &Value) -> Option<OutputRef> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let marker = object.get(OUTPUT_MARKER)?;
    serde_json::from_value(marker.clone()).ok()
}

/// Collect every deferred-value marker in a serialized record, in document order
pub fn collect_output_refs(value: &Value) -> Vec<FoundReference> {
    let mut found = Vec::new();
    walk(value, String::new(), &mut found);
    found
}

/// Collect every marker and remove its origin, leaving `value` in record form
pub fn detach_output_refs(value: &mut Value) -> Vec<FoundReference> {
    let found = collect_output_refs(value);
    for item in &found {
        if let Some(marker) = value
            .pointer_mut(&item.path)
            .and_then(|marker| marker.get_mut(OUTPUT_MARKER))
            .and_then(Value::as_object_mut)
        {
            marker.remove(ORIGIN_KEY);
        }
    }
    found
}

fn walk(value: &Value, path: String, found: &mut Vec<FoundReference>) {
    if let Some(reference) = as_output_ref(value) {
        found.push(FoundReference { path, reference });
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                walk(child, format!("{}/{}", path, escape_pointer(key)), found);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{}/{}", path, i), found);
            }
        }
        _ => {}
    }
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
