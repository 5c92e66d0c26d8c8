// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declaration records
//!
//! A record is the snapshot of one declaration before anything is resolved:
//! its name, kind, JSON payload (deferred values still as markers) and the
//! edges derived from that payload. Records contain no generated identity,
//! so two evaluations of the same program produce identical records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::domain::{LogicalName, ResourceKind};
use crate::resources::{collect_output_refs, Input, OutputRef};

/// A reference edge recorded on a declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRecord {
    pub resource: LogicalName,
    pub attribute: String,
    /// JSON pointer to the field holding the reference
    pub path: String,
}

/// Whether a record creates a resource or queries the platform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationRole {
    #[default]
    Resource,
    Lookup,
}

impl DeclarationRole {
    pub fn of(kind: ResourceKind) -> Self {
        if kind.is_lookup() {
            Self::Lookup
        } else {
            Self::Resource
        }
    }
}

/// Snapshot of one declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclarationRecord {
    /// Position in program order
    pub index: usize,
    pub name: LogicalName,
    pub kind: ResourceKind,
    /// Derived from `kind`
    #[serde(default)]
    pub role: DeclarationRole,
    pub properties: Value,
    /// Derived from `properties`
    #[serde(default)]
    pub references: Vec<ReferenceRecord>,
    /// Explicit ordering hints
    #[serde(default)]
    pub depends_on: Vec<LogicalName>,
    /// False when the provider may answer differently over time
    #[serde(default = "default_deterministic")]
    pub deterministic: bool,
}

fn default_deterministic() -> bool {
    true
}

impl DeclarationRecord {
    /// Build a record, deriving reference edges from the payload
    pub fn new(
        index: usize,
        name: LogicalName,
        kind: ResourceKind,
        properties: Value,
        depends_on: Vec<LogicalName>,
        deterministic: bool,
    ) -> Self {
        let references = references_in(&properties);

        Self {
            index,
            name,
            kind,
            role: DeclarationRole::of(kind),
            properties,
            references,
            depends_on,
            deterministic,
        }
    }

    /// Whether this record is a query against the provider
    pub fn is_lookup(&self) -> bool {
        self.kind.is_lookup()
    }

    /// Re-derive `role` and `references` from `kind` and `properties`
    pub fn rederive(&mut self) {
        self.role = DeclarationRole::of(self.kind);
        self.references = references_in(&self.properties);
    }

    /// Every declaration this one must follow, by reference or ordering hint
    pub fn dependencies(&self) -> BTreeSet<&LogicalName> {
        self.references
            .iter()
            .map(|reference| &reference.resource)
            .chain(self.depends_on.iter())
            .collect()
    }

    /// Read a payload field by JSON pointer (e.g. `/cidr_block`)
    pub fn property(&self, pointer: &str) -> Option<&Value> {
        self.properties.pointer(pointer)
    }

    /// Deserialize the payload back into its typed arguments
    pub fn args<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.properties.clone())
    }
}

/// Reference edges for every marker in a payload, in document order
pub fn references_in(properties: &Value) -> Vec<ReferenceRecord> {
    collect_output_refs(properties)
        .into_iter()
        .map(|found| ReferenceRecord {
            resource: found.reference.resource,
            attribute: found.reference.attribute,
            path: found.path,
        })
        .collect()
}

/// A named value in the program's output contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub name: LogicalName,
    pub value: Input<Value>,
}

impl ExportRecord {
    /// The declaration attribute this export reads, if deferred
    pub fn reference(&self) -> Option<&OutputRef> {
        self.value.reference()
    }

    /// Every declaration attribute the export reads, including markers
    /// nested inside a literal
    pub fn references(&self) -> Vec<OutputRef> {
        match &self.value {
            Input::Output { reference } => vec![reference.clone()],
            Input::Value(value) => collect_output_refs(value)
                .into_iter()
                .map(|found| found.reference)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn name(s: &str) -> LogicalName {
        LogicalName::new(s).unwrap()
    }

    #[test]
    fn test_record_derives_references() {
        let record = DeclarationRecord::new(
            3,
            name("nat"),
            ResourceKind::NatGateway,
            json!({
                "allocation_id": {"$output": {"resource": "eip", "attribute": "id"}},
                "subnet_id": {"$output": {"resource": "public", "attribute": "id"}}
            }),
            vec![name("igw")],
            true,
        );

        assert_eq!(record.references.len(), 2);
        assert_eq!(record.references[0].resource, name("eip"));
        assert_eq!(record.references[0].path, "/allocation_id");

        let deps: Vec<&str> = record.dependencies().into_iter().map(|n| n.as_str()).collect();
        assert_eq!(deps, vec!["eip", "igw", "public"]);
    }

    #[test]
    fn test_property_pointer() {
        let record = DeclarationRecord::new(
            0,
            name("vpc"),
            ResourceKind::Vpc,
            json!({"cidr_block": "10.0.0.0/16"}),
            vec![],
            true,
        );
        assert_eq!(record.property("/cidr_block"), Some(&json!("10.0.0.0/16")));
        assert_eq!(record.role, DeclarationRole::Resource);
        assert!(record.property("/missing").is_none());
    }

    #[test]
    fn test_rederive_restores_edges_and_role() {
        let original = DeclarationRecord::new(
            1,
            name("ami"),
            ResourceKind::AmiLookup,
            json!({"owners": [{"$output": {"resource": "account", "attribute": "id"}}]}),
            vec![],
            false,
        );

        let mut snapshot = serde_json::to_value(&original).unwrap();
        assert_eq!(snapshot["role"], json!("lookup"));
        let fields = snapshot.as_object_mut().unwrap();
        fields.remove("references");
        fields.remove("role");

        let mut restored: DeclarationRecord = serde_json::from_value(snapshot).unwrap();
        assert!(restored.references.is_empty());
        restored.rederive();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_export_references_include_nested_markers() {
        let export = ExportRecord {
            name: name("ids"),
            value: Input::Value(json!([
                {"$output": {"resource": "vpc", "attribute": "id"}},
                "literal",
                {"nested": {"$output": {"resource": "igw", "attribute": "id"}}}
            ])),
        };
        let references = export.references();
        let targets: Vec<&str> = references.iter().map(|r| r.resource.as_str()).collect();
        assert_eq!(targets, vec!["vpc", "igw"]);
        assert!(export.reference().is_none());
    }
}
