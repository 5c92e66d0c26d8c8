// Copyright (c) 2025 - Cowboy AI, Inc.
//! Validated dependency DAG over declaration records

use petgraph::algo::toposort;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::record::{DeclarationRecord, ExportRecord};
use crate::domain::LogicalName;
use crate::errors::{StackError, StackResult};

/// Typed edge from a prerequisite to its dependent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Dependent reads `attribute` of the prerequisite
    Reference { attribute: String },
    /// Explicit ordering hint
    Ordering,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reference { attribute } => write!(f, "{}", attribute),
            Self::Ordering => write!(f, "depends_on"),
        }
    }
}

/// Acyclic graph of declarations plus the output contract
///
/// Node weights are positions into the record list, so records stay in
/// program order while edges carry the dependency structure.
#[derive(Debug, Clone)]
pub struct StackGraph {
    records: Vec<DeclarationRecord>,
    exports: Vec<ExportRecord>,
    graph: DiGraph<usize, EdgeKind>,
    indices: HashMap<LogicalName, NodeIndex>,
    order: Vec<usize>,
}

impl StackGraph {
    /// Build and validate a graph from records
    ///
    /// Rejects duplicate names, references to unknown declarations or
    /// attributes, exports that read unknown attributes, and cycles. Records
    /// need not be in dependency order; only acyclicity is required. Edges
    /// come from the markers in each payload, never from stored references.
    pub fn from_records(
        mut records: Vec<DeclarationRecord>,
        exports: Vec<ExportRecord>,
    ) -> StackResult<Self> {
        let mut graph = DiGraph::with_capacity(records.len(), records.len() * 2);
        let mut indices = HashMap::with_capacity(records.len());

        for (position, record) in records.iter_mut().enumerate() {
            record.index = position;
            record.rederive();
            if indices.contains_key(&record.name) {
                return Err(StackError::DuplicateName(record.name.to_string()));
            }
            indices.insert(record.name.clone(), graph.add_node(position));
        }

        for record in &records {
            let dependent = indices[&record.name];

            for reference in &record.references {
                let prerequisite = resolve_target(&indices, &record.name, &reference.resource)?;
                let kind = records[graph[prerequisite]].kind;
                if !kind.has_attribute(&reference.attribute) {
                    return Err(StackError::UnknownAttribute {
                        resource: reference.resource.to_string(),
                        kind: kind.to_string(),
                        attribute: reference.attribute.clone(),
                    });
                }
                graph.add_edge(
                    prerequisite,
                    dependent,
                    EdgeKind::Reference {
                        attribute: reference.attribute.clone(),
                    },
                );
            }

            for name in &record.depends_on {
                let prerequisite = resolve_target(&indices, &record.name, name)?;
                graph.add_edge(prerequisite, dependent, EdgeKind::Ordering);
            }
        }

        let mut seen_exports = Vec::with_capacity(exports.len());
        for export in &exports {
            if seen_exports.contains(&&export.name) {
                return Err(StackError::DuplicateExport(export.name.to_string()));
            }
            seen_exports.push(&export.name);

            for reference in export.references() {
                let target = resolve_target(&indices, &export.name, &reference.resource)?;
                let kind = records[graph[target]].kind;
                if !kind.has_attribute(&reference.attribute) {
                    return Err(StackError::UnknownAttribute {
                        resource: reference.resource.to_string(),
                        kind: kind.to_string(),
                        attribute: reference.attribute.clone(),
                    });
                }
            }
        }

        let order = topological_positions(&graph, &records)?;

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Validated declaration graph"
        );

        Ok(Self {
            records,
            exports,
            graph,
            indices,
            order,
        })
    }

    /// Re-check acyclicity
    pub fn validate(&self) -> StackResult<()> {
        topological_positions(&self.graph, &self.records).map(|_| ())
    }

    /// Declaration records in program order
    pub fn records(&self) -> &[DeclarationRecord] {
        &self.records
    }

    /// Output contract in declaration order
    pub fn exports(&self) -> &[ExportRecord] {
        &self.exports
    }

    /// Export names in declaration order
    pub fn export_names(&self) -> Vec<&str> {
        self.exports.iter().map(|export| export.name.as_str()).collect()
    }

    /// Get a record by name
    pub fn record(&self, name: &str) -> Option<&DeclarationRecord> {
        self.records.iter().find(|record| record.name.as_str() == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Records in a dependency-respecting order
    pub fn topological_order(&self) -> Vec<&DeclarationRecord> {
        self.order.iter().map(|&position| &self.records[position]).collect()
    }

    /// Records grouped by dependency depth
    ///
    /// Every record in level `n` depends only on records in levels below
    /// `n`, so the members of one level can be resolved independently.
    /// Within a level records keep program order.
    pub fn levels(&self) -> Vec<Vec<&DeclarationRecord>> {
        let mut depth = vec![0usize; self.records.len()];

        for &position in &self.order {
            let node = self.indices[&self.records[position].name];
            depth[position] = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|prerequisite| depth[self.graph[prerequisite]] + 1)
                .max()
                .unwrap_or(0);
        }

        let height = depth.iter().max().map_or(0, |max| max + 1);
        let mut levels: Vec<Vec<&DeclarationRecord>> = vec![Vec::new(); height];
        for record in &self.records {
            levels[depth[record.index]].push(record);
        }
        levels
    }

    /// Direct prerequisites of a declaration, in program order
    pub fn dependencies_of(&self, name: &str) -> Vec<&DeclarationRecord> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Direct dependents of a declaration, in program order
    pub fn dependents_of(&self, name: &str) -> Vec<&DeclarationRecord> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&DeclarationRecord> {
        let Some(node) = LogicalName::new(name)
            .ok()
            .and_then(|name| self.indices.get(&name).copied())
        else {
            return Vec::new();
        };

        let mut positions: Vec<usize> = self
            .graph
            .neighbors_directed(node, direction)
            .map(|neighbor| self.graph[neighbor])
            .collect();
        positions.sort_unstable();
        positions.dedup();
        positions.into_iter().map(|position| &self.records[position]).collect()
    }

    /// Every edge as (prerequisite, dependent, kind)
    pub fn edges(&self) -> Vec<(&LogicalName, &LogicalName, &EdgeKind)> {
        self.graph
            .edge_references()
            .map(|edge| {
                (
                    &self.records[self.graph[edge.source()]].name,
                    &self.records[self.graph[edge.target()]].name,
                    edge.weight(),
                )
            })
            .collect()
    }

    /// Whether every edge points from an earlier to a later declaration
    pub fn is_program_ordered(&self) -> bool {
        self.graph
            .edge_references()
            .all(|edge| self.graph[edge.source()] < self.graph[edge.target()])
    }

    /// Names of declarations whose results may change over time
    pub fn nondeterministic(&self) -> Vec<&LogicalName> {
        self.records
            .iter()
            .filter(|record| !record.deterministic)
            .map(|record| &record.name)
            .collect()
    }

    /// Render the topology in Graphviz DOT format
    pub fn to_dot(&self) -> String {
        let labelled = self.graph.map(
            |_, &position| {
                let record = &self.records[position];
                format!("{} ({})", record.name, record.kind)
            },
            |_, edge| edge.to_string(),
        );
        format!("{}", Dot::new(&labelled))
    }
}

fn resolve_target(
    indices: &HashMap<LogicalName, NodeIndex>,
    from: &LogicalName,
    target: &LogicalName,
) -> StackResult<NodeIndex> {
    indices
        .get(target)
        .copied()
        .ok_or_else(|| StackError::UnresolvedReference {
            from: from.to_string(),
            target: target.to_string(),
        })
}

fn topological_positions(
    graph: &DiGraph<usize, EdgeKind>,
    records: &[DeclarationRecord],
) -> StackResult<Vec<usize>> {
    toposort(graph, None)
        .map(|nodes| nodes.into_iter().map(|node| graph[node]).collect())
        .map_err(|cycle| StackError::Cycle(records[graph[cycle.node_id()]].name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceKind;
    use crate::graph::record::ReferenceRecord;
    use crate::resources::Input;
    use serde_json::json;

    fn name(s: &str) -> LogicalName {
        LogicalName::new(s).unwrap()
    }

    fn reference(resource: &str) -> serde_json::Value {
        json!({"$output": {"resource": resource, "attribute": "id"}})
    }

    fn record(n: &str, kind: ResourceKind, properties: serde_json::Value) -> DeclarationRecord {
        DeclarationRecord::new(0, name(n), kind, properties, vec![], true)
    }

    fn sample() -> Vec<DeclarationRecord> {
        vec![
            record("vpc", ResourceKind::Vpc, json!({"cidr_block": "10.0.0.0/16"})),
            record("public", ResourceKind::Subnet, json!({"vpc_id": reference("vpc")})),
            record("igw", ResourceKind::InternetGateway, json!({"vpc_id": reference("vpc")})),
            DeclarationRecord::new(0, name("eip"), ResourceKind::Eip, json!({"domain": "vpc"}), vec![name("igw")], true),
            record(
                "nat",
                ResourceKind::NatGateway,
                json!({"allocation_id": reference("eip"), "subnet_id": reference("public")}),
            ),
        ]
    }

    #[test]
    fn test_levels_respect_dependencies() {
        let graph = StackGraph::from_records(sample(), vec![]).unwrap();
        let levels: Vec<Vec<&str>> = graph
            .levels()
            .iter()
            .map(|level| level.iter().map(|r| r.name.as_str()).collect())
            .collect();

        assert_eq!(
            levels,
            vec![vec!["vpc"], vec!["public", "igw"], vec!["eip"], vec!["nat"]]
        );
    }

    #[test]
    fn test_edges_are_typed() {
        let graph = StackGraph::from_records(sample(), vec![]).unwrap();
        assert_eq!(graph.edge_count(), 5);

        let ordering: Vec<_> = graph
            .edges()
            .into_iter()
            .filter(|(_, _, kind)| **kind == EdgeKind::Ordering)
            .map(|(from, to, _)| (from.as_str(), to.as_str()))
            .collect();
        assert_eq!(ordering, vec![("igw", "eip")]);
        assert!(graph.is_program_ordered());
    }

    #[test]
    fn test_out_of_order_records_are_accepted_when_acyclic() {
        let mut records = sample();
        records.reverse();
        let graph = StackGraph::from_records(records, vec![]).unwrap();

        assert!(!graph.is_program_ordered());
        let order: Vec<&str> = graph.topological_order().iter().map(|r| r.name.as_str()).collect();
        let vpc = order.iter().position(|n| *n == "vpc").unwrap();
        let nat = order.iter().position(|n| *n == "nat").unwrap();
        assert!(vpc < nat);
    }

    #[test]
    fn test_cycle_rejected() {
        let records = vec![
            record("a", ResourceKind::Subnet, json!({"vpc_id": reference("b")})),
            record("b", ResourceKind::Vpc, json!({"peer": reference("a")})),
        ];
        assert!(matches!(
            StackGraph::from_records(records, vec![]),
            Err(StackError::Cycle(_))
        ));
    }

    #[test]
    fn test_self_reference_rejected() {
        let records = vec![record("a", ResourceKind::Vpc, json!({"self": reference("a")}))];
        assert!(matches!(
            StackGraph::from_records(records, vec![]),
            Err(StackError::Cycle(ref n)) if n == "a"
        ));
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let records = vec![record("a", ResourceKind::Subnet, json!({"vpc_id": reference("ghost")}))];
        assert!(matches!(
            StackGraph::from_records(records, vec![]),
            Err(StackError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn test_dependency_queries() {
        let graph = StackGraph::from_records(sample(), vec![]).unwrap();
        let deps: Vec<&str> = graph.dependencies_of("nat").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(deps, vec!["public", "eip"]);

        let dependents: Vec<&str> = graph.dependents_of("vpc").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(dependents, vec!["public", "igw"]);

        assert!(graph.dependencies_of("missing").is_empty());
    }

    #[test]
    fn test_dot_rendering() {
        let graph = StackGraph::from_records(sample(), vec![]).unwrap();
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("nat (nat_gateway)"));
        assert!(dot.contains("depends_on"));
    }

    #[test]
    fn test_stale_references_are_rebuilt_from_payload() {
        let mut records = sample();
        for record in &mut records {
            record.references.clear();
        }
        records[1].references.push(ReferenceRecord {
            resource: name("igw"),
            attribute: "id".to_string(),
            path: "/vpc_id".to_string(),
        });

        let graph = StackGraph::from_records(records, vec![]).unwrap();
        assert_eq!(graph.edge_count(), 5);
        let deps: Vec<&str> = graph.dependencies_of("public").iter().map(|r| r.name.as_str()).collect();
        assert_eq!(deps, vec!["vpc"]);
    }

    #[test]
    fn test_export_literal_markers_validated() {
        let ghost = ExportRecord {
            name: name("ids"),
            value: Input::Value(json!([reference("vpc"), reference("ghost")])),
        };
        assert!(matches!(
            StackGraph::from_records(sample(), vec![ghost]),
            Err(StackError::UnresolvedReference { ref from, ref target })
                if from == "ids" && target == "ghost"
        ));

        let wrong_attribute = ExportRecord {
            name: name("ips"),
            value: Input::Value(json!({"nat": {"$output": {"resource": "nat", "attribute": "arn"}}})),
        };
        assert!(matches!(
            StackGraph::from_records(sample(), vec![wrong_attribute]),
            Err(StackError::UnknownAttribute { .. })
        ));
    }
}
