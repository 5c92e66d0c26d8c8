// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Declaration Graphs
//!
//! Random acyclic graphs are generated by letting node `i` reference any
//! subset of nodes `0..i`. Every such graph must validate, and every order
//! the graph hands out must respect its edges.

use cim_stack_graph::graph::{DeclarationRecord, StackGraph};
use cim_stack_graph::{LogicalName, ResourceKind, StackError};
use proptest::prelude::*;
use proptest::sample::Index;
use serde_json::{json, Map, Value};
use std::collections::HashMap;

// ============================================================================
// Generators
// ============================================================================

fn node_name(i: usize) -> String {
    format!("node-{}", i)
}

fn reference(i: usize) -> Value {
    json!({"$output": {"resource": node_name(i), "attribute": "id"}})
}

/// Records for node `i` referencing each of `deps[i]`
fn records_from(deps: &[Vec<usize>]) -> Vec<DeclarationRecord> {
    deps.iter()
        .enumerate()
        .map(|(i, targets)| {
            let mut properties = Map::new();
            for (slot, target) in targets.iter().enumerate() {
                properties.insert(format!("ref_{}", slot), reference(*target));
            }
            DeclarationRecord::new(
                i,
                LogicalName::new(node_name(i)).unwrap(),
                ResourceKind::Vpc,
                Value::Object(properties),
                vec![],
                true,
            )
        })
        .collect()
}

/// Dependency lists where node `i` only references nodes below `i`
fn acyclic_deps() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(any::<Index>(), 0..4), 1..16).prop_map(
        |picks| {
            picks
                .into_iter()
                .enumerate()
                .map(|(i, indices)| {
                    if i == 0 {
                        return Vec::new();
                    }
                    let mut deps: Vec<usize> = indices.iter().map(|ix| ix.index(i)).collect();
                    deps.sort_unstable();
                    deps.dedup();
                    deps
                })
                .collect()
        },
    )
}

fn edges(graph: &StackGraph) -> Vec<(String, String)> {
    graph
        .edges()
        .into_iter()
        .map(|(from, to, _)| (from.to_string(), to.to_string()))
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_program_ordered_graphs_validate(deps in acyclic_deps()) {
        let graph = StackGraph::from_records(records_from(&deps), vec![]).unwrap();

        prop_assert_eq!(graph.len(), deps.len());
        prop_assert!(graph.is_program_ordered());
        prop_assert!(graph.validate().is_ok());
    }

    #[test]
    fn prop_topological_order_respects_edges(deps in acyclic_deps()) {
        let mut records = records_from(&deps);
        records.reverse();
        let graph = StackGraph::from_records(records, vec![]).unwrap();

        let position: HashMap<String, usize> = graph
            .topological_order()
            .iter()
            .enumerate()
            .map(|(i, record)| (record.name.to_string(), i))
            .collect();

        for (from, to) in edges(&graph) {
            prop_assert!(position[&from] < position[&to]);
        }
    }

    #[test]
    fn prop_levels_only_depend_on_lower_levels(deps in acyclic_deps()) {
        let graph = StackGraph::from_records(records_from(&deps), vec![]).unwrap();

        let level: HashMap<String, usize> = graph
            .levels()
            .iter()
            .enumerate()
            .flat_map(|(depth, members)| {
                members.iter().map(move |record| (record.name.to_string(), depth))
            })
            .collect();

        prop_assert_eq!(level.len(), graph.len());
        for (from, to) in edges(&graph) {
            prop_assert!(level[&from] < level[&to]);
        }

        // Every non-root sits exactly one level above its deepest prerequisite
        for record in graph.records() {
            let deepest = graph
                .dependencies_of(record.name.as_str())
                .iter()
                .map(|dep| level[dep.name.as_str()])
                .max();
            let expected = deepest.map_or(0, |d| d + 1);
            prop_assert_eq!(level[record.name.as_str()], expected);
        }
    }

    #[test]
    fn prop_back_edge_creates_cycle(length in 2usize..12) {
        // Chain node-0 <- node-1 <- ... <- node-(length-1), then close it
        let mut deps: Vec<Vec<usize>> = (0..length)
            .map(|i| if i == 0 { vec![] } else { vec![i - 1] })
            .collect();
        deps[0].push(length - 1);

        let result = StackGraph::from_records(records_from(&deps), vec![]);
        prop_assert!(matches!(result, Err(StackError::Cycle(_))));
    }

    #[test]
    fn prop_rebuild_is_identity(deps in acyclic_deps()) {
        let graph = StackGraph::from_records(records_from(&deps), vec![]).unwrap();
        let rebuilt = StackGraph::from_records(graph.records().to_vec(), vec![]).unwrap();

        prop_assert_eq!(rebuilt.records(), graph.records());
        prop_assert_eq!(edges(&rebuilt), edges(&graph));
    }
}
