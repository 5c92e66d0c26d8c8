// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deferred value substitution

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::LogicalName;
use crate::errors::{StackError, StackResult};
use crate::provider::ResourceState;
use crate::resources::{as_output_ref, Input};

/// Resolved state per declaration
pub type Resolved = BTreeMap<LogicalName, ResourceState>;

/// Replace every deferred-value marker in `value` with the resolved attribute
///
/// Fails with [`StackError::Unresolved`] when a marker names a declaration
/// that has not resolved yet or an attribute its state lacks.
pub fn substitute(value: &Value, resolved: &Resolved) -> StackResult<Value> {
    if let Some(reference) = as_output_ref(value) {
        return resolved
            .get(&reference.resource)
            .and_then(|state| state.get(&reference.attribute))
            .cloned()
            .ok_or_else(|| StackError::Unresolved {
                resource: reference.resource.to_string(),
                attribute: reference.attribute,
            });
    }

    match value {
        Value::Object(map) => {
            let mut substituted = Map::with_capacity(map.len());
            for (key, child) in map {
                substituted.insert(key.clone(), substitute(child, resolved)?);
            }
            Ok(Value::Object(substituted))
        }
        Value::Array(items) => items
            .iter()
            .map(|item| substitute(item, resolved))
            .collect::<StackResult<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other.clone()),
    }
}

/// Resolve an export value
pub fn resolve_input(input: &Input<Value>, resolved: &Resolved) -> StackResult<Value> {
    match input {
        Input::Output { reference } => resolved
            .get(&reference.resource)
            .and_then(|state| state.get(&reference.attribute))
            .cloned()
            .ok_or_else(|| StackError::Unresolved {
                resource: reference.resource.to_string(),
                attribute: reference.attribute.clone(),
            }),
        Input::Value(value) => substitute(value, resolved),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::OutputRef;
    use serde_json::json;

    fn resolved() -> Resolved {
        let mut resolved = Resolved::new();
        resolved.insert(
            LogicalName::new("main-vpc").unwrap(),
            ResourceState::new("vpc-0123").with_output("cidr_block", "10.0.0.0/16"),
        );
        resolved
    }

    #[test]
    fn test_nested_markers_are_replaced() {
        let value = json!({
            "vpc_id": {"$output": {"resource": "main-vpc", "attribute": "id"}},
            "routes": [{"target": {"$output": {"resource": "main-vpc", "attribute": "cidr_block"}}}],
            "tags": {"Name": "public"}
        });

        assert_eq!(
            substitute(&value, &resolved()).unwrap(),
            json!({
                "vpc_id": "vpc-0123",
                "routes": [{"target": "10.0.0.0/16"}],
                "tags": {"Name": "public"}
            })
        );
    }

    #[test]
    fn test_unresolved_marker_fails() {
        let value = json!({"subnet_id": {"$output": {"resource": "subnet", "attribute": "id"}}});
        assert!(matches!(
            substitute(&value, &resolved()),
            Err(StackError::Unresolved { ref resource, .. }) if resource == "subnet"
        ));
    }

    #[test]
    fn test_resolve_export_input() {
        let reference = OutputRef::new(LogicalName::new("main-vpc").unwrap(), "id");
        assert_eq!(
            resolve_input(&Input::output(reference), &resolved()).unwrap(),
            json!("vpc-0123")
        );
        assert_eq!(
            resolve_input(&Input::Value(json!("static")), &resolved()).unwrap(),
            json!("static")
        );
    }
}
