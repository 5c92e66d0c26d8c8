// Copyright (c) 2025 - Cowboy AI, Inc.
//! Identity role, instance profile and policy document records

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::{Input, Tags};

/// IAM policy language version
pub const POLICY_VERSION: &str = "2012-10-17";

/// Statement effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

/// Principal a statement applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "type")]
    pub kind: String,
    pub identifiers: Vec<String>,
}

impl Principal {
    /// AWS service principal such as `ec2.amazonaws.com`
    pub fn service(identifier: impl Into<String>) -> Self {
        Self {
            kind: "Service".to_string(),
            identifiers: vec![identifier.into()],
        }
    }
}

/// One statement of a policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyStatement {
    #[serde(default)]
    pub effect: Effect,
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub principals: Vec<Principal>,
}

/// Query for a rendered policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDocumentArgs {
    pub statements: Vec<PolicyStatement>,
}

impl PolicyDocumentArgs {
    /// Single-statement trust policy letting `service` assume a role
    pub fn assume_role(service: impl Into<String>) -> Self {
        Self {
            statements: vec![PolicyStatement {
                effect: Effect::Allow,
                actions: vec!["sts:AssumeRole".to_string()],
                principals: vec![Principal::service(service)],
            }],
        }
    }
}

/// Render a policy document as IAM JSON
///
/// Single-element action and identifier lists collapse to plain strings,
/// matching what the platform itself returns.
pub fn render_policy_document(args: &PolicyDocumentArgs) -> String {
    let statements: Vec<Value> = args
        .statements
        .iter()
        .map(|statement| {
            let mut rendered = Map::new();
            let effect = match statement.effect {
                Effect::Allow => "Allow",
                Effect::Deny => "Deny",
            };
            rendered.insert("Effect".to_string(), json!(effect));
            rendered.insert("Action".to_string(), collapse(&statement.actions));

            if !statement.principals.is_empty() {
                let mut principals = Map::new();
                for principal in &statement.principals {
                    principals.insert(principal.kind.clone(), collapse(&principal.identifiers));
                }
                rendered.insert("Principal".to_string(), Value::Object(principals));
            }

            Value::Object(rendered)
        })
        .collect();

    json!({
        "Version": POLICY_VERSION,
        "Statement": statements,
    })
    .to_string()
}

fn collapse(items: &[String]) -> Value {
    match items {
        [single] => json!(single),
        many => json!(many),
    }
}

/// Identity role with a trust policy and managed permission grants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleArgs {
    pub assume_role_policy: Input<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_arns: Vec<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// Instance profile carrying a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceProfileArgs {
    pub role: Input<String>,
}
