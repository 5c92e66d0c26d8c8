// Copyright (c) 2025 - Cowboy AI, Inc.
//! Compute instance and machine image records

use serde::{Deserialize, Serialize};

use super::{Input, Tags};

/// Name/values filter applied to a machine image query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmiFilter {
    pub name: String,
    pub values: Vec<String>,
}

/// Machine image selection query
///
/// With `most_recent` set, the newest matching image wins, so the same query
/// can select different images on different dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmiQuery {
    #[serde(default)]
    pub owners: Vec<String>,
    #[serde(default)]
    pub filters: Vec<AmiFilter>,
    #[serde(default)]
    pub most_recent: bool,
}

impl AmiQuery {
    /// Newest image from `owner` whose name matches `pattern`
    pub fn latest(owner: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            owners: vec![owner.into()],
            filters: vec![AmiFilter {
                name: "name".to_string(),
                values: vec![pattern.into()],
            }],
            most_recent: true,
        }
    }

    /// Name patterns from every `name` filter
    pub fn name_patterns(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .filter(|filter| filter.name == "name")
            .flat_map(|filter| filter.values.iter().map(String::as_str))
    }
}

/// Burst credit mode of a performance instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuCredits {
    #[default]
    Standard,
    Unlimited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditSpecification {
    pub cpu_credits: CpuCredits,
}

/// Virtual machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceArgs {
    pub ami: Input<String>,
    pub instance_type: String,
    pub iam_instance_profile: Input<String>,
    pub subnet_id: Input<String>,
    pub vpc_security_group_ids: Vec<Input<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_specification: Option<CreditSpecification>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_latest_query() {
        let query = AmiQuery::latest("amazon", "amzn2-ami-hvm-*-x86_64-ebs");
        assert!(query.most_recent);
        assert_eq!(query.owners, vec!["amazon"]);
        assert_eq!(
            query.name_patterns().collect::<Vec<_>>(),
            vec!["amzn2-ami-hvm-*-x86_64-ebs"]
        );
    }

    #[test]
    fn test_credit_specification_shape() {
        let spec = CreditSpecification {
            cpu_credits: CpuCredits::Unlimited,
        };
        assert_eq!(
            serde_json::to_value(spec).unwrap(),
            json!({"cpu_credits": "unlimited"})
        );
    }
}
