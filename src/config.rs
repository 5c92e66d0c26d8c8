// Copyright (c) 2025 - Cowboy AI, Inc.

//! Stack configuration
//!
//! One [`StackConfig`] parameterizes the whole graph. The network core
//! (VPC and two subnets) is always declared; every other subgraph is
//! optional and switched on by its section being present.
//!
//! | Section    | Declares                                               |
//! |------------|--------------------------------------------------------|
//! | `gateways` | internet gateway, EIP, NAT gateway, route tables       |
//! | `security` | TLS security group                                     |
//! | `iam`      | trust policy lookup, role, instance profile            |
//! | `compute`  | image lookup, instance (needs gateways, security, iam) |
//! | `storage`  | bucket                                                 |
//!
//! # Environment overlay
//!
//! [`StackConfig::from_env`] starts from the preset named by `STACK_VARIANT`
//! (`full` or `minimal`, default `full`) and applies `STACK_REGION`,
//! `STACK_VPC_CIDR` and `STACK_INSTANCE_TYPE` on top.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::invariants::{
    validate_disjoint_subnets, validate_subnet_within_network, validate_zone_in_region,
};
use crate::domain::{CidrBlock, ValidationError};
use crate::errors::{StackError, StackResult};
use crate::resources::{AllocationScope, CpuCredits, Tenancy};

pub const ENV_VARIANT: &str = "STACK_VARIANT";
pub const ENV_REGION: &str = "STACK_REGION";
pub const ENV_VPC_CIDR: &str = "STACK_VPC_CIDR";
pub const ENV_INSTANCE_TYPE: &str = "STACK_INSTANCE_TYPE";

pub const DEFAULT_REGION: &str = "ap-southeast-2";
pub const DEFAULT_SSM_POLICY_ARN: &str =
    "arn:aws:iam::aws:policy/service-role/AmazonEC2RoleforSSM";

/// Preset selecting which subgraphs are declared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackVariant {
    /// Network, gateways, security, identity and compute
    #[default]
    Full,
    /// Network core plus a storage bucket
    Minimal,
}

impl StackVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Minimal => "minimal",
        }
    }
}

impl fmt::Display for StackVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for StackVariant {
    type Err = StackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "minimal" => Ok(Self::Minimal),
            other => Err(StackError::Configuration(format!(
                "unknown stack variant '{}', expected 'full' or 'minimal'",
                other
            ))),
        }
    }
}

/// Subnet placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetConfig {
    pub availability_zone: String,
    pub cidr_block: CidrBlock,
}

/// Network container and its two subnets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub cidr_block: CidrBlock,
    #[serde(default = "default_true")]
    pub enable_dns_support: bool,
    #[serde(default = "default_true")]
    pub enable_dns_hostnames: bool,
    #[serde(default)]
    pub instance_tenancy: Tenancy,
    pub public_subnet: SubnetConfig,
    pub private_subnet: SubnetConfig,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            cidr_block: CidrBlock::ipv4([10, 0, 0, 0], 16),
            enable_dns_support: true,
            enable_dns_hostnames: true,
            instance_tenancy: Tenancy::Default,
            public_subnet: SubnetConfig {
                availability_zone: format!("{}a", DEFAULT_REGION),
                cidr_block: CidrBlock::ipv4([10, 0, 1, 0], 24),
            },
            private_subnet: SubnetConfig {
                availability_zone: format!("{}b", DEFAULT_REGION),
                cidr_block: CidrBlock::ipv4([10, 0, 2, 0], 24),
            },
        }
    }
}

fn default_true() -> bool {
    true
}

/// Internet and NAT gateway subgraph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub eip_scope: AllocationScope,
}

/// TLS access policy subgraph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(default = "default_security_description")]
    pub description: String,
    #[serde(default = "default_tls_port")]
    pub tls_port: u16,
    #[serde(default = "default_ingress_sources")]
    pub ingress_sources: Vec<CidrBlock>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            description: default_security_description(),
            tls_port: default_tls_port(),
            ingress_sources: default_ingress_sources(),
        }
    }
}

fn default_security_description() -> String {
    "Allow TLS inbound traffic".to_string()
}

fn default_tls_port() -> u16 {
    443
}

fn default_ingress_sources() -> Vec<CidrBlock> {
    vec![CidrBlock::ANY_V4]
}

/// Instance identity subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IamConfig {
    #[serde(default = "default_trusted_service")]
    pub trusted_service: String,
    #[serde(default = "default_managed_policies")]
    pub managed_policy_arns: Vec<String>,
}

impl Default for IamConfig {
    fn default() -> Self {
        Self {
            trusted_service: default_trusted_service(),
            managed_policy_arns: default_managed_policies(),
        }
    }
}

fn default_trusted_service() -> String {
    "ec2.amazonaws.com".to_string()
}

fn default_managed_policies() -> Vec<String> {
    vec![DEFAULT_SSM_POLICY_ARN.to_string()]
}

/// Image lookup and instance subgraph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeConfig {
    #[serde(default = "default_instance_type")]
    pub instance_type: String,
    #[serde(default = "default_ami_owner")]
    pub ami_owner: String,
    #[serde(default = "default_ami_pattern")]
    pub ami_name_pattern: String,
    #[serde(default = "default_cpu_credits")]
    pub cpu_credits: CpuCredits,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            instance_type: default_instance_type(),
            ami_owner: default_ami_owner(),
            ami_name_pattern: default_ami_pattern(),
            cpu_credits: default_cpu_credits(),
        }
    }
}

fn default_instance_type() -> String {
    "t3.micro".to_string()
}

fn default_ami_owner() -> String {
    "amazon".to_string()
}

fn default_ami_pattern() -> String {
    "amzn2-ami-hvm-*-x86_64-ebs".to_string()
}

fn default_cpu_credits() -> CpuCredits {
    CpuCredits::Unlimited
}

/// Bucket subgraph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_prefix: Option<String>,
    #[serde(default)]
    pub force_destroy: bool,
}

/// Configuration for one stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackConfig {
    pub project: String,
    pub region: String,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateways: Option<GatewayConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecurityConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam: Option<IamConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compute: Option<ComputeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self::full()
    }
}

impl StackConfig {
    /// Network, gateways, security, identity and compute
    pub fn full() -> Self {
        Self {
            project: "quickstart".to_string(),
            region: DEFAULT_REGION.to_string(),
            network: NetworkConfig::default(),
            gateways: Some(GatewayConfig::default()),
            security: Some(SecurityConfig::default()),
            iam: Some(IamConfig::default()),
            compute: Some(ComputeConfig::default()),
            storage: None,
        }
    }

    /// Network core plus a storage bucket
    pub fn minimal() -> Self {
        Self {
            project: "quickstart".to_string(),
            region: DEFAULT_REGION.to_string(),
            network: NetworkConfig::default(),
            gateways: None,
            security: None,
            iam: None,
            compute: None,
            storage: Some(StorageConfig::default()),
        }
    }

    pub fn for_variant(variant: StackVariant) -> Self {
        match variant {
            StackVariant::Full => Self::full(),
            StackVariant::Minimal => Self::minimal(),
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> StackResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StackError::Configuration(format!("invalid stack config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from process environment
    pub fn from_env() -> StackResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to read variables
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> StackResult<Self> {
        let variant = match lookup(ENV_VARIANT) {
            Some(value) => value.parse()?,
            None => StackVariant::default(),
        };
        let mut config = Self::for_variant(variant);

        if let Some(region) = lookup(ENV_REGION) {
            config.set_region(region.trim());
        }

        if let Some(cidr) = lookup(ENV_VPC_CIDR) {
            config.network.cidr_block = CidrBlock::new(cidr.trim())?;
        }

        if let Some(instance_type) = lookup(ENV_INSTANCE_TYPE) {
            match config.compute.as_mut() {
                Some(compute) => compute.instance_type = instance_type.trim().to_string(),
                None => {
                    return Err(StackError::Configuration(format!(
                        "{} set but the {} variant declares no instance",
                        ENV_INSTANCE_TYPE, variant
                    )))
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Move the stack to another region, keeping zone letters
    pub fn set_region(&mut self, region: &str) {
        for subnet in [
            &mut self.network.public_subnet,
            &mut self.network.private_subnet,
        ] {
            if let Some(letter) = subnet.availability_zone.strip_prefix(self.region.as_str()) {
                subnet.availability_zone = format!("{}{}", region, letter);
            }
        }
        self.region = region.to_string();
    }

    /// Check addressing, placement and subgraph prerequisites
    pub fn validate(&self) -> StackResult<()> {
        if self.project.trim().is_empty() {
            return Err(StackError::Configuration("project name is empty".to_string()));
        }

        let network = &self.network;
        for subnet in [&network.public_subnet, &network.private_subnet] {
            validate_subnet_within_network(&network.cidr_block, &subnet.cidr_block)?;
            validate_zone_in_region(&subnet.availability_zone, &self.region)?;
        }
        validate_disjoint_subnets(&[
            network.public_subnet.cidr_block,
            network.private_subnet.cidr_block,
        ])?;

        if self.compute.is_some() {
            let prerequisites = [
                ("gateways", self.gateways.is_some()),
                ("security", self.security.is_some()),
                ("iam", self.iam.is_some()),
            ];
            for (requires, present) in prerequisites {
                if !present {
                    return Err(ValidationError::MissingPrerequisite {
                        subgraph: "compute",
                        requires,
                    }
                    .into());
                }
            }
        }

        if let Some(security) = &self.security {
            if security.ingress_sources.is_empty() {
                return Err(StackError::Configuration(
                    "security group needs at least one ingress source".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Variant this configuration corresponds to, if it matches a preset
    pub fn variant(&self) -> Option<StackVariant> {
        let full = self.gateways.is_some()
            && self.security.is_some()
            && self.iam.is_some()
            && self.compute.is_some()
            && self.storage.is_none();
        let minimal = self.gateways.is_none()
            && self.security.is_none()
            && self.iam.is_none()
            && self.compute.is_none()
            && self.storage.is_some();

        match (full, minimal) {
            (true, _) => Some(StackVariant::Full),
            (_, true) => Some(StackVariant::Minimal),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(StackConfig::full().validate().is_ok());
        assert!(StackConfig::minimal().validate().is_ok());
        assert_eq!(StackConfig::default().variant(), Some(StackVariant::Full));
        assert_eq!(StackConfig::minimal().variant(), Some(StackVariant::Minimal));
    }

    #[test]
    fn test_defaults_match_quickstart() {
        let config = StackConfig::full();
        assert_eq!(config.network.cidr_block.to_string(), "10.0.0.0/16");
        assert_eq!(config.network.public_subnet.cidr_block.to_string(), "10.0.1.0/24");
        assert_eq!(config.network.private_subnet.availability_zone, "ap-southeast-2b");
        let compute = config.compute.unwrap();
        assert_eq!(compute.instance_type, "t3.micro");
        assert_eq!(compute.cpu_credits, CpuCredits::Unlimited);
    }

    #[test]
    fn test_env_overlay() {
        let config = StackConfig::from_env_with(env(&[
            (ENV_REGION, "us-west-2"),
            (ENV_INSTANCE_TYPE, "t3.small"),
        ]))
        .unwrap();

        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.network.public_subnet.availability_zone, "us-west-2a");
        assert_eq!(config.network.private_subnet.availability_zone, "us-west-2b");
        assert_eq!(config.compute.unwrap().instance_type, "t3.small");
    }

    #[test]
    fn test_env_minimal_rejects_instance_type() {
        let result = StackConfig::from_env_with(env(&[
            (ENV_VARIANT, "minimal"),
            (ENV_INSTANCE_TYPE, "t3.small"),
        ]));
        assert!(matches!(result, Err(StackError::Configuration(_))));
    }

    #[test]
    fn test_env_cidr_must_contain_subnets() {
        let result = StackConfig::from_env_with(env(&[(ENV_VPC_CIDR, "192.168.0.0/16")]));
        assert!(matches!(
            result,
            Err(StackError::Validation(ValidationError::CidrOutsideNetwork { .. }))
        ));
    }

    #[test]
    fn test_unknown_variant() {
        assert!(matches!(
            StackConfig::from_env_with(env(&[(ENV_VARIANT, "huge")])),
            Err(StackError::Configuration(_))
        ));
    }

    #[test]
    fn test_compute_requires_prerequisites() {
        let mut config = StackConfig::full();
        config.iam = None;
        assert!(matches!(
            config.validate(),
            Err(StackError::Validation(ValidationError::MissingPrerequisite {
                subgraph: "compute",
                requires: "iam"
            }))
        ));
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let config = StackConfig::from_json_str(
            r#"{
                "project": "demo",
                "region": "ap-southeast-2",
                "storage": {"bucket_prefix": "artifacts"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.network, NetworkConfig::default());
        assert_eq!(config.variant(), Some(StackVariant::Minimal));
        assert_eq!(
            config.storage.and_then(|s| s.bucket_prefix).as_deref(),
            Some("artifacts")
        );
    }

    #[test]
    fn test_from_json_rejects_overlap() {
        let result = StackConfig::from_json_str(
            r#"{
                "project": "demo",
                "region": "ap-southeast-2",
                "network": {
                    "cidr_block": "10.0.0.0/16",
                    "public_subnet": {"availability_zone": "ap-southeast-2a", "cidr_block": "10.0.0.0/23"},
                    "private_subnet": {"availability_zone": "ap-southeast-2b", "cidr_block": "10.0.1.0/24"}
                }
            }"#,
        );
        assert!(matches!(
            result,
            Err(StackError::Validation(ValidationError::OverlappingSubnets { .. }))
        ));
    }
}
