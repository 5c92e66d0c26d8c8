// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network container, subnet, gateway and routing records

use serde::{Deserialize, Serialize};

use super::{Input, Tags};
use crate::domain::CidrBlock;

/// Tenancy of instances launched into a VPC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tenancy {
    #[default]
    Default,
    Dedicated,
    Host,
}

/// Network container (VPC)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VpcArgs {
    pub cidr_block: CidrBlock,
    pub enable_dns_support: bool,
    pub enable_dns_hostnames: bool,
    #[serde(default)]
    pub instance_tenancy: Tenancy,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// Subnet bound to one availability zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubnetArgs {
    pub vpc_id: Input<String>,
    pub availability_zone: String,
    pub cidr_block: CidrBlock,
    #[serde(default)]
    pub map_public_ip_on_launch: bool,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// Internet gateway attached to a VPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternetGatewayArgs {
    pub vpc_id: Input<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// Address allocation scope of an elastic IP
///
/// Older declarations expressed this as a `vpc: true` flag; both spellings
/// map to [`AllocationScope::Vpc`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationScope {
    #[default]
    Vpc,
    Standard,
}

impl From<bool> for AllocationScope {
    fn from(vpc: bool) -> Self {
        if vpc {
            Self::Vpc
        } else {
            Self::Standard
        }
    }
}

/// Elastic IP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EipArgs {
    pub domain: AllocationScope,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// NAT gateway placed in a public subnet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatGatewayArgs {
    pub allocation_id: Input<String>,
    pub subnet_id: Input<String>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

/// Next hop of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    /// Internet gateway
    GatewayId(Input<String>),
    /// NAT gateway
    NatGatewayId(Input<String>),
}

impl RouteTarget {
    /// The next-hop input regardless of gateway flavour
    pub fn input(&self) -> &Input<String> {
        match self {
            Self::GatewayId(input) | Self::NatGatewayId(input) => input,
        }
    }
}

/// Single destination to next-hop rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub cidr_block: CidrBlock,
    pub target: RouteTarget,
}

impl Route {
    /// Default route through an internet gateway
    pub fn via_internet_gateway(gateway_id: Input<String>) -> Self {
        Self {
            cidr_block: CidrBlock::ANY_V4,
            target: RouteTarget::GatewayId(gateway_id),
        }
    }

    /// Default route through a NAT gateway
    pub fn via_nat_gateway(nat_gateway_id: Input<String>) -> Self {
        Self {
            cidr_block: CidrBlock::ANY_V4,
            target: RouteTarget::NatGatewayId(nat_gateway_id),
        }
    }
}

/// Route table bound to a VPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTableArgs {
    pub vpc_id: Input<String>,
    pub routes: Vec<Route>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

impl RouteTableArgs {
    /// The route covering `0.0.0.0/0`, if present
    pub fn default_route(&self) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| route.cidr_block == CidrBlock::ANY_V4)
    }
}

/// Binding of one subnet to one route table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteTableAssociationArgs {
    pub subnet_id: Input<String>,
    pub route_table_id: Input<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vpc_args_shape() {
        let args = VpcArgs {
            cidr_block: CidrBlock::new("10.0.0.0/16").unwrap(),
            enable_dns_support: true,
            enable_dns_hostnames: true,
            instance_tenancy: Tenancy::Default,
            tags: super::super::name_tag("newVPC"),
        };

        assert_eq!(
            serde_json::to_value(&args).unwrap(),
            json!({
                "cidr_block": "10.0.0.0/16",
                "enable_dns_support": true,
                "enable_dns_hostnames": true,
                "instance_tenancy": "default",
                "tags": {"Name": "newVPC"}
            })
        );
    }

    #[test]
    fn test_route_target_tagging() {
        let route = Route::via_nat_gateway("nat-1".into());
        assert_eq!(
            serde_json::to_value(&route).unwrap(),
            json!({"cidr_block": "0.0.0.0/0", "target": {"nat_gateway_id": "nat-1"}})
        );
    }

    #[test]
    fn test_default_route_lookup() {
        let table = RouteTableArgs {
            vpc_id: "vpc-1".into(),
            routes: vec![Route::via_internet_gateway("igw-1".into())],
            tags: Tags::new(),
        };
        let route = table.default_route().unwrap();
        assert!(matches!(route.target, RouteTarget::GatewayId(_)));
    }

    #[test]
    fn test_allocation_scope_from_flag() {
        assert_eq!(AllocationScope::from(true), AllocationScope::Vpc);
        assert_eq!(AllocationScope::from(false), AllocationScope::Standard);
    }
}
