// Copyright (c) 2025 - Cowboy AI, Inc.
//! Access policy (security group) records

use serde::{Deserialize, Serialize};

use super::{Input, Tags};
use crate::domain::{CidrBlock, PortRange, Protocol};

/// One allow rule of a security group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub protocol: Protocol,
    #[serde(flatten)]
    pub ports: PortRange,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<CidrBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6_cidr_blocks: Vec<CidrBlock>,
}

impl SecurityRule {
    /// Allow a single TCP port from the given sources
    pub fn tcp(port: u16, sources: Vec<CidrBlock>) -> Self {
        let (v4, v6): (Vec<_>, Vec<_>) = sources.into_iter().partition(CidrBlock::is_ipv4);
        Self {
            description: None,
            protocol: Protocol::Tcp,
            ports: PortRange::single(port),
            cidr_blocks: v4,
            ipv6_cidr_blocks: v6,
        }
    }

    /// Allow every protocol and port to or from anywhere, on both families
    pub fn allow_all() -> Self {
        Self {
            description: None,
            protocol: Protocol::All,
            ports: PortRange::ALL,
            cidr_blocks: vec![CidrBlock::ANY_V4],
            ipv6_cidr_blocks: vec![CidrBlock::ANY_V6],
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Every source or destination block, IPv4 first
    pub fn blocks(&self) -> impl Iterator<Item = &CidrBlock> {
        self.cidr_blocks.iter().chain(self.ipv6_cidr_blocks.iter())
    }

    /// Check whether this rule admits `protocol`/`port` for `peer`
    pub fn allows(&self, protocol: Protocol, port: u16, peer: &CidrBlock) -> bool {
        let protocol_ok = self.protocol == Protocol::All || self.protocol == protocol;
        let port_ok = self.protocol == Protocol::All || self.ports.contains(port);
        protocol_ok && port_ok && self.blocks().any(|block| block.contains(peer))
    }
}

/// Security group bound to a VPC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityGroupArgs {
    pub description: String,
    pub vpc_id: Input<String>,
    #[serde(default)]
    pub ingress: Vec<SecurityRule>,
    #[serde(default)]
    pub egress: Vec<SecurityRule>,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tcp_rule_shape() {
        let rule = SecurityRule::tcp(443, vec![CidrBlock::ANY_V4]).with_description("TLS from public");
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({
                "description": "TLS from public",
                "protocol": "tcp",
                "from_port": 443,
                "to_port": 443,
                "cidr_blocks": ["0.0.0.0/0"]
            })
        );
    }

    #[test]
    fn test_tcp_rule_splits_families() {
        let rule = SecurityRule::tcp(22, vec![CidrBlock::ANY_V6, CidrBlock::ANY_V4]);
        assert_eq!(rule.cidr_blocks, vec![CidrBlock::ANY_V4]);
        assert_eq!(rule.ipv6_cidr_blocks, vec![CidrBlock::ANY_V6]);
    }

    #[test]
    fn test_allow_all_rule() {
        let rule = SecurityRule::allow_all();
        let host = CidrBlock::new("198.51.100.7/32").unwrap();
        assert!(rule.allows(Protocol::Udp, 53, &host));
        assert!(rule.allows(Protocol::Tcp, 8080, &CidrBlock::new("2001:db8::/32").unwrap()));
    }

    #[test]
    fn test_tls_rule_allows_only_443() {
        let rule = SecurityRule::tcp(443, vec![CidrBlock::ANY_V4]);
        let host = CidrBlock::new("203.0.113.9/32").unwrap();
        assert!(rule.allows(Protocol::Tcp, 443, &host));
        assert!(!rule.allows(Protocol::Tcp, 80, &host));
        assert!(!rule.allows(Protocol::Udp, 443, &host));
    }

    #[test]
    fn test_rule_roundtrip_keeps_ports() {
        let json = json!({"protocol": "-1", "from_port": 0, "to_port": 0, "cidr_blocks": ["0.0.0.0/0"]});
        let rule: SecurityRule = serde_json::from_value(json).unwrap();
        assert_eq!(rule.protocol, Protocol::All);
        assert_eq!(rule.ports, PortRange::ALL);
    }
}
