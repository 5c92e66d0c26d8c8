// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Validation Functions - Topology Invariants
//!
//! Business rules checked before a declaration enters the graph. All
//! functions are pure and return detailed validation results, so the stack
//! builder can fail before any provider call is attempted.
//!
//! # Invariant Categories
//!
//! 1. **Addressing**: subnets inside their network, no overlapping subnets
//! 2. **Placement**: zones belong to the configured region
//! 3. **Routing**: default routes point at the right kind of gateway
//! 4. **Access rules**: ports and sources are coherent

use crate::domain::{CidrBlock, PortRange, Protocol, ResourceKind};
use crate::resources::{Route, RouteTarget, SecurityRule};

/// Validation result with detailed error information
pub type ValidationResult = Result<(), ValidationError>;

/// Validation error with context
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Subnet range lies outside its network
    #[error("Subnet {subnet} is not contained in network {network}")]
    CidrOutsideNetwork { subnet: String, network: String },

    /// Two subnets share addresses
    #[error("Subnets {first} and {second} overlap")]
    OverlappingSubnets { first: String, second: String },

    /// Zone does not belong to the region
    #[error("Availability zone {zone} is not in region {region}")]
    ZoneOutsideRegion { zone: String, region: String },

    /// Route points at the wrong kind of gateway
    #[error("Route table {route_table} must target {expected}, found {actual}")]
    RouteTargetMismatch {
        route_table: String,
        expected: ResourceKind,
        actual: String,
    },

    /// Route table lacks a default route
    #[error("Route table {0} has no default route")]
    MissingDefaultRoute(String),

    /// Access rule is malformed
    #[error("Invalid access rule: {0}")]
    InvalidRule(String),

    /// A subgraph was requested without the subgraphs it depends on
    #[error("Subgraph {subgraph} requires {requires}")]
    MissingPrerequisite {
        subgraph: &'static str,
        requires: &'static str,
    },
}

/// Validate a subnet lies within its network
///
/// # Rules
/// - Same address family
/// - Subnet prefix at least as long as the network prefix
/// - Subnet network address inside the network range
pub fn validate_subnet_within_network(
    network: &CidrBlock,
    subnet: &CidrBlock,
) -> ValidationResult {
    if !network.contains(subnet) {
        return Err(ValidationError::CidrOutsideNetwork {
            subnet: subnet.to_string(),
            network: network.to_string(),
        });
    }
    Ok(())
}

/// Validate that no two subnets overlap
pub fn validate_disjoint_subnets(subnets: &[CidrBlock]) -> ValidationResult {
    for (i, first) in subnets.iter().enumerate() {
        for second in &subnets[i + 1..] {
            if first.overlaps(second) {
                return Err(ValidationError::OverlappingSubnets {
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Validate a zone label belongs to the region
///
/// # Rules
/// - Zone is the region name followed by a single lowercase letter
///   (`ap-southeast-2a` in `ap-southeast-2`)
pub fn validate_zone_in_region(zone: &str, region: &str) -> ValidationResult {
    let suffix_ok = zone
        .strip_prefix(region)
        .map(|suffix| suffix.len() == 1 && suffix.chars().all(|c| c.is_ascii_lowercase()))
        .unwrap_or(false);

    if !suffix_ok {
        return Err(ValidationError::ZoneOutsideRegion {
            zone: zone.to_string(),
            region: region.to_string(),
        });
    }
    Ok(())
}

/// Validate a route's next hop against the kind of resource it references
///
/// # Rules
/// - `gateway_id` must reference an internet gateway
/// - `nat_gateway_id` must reference a NAT gateway
/// - Literal next hops are accepted as-is
pub fn validate_route_target(
    route_table: &str,
    route: &Route,
    referenced_kind: Option<ResourceKind>,
) -> ValidationResult {
    let expected = match route.target {
        RouteTarget::GatewayId(_) => ResourceKind::InternetGateway,
        RouteTarget::NatGatewayId(_) => ResourceKind::NatGateway,
    };

    match referenced_kind {
        Some(actual) if actual != expected => Err(ValidationError::RouteTargetMismatch {
            route_table: route_table.to_string(),
            expected,
            actual: actual.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Validate a route table sends its default route through `expected`
pub fn validate_default_route(
    route_table: &str,
    routes: &[Route],
    expected: ResourceKind,
) -> ValidationResult {
    let route = routes
        .iter()
        .find(|route| route.cidr_block == CidrBlock::ANY_V4)
        .ok_or_else(|| ValidationError::MissingDefaultRoute(route_table.to_string()))?;

    let actual = match route.target {
        RouteTarget::GatewayId(_) => ResourceKind::InternetGateway,
        RouteTarget::NatGatewayId(_) => ResourceKind::NatGateway,
    };

    if actual != expected {
        return Err(ValidationError::RouteTargetMismatch {
            route_table: route_table.to_string(),
            expected,
            actual: actual.to_string(),
        });
    }
    Ok(())
}

/// Validate an access rule
///
/// # Rules
/// - At least one source/destination block
/// - The all-protocol wildcard only with the `0-0` port range
pub fn validate_security_rule(rule: &SecurityRule) -> ValidationResult {
    if rule.blocks().next().is_none() {
        return Err(ValidationError::InvalidRule(
            "rule has no CIDR blocks".to_string(),
        ));
    }

    if rule.protocol == Protocol::All && rule.ports != PortRange::ALL {
        return Err(ValidationError::InvalidRule(format!(
            "all-protocol rule must use ports 0-0, found {}",
            rule.ports
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn cidr(s: &str) -> CidrBlock {
        CidrBlock::new(s).unwrap()
    }

    #[test]
    fn test_subnet_within_network() {
        let network = cidr("10.0.0.0/16");
        assert!(validate_subnet_within_network(&network, &cidr("10.0.1.0/24")).is_ok());
        assert!(matches!(
            validate_subnet_within_network(&network, &cidr("10.1.1.0/24")),
            Err(ValidationError::CidrOutsideNetwork { .. })
        ));
    }

    #[test]
    fn test_disjoint_subnets() {
        assert!(validate_disjoint_subnets(&[cidr("10.0.1.0/24"), cidr("10.0.2.0/24")]).is_ok());
        assert!(validate_disjoint_subnets(&[
            cidr("10.0.1.0/24"),
            cidr("10.0.2.0/24"),
            cidr("10.0.0.0/22"),
        ])
        .is_err());
        assert!(validate_disjoint_subnets(&[]).is_ok());
    }

    #[test_case("ap-southeast-2a", "ap-southeast-2" => true ; "zone a")]
    #[test_case("ap-southeast-2b", "ap-southeast-2" => true ; "zone b")]
    #[test_case("us-east-1a", "ap-southeast-2" => false ; "other region")]
    #[test_case("ap-southeast-2", "ap-southeast-2" => false ; "missing letter")]
    #[test_case("ap-southeast-2ab", "ap-southeast-2" => false ; "two letters")]
    fn test_zone_in_region(zone: &str, region: &str) -> bool {
        validate_zone_in_region(zone, region).is_ok()
    }

    #[test]
    fn test_route_target_kind() {
        let route = Route::via_internet_gateway("igw-1".into());
        assert!(validate_route_target("public", &route, Some(ResourceKind::InternetGateway)).is_ok());
        assert!(validate_route_target("public", &route, None).is_ok());
        assert!(matches!(
            validate_route_target("public", &route, Some(ResourceKind::NatGateway)),
            Err(ValidationError::RouteTargetMismatch { .. })
        ));
    }

    #[test]
    fn test_default_route() {
        let public = vec![Route::via_internet_gateway("igw-1".into())];
        let private = vec![Route::via_nat_gateway("nat-1".into())];

        assert!(validate_default_route("public", &public, ResourceKind::InternetGateway).is_ok());
        assert!(validate_default_route("private", &private, ResourceKind::NatGateway).is_ok());
        assert!(validate_default_route("private", &public, ResourceKind::NatGateway).is_err());
        assert_eq!(
            validate_default_route("empty", &[], ResourceKind::NatGateway),
            Err(ValidationError::MissingDefaultRoute("empty".to_string()))
        );
    }

    #[test]
    fn test_security_rule() {
        assert!(validate_security_rule(&SecurityRule::allow_all()).is_ok());
        assert!(validate_security_rule(&SecurityRule::tcp(443, vec![CidrBlock::ANY_V4])).is_ok());
        assert!(validate_security_rule(&SecurityRule::tcp(443, vec![])).is_err());

        let mut wide = SecurityRule::allow_all();
        wide.ports = PortRange::single(22);
        assert!(validate_security_rule(&wide).is_err());
    }
}
