// Copyright (c) 2025 - Cowboy AI, Inc.
//! Declarable Resource Taxonomy
//!
//! Defines every kind of entity a stack can declare or look up, together with
//! the attributes each kind produces once the provider resolves it. The
//! attribute table is what lets the builder reject a reference to an output
//! that will never exist.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a declaration in the stack graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Isolated address space (VPC)
    Vpc,
    /// Address range bound to a zone
    Subnet,
    /// Egress point for a network container
    InternetGateway,
    /// Stable external address
    Eip,
    /// Address-translating egress for a subnet
    NatGateway,
    /// Ordered destination to next-hop rules
    RouteTable,
    /// Binding of a subnet to a route table
    RouteTableAssociation,

    // Security
    /// Inbound/outbound allow rules
    SecurityGroup,

    // Identity
    /// Named permission principal
    IamRole,
    /// Runtime carrier binding a role to an instance
    InstanceProfile,

    // Compute
    /// Virtual machine
    Instance,

    // Storage
    /// Object storage bucket
    Bucket,

    // Lookups
    /// Machine image query
    AmiLookup,
    /// IAM policy document rendering
    PolicyDocumentLookup,
}

impl ResourceKind {
    /// Every kind, in taxonomy order
    pub const ALL: [ResourceKind; 14] = [
        Self::Vpc,
        Self::Subnet,
        Self::InternetGateway,
        Self::Eip,
        Self::NatGateway,
        Self::RouteTable,
        Self::RouteTableAssociation,
        Self::SecurityGroup,
        Self::IamRole,
        Self::InstanceProfile,
        Self::Instance,
        Self::Bucket,
        Self::AmiLookup,
        Self::PolicyDocumentLookup,
    ];

    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "internet_gateway",
            Self::Eip => "eip",
            Self::NatGateway => "nat_gateway",
            Self::RouteTable => "route_table",
            Self::RouteTableAssociation => "route_table_association",
            Self::SecurityGroup => "security_group",
            Self::IamRole => "iam_role",
            Self::InstanceProfile => "instance_profile",
            Self::Instance => "instance",
            Self::Bucket => "bucket",
            Self::AmiLookup => "ami_lookup",
            Self::PolicyDocumentLookup => "policy_document_lookup",
        }
    }

    /// Identifier prefix the provider uses for this kind
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::Subnet => "subnet",
            Self::InternetGateway => "igw",
            Self::Eip => "eipalloc",
            Self::NatGateway => "nat",
            Self::RouteTable => "rtb",
            Self::RouteTableAssociation => "rtbassoc",
            Self::SecurityGroup => "sg",
            Self::IamRole => "role",
            Self::InstanceProfile => "profile",
            Self::Instance => "i",
            Self::Bucket => "bucket",
            Self::AmiLookup => "ami",
            Self::PolicyDocumentLookup => "policy",
        }
    }

    /// Attributes available on a resolved entity of this kind
    pub fn attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Vpc => &["id", "arn", "cidr_block"],
            Self::Subnet => &["id", "arn", "availability_zone"],
            Self::InternetGateway => &["id", "arn"],
            Self::Eip => &["id", "allocation_id", "public_ip"],
            Self::NatGateway => &["id"],
            Self::RouteTable => &["id", "arn"],
            Self::RouteTableAssociation => &["id"],
            Self::SecurityGroup => &["id", "arn"],
            Self::IamRole => &["id", "arn", "name"],
            Self::InstanceProfile => &["id", "arn", "name"],
            Self::Instance => &["id", "arn", "private_ip"],
            Self::Bucket => &["id", "arn", "bucket"],
            Self::AmiLookup => &["id", "name", "creation_date"],
            Self::PolicyDocumentLookup => &["json"],
        }
    }

    /// Check whether this kind produces `attribute`
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes().contains(&attribute)
    }

    /// Whether this kind is a read-only query rather than a declaration
    pub fn is_lookup(&self) -> bool {
        matches!(self, Self::AmiLookup | Self::PolicyDocumentLookup)
    }

    /// Whether the kind accepts a `tags` map
    pub fn is_taggable(&self) -> bool {
        !matches!(
            self,
            Self::RouteTableAssociation
                | Self::InstanceProfile
                | Self::AmiLookup
                | Self::PolicyDocumentLookup
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
