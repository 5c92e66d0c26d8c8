// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Domain Models
//!
//! Value objects and pure invariants shared by every declaration in a stack.
//!
//! # Value Objects with Invariants
//!
//! - [`LogicalName`] - Unique declaration and export names
//! - [`CidrBlock`] - IPv4/IPv6 networks with mandatory prefix
//! - [`PortRange`] - Inclusive port ranges
//! - [`Protocol`] - Access rule protocols
//! - [`ResourceKind`] - Declarable resource taxonomy and produced attributes

pub mod invariants;
pub mod logical_name;
pub mod network;
pub mod resource_type;

pub use invariants::{ValidationError, ValidationResult};
pub use logical_name::{LogicalName, NameError};
pub use network::{CidrBlock, NetworkError, PortRange, Protocol};
pub use resource_type::ResourceKind;
