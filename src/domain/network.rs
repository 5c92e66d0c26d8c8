// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Value Objects with Validation Invariants

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use thiserror::Error;

/// Network validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Invalid IP address format: {0}")]
    InvalidIpAddress(String),

    #[error("Invalid CIDR notation: {0}")]
    InvalidCidr(String),

    #[error("Invalid prefix length: {0} (must be 0-32 for IPv4, 0-128 for IPv6)")]
    InvalidPrefixLength(u8),

    #[error("CIDR block has host bits set: {0}")]
    HostBitsSet(String),

    #[error("Invalid port range: {from}-{to}")]
    InvalidPortRange { from: u16, to: u16 },

    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),
}

/// CIDR block value object
///
/// Represents an IPv4 or IPv6 network with a mandatory prefix length.
/// Invariants:
/// - Valid IP address format
/// - Prefix length within valid range for the address family
/// - No host bits set (the address is the network address)
///
/// # Examples
///
/// ```rust
/// use cim_stack_graph::domain::CidrBlock;
///
/// let vpc = CidrBlock::new("10.0.0.0/16").unwrap();
/// let subnet = CidrBlock::new("10.0.1.0/24").unwrap();
/// assert!(vpc.contains(&subnet));
/// assert_eq!(subnet.to_string(), "10.0.1.0/24");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CidrBlock {
    address: IpAddr,
    prefix_length: u8,
}

impl CidrBlock {
    /// Every IPv4 address
    pub const ANY_V4: CidrBlock = CidrBlock {
        address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        prefix_length: 0,
    };

    /// Every IPv6 address
    pub const ANY_V6: CidrBlock = CidrBlock {
        address: IpAddr::V6(Ipv6Addr::UNSPECIFIED),
        prefix_length: 0,
    };

    /// IPv4 block from a literal address
    ///
    /// The prefix is capped at 32 and host bits beyond it are cleared, so the
    /// result always upholds the block invariants.
    pub const fn ipv4(octets: [u8; 4], prefix_length: u8) -> Self {
        let prefix_length = if prefix_length > 32 { 32 } else { prefix_length };
        let bits = ((octets[0] as u32) << 24)
            | ((octets[1] as u32) << 16)
            | ((octets[2] as u32) << 8)
            | (octets[3] as u32);
        let mask = if prefix_length == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_length as u32)
        };
        let network = bits & mask;
        Self {
            address: IpAddr::V4(Ipv4Addr::new(
                (network >> 24) as u8,
                (network >> 16) as u8,
                (network >> 8) as u8,
                network as u8,
            )),
            prefix_length,
        }
    }

    /// Parse a CIDR block such as `10.0.0.0/16`
    ///
    /// # Invariants
    /// - Prefix is required
    /// - Prefix 0-32 for IPv4, 0-128 for IPv6
    /// - Host bits must be zero
    pub fn new(cidr: impl AsRef<str>) -> Result<Self, NetworkError> {
        let cidr = cidr.as_ref();

        let (addr_str, prefix_str) = cidr
            .split_once('/')
            .ok_or_else(|| NetworkError::InvalidCidr(cidr.to_string()))?;

        let address = IpAddr::from_str(addr_str)
            .map_err(|_| NetworkError::InvalidIpAddress(addr_str.to_string()))?;

        let prefix_length = prefix_str
            .parse::<u8>()
            .map_err(|_| NetworkError::InvalidCidr(cidr.to_string()))?;

        Self::from_parts(address, prefix_length)
    }

    /// Create from separate address and prefix
    pub fn from_parts(address: IpAddr, prefix_length: u8) -> Result<Self, NetworkError> {
        if prefix_length > max_prefix(&address) {
            return Err(NetworkError::InvalidPrefixLength(prefix_length));
        }

        let block = Self {
            address,
            prefix_length,
        };

        // Invariant: the address must already be the network address
        if block.bits() & !block.mask() != 0 {
            return Err(NetworkError::HostBitsSet(format!(
                "{}/{}",
                address, prefix_length
            )));
        }

        Ok(block)
    }

    /// Get the network address
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Get the prefix length
    pub fn prefix_length(&self) -> u8 {
        self.prefix_length
    }

    /// Check if this is an IPv4 block
    pub fn is_ipv4(&self) -> bool {
        matches!(self.address, IpAddr::V4(_))
    }

    /// Check if this is an IPv6 block
    pub fn is_ipv6(&self) -> bool {
        matches!(self.address, IpAddr::V6(_))
    }

    /// Check if this block covers the whole address family
    pub fn is_default_route(&self) -> bool {
        self.prefix_length == 0
    }

    /// Check whether `other` lies entirely within this block
    pub fn contains(&self, other: &CidrBlock) -> bool {
        if self.is_ipv4() != other.is_ipv4() || other.prefix_length < self.prefix_length {
            return false;
        }
        other.bits() & self.mask() == self.bits()
    }

    /// Check whether the two blocks share any address
    pub fn overlaps(&self, other: &CidrBlock) -> bool {
        self.contains(other) || other.contains(self)
    }

    /// Get as CIDR notation string
    pub fn as_cidr(&self) -> String {
        format!("{}/{}", self.address, self.prefix_length)
    }

    fn bits(&self) -> u128 {
        match self.address {
            IpAddr::V4(v4) => u128::from(u32::from(v4)),
            IpAddr::V6(v6) => u128::from(v6),
        }
    }

    fn mask(&self) -> u128 {
        let width = u32::from(max_prefix(&self.address));
        let prefix = u32::from(self.prefix_length);
        if prefix == 0 {
            return 0;
        }
        let family = if width == 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        };
        (u128::MAX << (width - prefix)) & family
    }
}

fn max_prefix(address: &IpAddr) -> u8 {
    match address {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

impl fmt::Display for CidrBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_cidr())
    }
}

impl FromStr for CidrBlock {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CidrBlock {
    type Error = NetworkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CidrBlock> for String {
    fn from(block: CidrBlock) -> Self {
        block.as_cidr()
    }
}

/// Transport protocol for access rules
///
/// `All` serializes as `-1`, the provider's wildcard for every protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "tcp")]
    Tcp,
    #[serde(rename = "udp")]
    Udp,
    #[serde(rename = "icmp")]
    Icmp,
    #[serde(rename = "-1")]
    All,
}

impl Protocol {
    /// Get the canonical string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::All => "-1",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" | "6" => Ok(Self::Tcp),
            "udp" | "17" => Ok(Self::Udp),
            "icmp" | "1" => Ok(Self::Icmp),
            "-1" | "all" => Ok(Self::All),
            other => Err(NetworkError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Inclusive port range value object
///
/// Invariants:
/// - `from_port <= to_port`
/// - `0-0` paired with [`Protocol::All`] means every port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PortRangeFields")]
pub struct PortRange {
    from_port: u16,
    to_port: u16,
}

#[derive(Deserialize)]
struct PortRangeFields {
    from_port: u16,
    to_port: u16,
}

impl TryFrom<PortRangeFields> for PortRange {
    type Error = NetworkError;

    fn try_from(fields: PortRangeFields) -> Result<Self, Self::Error> {
        Self::new(fields.from_port, fields.to_port)
    }
}

impl PortRange {
    /// Wildcard range used with [`Protocol::All`]
    pub const ALL: PortRange = PortRange {
        from_port: 0,
        to_port: 0,
    };

    /// Create a new port range with validation
    pub fn new(from_port: u16, to_port: u16) -> Result<Self, NetworkError> {
        if from_port > to_port {
            return Err(NetworkError::InvalidPortRange {
                from: from_port,
                to: to_port,
            });
        }

        Ok(Self { from_port, to_port })
    }

    /// Range covering exactly one port
    pub fn single(port: u16) -> Self {
        Self {
            from_port: port,
            to_port: port,
        }
    }

    pub fn from_port(&self) -> u16 {
        self.from_port
    }

    pub fn to_port(&self) -> u16 {
        self.to_port
    }

    /// Check if the range is a single port
    pub fn is_single(&self) -> bool {
        self.from_port == self.to_port
    }

    /// Check whether `port` falls within the range
    pub fn contains(&self, port: u16) -> bool {
        (self.from_port..=self.to_port).contains(&port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.from_port)
        } else {
            write!(f, "{}-{}", self.from_port, self.to_port)
        }
    }
}
