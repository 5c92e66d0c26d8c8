// Copyright (c) 2025 - Cowboy AI, Inc.

//! In-memory provider
//!
//! Produces deterministic platform state without leaving the process:
//! identifiers derive from UUID v5 of `kind/name`, so the same declaration
//! always resolves to the same identifier. Image lookups answer from a
//! catalog seeded with [`InMemoryProvider::with_image`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use super::{
    LookupRequest, Provider, ProviderError, ProviderResult, RegisterRequest, ResourceState,
};
use crate::domain::{CidrBlock, ResourceKind};
use crate::resources::{collect_output_refs, render_policy_document, AmiQuery, PolicyDocumentArgs};

/// Account used in generated ARNs
pub const DEFAULT_ACCOUNT: &str = "123456789012";

/// Region used when none is given
pub const DEFAULT_REGION: &str = "ap-southeast-2";

/// Offset of an instance's private address within its subnet
const INSTANCE_HOST_OFFSET: u32 = 4;

/// Machine image in the provider's catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub creation_date: DateTime<Utc>,
}

impl MachineImage {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        owner: impl Into<String>,
        creation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
            creation_date,
        }
    }
}

/// A request the provider has received
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum ProviderRequest {
    Register(RegisterRequest),
    Lookup(LookupRequest),
}

impl ProviderRequest {
    pub fn name(&self) -> &str {
        match self {
            Self::Register(request) => request.name.as_str(),
            Self::Lookup(request) => request.name.as_str(),
        }
    }
}

/// Deterministic provider backed by process memory
#[derive(Debug)]
pub struct InMemoryProvider {
    region: String,
    account: String,
    images: Vec<MachineImage>,
    failures: HashSet<String>,
    subnets: RwLock<HashMap<String, CidrBlock>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl InMemoryProvider {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account: DEFAULT_ACCOUNT.to_string(),
            images: Vec::new(),
            failures: HashSet::new(),
            subnets: RwLock::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Account embedded in generated ARNs
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    /// Add an image to the lookup catalog
    pub fn with_image(mut self, image: MachineImage) -> Self {
        self.images.push(image);
        self
    }

    /// Reject every request for the named declaration
    pub fn fail_on(mut self, name: impl Into<String>) -> Self {
        self.failures.insert(name.into());
        self
    }

    /// Requests received so far, in arrival order
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    fn check_failure(&self, name: &str) -> ProviderResult<()> {
        if self.failures.contains(name) {
            return Err(ProviderError::Rejected(format!("injected failure for {}", name)));
        }
        Ok(())
    }

    fn arn(&self, service: &str, resource: &str) -> String {
        match service {
            "iam" => format!("arn:aws:iam::{}:{}", self.account, resource),
            "s3" => format!("arn:aws:s3:::{}", resource),
            _ => format!("arn:aws:{}:{}:{}:{}", service, self.region, self.account, resource),
        }
    }

    async fn register_state(&self, request: &RegisterRequest) -> ProviderResult<ResourceState> {
        let seed = seed(request.kind, request.name.as_str());
        let id = identifier(request.kind, &seed);

        let state = match request.kind {
            ResourceKind::Vpc => {
                let cidr = string_field(&request.properties, "/cidr_block")?;
                ResourceState::new(&id)
                    .with_output("arn", self.arn("ec2", &format!("vpc/{}", id)))
                    .with_output("cidr_block", cidr)
            }
            ResourceKind::Subnet => {
                let cidr = string_field(&request.properties, "/cidr_block")?;
                let block = CidrBlock::new(&cidr)
                    .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;
                let zone = string_field(&request.properties, "/availability_zone")?;
                self.subnets.write().await.insert(id.clone(), block);
                ResourceState::new(&id)
                    .with_output("arn", self.arn("ec2", &format!("subnet/{}", id)))
                    .with_output("availability_zone", zone)
            }
            ResourceKind::InternetGateway => ResourceState::new(&id)
                .with_output("arn", self.arn("ec2", &format!("internet-gateway/{}", id))),
            ResourceKind::Eip => {
                let host = 1 + seed.as_bytes()[0] % 254;
                ResourceState::new(&id)
                    .with_output("allocation_id", id.clone())
                    .with_output("public_ip", Ipv4Addr::new(203, 0, 113, host).to_string())
            }
            ResourceKind::NatGateway | ResourceKind::RouteTableAssociation => {
                ResourceState::new(&id)
            }
            ResourceKind::RouteTable => ResourceState::new(&id)
                .with_output("arn", self.arn("ec2", &format!("route-table/{}", id))),
            ResourceKind::SecurityGroup => ResourceState::new(&id)
                .with_output("arn", self.arn("ec2", &format!("security-group/{}", id))),
            ResourceKind::IamRole => {
                let name = generated_name(request.name.as_str(), &seed);
                ResourceState::new(&name)
                    .with_output("arn", self.arn("iam", &format!("role/{}", name)))
                    .with_output("name", name)
            }
            ResourceKind::InstanceProfile => {
                let name = generated_name(request.name.as_str(), &seed);
                ResourceState::new(&name)
                    .with_output("arn", self.arn("iam", &format!("instance-profile/{}", name)))
                    .with_output("name", name)
            }
            ResourceKind::Instance => {
                let subnet_id = string_field(&request.properties, "/subnet_id")?;
                let private_ip = self.private_ip(&subnet_id).await?;
                ResourceState::new(&id)
                    .with_output("arn", self.arn("ec2", &format!("instance/{}", id)))
                    .with_output("private_ip", private_ip.to_string())
            }
            ResourceKind::Bucket => {
                let prefix = request
                    .properties
                    .pointer("/bucket_prefix")
                    .and_then(Value::as_str)
                    .unwrap_or(request.name.as_str());
                let bucket = generated_name(prefix, &seed).to_lowercase();
                ResourceState::new(&bucket)
                    .with_output("arn", self.arn("s3", &bucket))
                    .with_output("bucket", bucket)
            }
            ResourceKind::AmiLookup | ResourceKind::PolicyDocumentLookup => {
                return Err(ProviderError::Unsupported(request.kind));
            }
        };

        Ok(state)
    }

    async fn private_ip(&self, subnet_id: &str) -> ProviderResult<Ipv4Addr> {
        let subnets = self.subnets.read().await;
        let block = subnets.get(subnet_id).ok_or_else(|| {
            ProviderError::InvalidRequest(format!("unknown subnet {}", subnet_id))
        })?;

        match block.address() {
            IpAddr::V4(network) => {
                // The last address of the block is reserved for broadcast
                let size = 1u64 << (32 - u32::from(block.prefix_length().min(32)));
                if u64::from(INSTANCE_HOST_OFFSET) >= size.saturating_sub(1) {
                    return Err(ProviderError::InvalidRequest(format!(
                        "subnet {} ({}) has no room for an instance address",
                        subnet_id, block
                    )));
                }
                Ok(Ipv4Addr::from(u32::from(network) + INSTANCE_HOST_OFFSET))
            }
            IpAddr::V6(_) => Err(ProviderError::InvalidRequest(format!(
                "subnet {} has no IPv4 range",
                subnet_id
            ))),
        }
    }

    fn find_image(&self, query: &AmiQuery) -> ProviderResult<&MachineImage> {
        let mut patterns = Vec::new();
        for filter in &query.filters {
            if filter.name != "name" {
                return Err(ProviderError::InvalidRequest(format!(
                    "unsupported image filter {}",
                    filter.name
                )));
            }
            let compiled = filter
                .values
                .iter()
                .map(|value| Pattern::new(value))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;
            patterns.push(compiled);
        }

        let matches: Vec<&MachineImage> = self
            .images
            .iter()
            .filter(|image| query.owners.is_empty() || query.owners.contains(&image.owner))
            .filter(|image| {
                patterns
                    .iter()
                    .all(|values| values.iter().any(|pattern| pattern.matches(&image.name)))
            })
            .collect();

        let describe = || query.name_patterns().collect::<Vec<_>>().join(", ");
        match matches.as_slice() {
            [] => Err(ProviderError::NotFound(format!("no image matches {}", describe()))),
            [single] => Ok(*single),
            many if query.most_recent => many
                .iter()
                .copied()
                .max_by_key(|image| image.creation_date)
                .ok_or_else(|| ProviderError::NotFound(describe())),
            many => Err(ProviderError::Rejected(format!(
                "{} images match {}; set most_recent to choose one",
                many.len(),
                describe()
            ))),
        }
    }

    fn lookup_state(&self, request: &LookupRequest) -> ProviderResult<ResourceState> {
        match request.kind {
            ResourceKind::AmiLookup => {
                let query: AmiQuery = serde_json::from_value(request.query.clone())
                    .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;
                let image = self.find_image(&query)?;
                Ok(ResourceState::new(&image.id)
                    .with_output("name", image.name.clone())
                    .with_output("creation_date", image.creation_date.to_rfc3339()))
            }
            ResourceKind::PolicyDocumentLookup => {
                let args: PolicyDocumentArgs = serde_json::from_value(request.query.clone())
                    .map_err(|e| ProviderError::InvalidRequest(e.to_string()))?;
                let json = render_policy_document(&args);
                let digest = Uuid::new_v5(&Uuid::NAMESPACE_OID, json.as_bytes());
                Ok(ResourceState::new(format!("policy-{}", &digest.simple().to_string()[..17]))
                    .with_output("json", json))
            }
            kind => Err(ProviderError::Unsupported(kind)),
        }
    }
}

#[async_trait]
impl Provider for InMemoryProvider {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn register(&self, request: RegisterRequest) -> ProviderResult<ResourceState> {
        self.requests
            .lock()
            .await
            .push(ProviderRequest::Register(request.clone()));

        self.check_failure(request.name.as_str())?;
        reject_markers(&request.properties)?;

        let state = self.register_state(&request).await?;
        debug!(
            resource = %request.name,
            kind = %request.kind,
            id = %state.id,
            "Registered resource"
        );
        Ok(state)
    }

    async fn lookup(&self, request: LookupRequest) -> ProviderResult<ResourceState> {
        self.requests
            .lock()
            .await
            .push(ProviderRequest::Lookup(request.clone()));

        self.check_failure(request.name.as_str())?;
        reject_markers(&request.query)?;

        let state = self.lookup_state(&request)?;
        debug!(
            resource = %request.name,
            kind = %request.kind,
            id = %state.id,
            "Answered lookup"
        );
        Ok(state)
    }
}

fn seed(kind: ResourceKind, name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("{}/{}", kind, name).as_bytes())
}

/// Platform-style identifier, e.g. `vpc-0a1b2c3d4e5f67890`
fn identifier(kind: ResourceKind, seed: &Uuid) -> String {
    format!("{}-{}", kind.id_prefix(), &seed.simple().to_string()[..17])
}

/// Name with a short generated suffix, e.g. `ec2-ssm-role-1a2b3c4`
fn generated_name(base: &str, seed: &Uuid) -> String {
    format!("{}-{}", base, &seed.simple().to_string()[..7])
}

fn string_field(value: &Value, pointer: &str) -> ProviderResult<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ProviderError::InvalidRequest(format!("missing field {}", pointer)))
}

fn reject_markers(value: &Value) -> ProviderResult<()> {
    match collect_output_refs(value).first() {
        Some(found) => Err(ProviderError::InvalidRequest(format!(
            "unresolved reference {} at {}",
            found.reference, found.path
        ))),
        None => Ok(()),
    }
}
