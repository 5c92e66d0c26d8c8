// Copyright (c) 2025 - Cowboy AI, Inc.

//! Quickstart stack
//!
//! Builds the network quickstart graph from a [`StackConfig`]. The network
//! core is always declared; each optional subgraph adds its declarations
//! and exports when its configuration section is present.
//!
//! ```text
//! main-vpc ─┬─ public-subnet-a ──┬─ nat-gateway ── private-route-table ── private-route-association
//!           ├─ private-subnet-b ─┼──────────────────────────────────────── (association, app-instance)
//!           ├─ internet-gateway ─┴─ nat-eip (depends_on) ── public-route-table ── public-route-association
//!           └─ allow-tls ──────────────────────────────────── app-instance
//! instance-assume-role-policy ── ec2-ssm-role ── ec2-instance-profile ── app-instance
//! amazon-linux-2-ami ─────────────────────────────────────────────── app-instance
//! ```

use tracing::info;

use crate::config::{ComputeConfig, GatewayConfig, IamConfig, SecurityConfig, StackConfig, StorageConfig};
use crate::domain::invariants::validate_default_route;
use crate::domain::ResourceKind;
use crate::errors::StackResult;
use crate::graph::{DeclareOptions, ResourceHandle, StackBuilder, StackGraph};
use crate::resources::{
    name_tag, AmiQuery, BucketArgs, CreditSpecification, EipArgs, InstanceArgs,
    InstanceProfileArgs, InternetGatewayArgs, NatGatewayArgs, PolicyDocumentArgs, RoleArgs,
    Route, RouteTableArgs, RouteTableAssociationArgs, SecurityGroupArgs, SecurityRule,
    SubnetArgs, VpcArgs,
};

/// Logical names of every declaration
pub mod names {
    pub const VPC: &str = "main-vpc";
    pub const PUBLIC_SUBNET: &str = "public-subnet-a";
    pub const PRIVATE_SUBNET: &str = "private-subnet-b";
    pub const INTERNET_GATEWAY: &str = "internet-gateway";
    pub const NAT_EIP: &str = "nat-eip";
    pub const NAT_GATEWAY: &str = "nat-gateway";
    pub const PUBLIC_ROUTE_TABLE: &str = "public-route-table";
    pub const PRIVATE_ROUTE_TABLE: &str = "private-route-table";
    pub const PUBLIC_ROUTE_ASSOCIATION: &str = "public-route-association";
    pub const PRIVATE_ROUTE_ASSOCIATION: &str = "private-route-association";
    pub const SECURITY_GROUP: &str = "allow-tls";
    pub const TRUST_POLICY: &str = "instance-assume-role-policy";
    pub const ROLE: &str = "ec2-ssm-role";
    pub const INSTANCE_PROFILE: &str = "ec2-instance-profile";
    pub const IMAGE: &str = "amazon-linux-2-ami";
    pub const INSTANCE: &str = "app-instance";
    pub const BUCKET: &str = "artifact-bucket";
}

/// Export names of the output contract
pub mod exports {
    pub const VPC_ID: &str = "vpc_id";
    pub const PUBLIC_SUBNET_A_ID: &str = "public_subnet_a_id";
    pub const PRIVATE_SUBNET_B_ID: &str = "private_subnet_b_id";
    pub const INTERNET_GATEWAY_ID: &str = "internet_gateway_id";
    pub const EIP_ID: &str = "eip_id";
    pub const EIP_ADDRESS: &str = "eip_address";
    pub const NAT_GATEWAY_ID: &str = "nat_gateway_id";
    pub const SECURITY_GROUP_ID: &str = "security_group_id";
    pub const ROLE_ARN: &str = "role_arn";
    pub const INSTANCE_PROFILE_NAME: &str = "instance_profile_name";
    pub const INSTANCE_ID: &str = "instance_id";
    pub const BUCKET_ID: &str = "bucket_id";
}

/// Export names `build_stack` produces for `config`, in declaration order
pub fn expected_exports(config: &StackConfig) -> Vec<&'static str> {
    let mut expected = vec![
        exports::VPC_ID,
        exports::PUBLIC_SUBNET_A_ID,
        exports::PRIVATE_SUBNET_B_ID,
    ];
    if config.gateways.is_some() {
        expected.extend([
            exports::INTERNET_GATEWAY_ID,
            exports::EIP_ID,
            exports::EIP_ADDRESS,
            exports::NAT_GATEWAY_ID,
        ]);
    }
    if config.security.is_some() {
        expected.push(exports::SECURITY_GROUP_ID);
    }
    if config.iam.is_some() {
        expected.extend([exports::ROLE_ARN, exports::INSTANCE_PROFILE_NAME]);
    }
    if config.compute.is_some() {
        expected.push(exports::INSTANCE_ID);
    }
    if config.storage.is_some() {
        expected.push(exports::BUCKET_ID);
    }
    expected
}

/// Handles of the always-present network core
struct Network {
    vpc: ResourceHandle,
    public_subnet: ResourceHandle,
    private_subnet: ResourceHandle,
}

/// Build the declaration graph for `config`
///
/// The configuration is validated first, so addressing and subgraph
/// prerequisite errors surface before anything is declared.
pub fn build_stack(config: &StackConfig) -> StackResult<StackGraph> {
    config.validate()?;

    let mut builder = StackBuilder::new();
    let network = declare_network(&mut builder, config)?;

    if let Some(gateways) = &config.gateways {
        declare_gateways(&mut builder, &network, gateways)?;
    }

    let security_group = match &config.security {
        Some(security) => Some(declare_security(&mut builder, &network, security)?),
        None => None,
    };

    let profile = match &config.iam {
        Some(iam) => Some(declare_identity(&mut builder, iam)?),
        None => None,
    };

    if let (Some(compute), Some(security_group), Some(profile)) =
        (&config.compute, &security_group, &profile)
    {
        declare_compute(&mut builder, &network, compute, security_group, profile)?;
    }

    if let Some(storage) = &config.storage {
        declare_storage(&mut builder, storage)?;
    }

    info!(
        project = %config.project,
        region = %config.region,
        declarations = builder.len(),
        "Declared stack"
    );
    builder.finish()
}

fn declare_network(builder: &mut StackBuilder, config: &StackConfig) -> StackResult<Network> {
    let network = &config.network;

    let vpc = builder.vpc(
        names::VPC,
        VpcArgs {
            cidr_block: network.cidr_block,
            enable_dns_support: network.enable_dns_support,
            enable_dns_hostnames: network.enable_dns_hostnames,
            instance_tenancy: network.instance_tenancy,
            tags: name_tag(names::VPC),
        },
    )?;

    let public_subnet = builder.subnet(
        names::PUBLIC_SUBNET,
        SubnetArgs {
            vpc_id: vpc.id(),
            availability_zone: network.public_subnet.availability_zone.clone(),
            cidr_block: network.public_subnet.cidr_block,
            map_public_ip_on_launch: false,
            tags: name_tag(names::PUBLIC_SUBNET),
        },
    )?;

    let private_subnet = builder.subnet(
        names::PRIVATE_SUBNET,
        SubnetArgs {
            vpc_id: vpc.id(),
            availability_zone: network.private_subnet.availability_zone.clone(),
            cidr_block: network.private_subnet.cidr_block,
            map_public_ip_on_launch: false,
            tags: name_tag(names::PRIVATE_SUBNET),
        },
    )?;

    builder.export(exports::VPC_ID, vpc.id())?;
    builder.export(exports::PUBLIC_SUBNET_A_ID, public_subnet.id())?;
    builder.export(exports::PRIVATE_SUBNET_B_ID, private_subnet.id())?;

    Ok(Network {
        vpc,
        public_subnet,
        private_subnet,
    })
}

fn declare_gateways(
    builder: &mut StackBuilder,
    network: &Network,
    config: &GatewayConfig,
) -> StackResult<()> {
    let internet_gateway = builder.internet_gateway(
        names::INTERNET_GATEWAY,
        InternetGatewayArgs {
            vpc_id: network.vpc.id(),
            tags: name_tag(names::INTERNET_GATEWAY),
        },
    )?;

    // The address and the NAT gateway need the VPC attached to the internet
    // before they can be created, which no reference expresses.
    let eip = builder.eip(
        names::NAT_EIP,
        EipArgs {
            domain: config.eip_scope,
            tags: name_tag(names::NAT_EIP),
        },
        DeclareOptions::depends_on([&internet_gateway]),
    )?;

    let nat_gateway = builder.nat_gateway(
        names::NAT_GATEWAY,
        NatGatewayArgs {
            allocation_id: eip.output("allocation_id"),
            subnet_id: network.public_subnet.id(),
            tags: name_tag(names::NAT_GATEWAY),
        },
        DeclareOptions::depends_on([&internet_gateway]),
    )?;

    let public_routes = vec![Route::via_internet_gateway(internet_gateway.id())];
    validate_default_route(names::PUBLIC_ROUTE_TABLE, &public_routes, ResourceKind::InternetGateway)?;
    let public_route_table = builder.route_table(
        names::PUBLIC_ROUTE_TABLE,
        RouteTableArgs {
            vpc_id: network.vpc.id(),
            routes: public_routes,
            tags: name_tag(names::PUBLIC_ROUTE_TABLE),
        },
    )?;

    let private_routes = vec![Route::via_nat_gateway(nat_gateway.id())];
    validate_default_route(names::PRIVATE_ROUTE_TABLE, &private_routes, ResourceKind::NatGateway)?;
    let private_route_table = builder.route_table(
        names::PRIVATE_ROUTE_TABLE,
        RouteTableArgs {
            vpc_id: network.vpc.id(),
            routes: private_routes,
            tags: name_tag(names::PRIVATE_ROUTE_TABLE),
        },
    )?;

    builder.route_table_association(
        names::PUBLIC_ROUTE_ASSOCIATION,
        RouteTableAssociationArgs {
            subnet_id: network.public_subnet.id(),
            route_table_id: public_route_table.id(),
        },
    )?;
    builder.route_table_association(
        names::PRIVATE_ROUTE_ASSOCIATION,
        RouteTableAssociationArgs {
            subnet_id: network.private_subnet.id(),
            route_table_id: private_route_table.id(),
        },
    )?;

    builder.export(exports::INTERNET_GATEWAY_ID, internet_gateway.id())?;
    builder.export(exports::EIP_ID, eip.id())?;
    builder.export(exports::EIP_ADDRESS, eip.output::<String>("public_ip"))?;
    builder.export(exports::NAT_GATEWAY_ID, nat_gateway.id())?;
    Ok(())
}

fn declare_security(
    builder: &mut StackBuilder,
    network: &Network,
    config: &SecurityConfig,
) -> StackResult<ResourceHandle> {
    let security_group = builder.security_group(
        names::SECURITY_GROUP,
        SecurityGroupArgs {
            description: config.description.clone(),
            vpc_id: network.vpc.id(),
            ingress: vec![SecurityRule::tcp(config.tls_port, config.ingress_sources.clone())
                .with_description("TLS from public")],
            egress: vec![SecurityRule::allow_all()],
            tags: name_tag("allow_tls"),
        },
    )?;

    builder.export(exports::SECURITY_GROUP_ID, security_group.id())?;
    Ok(security_group)
}

/// Declares trust policy, role and profile; returns the profile
fn declare_identity(builder: &mut StackBuilder, config: &IamConfig) -> StackResult<ResourceHandle> {
    let trust_policy = builder.lookup_policy_document(
        names::TRUST_POLICY,
        PolicyDocumentArgs::assume_role(config.trusted_service.clone()),
    )?;

    let role = builder.iam_role(
        names::ROLE,
        RoleArgs {
            assume_role_policy: trust_policy.output("json"),
            managed_policy_arns: config.managed_policy_arns.clone(),
            tags: name_tag(names::ROLE),
        },
    )?;

    let profile = builder.instance_profile(
        names::INSTANCE_PROFILE,
        InstanceProfileArgs {
            role: role.output("name"),
        },
    )?;

    builder.export(exports::ROLE_ARN, role.arn())?;
    builder.export(exports::INSTANCE_PROFILE_NAME, profile.output::<String>("name"))?;
    Ok(profile)
}

fn declare_compute(
    builder: &mut StackBuilder,
    network: &Network,
    config: &ComputeConfig,
    security_group: &ResourceHandle,
    profile: &ResourceHandle,
) -> StackResult<()> {
    let image = builder.lookup_ami(
        names::IMAGE,
        AmiQuery::latest(config.ami_owner.clone(), config.ami_name_pattern.clone()),
    )?;

    let instance = builder.instance(
        names::INSTANCE,
        InstanceArgs {
            ami: image.id(),
            instance_type: config.instance_type.clone(),
            iam_instance_profile: profile.output("name"),
            subnet_id: network.private_subnet.id(),
            vpc_security_group_ids: vec![security_group.id()],
            credit_specification: Some(CreditSpecification {
                cpu_credits: config.cpu_credits,
            }),
            tags: name_tag(names::INSTANCE),
        },
    )?;

    builder.export(exports::INSTANCE_ID, instance.id())?;
    Ok(())
}

fn declare_storage(builder: &mut StackBuilder, config: &StorageConfig) -> StackResult<()> {
    let bucket = builder.bucket(
        names::BUCKET,
        BucketArgs {
            bucket_prefix: config.bucket_prefix.clone(),
            force_destroy: config.force_destroy,
            tags: name_tag(names::BUCKET),
        },
    )?;

    builder.export(exports::BUCKET_ID, bucket.id())?;
    Ok(())
}
