// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stack Builder
//!
//! Registers declarations in program order. Every reference a declaration
//! carries must name a declaration registered earlier and an attribute that
//! declaration's kind produces; anything else is rejected at registration
//! time, before a graph exists and long before any provider call. Handles
//! are bound to the builder that minted them.
//!
//! ```text
//! declare(vpc) ──> handle.id() ──> declare(subnet { vpc_id }) ──> ... ──> finish()
//!                                                                          │
//!                                                                  StackGraph (DAG)
//! ```

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::record::{DeclarationRecord, ExportRecord};
use super::StackGraph;
use crate::domain::invariants::{validate_route_target, validate_security_rule};
use crate::domain::{LogicalName, ResourceKind};
use crate::errors::{StackError, StackResult};
use crate::resources::{
    as_output_ref, detach_output_refs, AmiQuery, BucketArgs, EipArgs, Input, InstanceArgs, InstanceProfileArgs,
    InternetGatewayArgs, NatGatewayArgs, OutputRef, PolicyDocumentArgs, RoleArgs,
    RouteTableArgs, RouteTableAssociationArgs, SecurityGroupArgs, SubnetArgs, VpcArgs,
};

/// Handle to a registered declaration
///
/// Exposes the declaration's eventual attributes as deferred inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceHandle {
    stack: Uuid,
    name: LogicalName,
    kind: ResourceKind,
}

impl ResourceHandle {
    pub fn name(&self) -> &LogicalName {
        &self.name
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Deferred input for `attribute` of this declaration
    ///
    /// The attribute is checked against the kind when the input is used in a
    /// later declaration or export.
    pub fn output<T>(&self, attribute: &str) -> Input<T> {
        Input::output(OutputRef::new(self.name.clone(), attribute).minted_by(self.stack))
    }

    /// Deferred input for `attribute`, checked against the kind now
    pub fn attr<T>(&self, attribute: &str) -> StackResult<Input<T>> {
        if !self.kind.has_attribute(attribute) {
            return Err(StackError::UnknownAttribute {
                resource: self.name.to_string(),
                kind: self.kind.to_string(),
                attribute: attribute.to_string(),
            });
        }
        Ok(self.output(attribute))
    }

    /// Deferred provider identifier
    pub fn id(&self) -> Input<String> {
        self.output("id")
    }

    /// Deferred ARN
    pub fn arn(&self) -> Input<String> {
        self.output("arn")
    }
}

/// Options for a single declaration
#[derive(Debug, Clone, Default)]
pub struct DeclareOptions {
    /// Declarations that must be provisioned first even without a reference
    pub depends_on: Vec<ResourceHandle>,
}

impl DeclareOptions {
    pub fn depends_on<'a>(handles: impl IntoIterator<Item = &'a ResourceHandle>) -> Self {
        Self {
            depends_on: handles.into_iter().cloned().collect(),
        }
    }
}

/// Builder registering declarations in program order
#[derive(Debug)]
pub struct StackBuilder {
    stack: Uuid,
    records: Vec<DeclarationRecord>,
    names: HashMap<LogicalName, usize>,
    exports: Vec<ExportRecord>,
}

impl Default for StackBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StackBuilder {
    pub fn new() -> Self {
        Self {
            stack: Uuid::now_v7(),
            records: Vec::new(),
            names: HashMap::new(),
            exports: Vec::new(),
        }
    }

    /// Register one declaration
    ///
    /// `config` is reduced to JSON; every deferred input inside it becomes a
    /// reference edge. Returns a handle exposing the declaration's attributes.
    pub fn declare<C: Serialize>(
        &mut self,
        kind: ResourceKind,
        name: &str,
        config: &C,
        options: DeclareOptions,
    ) -> StackResult<ResourceHandle> {
        if kind.is_lookup() {
            return Err(StackError::Configuration(format!(
                "{} is a lookup; register it with lookup()",
                kind
            )));
        }
        self.register(kind, name, config, options, true)
    }

    /// Register a query against the provider
    pub fn lookup<Q: Serialize>(
        &mut self,
        kind: ResourceKind,
        name: &str,
        query: &Q,
        deterministic: bool,
    ) -> StackResult<ResourceHandle> {
        if !kind.is_lookup() {
            return Err(StackError::Configuration(format!(
                "{} is not a lookup; register it with declare()",
                kind
            )));
        }
        self.register(kind, name, query, DeclareOptions::default(), deterministic)
    }

    fn register<C: Serialize>(
        &mut self,
        kind: ResourceKind,
        name: &str,
        config: &C,
        options: DeclareOptions,
        deterministic: bool,
    ) -> StackResult<ResourceHandle> {
        let name = LogicalName::new(name)?;
        if self.names.contains_key(&name) {
            return Err(StackError::DuplicateName(name.to_string()));
        }

        let mut depends_on = Vec::with_capacity(options.depends_on.len());
        for handle in &options.depends_on {
            self.check_handle(handle)?;
            if !depends_on.contains(&handle.name) {
                depends_on.push(handle.name.clone());
            }
        }

        let mut properties = serde_json::to_value(config)?;
        for found in detach_output_refs(&mut properties) {
            self.check_origin(&found.reference)?;
        }
        let record = DeclarationRecord::new(
            self.records.len(),
            name.clone(),
            kind,
            properties,
            depends_on,
            deterministic,
        );

        for reference in &record.references {
            self.check_reference(&name, &reference.resource, &reference.attribute)?;
        }

        debug!(
            resource = %name,
            kind = %kind,
            references = record.references.len(),
            depends_on = record.depends_on.len(),
            "Registered declaration"
        );

        self.names.insert(name.clone(), record.index);
        self.records.push(record);

        Ok(ResourceHandle {
            stack: self.stack,
            name,
            kind,
        })
    }

    fn check_handle(&self, handle: &ResourceHandle) -> StackResult<()> {
        if handle.stack != self.stack {
            return Err(StackError::ForeignHandle(handle.name.to_string()));
        }
        Ok(())
    }

    fn check_origin(&self, reference: &OutputRef) -> StackResult<()> {
        match reference.stack {
            Some(stack) if stack != self.stack => {
                Err(StackError::ForeignHandle(reference.resource.to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_reference(
        &self,
        from: &LogicalName,
        target: &LogicalName,
        attribute: &str,
    ) -> StackResult<()> {
        let kind = self
            .kind_of(target)
            .ok_or_else(|| StackError::UnresolvedReference {
                from: from.to_string(),
                target: target.to_string(),
            })?;

        if !kind.has_attribute(attribute) {
            return Err(StackError::UnknownAttribute {
                resource: target.to_string(),
                kind: kind.to_string(),
                attribute: attribute.to_string(),
            });
        }
        Ok(())
    }

    /// Kind of a registered declaration
    pub fn kind_of(&self, name: &LogicalName) -> Option<ResourceKind> {
        self.names.get(name).map(|&index| self.records[index].kind)
    }

    /// Number of registered declarations
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Add a value to the output contract
    pub fn export<T: Serialize>(&mut self, name: &str, value: Input<T>) -> StackResult<()> {
        let name = LogicalName::new(name)?;
        if self.exports.iter().any(|export| export.name == name) {
            return Err(StackError::DuplicateExport(name.to_string()));
        }

        let mut value = serde_json::to_value(&value)?;
        for found in detach_output_refs(&mut value) {
            self.check_origin(&found.reference)?;
            self.check_reference(&name, &found.reference.resource, &found.reference.attribute)?;
        }
        let value = match as_output_ref(&value) {
            Some(reference) => Input::output(reference),
            None => Input::Value(value),
        };

        self.exports.push(ExportRecord { name, value });
        Ok(())
    }

    /// Validate the registered declarations and produce the graph
    pub fn finish(self) -> StackResult<StackGraph> {
        info!(
            declarations = self.records.len(),
            exports = self.exports.len(),
            "Finishing stack graph"
        );
        StackGraph::from_records(self.records, self.exports)
    }

    // ========================================================================
    // Typed declarations
    // ========================================================================

    pub fn vpc(&mut self, name: &str, args: VpcArgs) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::Vpc, name, &args, DeclareOptions::default())
    }

    pub fn subnet(&mut self, name: &str, args: SubnetArgs) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::Subnet, name, &args, DeclareOptions::default())
    }

    pub fn internet_gateway(
        &mut self,
        name: &str,
        args: InternetGatewayArgs,
    ) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::InternetGateway, name, &args, DeclareOptions::default())
    }

    pub fn eip(
        &mut self,
        name: &str,
        args: EipArgs,
        options: DeclareOptions,
    ) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::Eip, name, &args, options)
    }

    pub fn nat_gateway(
        &mut self,
        name: &str,
        args: NatGatewayArgs,
        options: DeclareOptions,
    ) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::NatGateway, name, &args, options)
    }

    /// Declare a route table after checking each route's next hop kind
    pub fn route_table(&mut self, name: &str, args: RouteTableArgs) -> StackResult<ResourceHandle> {
        for route in &args.routes {
            let referenced = route
                .target
                .input()
                .reference()
                .and_then(|reference| self.kind_of(&reference.resource));
            validate_route_target(name, route, referenced)?;
        }
        self.declare(ResourceKind::RouteTable, name, &args, DeclareOptions::default())
    }

    pub fn route_table_association(
        &mut self,
        name: &str,
        args: RouteTableAssociationArgs,
    ) -> StackResult<ResourceHandle> {
        self.declare(
            ResourceKind::RouteTableAssociation,
            name,
            &args,
            DeclareOptions::default(),
        )
    }

    /// Declare a security group after validating each rule
    pub fn security_group(
        &mut self,
        name: &str,
        args: SecurityGroupArgs,
    ) -> StackResult<ResourceHandle> {
        for rule in args.ingress.iter().chain(args.egress.iter()) {
            validate_security_rule(rule)?;
        }
        self.declare(ResourceKind::SecurityGroup, name, &args, DeclareOptions::default())
    }

    pub fn iam_role(&mut self, name: &str, args: RoleArgs) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::IamRole, name, &args, DeclareOptions::default())
    }

    pub fn instance_profile(
        &mut self,
        name: &str,
        args: InstanceProfileArgs,
    ) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::InstanceProfile, name, &args, DeclareOptions::default())
    }

    pub fn instance(&mut self, name: &str, args: InstanceArgs) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::Instance, name, &args, DeclareOptions::default())
    }

    pub fn bucket(&mut self, name: &str, args: BucketArgs) -> StackResult<ResourceHandle> {
        self.declare(ResourceKind::Bucket, name, &args, DeclareOptions::default())
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Query for a machine image; non-deterministic when `most_recent` is set
    pub fn lookup_ami(&mut self, name: &str, query: AmiQuery) -> StackResult<ResourceHandle> {
        let deterministic = !query.most_recent;
        self.lookup(ResourceKind::AmiLookup, name, &query, deterministic)
    }

    /// Query for a rendered policy document
    pub fn lookup_policy_document(
        &mut self,
        name: &str,
        args: PolicyDocumentArgs,
    ) -> StackResult<ResourceHandle> {
        self.lookup(ResourceKind::PolicyDocumentLookup, name, &args, true)
    }
}
