// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource declaration graphs for cloud network and compute stacks
//!
//! A stack is a static, acyclic set of named declarations. Each declaration
//! carries a literal configuration payload and may reference identifiers
//! produced by earlier declarations. The graph is validated before any
//! provider call, then resolved level by level against a [`Provider`].
//!
//! ```rust,no_run
//! use cim_stack_graph::{build_stack, Engine, InMemoryProvider, StackConfig};
//!
//! # async fn run() -> Result<(), cim_stack_graph::StackError> {
//! let graph = build_stack(&StackConfig::minimal())?;
//! let evaluation = Engine::new(InMemoryProvider::default()).evaluate(&graph).await?;
//! println!("{:?}", evaluation.outputs.get("vpc_id"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod graph;
pub mod provider;
pub mod resources;
pub mod stack;

// Re-export commonly used types
pub use config::{StackConfig, StackVariant};
pub use domain::{CidrBlock, LogicalName, PortRange, Protocol, ResourceKind};
pub use engine::{Engine, Evaluation, StackOutputs};
pub use errors::{StackError, StackResult};
pub use graph::{DeclareOptions, EdgeKind, ResourceHandle, StackBuilder, StackGraph};
pub use provider::{InMemoryProvider, MachineImage, Provider, ProviderError};
pub use resources::{Input, OutputRef};
pub use stack::{build_stack, expected_exports};
