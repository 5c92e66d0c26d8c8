// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Declaration Graph
//!
//! Declarations become nodes of a directed acyclic graph whose edges run from
//! a prerequisite to the declaration that needs it. Two edge kinds exist:
//!
//! - [`EdgeKind::Reference`] - the dependent reads an attribute of the prerequisite
//! - [`EdgeKind::Ordering`] - an explicit "must follow" hint with no data flow
//!
//! The graph is validated for acyclicity when it is built, so nothing that
//! consumes a [`StackGraph`] ever sees a cycle.

pub mod builder;
pub mod dag;
pub mod record;

pub use builder::{DeclareOptions, ResourceHandle, StackBuilder};
pub use dag::{EdgeKind, StackGraph};
pub use record::{DeclarationRecord, DeclarationRole, ExportRecord, ReferenceRecord};
