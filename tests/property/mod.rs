// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! - `graph_properties`: ordering and cycle detection over random DAGs
//! - `network_properties`: CIDR containment and overlap laws

mod graph_properties;
mod network_properties;
