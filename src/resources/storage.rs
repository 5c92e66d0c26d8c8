// Copyright (c) 2025 - Cowboy AI, Inc.
//! Storage bucket record

use serde::{Deserialize, Serialize};

use super::Tags;

/// Object storage bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketArgs {
    /// Prefix for the generated bucket name; the logical name is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_prefix: Option<String>,
    #[serde(default)]
    pub force_destroy: bool,
    #[serde(default, skip_serializing_if = "Tags::is_empty")]
    pub tags: Tags,
}
