// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-stack-graph
//!
//! Provides deterministic image catalogs and providers for stack tests.
//! All timestamps are fixed constants so lookups are reproducible.
//!
//! # Design Principles
//! - No `Utc::now()`: image creation dates are fixed
//! - Fixtures are the only place that seeds provider catalogs

#![allow(dead_code)]

use chrono::{DateTime, Utc};

use cim_stack_graph::{InMemoryProvider, MachineImage};

pub const OLDER_IMAGE_ID: &str = "ami-0000000000000a001";
pub const NEWEST_IMAGE_ID: &str = "ami-0000000000000a002";
pub const ARM_IMAGE_ID: &str = "ami-0000000000000a003";
pub const OTHER_OWNER_IMAGE_ID: &str = "ami-0000000000000a004";

// Fixed creation dates
pub const OLDER_IMAGE_DATE: &str = "2025-11-02T08:00:00Z";
pub const NEWEST_IMAGE_DATE: &str = "2026-01-19T12:00:00Z";
pub const ARM_IMAGE_DATE: &str = "2026-02-01T12:00:00Z";

/// Parse a fixed timestamp
pub fn timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Image catalog: two matching x86_64 images, one arm64 image newer than
/// both, and a matching name from another owner
pub fn image_catalog() -> Vec<MachineImage> {
    vec![
        MachineImage::new(
            OLDER_IMAGE_ID,
            "amzn2-ami-hvm-2.0.20251102.0-x86_64-ebs",
            "amazon",
            timestamp(OLDER_IMAGE_DATE),
        ),
        MachineImage::new(
            NEWEST_IMAGE_ID,
            "amzn2-ami-hvm-2.0.20260119.1-x86_64-ebs",
            "amazon",
            timestamp(NEWEST_IMAGE_DATE),
        ),
        MachineImage::new(
            ARM_IMAGE_ID,
            "amzn2-ami-hvm-2.0.20260201.0-arm64-gp2",
            "amazon",
            timestamp(ARM_IMAGE_DATE),
        ),
        MachineImage::new(
            OTHER_OWNER_IMAGE_ID,
            "amzn2-ami-hvm-2.0.20260301.0-x86_64-ebs",
            "123456789012",
            timestamp("2026-03-01T00:00:00Z"),
        ),
    ]
}

/// In-memory provider seeded with [`image_catalog`]
pub fn seeded_provider() -> InMemoryProvider {
    image_catalog()
        .into_iter()
        .fold(InMemoryProvider::default(), |provider, image| {
            provider.with_image(image)
        })
}
