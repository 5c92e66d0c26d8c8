// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Address Blocks

use cim_stack_graph::domain::invariants::validate_disjoint_subnets;
use cim_stack_graph::CidrBlock;
use proptest::prelude::*;

fn ipv4_block() -> impl Strategy<Value = CidrBlock> {
    (any::<[u8; 4]>(), 0u8..=32).prop_map(|(octets, prefix)| CidrBlock::ipv4(octets, prefix))
}

proptest! {
    #[test]
    fn prop_display_parses_back(block in ipv4_block()) {
        let parsed = CidrBlock::new(block.to_string()).unwrap();
        prop_assert_eq!(parsed, block);
    }

    #[test]
    fn prop_block_contains_itself(block in ipv4_block()) {
        prop_assert!(block.contains(&block));
        prop_assert!(block.overlaps(&block));
    }

    #[test]
    fn prop_longer_prefix_is_contained(octets in any::<[u8; 4]>(), prefix in 0u8..32, extra in 1u8..=8) {
        let outer = CidrBlock::ipv4(octets, prefix);
        let inner = CidrBlock::ipv4(octets, (prefix + extra).min(32));

        prop_assert!(outer.contains(&inner));
        prop_assert!(outer.overlaps(&inner));
        prop_assert!(inner.overlaps(&outer));
        if inner.prefix_length() > outer.prefix_length() {
            prop_assert!(!inner.contains(&outer));
        }
    }

    #[test]
    fn prop_overlap_is_symmetric(a in ipv4_block(), b in ipv4_block()) {
        prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        // Two blocks either nest or are disjoint
        prop_assert_eq!(a.overlaps(&b), a.contains(&b) || b.contains(&a));
    }

    #[test]
    fn prop_sibling_subnets_are_disjoint(third in 0u8..=254) {
        let first = CidrBlock::ipv4([10, 0, third, 0], 24);
        let second = CidrBlock::ipv4([10, 0, third + 1, 0], 24);
        prop_assert!(validate_disjoint_subnets(&[first, second]).is_ok());
        prop_assert!(validate_disjoint_subnets(&[first, first]).is_err());
    }
}
