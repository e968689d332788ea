// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use proptest::prelude::*;
use regforge_core::{AddressPlanner, RegisterFileModel};
use regforge_ir::{Register, RegisterFileConfig, RegisterType};
use std::collections::HashSet;

/// Registers where some carry distinct, aligned pre-assigned addresses.
fn planner_input() -> impl Strategy<Value = RegisterFileConfig> {
    (
        proptest::collection::vec(any::<bool>(), 0..12),
        proptest::collection::btree_set(0u64..64, 0..12),
        0u64..8,
    )
        .prop_map(|(fixed, slots, base)| {
            let mut cfg = RegisterFileConfig::new("rf");
            cfg.base_address = base * 4;
            let mut slots = slots.into_iter();
            for (i, pinned) in fixed.into_iter().enumerate() {
                let mut reg = Register::new(format!("R{i}"));
                if pinned {
                    reg.address = slots.next().map(|s| s * 4);
                }
                cfg.registers.push(reg);
            }
            cfg
        })
}

proptest! {
    #[test]
    fn planner_assigns_unique_aligned_addresses(cfg in planner_input()) {
        let planner = AddressPlanner::new(&cfg);
        let planned = planner.assign(&cfg).unwrap();
        let mut seen = HashSet::new();
        for (before, after) in cfg.registers.iter().zip(&planned.registers) {
            let addr = after.address.unwrap();
            prop_assert_eq!(addr % planner.alignment(), 0);
            prop_assert!(seen.insert(addr));
            match before.address {
                Some(pinned) => prop_assert_eq!(addr, pinned),
                None => prop_assert!(addr >= cfg.base_address),
            }
        }
    }

    #[test]
    fn planner_is_idempotent(cfg in planner_input()) {
        let planner = AddressPlanner::new(&cfg);
        let once = planner.assign(&cfg).unwrap();
        let twice = planner.assign(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn model_write_effects_follow_catalogue(reset in any::<u32>(), data in any::<u32>()) {
        let (reset, data) = (u128::from(reset), u128::from(data));
        let mut cfg = RegisterFileConfig::new("rf");
        cfg.registers = vec![
            Register::new("RW").at(0x0).with_reset(reset),
            Register::new("W1C").at(0x4).with_type(RegisterType::Write1Clean).with_reset(reset),
            Register::new("W1S").at(0x8).with_type(RegisterType::Write1Set).with_reset(reset),
            Register::new("W0C").at(0xC).with_type(RegisterType::Write0Clean).with_reset(reset),
            Register::new("RO").at(0x10).with_type(RegisterType::ReadOnly).with_reset(reset),
        ];
        let mut model = RegisterFileModel::new(&cfg);
        for addr in [0x0, 0x4, 0x8, 0xC, 0x10] {
            model.write(addr, data, u128::MAX);
        }
        prop_assert_eq!(model.value("RW"), Some(data));
        prop_assert_eq!(model.value("W1C"), Some(reset & !data));
        prop_assert_eq!(model.value("W1S"), Some(reset | data));
        prop_assert_eq!(model.value("W0C"), Some(reset & data));
        prop_assert_eq!(model.value("RO"), Some(reset));
        prop_assert_eq!(model.read(0x0).0, data);
    }

    #[test]
    fn read_clean_returns_value_once(reset in any::<u32>()) {
        let mut cfg = RegisterFileConfig::new("rf");
        cfg.registers = vec![Register::new("EVT")
            .at(0x0)
            .with_type(RegisterType::ReadClean)
            .with_reset(u128::from(reset))];
        let mut model = RegisterFileModel::new(&cfg);
        prop_assert_eq!(model.read(0x0).0, u128::from(reset));
        prop_assert_eq!(model.read(0x0).0, 0);
    }
}
