// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Transaction-level reference model of a generated register file.
//!
//! The model executes the same [`FileLayout`] the Verilog emitter compiles, one
//! bus transaction per clock cycle. Lock and magic gates are evaluated against
//! the state before the write, pulses last until the next cycle and read side
//! effects apply after the read data has been sampled.

use crate::layout::{FileLayout, RegisterLayout};
use regforge_ir::{ErrorResponse, ReadEffect, RegisterFileConfig};
use std::collections::HashMap;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusResponse {
    Okay,
    /// Decode error, or a write dropped by a lock when `lock_error` is set.
    SlvErr,
}

#[derive(Debug, Clone)]
pub struct RegisterFileModel {
    layout: FileLayout,
    byte_enable: bool,
    data_width: u32,
    error_response: ErrorResponse,
    lock_error: bool,
    by_ident: HashMap<String, usize>,
    values: Vec<u128>,
    written: Vec<Vec<bool>>,
    pulses: Vec<u128>,
}

impl RegisterFileModel {
    /// Builds a model in its reset state. `config` should have passed validation.
    pub fn new(config: &RegisterFileConfig) -> Self {
        let layout = FileLayout::new(config);
        let by_ident = layout
            .registers
            .iter()
            .enumerate()
            .map(|(i, r)| (r.ident.clone(), i))
            .collect();
        let mut model = Self {
            byte_enable: config.byte_enable,
            data_width: config.data_width,
            error_response: config.bus_options.error_response,
            lock_error: config.bus_options.lock_error,
            by_ident,
            values: Vec::new(),
            written: Vec::new(),
            pulses: Vec::new(),
            layout,
        };
        model.reset();
        model
    }

    /// Drives reset: stored values return to their reset values, write-once
    /// flags and pulses clear.
    pub fn reset(&mut self) {
        self.values = self.layout.registers.iter().map(|r| r.reset).collect();
        self.written = self
            .layout
            .registers
            .iter()
            .map(|r| vec![false; r.segments.len()])
            .collect();
        self.pulses = vec![0; self.layout.registers.len()];
    }

    /// One bus write cycle. `strobe` bit `i` enables byte lane `i`; it is
    /// ignored unless byte enables are configured.
    pub fn write(&mut self, addr: u64, data: u128, strobe: u128) -> BusResponse {
        self.tick();
        let Some(idx) = self.index_at(addr) else {
            return self.error();
        };
        let lanes = self.lane_mask(strobe);
        let snapshot = self.values.clone();
        let reg = &self.layout.registers[idx];

        let mut value = self.values[idx];
        let mut pulse = 0;
        let mut lock_hit = false;
        for (s, seg) in reg.segments.iter().enumerate() {
            if !seg.sw_write {
                continue;
            }
            let locked = seg.locks.iter().any(|tap| {
                self.by_ident
                    .get(&tap.register)
                    .is_some_and(|&i| snapshot[i] & tap.range.mask() != 0)
            });
            if locked {
                lock_hit = true;
                continue;
            }
            let magic_ok = seg.magic.iter().all(|gate| {
                self.by_ident
                    .get(&gate.register)
                    .is_some_and(|&i| snapshot[i] == gate.value)
            });
            if !magic_ok || self.written[idx][s] {
                continue;
            }

            let mask = seg.range.mask() & lanes & reg.full_mask();
            let next = seg.behavior.write_fn(value, data, mask);
            value = (value & !mask) | next;
            pulse |= seg.behavior.pulse_fn(data, mask);
            if seg.written_flag.is_some() {
                self.written[idx][s] = true;
            }
        }
        trace!(register = %reg.name, value, pulse, "bus write");
        self.values[idx] = value;
        self.pulses[idx] = pulse;

        if lock_hit && self.lock_error {
            self.error()
        } else {
            BusResponse::Okay
        }
    }

    /// One bus read cycle. Returns the pre-side-effect value.
    pub fn read(&mut self, addr: u64) -> (u128, BusResponse) {
        self.tick();
        let Some(idx) = self.index_at(addr) else {
            return (0, self.error());
        };
        let reg = &self.layout.registers[idx];
        let data = self.values[idx] & reg.read_mask();
        for seg in &reg.segments {
            match seg.read_effect() {
                Some(ReadEffect::Clear) => self.values[idx] &= !seg.range.mask(),
                Some(ReadEffect::Set) => self.values[idx] |= seg.range.mask() & reg.full_mask(),
                None => {}
            }
        }
        (data, BusResponse::Okay)
    }

    /// Hardware write through `<stem>_i`/`<stem>_we`. Returns false when no
    /// field with a hardware write port has that stem.
    pub fn hw_write(&mut self, stem: &str, value: u128) -> bool {
        for (idx, reg) in self.layout.registers.iter().enumerate() {
            if let Some(hw) = reg.hw_fields.iter().find(|f| f.stem == stem && f.input) {
                let mask = hw.range.mask();
                self.values[idx] = (self.values[idx] & !mask) | ((value << hw.range.low()) & mask);
                return true;
            }
        }
        false
    }

    /// Ends the current cycle; pulses drop back to zero.
    pub fn tick(&mut self) {
        self.pulses.iter_mut().for_each(|p| *p = 0);
    }

    /// Stored value of a register, by declared name.
    pub fn value(&self, name: &str) -> Option<u128> {
        self.find(name).map(|i| self.values[i])
    }

    /// Pulse output of a register during the current cycle.
    pub fn pulse(&self, name: &str) -> Option<u128> {
        self.find(name).map(|i| self.pulses[i])
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.layout
            .registers
            .iter()
            .position(|r| r.name == name)
            .or_else(|| self.by_ident.get(&name.to_ascii_lowercase()).copied())
    }

    fn index_at(&self, addr: u64) -> Option<usize> {
        self.layout
            .registers
            .iter()
            .position(|r: &RegisterLayout| r.address == addr)
    }

    fn lane_mask(&self, strobe: u128) -> u128 {
        if !self.byte_enable {
            return u128::MAX;
        }
        let lanes = self.data_width.div_ceil(8).min(16);
        (0..lanes)
            .filter(|i| strobe >> i & 1 == 1)
            .fold(0, |acc, i| acc | (0xFFu128 << (8 * i)))
    }

    fn error(&self) -> BusResponse {
        match self.error_response {
            ErrorResponse::Slverr => BusResponse::SlvErr,
            ErrorResponse::Okay => BusResponse::Okay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regforge_ir::{
        AccessHint, BitRange, Field, LockRelation, MagicDependency, Register, RegisterType,
    };

    const ALL: u128 = u128::MAX;

    fn model(regs: Vec<Register>) -> RegisterFileModel {
        let mut cfg = RegisterFileConfig::new("rf");
        cfg.registers = regs;
        RegisterFileModel::new(&cfg)
    }

    #[test]
    fn test_read_write_and_decode_error() {
        let mut m = model(vec![Register::new("CTRL").at(0).with_reset(0x5)]);
        assert_eq!(m.read(0), (0x5, BusResponse::Okay));
        assert_eq!(m.write(0, 0xABCD, ALL), BusResponse::Okay);
        assert_eq!(m.value("CTRL"), Some(0xABCD));
        assert_eq!(m.read(0x40), (0, BusResponse::SlvErr));
        assert_eq!(m.write(0x40, 1, ALL), BusResponse::SlvErr);
    }

    #[test]
    fn test_write_semantics_per_type() {
        let mut m = model(vec![
            Register::new("W1C").at(0x0).with_type(RegisterType::Write1Clean).with_reset(0xFF),
            Register::new("W0S").at(0x4).with_type(RegisterType::Write0Set),
            Register::new("RO").at(0x8).with_type(RegisterType::ReadOnly).with_reset(0x7),
            Register::new("WO").at(0xC).with_type(RegisterType::WriteOnly),
        ]);
        m.write(0x0, 0x0F, ALL);
        assert_eq!(m.value("W1C"), Some(0xF0));
        m.write(0x4, 0xFFFF_FFFE, ALL);
        assert_eq!(m.value("W0S"), Some(0x1));
        m.write(0x8, 0x0, ALL);
        assert_eq!(m.value("RO"), Some(0x7));
        m.write(0xC, 0x55, ALL);
        assert_eq!(m.value("WO"), Some(0x55));
        assert_eq!(m.read(0xC).0, 0);
    }

    #[test]
    fn test_write_once_is_sticky_until_reset() {
        let mut m = model(vec![Register::new("ID").at(0).with_type(RegisterType::WriteOnce)]);
        m.write(0, 0x11, ALL);
        m.write(0, 0x22, ALL);
        assert_eq!(m.value("ID"), Some(0x11));
        m.reset();
        m.write(0, 0x33, ALL);
        assert_eq!(m.value("ID"), Some(0x33));
    }

    #[test]
    fn test_pulse_lasts_one_cycle() {
        let mut m = model(vec![
            Register::new("GO").at(0).with_type(RegisterType::Write1Pulse),
            Register::new("NGO").at(4).with_type(RegisterType::Write0Pulse),
        ]);
        m.write(0, 0b101, ALL);
        assert_eq!(m.pulse("GO"), Some(0b101));
        assert_eq!(m.value("GO"), Some(0));
        assert_eq!(m.read(0).0, 0);
        assert_eq!(m.pulse("GO"), Some(0));

        m.write(4, 0xFFFF_FFFE, ALL);
        assert_eq!(m.pulse("NGO"), Some(0x1));
        m.tick();
        assert_eq!(m.pulse("NGO"), Some(0));
    }

    #[test]
    fn test_read_side_effects_after_sampling() {
        let mut m = model(vec![
            Register::new("RC").at(0).with_type(RegisterType::ReadClean).with_reset(0x3),
            Register::new("RS").at(4).with_type(RegisterType::WriteReadSet),
        ]);
        assert_eq!(m.read(0).0, 0x3);
        assert_eq!(m.read(0).0, 0x0);
        assert_eq!(m.read(4).0, 0x0);
        assert_eq!(m.value("RS"), Some(0xFFFF_FFFF));
    }

    #[test]
    fn test_lock_blocks_writes() {
        let mut data = Register::new("DATA").at(4);
        data.locked_by.push(LockRelation::new("LOCK"));
        let mut m = model(vec![
            Register::new("LOCK").at(0).with_type(RegisterType::LockField),
            data,
        ]);
        m.write(4, 0x12, ALL);
        assert_eq!(m.value("DATA"), Some(0x12));
        m.write(0, 0x1, ALL);
        assert_eq!(m.write(4, 0x34, ALL), BusResponse::Okay);
        assert_eq!(m.value("DATA"), Some(0x12));
        m.write(0, 0x0, ALL);
        m.write(4, 0x56, ALL);
        assert_eq!(m.value("DATA"), Some(0x56));
    }

    #[test]
    fn test_lock_error_response() {
        let mut data = Register::new("DATA").at(4);
        data.locked_by.push(LockRelation::bit("LOCK", 2));
        let mut cfg = RegisterFileConfig::new("rf");
        cfg.bus_options.lock_error = true;
        cfg.registers = vec![
            Register::new("LOCK").at(0).with_type(RegisterType::LockField).with_reset(0x4),
            data,
        ];
        let mut m = RegisterFileModel::new(&cfg);
        assert_eq!(m.write(4, 1, ALL), BusResponse::SlvErr);
        assert_eq!(m.value("DATA"), Some(0));
    }

    #[test]
    fn test_magic_gate() {
        let mut secure = Register::new("SECURE").at(4);
        secure.magic_dependency = Some(MagicDependency {
            source: "MAGIC".into(),
            value: 0xDEAD_BEEF,
        });
        let mut m = model(vec![Register::new("MAGIC").at(0), secure]);
        m.write(4, 0x1, ALL);
        assert_eq!(m.value("SECURE"), Some(0));
        m.write(0, 0xDEAD_BEEF, ALL);
        m.write(4, 0x1, ALL);
        assert_eq!(m.value("SECURE"), Some(1));
    }

    #[test]
    fn test_byte_strobes() {
        let mut cfg = RegisterFileConfig::new("rf");
        cfg.byte_enable = true;
        cfg.registers = vec![Register::new("DATA").at(0).with_reset(0x1122_3344)];
        let mut m = RegisterFileModel::new(&cfg);
        m.write(0, 0xAABB_CCDD, 0b0101);
        assert_eq!(m.value("DATA"), Some(0x11BB_33DD));
    }

    #[test]
    fn test_sliced_register_and_access_hints() {
        let mut reg = Register::new("IRQ").at(0).with_reset(0xFF);
        let mut status = Field::new("STATUS", BitRange::new(7, 0).unwrap());
        status.field_type = Some(RegisterType::Write1Clean);
        let mut mode = Field::new("MODE", BitRange::new(11, 8).unwrap());
        mode.sw_access = Some(AccessHint::Read);
        reg.fields = vec![status, mode];
        let mut m = model(vec![reg]);
        m.write(0, 0xF03, ALL);
        assert_eq!(m.value("IRQ"), Some(0xFC));
    }

    #[test]
    fn test_hw_write_port() {
        let mut reg = Register::new("STAT").at(0);
        let mut level = Field::new("LEVEL", BitRange::new(7, 4).unwrap());
        level.hw_access = Some(AccessHint::Write);
        reg.fields.push(level);
        let mut m = model(vec![reg]);
        assert!(m.hw_write("level", 0xA));
        assert_eq!(m.value("STAT"), Some(0xA0));
        assert!(!m.hw_write("missing", 1));
    }

    #[test]
    fn test_sliced_reserved_bits_read_zero() {
        let mut irq = Register::new("IRQ").at(0).with_reset(0xFFFF_000F);
        let mut status = Field::new("STATUS", BitRange::new(7, 0).unwrap());
        status.field_type = Some(RegisterType::Write1Clean);
        irq.fields.push(status);
        let mut m = model(vec![irq]);

        assert!(m.layout().registers[0].sliced);
        assert_eq!(m.read(0).0, 0x0F);
        m.write(0, 0xFFFF_FF01, ALL);
        assert_eq!(m.read(0).0, 0x0E);
    }
}
