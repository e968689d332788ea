// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Semantic validation of a register file.
//!
//! Structural checks (identifiers, widths, names, addresses, field packing) run
//! before semantic checks (lock/magic references, dependency cycles, reset
//! values, protocol compatibility). All findings are collected; nothing stops at
//! the first error.

use crate::bus::{self, BusAdapter};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::layout::{ident, FileLayout};
use regforge_ir::{
    width_mask, BitRange, LockRelation, LockSelector, MagicDependency, Register, RegisterFileConfig,
    RegisterType,
};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Data widths that need no warning.
pub const STANDARD_DATA_WIDTHS: [u32; 5] = [8, 16, 32, 64, 128];

/// Validates `config` against its own bus protocol.
pub fn validate(config: &RegisterFileConfig) -> Diagnostics {
    let adapter = bus::adapter_for(config.bus_protocol);
    Validator::new(config, adapter.as_ref()).run()
}

pub struct Validator<'a> {
    config: &'a RegisterFileConfig,
    adapter: &'a dyn BusAdapter,
    diags: Diagnostics,
}

impl<'a> Validator<'a> {
    pub fn new(config: &'a RegisterFileConfig, adapter: &'a dyn BusAdapter) -> Self {
        Self {
            config,
            adapter,
            diags: Diagnostics::new(),
        }
    }

    pub fn run(mut self) -> Diagnostics {
        self.check_file();
        self.check_names();
        self.check_addresses();
        self.check_fields();
        self.check_locks();
        self.check_magic();
        self.check_cycles();
        self.check_resets();
        self.check_usage();
        self.check_ports();
        if self.config.data_width > 0 && self.config.data_width <= 128 {
            bus::check_protocol(self.adapter, self.config, &mut self.diags);
        }
        debug!(
            errors = self.diags.errors().count(),
            warnings = self.diags.warnings().count(),
            "validation finished"
        );
        self.diags
    }

    fn check_file(&mut self) {
        let cfg = self.config;
        if !is_identifier(&cfg.module_name) {
            self.diags.error(
                DiagnosticKind::InvalidIdentifier,
                Location::Config,
                format!("module name '{}' is not a Verilog identifier", cfg.module_name),
            );
        }

        let dw = cfg.data_width;
        if dw == 0 || dw % 8 != 0 || dw > 128 {
            self.diags.error(
                DiagnosticKind::InvalidWidth,
                Location::Config,
                format!("data_width must be a multiple of 8 between 8 and 128, got {dw}"),
            );
        } else if !STANDARD_DATA_WIDTHS.contains(&dw) {
            self.diags.warning(
                DiagnosticKind::NonStandardDataWidth,
                Location::Config,
                format!("data_width {dw} is not a power of two"),
            );
        }

        if cfg.addr_width == 0 || cfg.addr_width > 64 {
            self.diags.error(
                DiagnosticKind::InvalidWidth,
                Location::Config,
                format!("addr_width must be between 1 and 64, got {}", cfg.addr_width),
            );
        }

        for (what, count) in [
            ("num_write_ports", cfg.num_write_ports),
            ("num_read_ports", cfg.num_read_ports),
        ] {
            if count == 0 {
                self.diags.error(
                    DiagnosticKind::InvalidBusOption,
                    Location::Config,
                    format!("{what} must be at least 1"),
                );
            }
        }

        for reg in &cfg.registers {
            if let Some(width) = reg.width {
                if width == 0 || width > dw {
                    self.diags.error(
                        DiagnosticKind::InvalidWidth,
                        Location::register(&reg.name),
                        format!("register width {width} must be between 1 and data_width ({dw})"),
                    );
                }
            }
        }
    }

    fn check_names(&mut self) {
        let mut seen: HashSet<String> = HashSet::new();
        for reg in &self.config.registers {
            if !is_identifier(&reg.name) {
                self.diags.error(
                    DiagnosticKind::InvalidIdentifier,
                    Location::register(&reg.name),
                    format!("register name '{}' is not a Verilog identifier", reg.name),
                );
            }
            if !seen.insert(ident(&reg.name)) {
                self.diags.error(
                    DiagnosticKind::DuplicateName,
                    Location::register(&reg.name),
                    format!("register '{}' is declared more than once", reg.name),
                );
            }

            let mut fields: HashSet<String> = HashSet::new();
            for field in &reg.fields {
                if !is_identifier(&field.name) {
                    self.diags.error(
                        DiagnosticKind::InvalidIdentifier,
                        Location::field(&reg.name, &field.name),
                        format!("field name '{}' is not a Verilog identifier", field.name),
                    );
                }
                if !fields.insert(ident(&field.name)) {
                    self.diags.error(
                        DiagnosticKind::DuplicateName,
                        Location::field(&reg.name, &field.name),
                        format!(
                            "field '{}' is declared more than once in '{}'",
                            field.name, reg.name
                        ),
                    );
                }
            }
        }
    }

    fn check_addresses(&mut self) {
        let cfg = self.config;
        let stride = u64::from((cfg.data_width / 8).max(1));
        let misaligned_is_error = self.adapter.misaligned_is_error(cfg);
        let limit = if cfg.addr_width >= 64 {
            None
        } else {
            Some(1u64 << cfg.addr_width)
        };

        let mut owners: HashMap<u64, &str> = HashMap::new();
        for reg in &cfg.registers {
            let loc = Location::register(&reg.name);
            let Some(address) = reg.address else {
                self.diags.error(
                    DiagnosticKind::MissingAddress,
                    loc,
                    format!("register '{}' has no address and auto-address is off", reg.name),
                );
                continue;
            };

            if let Some(other) = owners.insert(address, &reg.name) {
                self.diags.error(
                    DiagnosticKind::AddressConflict,
                    loc.clone(),
                    format!("address {address:#x} is used by both '{other}' and '{}'", reg.name),
                );
            }

            if limit.is_some_and(|l| address >= l) {
                self.diags.error(
                    DiagnosticKind::AddressOutOfRange,
                    loc.clone(),
                    format!(
                        "address {address:#x} does not fit in {} address bits",
                        cfg.addr_width
                    ),
                );
            }

            if address % stride != 0 {
                let message =
                    format!("address {address:#x} is not aligned to {stride}-byte words");
                if misaligned_is_error {
                    self.diags
                        .error(DiagnosticKind::MisalignedAddress, loc, message);
                } else {
                    self.diags
                        .warning(DiagnosticKind::MisalignedAddress, loc, message);
                }
            }
        }
    }

    fn check_fields(&mut self) {
        let cfg = self.config;
        for reg in &cfg.registers {
            let width = cfg.register_width(reg);
            for (i, field) in reg.fields.iter().enumerate() {
                if !field.bit_range.fits_in(width) {
                    self.diags.error(
                        DiagnosticKind::FieldOutOfRegisterWidth,
                        Location::field(&reg.name, &field.name),
                        format!(
                            "bits [{}] exceed the {width}-bit register",
                            field.bit_range
                        ),
                    );
                }
                for other in &reg.fields[..i] {
                    if field.bit_range.overlaps(&other.bit_range) {
                        self.diags.error(
                            DiagnosticKind::FieldOverlap,
                            Location::field(&reg.name, &field.name),
                            format!(
                                "bits [{}] overlap field '{}' [{}]",
                                field.bit_range, other.name, other.bit_range
                            ),
                        );
                    }
                }
            }
        }
    }

    fn check_locks(&mut self) {
        let cfg = self.config;
        for reg in &cfg.registers {
            for lock in &reg.locked_by {
                self.check_lock(Location::register(&reg.name), lock);
            }
            for field in &reg.fields {
                for lock in &field.locked_by {
                    self.check_lock(Location::field(&reg.name, &field.name), lock);
                }
            }
        }
    }

    fn check_lock(&mut self, location: Location, lock: &LockRelation) {
        let cfg = self.config;
        let Some(locker) = cfg.register(&lock.register) else {
            self.diags.error(
                DiagnosticKind::UnresolvedLockTarget,
                location,
                format!("lock register '{}' does not exist", lock.register),
            );
            return;
        };

        let problem = match &lock.selector {
            LockSelector::Bit(bit) => {
                let lock_bit = BitRange::bit(*bit);
                let is_lock = locker.reg_type == RegisterType::LockField
                    || locker.fields.iter().any(|f| {
                        f.bit_range.overlaps(&lock_bit)
                            && f.effective_type(locker) == RegisterType::LockField
                    });
                if !is_lock {
                    Some(format!("'{}' is not a LockField register", locker.name))
                } else if *bit >= cfg.register_width(locker) {
                    Some(format!("lock bit {bit} is outside '{}'", locker.name))
                } else {
                    None
                }
            }
            LockSelector::Field(name) => match locker.field(name) {
                None => Some(format!("'{}' has no field '{name}'", locker.name)),
                Some(f) if f.effective_type(locker) != RegisterType::LockField => {
                    Some(format!("'{}.{name}' is not a LockField", locker.name))
                }
                Some(_) => None,
            },
        };
        if let Some(message) = problem {
            self.diags
                .error(DiagnosticKind::UnresolvedLockTarget, location, message);
        }
    }

    fn check_magic(&mut self) {
        let cfg = self.config;
        for reg in &cfg.registers {
            if let Some(magic) = &reg.magic_dependency {
                self.check_magic_gate(Location::register(&reg.name), magic);
            }
            for field in &reg.fields {
                if let Some(magic) = &field.magic_dependency {
                    self.check_magic_gate(Location::field(&reg.name, &field.name), magic);
                }
            }
        }
    }

    fn check_magic_gate(&mut self, location: Location, magic: &MagicDependency) {
        let Some(source) = self.config.register(&magic.source) else {
            self.diags.error(
                DiagnosticKind::UnresolvedMagicTarget,
                location,
                format!("magic source register '{}' does not exist", magic.source),
            );
            return;
        };
        let width = self.config.register_width(source);
        if magic.value & !width_mask(width) != 0 {
            self.diags.warning(
                DiagnosticKind::MagicValueTruncated,
                location,
                format!(
                    "magic value {:#x} does not fit in {width}-bit '{}' and is truncated",
                    magic.value, source.name
                ),
            );
        }
    }

    /// Lock and magic references must form a DAG; registers left over after a
    /// topological sort sit on a cycle.
    fn check_cycles(&mut self) {
        let regs = &self.config.registers;
        let index: HashMap<&str, usize> = regs
            .iter()
            .enumerate()
            .map(|(i, r)| (r.name.as_str(), i))
            .collect();

        let mut edges: Vec<HashSet<usize>> = vec![HashSet::new(); regs.len()];
        for (i, reg) in regs.iter().enumerate() {
            for target in dependencies(reg) {
                if let Some(&j) = index.get(target) {
                    edges[i].insert(j);
                }
            }
        }

        let mut indegree = vec![0usize; regs.len()];
        for targets in &edges {
            for &j in targets {
                indegree[j] += 1;
            }
        }
        let mut queue: VecDeque<usize> = (0..regs.len()).filter(|&i| indegree[i] == 0).collect();
        let mut visited = 0;
        while let Some(i) = queue.pop_front() {
            visited += 1;
            for &j in &edges[i] {
                indegree[j] -= 1;
                if indegree[j] == 0 {
                    queue.push_back(j);
                }
            }
        }

        if visited < regs.len() {
            let members: Vec<&str> = (0..regs.len())
                .filter(|&i| indegree[i] > 0)
                .map(|i| regs[i].name.as_str())
                .collect();
            if let Some(first) = members.first() {
                self.diags.error(
                    DiagnosticKind::CyclicDependency,
                    Location::register(first),
                    format!("lock/magic dependencies form a cycle through {}", members.join(", ")),
                );
            }
        }
    }

    fn check_resets(&mut self) {
        let cfg = self.config;
        for reg in &cfg.registers {
            let width = cfg.register_width(reg);
            if reg.reset_value & !width_mask(width) != 0 {
                self.diags.warning(
                    DiagnosticKind::ResetValueTruncated,
                    Location::register(&reg.name),
                    format!(
                        "reset value {:#x} does not fit in {width} bits and is truncated",
                        reg.reset_value
                    ),
                );
            }
            for field in &reg.fields {
                let fw = field.bit_range.width();
                if let Some(reset) = field.reset_value {
                    if reset & !width_mask(fw) != 0 {
                        self.diags.warning(
                            DiagnosticKind::ResetValueTruncated,
                            Location::field(&reg.name, &field.name),
                            format!(
                                "reset value {reset:#x} does not fit in {fw} bits and is truncated"
                            ),
                        );
                    }
                }
            }
        }
    }

    fn check_usage(&mut self) {
        use regforge_ir::AccessHint;
        let unused = |sw: Option<AccessHint>, hw: Option<AccessHint>| {
            sw == Some(AccessHint::None) && matches!(hw, None | Some(AccessHint::None))
        };
        for reg in &self.config.registers {
            if reg.fields.is_empty() {
                if unused(reg.sw_access, reg.hw_access) {
                    self.diags.warning(
                        DiagnosticKind::UnusedField,
                        Location::register(&reg.name),
                        "neither software nor hardware can access this register",
                    );
                }
                continue;
            }
            for field in &reg.fields {
                if unused(
                    field.sw_access.or(reg.sw_access),
                    field.hw_access.or(reg.hw_access),
                ) {
                    self.diags.warning(
                        DiagnosticKind::UnusedField,
                        Location::field(&reg.name, &field.name),
                        "neither software nor hardware can access this field",
                    );
                }
            }
        }

        if self.config.num_write_ports > 1 {
            let layout = FileLayout::new(self.config);
            if layout.registers.iter().any(|r| r.is_writable()) {
                self.diags.warning(
                    DiagnosticKind::MultiPortWriteCollision,
                    Location::Config,
                    format!(
                        "{} write ports can target the same register in one cycle; the lowest port index wins",
                        self.config.num_write_ports
                    ),
                );
            }
        }
    }

    /// Generated port names (`<field>_o`, `<field>_i`, `<field>_we`,
    /// `<reg>_pulse`) share one namespace.
    fn check_ports(&mut self) {
        let layout = FileLayout::new(self.config);
        let mut owners: HashMap<String, String> = HashMap::new();
        for reg in &layout.registers {
            let mut names = Vec::new();
            for hw in &reg.hw_fields {
                if hw.output {
                    names.push(format!("{}_o", hw.stem));
                }
                if hw.input {
                    names.push(format!("{}_i", hw.stem));
                    names.push(format!("{}_we", hw.stem));
                }
            }
            names.extend(reg.segments.iter().filter_map(|s| s.pulse_port.clone()));
            for name in names {
                if let Some(previous) = owners.insert(name.clone(), reg.name.clone()) {
                    self.diags.error(
                        DiagnosticKind::DuplicateName,
                        Location::register(&reg.name),
                        format!("port '{name}' is generated for both '{previous}' and '{}'", reg.name),
                    );
                }
            }
        }
    }
}

fn dependencies(reg: &Register) -> impl Iterator<Item = &str> {
    let locks = reg
        .locked_by
        .iter()
        .chain(reg.fields.iter().flat_map(|f| f.locked_by.iter()))
        .map(|l| l.register.as_str());
    let magic = reg
        .magic_dependency
        .iter()
        .chain(reg.fields.iter().filter_map(|f| f.magic_dependency.as_ref()))
        .map(|m| m.source.as_str());
    locks.chain(magic)
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
