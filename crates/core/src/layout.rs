// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Resolved view of a validated register file.
//!
//! A [`RegisterLayout`] splits each register into [`Segment`]s that share one
//! type, one access policy and one set of write gates. Registers without field
//! overrides are a single segment covering the whole register; registers whose
//! fields carry their own type, access hint, lock or magic gate get one segment
//! per field. Both the Verilog emitter and the reference model walk this view,
//! so the two can never disagree on which bits a write touches.

use regforge_ir::{
    width_mask, AccessHint, BitRange, LockSelector, Register, RegisterFileConfig, RegisterType,
    TypeBehavior,
};

/// Lowercase Verilog identifier for a declared name.
pub fn ident(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Bits of another register that block a write when any of them is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTap {
    pub register: String,
    pub range: BitRange,
}

/// Writes pass only while `register` equals `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MagicGate {
    pub register: String,
    pub width: u32,
    pub value: u128,
}

#[derive(Debug, Clone)]
pub struct Segment {
    /// Field name for sliced registers, `None` for the whole register.
    pub field: Option<String>,
    pub range: BitRange,
    pub reg_type: RegisterType,
    pub behavior: &'static TypeBehavior,
    /// Bus reads return the stored bits.
    pub sw_read: bool,
    /// Bus writes reach the stored bits or the pulse output.
    pub sw_write: bool,
    pub locks: Vec<LockTap>,
    pub magic: Vec<MagicGate>,
    /// Sticky flag name for write-once segments.
    pub written_flag: Option<String>,
    /// Output port name for pulse segments.
    pub pulse_port: Option<String>,
}

impl Segment {
    /// Read-side effect, only when software can read the segment.
    pub fn read_effect(&self) -> Option<regforge_ir::ReadEffect> {
        if self.sw_read {
            self.behavior.read_mutates()
        } else {
            None
        }
    }

    pub fn is_gated(&self) -> bool {
        !self.locks.is_empty() || !self.magic.is_empty() || self.written_flag.is_some()
    }
}

/// A field exposed to surrounding hardware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HwField {
    /// Lowercase port stem (`<stem>_o`, `<stem>_i`, `<stem>_we`).
    pub stem: String,
    pub range: BitRange,
    pub output: bool,
    pub input: bool,
}

#[derive(Debug, Clone)]
pub struct RegisterLayout {
    pub name: String,
    pub ident: String,
    pub address: u64,
    pub width: u32,
    pub reg_type: RegisterType,
    pub reset: u128,
    pub sliced: bool,
    pub segments: Vec<Segment>,
    pub hw_fields: Vec<HwField>,
}

impl RegisterLayout {
    /// Bits returned by a bus read.
    pub fn read_mask(&self) -> u128 {
        self.segments
            .iter()
            .filter(|s| s.sw_read && !s.behavior.needs_pulse_output())
            .fold(0, |acc, s| acc | s.range.mask())
    }

    pub fn full_mask(&self) -> u128 {
        width_mask(self.width)
    }

    pub fn is_writable(&self) -> bool {
        self.segments.iter().any(|s| s.sw_write)
    }

    pub fn has_read_effect(&self) -> bool {
        self.segments.iter().any(|s| s.read_effect().is_some())
    }
}

#[derive(Debug, Clone)]
pub struct FileLayout {
    pub registers: Vec<RegisterLayout>,
}

impl FileLayout {
    /// Builds the layout of a validated configuration.
    ///
    /// References the validator would have rejected (unknown lock or magic
    /// targets) are skipped rather than reported.
    pub fn new(config: &RegisterFileConfig) -> Self {
        let registers = config
            .registers
            .iter()
            .map(|reg| build_register(config, reg))
            .collect();
        Self { registers }
    }

    pub fn register(&self, name: &str) -> Option<&RegisterLayout> {
        self.registers.iter().find(|r| r.name == name)
    }

    pub fn at_address(&self, address: u64) -> Option<&RegisterLayout> {
        self.registers.iter().find(|r| r.address == address)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.registers.iter().position(|r| r.name == name)
    }
}

fn build_register(config: &RegisterFileConfig, reg: &Register) -> RegisterLayout {
    let width = config.register_width(reg);
    let reg_ident = ident(&reg.name);
    let reg_locks = resolve_locks(config, &reg.locked_by);
    let reg_magic: Vec<MagicGate> = reg
        .magic_dependency
        .as_ref()
        .and_then(|m| resolve_magic(config, &m.source, m.value))
        .into_iter()
        .collect();

    let sliced = reg.has_field_overrides();
    let segments = if sliced {
        reg.fields
            .iter()
            .map(|field| {
                let ty = field.effective_type(reg);
                let mut locks = reg_locks.clone();
                locks.extend(resolve_locks(config, &field.locked_by));
                let mut magic = reg_magic.clone();
                if let Some(m) = &field.magic_dependency {
                    magic.extend(resolve_magic(config, &m.source, m.value));
                }
                let stem = format!("{}_{}", reg_ident, ident(&field.name));
                segment(
                    Some(field.name.clone()),
                    field.bit_range,
                    ty,
                    field.sw_access.or(reg.sw_access),
                    locks,
                    magic,
                    &stem,
                )
            })
            .collect()
    } else {
        vec![segment(
            None,
            BitRange::full(width),
            reg.reg_type,
            reg.sw_access,
            reg_locks,
            reg_magic,
            &reg_ident,
        )]
    };

    let hw_fields = if reg.fields.is_empty() {
        hw_field(&reg.name, BitRange::full(width), reg.hw_access)
            .into_iter()
            .collect()
    } else {
        reg.fields
            .iter()
            .filter_map(|f| hw_field(&f.name, f.bit_range, f.hw_access.or(reg.hw_access)))
            .collect()
    };

    RegisterLayout {
        name: reg.name.clone(),
        ident: reg_ident,
        address: reg.address.unwrap_or_default(),
        width,
        reg_type: reg.reg_type,
        reset: reg.effective_reset(width),
        sliced,
        segments,
        hw_fields,
    }
}

fn segment(
    field: Option<String>,
    range: BitRange,
    reg_type: RegisterType,
    sw: Option<AccessHint>,
    locks: Vec<LockTap>,
    magic: Vec<MagicGate>,
    stem: &str,
) -> Segment {
    let behavior = reg_type.behavior();
    Segment {
        field,
        range,
        reg_type,
        behavior,
        sw_read: behavior.is_readable() && sw.map_or(true, AccessHint::can_read),
        sw_write: behavior.is_writable() && sw.map_or(true, AccessHint::can_write),
        locks,
        magic,
        written_flag: behavior
            .needs_written_flag()
            .then(|| format!("{stem}_written")),
        pulse_port: behavior
            .needs_pulse_output()
            .then(|| format!("{stem}_pulse")),
    }
}

fn hw_field(name: &str, range: BitRange, hw: Option<AccessHint>) -> Option<HwField> {
    let hw = hw?;
    if !hw.can_read() && !hw.can_write() {
        return None;
    }
    Some(HwField {
        stem: ident(name),
        range,
        output: hw.can_read(),
        input: hw.can_write(),
    })
}

fn resolve_locks(config: &RegisterFileConfig, relations: &[regforge_ir::LockRelation]) -> Vec<LockTap> {
    relations
        .iter()
        .filter_map(|rel| {
            let locker = config.register(&rel.register)?;
            let range = match &rel.selector {
                LockSelector::Bit(bit) => BitRange::bit(*bit),
                LockSelector::Field(name) => locker.field(name)?.bit_range,
            };
            Some(LockTap {
                register: ident(&locker.name),
                range,
            })
        })
        .collect()
}

fn resolve_magic(config: &RegisterFileConfig, source: &str, value: u128) -> Option<MagicGate> {
    let src = config.register(source)?;
    let width = config.register_width(src);
    Some(MagicGate {
        register: ident(&src.name),
        width,
        value: value & width_mask(width),
    })
}
