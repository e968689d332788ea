// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Static register type catalogue.
//!
//! Every semantic register type maps to exactly one [`TypeBehavior`] row. Code
//! generators and the reference model consult these rows instead of matching on
//! [`RegisterType`] themselves.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a register type name is not part of the catalogue.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown register type '{0}'")]
pub struct UnknownRegisterType(pub String);

/// Semantic class of a register or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RegisterType {
    /// Software reads, writes are ignored.
    ReadOnly,
    /// Plain storage.
    #[default]
    ReadWrite,
    /// Software writes, reads return zero.
    WriteOnly,
    /// Writing 1 clears the bit.
    Write1Clean,
    /// Writing 0 clears the bit.
    Write0Clean,
    /// Writing 1 sets the bit.
    Write1Set,
    /// Writing 0 sets the bit.
    Write0Set,
    /// Writing 1 pulses the bit for one cycle.
    Write1Pulse,
    /// Writing 0 pulses the bit for one cycle.
    Write0Pulse,
    /// Cleared after every read.
    ReadClean,
    /// Set to all-ones after every read.
    ReadSet,
    /// Writable, cleared after every read.
    WriteReadClean,
    /// Writable, set to all-ones after every read.
    WriteReadSet,
    /// Latches the first write after reset.
    WriteOnce,
    /// Latches the first write after reset and reads as zero.
    WriteOnlyOnce,
    /// Plain storage whose bits gate writes to registers that name it in `locked_by`.
    LockField,
}

/// Bus-visible effect of a write on the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEffect {
    /// Stored value is unchanged.
    Ignore,
    /// `reg <- data`
    Store,
    /// `reg <- reg & ~data`
    ClearOnOne,
    /// `reg <- reg & data`
    ClearOnZero,
    /// `reg <- reg | data`
    SetOnOne,
    /// `reg <- reg | ~data`
    SetOnZero,
    /// Stored value stays zero; the pulse output carries the written pattern for a cycle.
    Pulse(PulseLevel),
}

/// Which written level produces a pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseLevel {
    /// Bits written as 1 pulse.
    High,
    /// Bits written as 0 pulse.
    Low,
}

/// State change triggered by a completed bus read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadEffect {
    /// Stored value becomes zero.
    Clear,
    /// Stored value becomes all-ones.
    Set,
}

/// One row of the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeBehavior {
    /// The type this row describes.
    pub reg_type: RegisterType,
    /// Reads return the stored value (otherwise zero).
    pub readable: bool,
    /// Writes reach the stored value or the pulse output.
    pub writable: bool,
    /// Only the first write after reset is honored.
    pub write_once: bool,
    /// Effect of an honored write.
    pub write_effect: WriteEffect,
    /// Effect of a completed read.
    pub read_effect: Option<ReadEffect>,
    /// One-line description used in generated documentation.
    pub summary: &'static str,
}

const fn row(
    reg_type: RegisterType,
    readable: bool,
    writable: bool,
    write_once: bool,
    write_effect: WriteEffect,
    read_effect: Option<ReadEffect>,
    summary: &'static str,
) -> TypeBehavior {
    TypeBehavior {
        reg_type,
        readable,
        writable,
        write_once,
        write_effect,
        read_effect,
        summary,
    }
}

// Indexed by `RegisterType as usize`; order must follow the enum declaration.
#[rustfmt::skip]
static CATALOGUE: [TypeBehavior; 16] = [
    row(RegisterType::ReadOnly, true, false, false, WriteEffect::Ignore, None, "Read-only; writes are ignored"),
    row(RegisterType::ReadWrite, true, true, false, WriteEffect::Store, None, "Read/write storage"),
    row(RegisterType::WriteOnly, false, true, false, WriteEffect::Store, None, "Write-only; reads return 0"),
    row(RegisterType::Write1Clean, true, true, false, WriteEffect::ClearOnOne, None, "Write 1 to clear"),
    row(RegisterType::Write0Clean, true, true, false, WriteEffect::ClearOnZero, None, "Write 0 to clear"),
    row(RegisterType::Write1Set, true, true, false, WriteEffect::SetOnOne, None, "Write 1 to set"),
    row(RegisterType::Write0Set, true, true, false, WriteEffect::SetOnZero, None, "Write 0 to set"),
    row(RegisterType::Write1Pulse, true, true, false, WriteEffect::Pulse(PulseLevel::High), None, "Write 1 to pulse for one cycle; reads 0"),
    row(RegisterType::Write0Pulse, true, true, false, WriteEffect::Pulse(PulseLevel::Low), None, "Write 0 to pulse for one cycle; reads 0"),
    row(RegisterType::ReadClean, true, true, false, WriteEffect::Store, Some(ReadEffect::Clear), "Cleared after read"),
    row(RegisterType::ReadSet, true, true, false, WriteEffect::Store, Some(ReadEffect::Set), "Set to all-ones after read"),
    row(RegisterType::WriteReadClean, true, true, false, WriteEffect::Store, Some(ReadEffect::Clear), "Writable, cleared after read"),
    row(RegisterType::WriteReadSet, true, true, false, WriteEffect::Store, Some(ReadEffect::Set), "Writable, set to all-ones after read"),
    row(RegisterType::WriteOnce, true, true, true, WriteEffect::Store, None, "First write after reset sticks"),
    row(RegisterType::WriteOnlyOnce, false, true, true, WriteEffect::Store, None, "First write after reset sticks; reads 0"),
    row(RegisterType::LockField, true, true, false, WriteEffect::Store, None, "Lock bits gating writes to other registers"),
];

impl RegisterType {
    /// Every catalogue entry in declaration order.
    pub const ALL: [RegisterType; 16] = [
        RegisterType::ReadOnly,
        RegisterType::ReadWrite,
        RegisterType::WriteOnly,
        RegisterType::Write1Clean,
        RegisterType::Write0Clean,
        RegisterType::Write1Set,
        RegisterType::Write0Set,
        RegisterType::Write1Pulse,
        RegisterType::Write0Pulse,
        RegisterType::ReadClean,
        RegisterType::ReadSet,
        RegisterType::WriteReadClean,
        RegisterType::WriteReadSet,
        RegisterType::WriteOnce,
        RegisterType::WriteOnlyOnce,
        RegisterType::LockField,
    ];

    /// The catalogue row for this type.
    pub fn behavior(self) -> &'static TypeBehavior {
        &CATALOGUE[self as usize]
    }

    /// Canonical spelling, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            RegisterType::ReadOnly => "ReadOnly",
            RegisterType::ReadWrite => "ReadWrite",
            RegisterType::WriteOnly => "WriteOnly",
            RegisterType::Write1Clean => "Write1Clean",
            RegisterType::Write0Clean => "Write0Clean",
            RegisterType::Write1Set => "Write1Set",
            RegisterType::Write0Set => "Write0Set",
            RegisterType::Write1Pulse => "Write1Pulse",
            RegisterType::Write0Pulse => "Write0Pulse",
            RegisterType::ReadClean => "ReadClean",
            RegisterType::ReadSet => "ReadSet",
            RegisterType::WriteReadClean => "WriteReadClean",
            RegisterType::WriteReadSet => "WriteReadSet",
            RegisterType::WriteOnce => "WriteOnce",
            RegisterType::WriteOnlyOnce => "WriteOnlyOnce",
            RegisterType::LockField => "LockField",
        }
    }
}

impl TypeBehavior {
    /// Reads return the stored value.
    pub fn is_readable(&self) -> bool {
        self.readable
    }

    /// Writes have an effect.
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// A sticky `written` flag is needed to ignore writes after the first.
    pub fn needs_written_flag(&self) -> bool {
        self.write_once
    }

    /// A one-cycle pulse output is generated.
    pub fn needs_pulse_output(&self) -> bool {
        matches!(self.write_effect, WriteEffect::Pulse(_))
    }

    /// State change performed by a completed read, if any.
    pub fn read_mutates(&self) -> Option<ReadEffect> {
        self.read_effect
    }

    /// Next stored value after an honored write of `data`, restricted to `mask`.
    pub fn write_fn(&self, current: u128, data: u128, mask: u128) -> u128 {
        let next = match self.write_effect {
            WriteEffect::Ignore => current,
            WriteEffect::Store => data,
            WriteEffect::ClearOnOne => current & !data,
            WriteEffect::ClearOnZero => current & data,
            WriteEffect::SetOnOne => current | data,
            WriteEffect::SetOnZero => current | !data,
            WriteEffect::Pulse(_) => 0,
        };
        next & mask
    }

    /// Pulse pattern driven for one cycle after an honored write of `data`.
    pub fn pulse_fn(&self, data: u128, mask: u128) -> u128 {
        match self.write_effect {
            WriteEffect::Pulse(PulseLevel::High) => data & mask,
            WriteEffect::Pulse(PulseLevel::Low) => !data & mask,
            _ => 0,
        }
    }

    /// Stored value after a completed read.
    pub fn read_fn(&self, current: u128, mask: u128) -> u128 {
        match self.read_effect {
            Some(ReadEffect::Clear) => 0,
            Some(ReadEffect::Set) => mask,
            None => current & mask,
        }
    }
}

impl fmt::Display for RegisterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegisterType {
    type Err = UnknownRegisterType;

    /// Case-insensitive; `_`, `-` and spaces are ignored, so `read_write`,
    /// `Read-Write` and `READWRITE` all resolve. Common short forms are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        let ty = match key.as_str() {
            "readonly" | "ro" | "r" => RegisterType::ReadOnly,
            "readwrite" | "rw" => RegisterType::ReadWrite,
            "writeonly" | "wo" | "w" => RegisterType::WriteOnly,
            "write1clean" | "write1clear" | "w1c" => RegisterType::Write1Clean,
            "write0clean" | "write0clear" | "w0c" => RegisterType::Write0Clean,
            "write1set" | "w1s" => RegisterType::Write1Set,
            "write0set" | "w0s" => RegisterType::Write0Set,
            "write1pulse" | "w1p" => RegisterType::Write1Pulse,
            "write0pulse" | "w0p" => RegisterType::Write0Pulse,
            "readclean" | "readclear" | "rc" => RegisterType::ReadClean,
            "readset" | "rs" => RegisterType::ReadSet,
            "writereadclean" | "writereadclear" | "wrc" => RegisterType::WriteReadClean,
            "writereadset" | "wrs" => RegisterType::WriteReadSet,
            "writeonce" | "w1" => RegisterType::WriteOnce,
            "writeonlyonce" | "wo1" => RegisterType::WriteOnlyOnce,
            "lockfield" | "lock" => RegisterType::LockField,
            _ => return Err(UnknownRegisterType(s.to_string())),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for RegisterType {
    type Error = UnknownRegisterType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RegisterType> for String {
    fn from(ty: RegisterType) -> Self {
        ty.as_str().to_string()
    }
}
