// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! RegForge Intermediate Representation (IR)
//!
//! This crate defines the typed, serializable model of a register file. It is the
//! common language between:
//!
//! 1. **Document adapters**: YAML/JSON loaders that normalize user input into this model.
//! 2. **The core**: validation, address planning and the behavioral reference model.
//! 3. **Generators**: Verilog, C header, Markdown and Rust emitters.
//!
//! Addresses are plain `u64` and register values are `u128`; any literal
//! normalization happens before a value reaches this crate.

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

mod bit_range;
mod catalogue;

pub use bit_range::{BitRange, BitRangeError};
pub use catalogue::{
    PulseLevel, ReadEffect, RegisterType, TypeBehavior, UnknownRegisterType, WriteEffect,
};

/// Mask with the low `width` bits set. Saturates at 128 bits.
pub fn width_mask(width: u32) -> u128 {
    if width >= 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    }
}

/// The root of a register file description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegisterFileConfig {
    /// Name of the generated Verilog module; also the C header prefix.
    pub module_name: String,

    /// Bus data width in bits.
    pub data_width: u32,

    /// Bus address width in bits.
    pub addr_width: u32,

    /// Bus protocol the module is generated for.
    pub bus_protocol: BusProtocol,

    /// Synchronous active-high `rst` instead of asynchronous active-low `rst_n`.
    pub sync_reset: bool,

    /// Honor per-byte write strobes.
    pub byte_enable: bool,

    /// Number of write ports, the bus being port 0.
    pub num_write_ports: u32,

    /// Number of read ports, the bus being port 0.
    pub num_read_ports: u32,

    /// First address handed out by the address planner.
    pub base_address: u64,

    /// Registers in declaration order.
    pub registers: Vec<Register>,

    /// Protocol-scoped options.
    pub bus_options: BusOptions,
}

impl Default for RegisterFileConfig {
    fn default() -> Self {
        Self {
            module_name: String::new(),
            data_width: 32,
            addr_width: 8,
            bus_protocol: BusProtocol::Apb,
            sync_reset: false,
            byte_enable: false,
            num_write_ports: 1,
            num_read_ports: 1,
            base_address: 0,
            registers: Vec::new(),
            bus_options: BusOptions::default(),
        }
    }
}

impl RegisterFileConfig {
    /// Creates an empty configuration with default widths and protocol.
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
            ..Self::default()
        }
    }

    /// Looks up a register by exact name.
    pub fn register(&self, name: &str) -> Option<&Register> {
        self.registers.iter().find(|r| r.name == name)
    }

    /// Width in bits of a register, falling back to the bus data width.
    pub fn register_width(&self, reg: &Register) -> u32 {
        reg.width.unwrap_or(self.data_width)
    }

    /// Number of byte lanes on the data bus.
    pub fn byte_lanes(&self) -> u32 {
        self.data_width.div_ceil(8)
    }
}

/// A single memory-mapped register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Register {
    /// Unique identifier within the file.
    pub name: String,

    /// Byte address; `None` until assigned by the planner.
    #[serde(default)]
    pub address: Option<u64>,

    /// Semantic type applied to every bit not covered by a field override.
    #[serde(rename = "type", default)]
    pub reg_type: RegisterType,

    /// Value after reset.
    #[serde(default)]
    pub reset_value: u128,

    /// Width in bits; defaults to the file's data width.
    #[serde(default)]
    pub width: Option<u32>,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Bit fields in declaration order. Empty means one implicit full-width field.
    #[serde(default)]
    pub fields: Vec<Field>,

    /// Software access hint.
    #[serde(default)]
    pub sw_access: Option<AccessHint>,

    /// Hardware access hint.
    #[serde(default)]
    pub hw_access: Option<AccessHint>,

    /// Lock bits that inhibit writes to this register.
    #[serde(default)]
    pub locked_by: Vec<LockRelation>,

    /// Optional magic-value write gate.
    #[serde(default)]
    pub magic_dependency: Option<MagicDependency>,
}

impl Register {
    /// A `ReadWrite` register with no address and no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            reg_type: RegisterType::ReadWrite,
            reset_value: 0,
            width: None,
            description: String::new(),
            fields: Vec::new(),
            sw_access: None,
            hw_access: None,
            locked_by: Vec::new(),
            magic_dependency: None,
        }
    }

    /// Builder-style address setter.
    pub fn at(mut self, address: u64) -> Self {
        self.address = Some(address);
        self
    }

    /// Builder-style type setter.
    pub fn with_type(mut self, reg_type: RegisterType) -> Self {
        self.reg_type = reg_type;
        self
    }

    /// Builder-style reset value setter.
    pub fn with_reset(mut self, reset_value: u128) -> Self {
        self.reset_value = reset_value;
        self
    }

    /// Looks up a field by exact name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// True when any field needs slice-by-slice handling: its own type, its own
    /// lock/magic gate or its own software access hint.
    pub fn has_field_overrides(&self) -> bool {
        self.fields.iter().any(|f| {
            f.field_type.is_some_and(|t| t != self.reg_type)
                || !f.locked_by.is_empty()
                || f.magic_dependency.is_some()
                || f.sw_access.is_some_and(|s| Some(s) != self.sw_access)
        })
    }

    /// Reset value with per-field resets folded in, masked to `width`.
    pub fn effective_reset(&self, width: u32) -> u128 {
        let mut value = self.reset_value;
        for field in &self.fields {
            if let Some(reset) = field.reset_value {
                let mask = field.bit_range.mask();
                value = (value & !mask) | ((reset << field.bit_range.low()) & mask);
            }
        }
        value & width_mask(width)
    }
}

/// A named bit slice inside a register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Unique identifier within the parent register.
    pub name: String,

    /// Bits covered by the field.
    pub bit_range: BitRange,

    /// Type override; `None` inherits the register type.
    #[serde(rename = "type", default)]
    pub field_type: Option<RegisterType>,

    /// Reset value of the slice, right-aligned. `None` takes the register's reset bits.
    #[serde(default)]
    pub reset_value: Option<u128>,

    /// Free-form description.
    #[serde(default)]
    pub description: String,

    /// Free-form functional note.
    #[serde(default)]
    pub function: String,

    /// Software access hint; `None` inherits the register hint.
    #[serde(default)]
    pub sw_access: Option<AccessHint>,

    /// Hardware access hint; `None` inherits the register hint.
    #[serde(default)]
    pub hw_access: Option<AccessHint>,

    /// Lock bits gating writes to this field in addition to the register's.
    #[serde(default)]
    pub locked_by: Vec<LockRelation>,

    /// Magic gate for this field in addition to the register's.
    #[serde(default)]
    pub magic_dependency: Option<MagicDependency>,
}

impl Field {
    /// A field over `bit_range` that inherits everything from its register.
    pub fn new(name: impl Into<String>, bit_range: BitRange) -> Self {
        Self {
            name: name.into(),
            bit_range,
            field_type: None,
            reset_value: None,
            description: String::new(),
            function: String::new(),
            sw_access: None,
            hw_access: None,
            locked_by: Vec::new(),
            magic_dependency: None,
        }
    }

    /// Type of the slice after inheritance.
    pub fn effective_type(&self, parent: &Register) -> RegisterType {
        self.field_type.unwrap_or(parent.reg_type)
    }

    /// Reset value of the slice, right-aligned.
    pub fn effective_reset(&self, parent: &Register) -> u128 {
        match self.reset_value {
            Some(v) => v & width_mask(self.bit_range.width()),
            None => (parent.reset_value & self.bit_range.mask()) >> self.bit_range.low(),
        }
    }
}

/// Software or hardware access hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AccessHint {
    /// Read access only.
    Read,
    /// Write access only.
    Write,
    /// Full access.
    ReadWrite,
    /// No access.
    None,
}

impl AccessHint {
    /// True for `Read` and `ReadWrite`.
    pub fn can_read(self) -> bool {
        matches!(self, AccessHint::Read | AccessHint::ReadWrite)
    }

    /// True for `Write` and `ReadWrite`.
    pub fn can_write(self) -> bool {
        matches!(self, AccessHint::Write | AccessHint::ReadWrite)
    }
}

impl fmt::Display for AccessHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessHint::Read => "read",
            AccessHint::Write => "write",
            AccessHint::ReadWrite => "read_write",
            AccessHint::None => "none",
        })
    }
}

/// Returned for access hints outside `read`, `write`, `read_write`, `none`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown access hint '{0}'")]
pub struct UnknownAccessHint(pub String);

impl FromStr for AccessHint {
    type Err = UnknownAccessHint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' ' | '/'))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "read" | "r" | "ro" => Ok(AccessHint::Read),
            "write" | "w" | "wo" => Ok(AccessHint::Write),
            "readwrite" | "rw" => Ok(AccessHint::ReadWrite),
            "none" | "na" => Ok(AccessHint::None),
            _ => Err(UnknownAccessHint(s.to_string())),
        }
    }
}

impl TryFrom<String> for AccessHint {
    type Error = UnknownAccessHint;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccessHint> for String {
    fn from(hint: AccessHint) -> Self {
        hint.to_string()
    }
}

/// Supported bus protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BusProtocol {
    /// AMBA APB.
    #[default]
    Apb,
    /// AMBA AXI4-Lite.
    Axi4Lite,
    /// Wishbone B4 classic.
    Wishbone,
    /// Open Core Protocol, simple request/response subset.
    Ocp,
    /// Generic request/acknowledge handshake.
    Custom,
}

impl BusProtocol {
    /// Every supported protocol.
    pub const ALL: [BusProtocol; 5] = [
        BusProtocol::Apb,
        BusProtocol::Axi4Lite,
        BusProtocol::Wishbone,
        BusProtocol::Ocp,
        BusProtocol::Custom,
    ];

    /// Canonical lowercase spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BusProtocol::Apb => "apb",
            BusProtocol::Axi4Lite => "axi4_lite",
            BusProtocol::Wishbone => "wishbone",
            BusProtocol::Ocp => "ocp",
            BusProtocol::Custom => "custom",
        }
    }

    /// Human-readable name used in generated comments and documents.
    pub fn display_name(self) -> &'static str {
        match self {
            BusProtocol::Apb => "APB",
            BusProtocol::Axi4Lite => "AXI4-Lite",
            BusProtocol::Wishbone => "Wishbone",
            BusProtocol::Ocp => "OCP",
            BusProtocol::Custom => "Custom",
        }
    }
}

impl fmt::Display for BusProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for unknown protocol names.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown bus protocol '{0}' (expected apb, axi4_lite, wishbone, ocp or custom)")]
pub struct UnknownBusProtocol(pub String);

impl FromStr for BusProtocol {
    type Err = UnknownBusProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "apb" | "apb3" | "apb4" => Ok(BusProtocol::Apb),
            "axi4lite" | "axilite" | "axi" | "axi4" => Ok(BusProtocol::Axi4Lite),
            "wishbone" | "wb" => Ok(BusProtocol::Wishbone),
            "ocp" => Ok(BusProtocol::Ocp),
            "custom" => Ok(BusProtocol::Custom),
            _ => Err(UnknownBusProtocol(s.to_string())),
        }
    }
}

impl TryFrom<String> for BusProtocol {
    type Error = UnknownBusProtocol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BusProtocol> for String {
    fn from(protocol: BusProtocol) -> Self {
        protocol.as_str().to_string()
    }
}

/// Which bits of the locking register act as the lock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LockSelector {
    /// A single bit index.
    Bit(u32),
    /// Any set bit of the named field locks.
    Field(String),
}

impl Default for LockSelector {
    fn default() -> Self {
        LockSelector::Bit(0)
    }
}

/// A `locked_by` entry: the named register's selected bits inhibit writes when set.
///
/// Textual forms are `REG` (bit 0), `REG[n]` and `REG.FIELD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LockRelation {
    /// Name of the locking register.
    pub register: String,
    /// Selected lock bits.
    pub selector: LockSelector,
}

impl LockRelation {
    /// Lock on bit 0 of `register`.
    pub fn new(register: impl Into<String>) -> Self {
        Self {
            register: register.into(),
            selector: LockSelector::default(),
        }
    }

    /// Lock on a single bit of `register`.
    pub fn bit(register: impl Into<String>, bit: u32) -> Self {
        Self {
            register: register.into(),
            selector: LockSelector::Bit(bit),
        }
    }

    /// Lock on any bit of a field of `register`.
    pub fn field(register: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            register: register.into(),
            selector: LockSelector::Field(field.into()),
        }
    }
}

impl fmt::Display for LockRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selector {
            LockSelector::Bit(0) => write!(f, "{}", self.register),
            LockSelector::Bit(n) => write!(f, "{}[{}]", self.register, n),
            LockSelector::Field(field) => write!(f, "{}.{}", self.register, field),
        }
    }
}

/// Returned for malformed `locked_by` references.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid lock reference '{0}' (expected REG, REG[bit] or REG.FIELD)")]
pub struct InvalidLockReference(pub String);

impl FromStr for LockRelation {
    type Err = InvalidLockReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let bad = || InvalidLockReference(s.to_string());
        if let Some((reg, rest)) = text.split_once('[') {
            let bit = rest
                .strip_suffix(']')
                .and_then(|b| b.trim().parse::<u32>().ok())
                .ok_or_else(bad)?;
            if reg.trim().is_empty() {
                return Err(bad());
            }
            return Ok(LockRelation::bit(reg.trim(), bit));
        }
        if let Some((reg, field)) = text.split_once('.') {
            if reg.is_empty() || field.is_empty() {
                return Err(bad());
            }
            return Ok(LockRelation::field(reg, field));
        }
        if text.is_empty() {
            return Err(bad());
        }
        Ok(LockRelation::new(text))
    }
}

impl TryFrom<String> for LockRelation {
    type Error = InvalidLockReference;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LockRelation> for String {
    fn from(lock: LockRelation) -> Self {
        lock.to_string()
    }
}

/// Writes are honored only while `source` holds `value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MagicDependency {
    /// Name of the register compared against `value`.
    pub source: String,
    /// Expected value.
    pub value: u128,
}

/// Error signalling policy for decode and lock errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorResponse {
    /// Signal errors with the protocol's error response.
    #[default]
    Slverr,
    /// Never signal errors; every access completes normally.
    Okay,
}

/// Wishbone data port granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Byte addressed; misaligned registers are tolerated.
    #[default]
    Byte,
    /// Word addressed; registers must be word aligned.
    Word,
}

/// APB specific options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApbOptions {
    /// Wait states inserted before `pready` (0..=15).
    pub wait_states: u32,
}

/// Custom handshake options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomOptions {
    /// Register `rdata`/`ack` for one cycle of read latency.
    pub registered_read: bool,
}

/// Wishbone options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WishboneOptions {
    /// Data port granularity.
    pub granularity: Granularity,
}

/// Protocol-scoped options bag. Options for protocols other than the selected one are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusOptions {
    /// Decode/lock error signalling.
    pub error_response: ErrorResponse,
    /// Writes dropped by a lock raise the error response.
    pub lock_error: bool,
    /// APB options.
    pub apb: ApbOptions,
    /// Custom handshake options.
    pub custom: CustomOptions,
    /// Wishbone options.
    pub wishbone: WishboneOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_mask() {
        assert_eq!(width_mask(0), 0);
        assert_eq!(width_mask(8), 0xFF);
        assert_eq!(width_mask(128), u128::MAX);
    }

    #[test]
    fn test_lock_reference_forms() {
        assert_eq!("LOCK".parse::<LockRelation>().unwrap(), LockRelation::new("LOCK"));
        assert_eq!(
            "LOCK[3]".parse::<LockRelation>().unwrap(),
            LockRelation::bit("LOCK", 3)
        );
        assert_eq!(
            "LOCK.KEY".parse::<LockRelation>().unwrap(),
            LockRelation::field("LOCK", "KEY")
        );
        assert!("LOCK[x]".parse::<LockRelation>().is_err());
        assert!("".parse::<LockRelation>().is_err());
        assert_eq!(LockRelation::bit("L", 2).to_string(), "L[2]");
    }

    #[test]
    fn test_protocol_aliases() {
        assert_eq!("AXI4-Lite".parse::<BusProtocol>().unwrap(), BusProtocol::Axi4Lite);
        assert_eq!("axi_lite".parse::<BusProtocol>().unwrap(), BusProtocol::Axi4Lite);
        assert_eq!("WB".parse::<BusProtocol>().unwrap(), BusProtocol::Wishbone);
        assert!("pcie".parse::<BusProtocol>().is_err());
    }

    #[test]
    fn test_effective_reset_folds_field_resets() {
        let mut reg = Register::new("CTRL").with_reset(0xF0);
        let mut low = Field::new("LOW", BitRange::new(3, 0).unwrap());
        low.reset_value = Some(0x5);
        reg.fields.push(low);
        reg.fields
            .push(Field::new("HIGH", BitRange::new(7, 4).unwrap()));
        assert_eq!(reg.effective_reset(32), 0xF5);
        assert_eq!(reg.fields[1].effective_reset(&reg), 0xF);
    }

    #[test]
    fn test_config_json_uses_type_key() {
        let mut cfg = RegisterFileConfig::new("rf");
        cfg.registers
            .push(Register::new("CTRL").at(0).with_type(RegisterType::Write1Clean));
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"type\":\"Write1Clean\""));
        let back: RegisterFileConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
