// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! YAML and JSON register-file documents.
//!
//! Documents are deserialized into loosely typed `*Entry` structs first so
//! literals, parameter expressions and type names can be normalized with
//! precise errors before the typed [`RegisterFileConfig`] is built.

pub mod literal;

pub use literal::{eval_expr, parse_literal, Literal, Parameters, RawBitRange};

use anyhow::Context;
use regforge_ir::{
    AccessHint, BusOptions, BusProtocol, Field, InvalidLockReference, LockRelation,
    MagicDependency, Register, RegisterFileConfig, RegisterType, UnknownAccessHint,
    UnknownBusProtocol, UnknownRegisterType,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML syntax error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON syntax error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid literal '{0}'")]
    InvalidLiteral(String),
    #[error("invalid expression '{0}'")]
    InvalidExpression(String),
    #[error("unresolved parameter '{name}' in '{expr}'")]
    UnresolvedParameter { name: String, expr: String },
    #[error("invalid bit range '{0}'")]
    InvalidBitRange(String),
    #[error("{what} value {value:#x} is out of range")]
    OutOfRange { what: &'static str, value: u128 },
    #[error(transparent)]
    UnknownRegisterType(#[from] UnknownRegisterType),
    #[error(transparent)]
    UnknownAccessHint(#[from] UnknownAccessHint),
    #[error(transparent)]
    UnknownBusProtocol(#[from] UnknownBusProtocol),
    #[error(transparent)]
    InvalidLockReference(#[from] InvalidLockReference),
    #[error("{context} names unknown register '{name}'")]
    UnknownRegister { name: String, context: &'static str },
    #[error("lock relation names unknown field '{field}' of register '{register}'")]
    UnknownField { register: String, field: String },
    #[error("register '{register}': {source}")]
    Register {
        register: String,
        source: Box<ConfigError>,
    },
    #[error("field '{field}': {source}")]
    Field {
        field: String,
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// The innermost error, skipping register/field context wrappers.
    pub fn root(&self) -> &ConfigError {
        match self {
            ConfigError::Register { source, .. } | ConfigError::Field { source, .. } => {
                source.root()
            }
            other => other,
        }
    }

    fn in_register(self, register: &str) -> Self {
        ConfigError::Register {
            register: register.to_string(),
            source: Box::new(self),
        }
    }

    fn in_field(self, field: &str) -> Self {
        ConfigError::Field {
            field: field.to_string(),
            source: Box::new(self),
        }
    }
}

/// `locked_by: LOCK` or `locked_by: [LOCK, CFG[2]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn relations(&self) -> Result<Vec<LockRelation>, ConfigError> {
        let names = match self {
            OneOrMany::One(name) => std::slice::from_ref(name),
            OneOrMany::Many(names) => names.as_slice(),
        };
        names
            .iter()
            .map(|n| n.parse::<LockRelation>().map_err(ConfigError::from))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicEntry {
    #[serde(alias = "register", alias = "source_register")]
    pub source: String,
    #[serde(alias = "expected", alias = "expected_value")]
    pub value: Literal,
}

impl MagicEntry {
    fn resolve(&self) -> Result<MagicDependency, ConfigError> {
        Ok(MagicDependency {
            source: self.source.clone(),
            value: self.value.value()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    #[serde(alias = "bits", alias = "bit")]
    pub bit_range: RawBitRange,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
    #[serde(alias = "reset", default)]
    pub reset_value: Option<Literal>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub sw_access: Option<String>,
    #[serde(default)]
    pub hw_access: Option<String>,
    #[serde(default)]
    pub locked_by: Option<OneOrMany>,
    #[serde(default)]
    pub magic_dependency: Option<MagicEntry>,
}

impl FieldEntry {
    pub fn resolve(&self, params: &Parameters) -> Result<Field, ConfigError> {
        self.build(params).map_err(|e| e.in_field(&self.name))
    }

    fn build(&self, params: &Parameters) -> Result<Field, ConfigError> {
        let mut field = Field::new(self.name.clone(), self.bit_range.resolve(params)?);
        field.field_type = parse_opt::<RegisterType>(&self.field_type)?;
        field.reset_value = self.reset_value.as_ref().map(Literal::value).transpose()?;
        field.description = self.description.clone();
        field.function = self.function.clone();
        field.sw_access = parse_opt::<AccessHint>(&self.sw_access)?;
        field.hw_access = parse_opt::<AccessHint>(&self.hw_access)?;
        if let Some(locks) = &self.locked_by {
            field.locked_by = locks.relations()?;
        }
        field.magic_dependency = self.magic_dependency.as_ref().map(MagicEntry::resolve).transpose()?;
        Ok(field)
    }
}

/// Entry of the top-level flat `fields:` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatFieldEntry {
    #[serde(alias = "reg")]
    pub register: String,
    #[serde(flatten)]
    pub field: FieldEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterEntry {
    pub name: String,
    #[serde(alias = "addr", alias = "offset", default)]
    pub address: Option<Literal>,
    #[serde(rename = "type", default)]
    pub reg_type: Option<String>,
    #[serde(alias = "reset", default)]
    pub reset_value: Option<Literal>,
    #[serde(default)]
    pub width: Option<Literal>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sw_access: Option<String>,
    #[serde(default)]
    pub hw_access: Option<String>,
    #[serde(default)]
    pub locked_by: Option<OneOrMany>,
    #[serde(default)]
    pub magic_dependency: Option<MagicEntry>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
}

impl RegisterEntry {
    pub fn resolve(
        &self,
        params: &Parameters,
        default_type: RegisterType,
    ) -> Result<Register, ConfigError> {
        self.build(params, default_type)
            .map_err(|e| e.in_register(&self.name))
    }

    fn build(&self, params: &Parameters, default_type: RegisterType) -> Result<Register, ConfigError> {
        let mut reg = Register::new(self.name.clone());
        reg.address = self
            .address
            .as_ref()
            .map(|a| a.value().and_then(|v| narrow(v, "address")))
            .transpose()?;
        reg.reg_type = parse_opt::<RegisterType>(&self.reg_type)?.unwrap_or(default_type);
        reg.reset_value = match &self.reset_value {
            Some(reset) => reset.value()?,
            None => 0,
        };
        reg.width = self
            .width
            .as_ref()
            .map(|w| w.eval(params).and_then(|v| narrow(v, "width")))
            .transpose()?;
        reg.description = self.description.clone();
        reg.sw_access = parse_opt::<AccessHint>(&self.sw_access)?;
        reg.hw_access = parse_opt::<AccessHint>(&self.hw_access)?;
        if let Some(locks) = &self.locked_by {
            reg.locked_by = locks.relations()?;
        }
        reg.magic_dependency = self.magic_dependency.as_ref().map(MagicEntry::resolve).transpose()?;
        for field in &self.fields {
            reg.fields.push(field.resolve(params)?);
        }
        Ok(reg)
    }
}

/// `{ locker: LOCK[1], locked: DATA }`. `locked` may also be `REG.FIELD`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRelationEntry {
    pub locker: String,
    pub locked: String,
}

fn default_data_width() -> u32 {
    32
}

fn default_addr_width() -> u32 {
    8
}

fn default_ports() -> u32 {
    1
}

/// A register-file document as written on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterFileDocument {
    #[serde(alias = "module", alias = "name")]
    pub module_name: String,
    #[serde(default = "default_data_width")]
    pub data_width: u32,
    #[serde(default = "default_addr_width")]
    pub addr_width: u32,
    #[serde(alias = "protocol", default)]
    pub bus_protocol: Option<String>,
    #[serde(default)]
    pub sync_reset: bool,
    #[serde(default)]
    pub byte_enable: bool,
    #[serde(default = "default_ports")]
    pub num_write_ports: u32,
    #[serde(default = "default_ports")]
    pub num_read_ports: u32,
    #[serde(default)]
    pub auto_address: bool,
    #[serde(default)]
    pub base_address: Option<Literal>,
    #[serde(default)]
    pub default_reg_type: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Literal>,
    #[serde(default)]
    pub registers: Vec<RegisterEntry>,
    #[serde(default)]
    pub fields: Vec<FlatFieldEntry>,
    #[serde(default)]
    pub lock_relations: Vec<LockRelationEntry>,
    #[serde(default)]
    pub bus_options: BusOptions,
}

impl RegisterFileDocument {
    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Symbols visible to bit-range and width expressions. User parameters
    /// shadow the built-in width names.
    pub fn parameters(&self) -> Result<Parameters, ConfigError> {
        let mut params = Parameters::new();
        for (name, value) in [
            ("DATA_WIDTH", self.data_width),
            ("data_width", self.data_width),
            ("ADDR_WIDTH", self.addr_width),
            ("addr_width", self.addr_width),
        ] {
            params.insert(name, u128::from(value));
        }
        for (name, value) in &self.parameters {
            params.insert(name.clone(), value.eval(&params)?);
        }
        Ok(params)
    }

    /// Normalizes literals, expands the flat field list and lock relations,
    /// and builds the typed model. No semantic validation happens here.
    pub fn resolve(&self) -> Result<LoadedConfig, ConfigError> {
        let params = self.parameters()?;
        let default_type =
            parse_opt::<RegisterType>(&self.default_reg_type)?.unwrap_or(RegisterType::ReadWrite);

        let mut config = RegisterFileConfig::new(self.module_name.clone());
        config.data_width = self.data_width;
        config.addr_width = self.addr_width;
        config.bus_protocol = parse_opt::<BusProtocol>(&self.bus_protocol)?.unwrap_or_default();
        config.sync_reset = self.sync_reset;
        config.byte_enable = self.byte_enable;
        config.num_write_ports = self.num_write_ports;
        config.num_read_ports = self.num_read_ports;
        config.bus_options = self.bus_options;
        if let Some(base) = &self.base_address {
            config.base_address = narrow(base.value()?, "base_address")?;
        }

        for entry in &self.registers {
            config.registers.push(entry.resolve(&params, default_type)?);
        }

        for flat in &self.fields {
            let field = flat
                .field
                .resolve(&params)
                .map_err(|e| e.in_register(&flat.register))?;
            let reg = find_register(&mut config, &flat.register, "field list entry")?;
            reg.fields.push(field);
        }

        for relation in &self.lock_relations {
            let lock: LockRelation = relation.locker.parse()?;
            if config.register(&relation.locked).is_some() {
                find_register(&mut config, &relation.locked, "lock relation")?
                    .locked_by
                    .push(lock);
                continue;
            }
            let Some((reg_name, field_name)) = relation.locked.split_once('.') else {
                return Err(ConfigError::UnknownRegister {
                    name: relation.locked.clone(),
                    context: "lock relation",
                });
            };
            let reg = find_register(&mut config, reg_name, "lock relation")?;
            let field = reg
                .fields
                .iter_mut()
                .find(|f| f.name == field_name)
                .ok_or_else(|| ConfigError::UnknownField {
                    register: reg_name.to_string(),
                    field: field_name.to_string(),
                })?;
            field.locked_by.push(lock);
        }

        debug!(
            module = %config.module_name,
            registers = config.registers.len(),
            "Resolved register file document"
        );
        Ok(LoadedConfig {
            config,
            auto_address: self.auto_address,
        })
    }
}

/// A resolved document: the typed model plus loader-level switches.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: RegisterFileConfig,
    /// The document asks for the address planner to run.
    pub auto_address: bool,
}

impl LoadedConfig {
    /// Loads a `.json` or YAML document.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read register file config {:?}", path))?;

        let doc = if path.extension().is_some_and(|ext| ext == "json") {
            RegisterFileDocument::from_json(&content)
        } else {
            RegisterFileDocument::from_yaml(&content)
        }
        .with_context(|| format!("Failed to parse register file config {:?}", path))?;

        doc.resolve()
            .with_context(|| format!("Invalid register file config {:?}", path))
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        RegisterFileDocument::from_yaml(text)?.resolve()
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        RegisterFileDocument::from_json(text)?.resolve()
    }
}

fn parse_opt<T>(text: &Option<String>) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    ConfigError: From<T::Err>,
{
    text.as_deref()
        .map(|s| s.parse::<T>().map_err(ConfigError::from))
        .transpose()
}

fn narrow<T: TryFrom<u128>>(value: u128, what: &'static str) -> Result<T, ConfigError> {
    T::try_from(value).map_err(|_| ConfigError::OutOfRange { what, value })
}

fn find_register<'a>(
    config: &'a mut RegisterFileConfig,
    name: &str,
    context: &'static str,
) -> Result<&'a mut Register, ConfigError> {
    config
        .registers
        .iter_mut()
        .find(|r| r.name == name)
        .ok_or_else(|| ConfigError::UnknownRegister {
            name: name.to_string(),
            context,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use regforge_ir::{ErrorResponse, LockSelector};

    #[test]
    fn test_minimal_document_defaults() {
        let loaded = LoadedConfig::from_yaml("module_name: rf\n").unwrap();
        let cfg = loaded.config;
        assert_eq!(cfg.module_name, "rf");
        assert_eq!(cfg.data_width, 32);
        assert_eq!(cfg.addr_width, 8);
        assert_eq!(cfg.bus_protocol, BusProtocol::Apb);
        assert_eq!((cfg.num_write_ports, cfg.num_read_ports), (1, 1));
        assert!(cfg.registers.is_empty());
        assert!(!loaded.auto_address);
    }

    #[test]
    fn test_register_literals_and_types() {
        let yaml = r#"
module_name: rf
bus_protocol: AXI4-Lite
default_reg_type: RO
registers:
  - name: CTRL
    address: "0h10"
    reset_value: "32'hDEAD_BEEF"
    type: w1c
  - name: STATUS
    addr: 0x14
  - name: MODE
    address: "0b11000"
    reset: "0o7"
"#;
        let cfg = LoadedConfig::from_yaml(yaml).unwrap().config;
        assert_eq!(cfg.bus_protocol, BusProtocol::Axi4Lite);
        let ctrl = cfg.register("CTRL").unwrap();
        assert_eq!(ctrl.address, Some(0x10));
        assert_eq!(ctrl.reset_value, 0xDEAD_BEEF);
        assert_eq!(ctrl.reg_type, RegisterType::Write1Clean);
        let status = cfg.register("STATUS").unwrap();
        assert_eq!(status.address, Some(0x14));
        assert_eq!(status.reg_type, RegisterType::ReadOnly);
        let mode = cfg.register("MODE").unwrap();
        assert_eq!(mode.address, Some(0x18));
        assert_eq!(mode.reset_value, 7);
    }

    #[test]
    fn test_parameterized_bit_ranges() {
        let yaml = r#"
module_name: rf
parameters:
  W: 8
  HALF: DATA_WIDTH / 2
registers:
  - name: CFG
    width: HALF
    fields:
      - name: LOW
        bit_range: "W-1:0"
      - name: HIGH
        bits: "[HALF-1:W]"
      - name: PAIR
        bit_range: [W, W]
"#;
        let cfg = LoadedConfig::from_yaml(yaml).unwrap().config;
        let reg = cfg.register("CFG").unwrap();
        assert_eq!(reg.width, Some(16));
        let ranges: Vec<(u32, u32)> = reg
            .fields
            .iter()
            .map(|f| (f.bit_range.high(), f.bit_range.low()))
            .collect();
        assert_eq!(ranges, [(7, 0), (15, 8), (8, 8)]);
    }

    #[test]
    fn test_unresolved_parameter_is_reported_with_context() {
        let yaml = r#"
module_name: rf
registers:
  - name: CFG
    fields:
      - name: F
        bit_range: "N-1:0"
"#;
        let err = LoadedConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err.root(),
            ConfigError::UnresolvedParameter { name, .. } if name == "N"
        ));
        assert_eq!(
            err.to_string(),
            "register 'CFG': field 'F': unresolved parameter 'N' in 'N-1'"
        );
    }

    #[test]
    fn test_unknown_register_type() {
        let yaml = "module_name: rf\nregisters:\n  - name: A\n    type: FlipFlop\n";
        let err = LoadedConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(err.root(), ConfigError::UnknownRegisterType(_)));
    }

    #[test]
    fn test_flat_fields_and_lock_relations() {
        let yaml = r#"
module_name: rf
registers:
  - name: LOCK
    type: LockField
  - name: DATA
    locked_by: LOCK
fields:
  - register: DATA
    name: VALUE
    bit_range: "7:0"
    magic_dependency: { source: LOCK, value: "0xA5" }
lock_relations:
  - { locker: "LOCK[3]", locked: DATA }
  - { locker: LOCK.KEY, locked: DATA.VALUE }
"#;
        let cfg = LoadedConfig::from_yaml(yaml).unwrap().config;
        let data = cfg.register("DATA").unwrap();
        assert_eq!(data.locked_by.len(), 2);
        assert_eq!(data.locked_by[0], LockRelation::new("LOCK"));
        assert_eq!(data.locked_by[1].selector, LockSelector::Bit(3));
        let value = data.field("VALUE").unwrap();
        assert_eq!(value.locked_by, [LockRelation::field("LOCK", "KEY")]);
        assert_eq!(value.magic_dependency.as_ref().unwrap().value, 0xA5);
    }

    #[test]
    fn test_dangling_flat_field() {
        let yaml = r#"
module_name: rf
fields:
  - register: NOPE
    name: F
    bit_range: 0
"#;
        let err = LoadedConfig::from_yaml(yaml).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownRegister { ref name, .. } if name == "NOPE"
        ));
    }

    #[test]
    fn test_json_document_with_bus_options() {
        let json = r#"{
            "module_name": "rf",
            "protocol": "wishbone",
            "auto_address": true,
            "base_address": "0x100",
            "bus_options": { "error_response": "okay", "wishbone": { "granularity": "word" } },
            "registers": [ { "name": "A", "sw_access": "R" } ]
        }"#;
        let loaded = LoadedConfig::from_json(json).unwrap();
        assert!(loaded.auto_address);
        let cfg = loaded.config;
        assert_eq!(cfg.bus_protocol, BusProtocol::Wishbone);
        assert_eq!(cfg.base_address, 0x100);
        assert_eq!(cfg.bus_options.error_response, ErrorResponse::Okay);
        assert_eq!(cfg.registers[0].sw_access, Some(AccessHint::Read));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            LoadedConfig::from_yaml("module_name: [unclosed"),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            LoadedConfig::from_json("{"),
            Err(ConfigError::Json(_))
        ));
    }
}
