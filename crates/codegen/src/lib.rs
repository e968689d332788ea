// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Generation pipeline: protocol override, address planning, validation and
//! the emitters. Nothing here touches the filesystem.

pub mod doc;
pub mod header;
pub mod rust_api;
pub mod verilog;

pub use doc::DocGenerator;
pub use header::HeaderGenerator;
pub use rust_api::RustApiGenerator;
pub use verilog::VerilogGenerator;

use regforge_core::{validate, AddressPlanner, Diagnostics};
use regforge_ir::{BusProtocol, RegisterFileConfig};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Tool name stamped into generated files.
pub const TOOL_NAME: &str = concat!("regforge ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Overrides `bus_protocol` from the configuration.
    pub protocol: Option<BusProtocol>,
    /// Assign addresses to registers that have none.
    pub auto_address: bool,
    /// Stamped into every artifact; never read from the clock.
    pub timestamp: String,
    pub tool: String,
    /// Also render the Rust register-access module.
    pub rust_api: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            protocol: None,
            auto_address: false,
            timestamp: "unspecified".to_string(),
            tool: TOOL_NAME.to_string(),
            rust_api: false,
        }
    }
}

/// Header information shared by every artifact of one generation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub tool: String,
    pub timestamp: String,
    /// Hex SHA-256 of the canonical JSON form of the validated configuration.
    pub digest: String,
}

impl Provenance {
    pub fn new(
        tool: impl Into<String>,
        timestamp: impl Into<String>,
        digest: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            timestamp: timestamp.into(),
            digest: digest.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationOutput {
    pub verilog: String,
    pub header: String,
    pub doc: String,
    pub rust: Option<String>,
    /// Warnings only; errors abort generation.
    pub diagnostics: Diagnostics,
    pub digest: String,
    /// The configuration after protocol override and address planning.
    pub config: RegisterFileConfig,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("configuration rejected with {} error(s)", .0.errors().count())]
    Validation(Diagnostics),
    #[error("failed to serialize configuration for the digest: {0}")]
    Digest(#[from] serde_json::Error),
    #[error("generated Rust module does not parse: {0}")]
    RustApi(#[from] syn::Error),
}

/// Applies the protocol override and address planning, then validates.
///
/// Planner failures are reported as error diagnostics, so the returned report
/// is complete either way.
pub fn prepare(
    config: &RegisterFileConfig,
    options: &GenerateOptions,
) -> (RegisterFileConfig, Diagnostics) {
    let mut config = config.clone();
    if let Some(protocol) = options.protocol {
        config.bus_protocol = protocol;
    }

    let mut diagnostics = Diagnostics::new();
    if options.auto_address {
        match AddressPlanner::new(&config).assign(&config) {
            Ok(planned) => config = planned,
            Err(err) => {
                err.report(&mut diagnostics);
                return (config, diagnostics);
            }
        }
    }
    diagnostics.extend(validate(&config));
    (config, diagnostics)
}

/// Runs the whole pipeline and renders every artifact.
///
/// Output is a pure function of `config` and `options`.
pub fn generate(
    config: &RegisterFileConfig,
    options: &GenerateOptions,
) -> Result<GenerationOutput, GenerateError> {
    info!(
        module = %config.module_name,
        registers = config.registers.len(),
        "generating register file"
    );
    let (config, diagnostics) = prepare(config, options);
    for diagnostic in diagnostics.warnings() {
        warn!("{}", diagnostic);
    }
    if diagnostics.has_errors() {
        return Err(GenerateError::Validation(diagnostics));
    }

    let digest = config_digest(&config)?;
    debug!(%digest, protocol = %config.bus_protocol, "configuration validated");
    let provenance = Provenance::new(options.tool.clone(), options.timestamp.clone(), digest);

    let verilog = VerilogGenerator::generate(&config, &provenance);
    let header = HeaderGenerator::generate(&config, &provenance);
    let doc = DocGenerator::generate(&config, &provenance);
    let rust = if options.rust_api {
        Some(RustApiGenerator::generate(&config)?)
    } else {
        None
    };
    info!(
        module = %config.module_name,
        warnings = diagnostics.len(),
        "generation complete"
    );

    Ok(GenerationOutput {
        verilog,
        header,
        doc,
        rust,
        diagnostics,
        digest: provenance.digest,
        config,
    })
}

/// SHA-256 over the canonical JSON serialization.
pub fn config_digest(config: &RegisterFileConfig) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(config)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
