// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Bus protocol adapters.
//!
//! Each adapter owns the wire-level contract of one protocol: its port set, the
//! expressions that qualify a completed read or write cycle, the handshake glue
//! and the protocol-specific validation warnings. The register-file emitter is
//! protocol agnostic and only talks to the [`BusAdapter`] trait.
//!
//! Adapter glue may reference two wires the emitter always declares:
//! [`WRITE_ERROR`] (decode or lock error on the current write) and
//! [`READ_ERROR`] (decode error on the current read).

mod apb;
mod axi_lite;
mod custom;
mod ocp;
mod wishbone;

pub use apb::ApbAdapter;
pub use axi_lite::AxiLiteAdapter;
pub use custom::CustomAdapter;
pub use ocp::OcpAdapter;
pub use wishbone::WishboneAdapter;

use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use crate::layout::FileLayout;
use regforge_ir::{BusProtocol, RegisterFileConfig, TypeBehavior};

/// Write-side error wire driven by the emitter.
pub const WRITE_ERROR: &str = "bus_wr_err";
/// Read-side error wire driven by the emitter.
pub const READ_ERROR: &str = "bus_rd_err";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    /// Continuous-assignment output (`output wire`).
    Output,
    /// Procedurally driven output (`output reg`).
    OutputReg,
}

/// One module port. `width == None` is a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub direction: Direction,
    pub width: Option<u32>,
}

impl Port {
    pub fn input(name: impl Into<String>, width: Option<u32>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Input,
            width,
        }
    }

    pub fn output(name: impl Into<String>, width: Option<u32>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::Output,
            width,
        }
    }

    pub fn output_reg(name: impl Into<String>, width: Option<u32>) -> Self {
        Self {
            name: name.into(),
            direction: Direction::OutputReg,
            width,
        }
    }

    /// ANSI port declaration without the trailing comma.
    pub fn declaration(&self) -> String {
        let dir = match self.direction {
            Direction::Input => "input  wire",
            Direction::Output => "output wire",
            Direction::OutputReg => "output reg ",
        };
        match self.width {
            Some(w) => format!("{dir} [{}:0] {}", w.saturating_sub(1), self.name),
            None => format!("{dir} {}", self.name),
        }
    }
}

/// Reset flavor shared by every sequential block of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetStyle {
    sync: bool,
}

impl ResetStyle {
    pub fn new(sync: bool) -> Self {
        Self { sync }
    }

    pub fn from_config(config: &RegisterFileConfig) -> Self {
        Self::new(config.sync_reset)
    }

    pub fn is_sync(&self) -> bool {
        self.sync
    }

    /// Reset port name: active-high `rst` or active-low `rst_n`.
    pub fn port(&self) -> &'static str {
        if self.sync {
            "rst"
        } else {
            "rst_n"
        }
    }

    pub fn sensitivity(&self) -> &'static str {
        if self.sync {
            "posedge clk"
        } else {
            "posedge clk or negedge rst_n"
        }
    }

    /// Condition true while reset is asserted.
    pub fn active(&self) -> &'static str {
        if self.sync {
            "rst"
        } else {
            "!rst_n"
        }
    }
}

/// Expressions the emitter plugs into decode, write and read logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusSignals {
    /// True in the single cycle a bus write completes.
    pub write_enable: String,
    pub write_addr: String,
    pub write_data: String,
    /// Per-byte strobe vector, present only when byte enables are honored.
    pub write_strobe: Option<String>,
    /// True in the single cycle a bus read is accepted.
    pub read_enable: String,
    pub read_addr: String,
    /// Target of the combinational read mux.
    pub read_data: String,
}

/// Protocol-specific half of the generated module.
pub trait BusAdapter {
    fn protocol(&self) -> BusProtocol;

    /// Bus ports, in declaration order, excluding `clk` and reset.
    fn ports(&self, config: &RegisterFileConfig) -> Vec<Port>;

    fn signals(&self, config: &RegisterFileConfig) -> BusSignals;

    /// Internal declarations emitted ahead of the register storage.
    fn declarations(&self, config: &RegisterFileConfig, out: &mut Snippet);

    /// Handshake and response logic emitted after the read mux.
    fn handshake(&self, config: &RegisterFileConfig, reset: ResetStyle, out: &mut Snippet);

    /// Short description of the error response, for documentation.
    fn error_encoding(&self) -> &'static str;

    /// Clock cycles from an accepted read to valid data.
    fn read_latency(&self, config: &RegisterFileConfig) -> u32;

    /// Data widths the protocol is normally used with. Empty means no preference.
    fn preferred_data_widths(&self) -> &'static [u32];

    fn misaligned_is_error(&self, config: &RegisterFileConfig) -> bool;

    /// Warning text when a register type needs extra handling on this protocol.
    fn type_conflict(&self, behavior: &TypeBehavior) -> Option<&'static str> {
        let _ = behavior;
        None
    }

    /// Protocol-specific option checks.
    fn check_options(&self, config: &RegisterFileConfig, diags: &mut Diagnostics) {
        let _ = (config, diags);
    }
}

/// Adapter for `protocol`.
pub fn adapter_for(protocol: BusProtocol) -> Box<dyn BusAdapter> {
    match protocol {
        BusProtocol::Apb => Box::new(ApbAdapter),
        BusProtocol::Axi4Lite => Box::new(AxiLiteAdapter),
        BusProtocol::Wishbone => Box::new(WishboneAdapter),
        BusProtocol::Ocp => Box::new(OcpAdapter),
        BusProtocol::Custom => Box::new(CustomAdapter),
    }
}

/// Protocol warnings shared by every adapter: preferred widths, option checks
/// and register types that need extra handshake logic.
pub fn check_protocol(
    adapter: &dyn BusAdapter,
    config: &RegisterFileConfig,
    diags: &mut Diagnostics,
) {
    let preferred = adapter.preferred_data_widths();
    if !preferred.is_empty() && !preferred.contains(&config.data_width) {
        diags.warning(
            DiagnosticKind::NonStandardDataWidth,
            Location::Config,
            format!(
                "{} is normally used with a data width of {:?}, got {}",
                adapter.protocol().display_name(),
                preferred,
                config.data_width
            ),
        );
    }

    adapter.check_options(config, diags);

    let layout = FileLayout::new(config);
    for reg in &layout.registers {
        for seg in &reg.segments {
            if let Some(reason) = adapter.type_conflict(seg.behavior) {
                let location = match &seg.field {
                    Some(field) => Location::field(&reg.name, field),
                    None => Location::register(&reg.name),
                };
                diags.warning(
                    DiagnosticKind::TypeProtocolMismatch,
                    location,
                    format!(
                        "{} on {}: {}",
                        seg.reg_type,
                        adapter.protocol().display_name(),
                        reason
                    ),
                );
            }
        }
    }
}

/// Sized Verilog hex literal, zero padded to the literal width: `8'h0C`.
pub fn hex_literal(width: u32, value: u128) -> String {
    let digits = width.div_ceil(4).max(1) as usize;
    format!("{width}'h{value:0digits$X}")
}

/// Line-oriented text builder with four-space indentation.
#[derive(Debug, Clone, Default)]
pub struct Snippet {
    text: String,
}

impl Snippet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, indent: usize, text: impl AsRef<str>) {
        for _ in 0..indent {
            self.text.push_str("    ");
        }
        self.text.push_str(text.as_ref());
        self.text.push('\n');
    }

    pub fn blank(&mut self) {
        self.text.push('\n');
    }

    pub fn append(&mut self, other: Snippet) {
        self.text.push_str(&other.text);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}
