// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{BusAdapter, BusSignals, Port, ResetStyle, Snippet, READ_ERROR, WRITE_ERROR};
use crate::diagnostics::{DiagnosticKind, Diagnostics, Location};
use regforge_ir::{BusProtocol, RegisterFileConfig, TypeBehavior};

/// Largest supported `bus_options.apb.wait_states`.
pub const MAX_WAIT_STATES: u32 = 15;

/// AMBA APB slave. Transfers complete in the access phase (`psel & penable`),
/// optionally stretched by a wait-state counter on `pready`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApbAdapter;

impl ApbAdapter {
    fn wait_states(config: &RegisterFileConfig) -> u32 {
        config.bus_options.apb.wait_states.min(MAX_WAIT_STATES)
    }
}

impl BusAdapter for ApbAdapter {
    fn protocol(&self) -> BusProtocol {
        BusProtocol::Apb
    }

    fn ports(&self, config: &RegisterFileConfig) -> Vec<Port> {
        let mut ports = vec![
            Port::input("paddr", Some(config.addr_width)),
            Port::input("psel", None),
            Port::input("penable", None),
            Port::input("pwrite", None),
            Port::input("pwdata", Some(config.data_width)),
        ];
        if config.byte_enable {
            ports.push(Port::input("pstrb", Some(config.byte_lanes())));
        }
        ports.push(Port::output_reg("prdata", Some(config.data_width)));
        ports.push(Port::output("pready", None));
        ports.push(Port::output("pslverr", None));
        ports
    }

    fn signals(&self, config: &RegisterFileConfig) -> BusSignals {
        let ready = if Self::wait_states(config) > 0 {
            " & pready"
        } else {
            ""
        };
        BusSignals {
            write_enable: format!("psel & penable & pwrite{ready}"),
            write_addr: "paddr".into(),
            write_data: "pwdata".into(),
            write_strobe: config.byte_enable.then(|| "pstrb".to_string()),
            read_enable: format!("psel & penable & ~pwrite{ready}"),
            read_addr: "paddr".into(),
            read_data: "prdata".into(),
        }
    }

    fn declarations(&self, config: &RegisterFileConfig, out: &mut Snippet) {
        if Self::wait_states(config) > 0 {
            out.line(1, "reg  [3:0] apb_wait_cnt;");
        }
    }

    fn handshake(&self, config: &RegisterFileConfig, reset: ResetStyle, out: &mut Snippet) {
        let waits = Self::wait_states(config);
        if waits == 0 {
            out.line(1, "assign pready  = 1'b1;");
            out.line(
                1,
                format!("assign pslverr = psel & penable & (pwrite ? {WRITE_ERROR} : {READ_ERROR});"),
            );
            return;
        }

        out.line(1, format!("always @({}) begin", reset.sensitivity()));
        out.line(2, format!("if ({}) begin", reset.active()));
        out.line(3, "apb_wait_cnt <= 4'd0;");
        out.line(2, "end else if (psel & penable & ~pready) begin");
        out.line(3, "apb_wait_cnt <= apb_wait_cnt + 4'd1;");
        out.line(2, "end else begin");
        out.line(3, "apb_wait_cnt <= 4'd0;");
        out.line(2, "end");
        out.line(1, "end");
        out.blank();
        out.line(1, format!("assign pready  = (apb_wait_cnt == 4'd{waits});"));
        out.line(
            1,
            format!(
                "assign pslverr = psel & penable & pready & (pwrite ? {WRITE_ERROR} : {READ_ERROR});"
            ),
        );
    }

    fn error_encoding(&self) -> &'static str {
        "pslverr asserted with pready"
    }

    fn read_latency(&self, config: &RegisterFileConfig) -> u32 {
        1 + Self::wait_states(config)
    }

    fn preferred_data_widths(&self) -> &'static [u32] {
        &[8, 16, 32]
    }

    fn misaligned_is_error(&self, _config: &RegisterFileConfig) -> bool {
        true
    }

    fn type_conflict(&self, behavior: &TypeBehavior) -> Option<&'static str> {
        behavior
            .read_mutates()
            .map(|_| "read side effect is gated to the single APB access cycle")
    }

    fn check_options(&self, config: &RegisterFileConfig, diags: &mut Diagnostics) {
        let waits = config.bus_options.apb.wait_states;
        if waits > MAX_WAIT_STATES {
            diags.error(
                DiagnosticKind::InvalidBusOption,
                Location::Config,
                format!("apb.wait_states must be 0..={MAX_WAIT_STATES}, got {waits}"),
            );
        }
    }
}
