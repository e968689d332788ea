// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{
    hex_literal, BusAdapter, BusSignals, Port, ResetStyle, Snippet, READ_ERROR, WRITE_ERROR,
};
use regforge_ir::{BusProtocol, RegisterFileConfig};

/// Generic `req`/`ack` handshake.
///
/// By default reads are combinational and `ack` follows `req`, so every cycle
/// with `req` high is one complete transfer. With `custom.registered_read` the
/// response (`rdata`, `ack`, `err`) is registered and a request is accepted
/// once per acknowledge.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomAdapter;

impl CustomAdapter {
    fn registered(config: &RegisterFileConfig) -> bool {
        config.bus_options.custom.registered_read
    }
}

impl BusAdapter for CustomAdapter {
    fn protocol(&self) -> BusProtocol {
        BusProtocol::Custom
    }

    fn ports(&self, config: &RegisterFileConfig) -> Vec<Port> {
        let mut ports = vec![
            Port::input("addr", Some(config.addr_width)),
            Port::input("wdata", Some(config.data_width)),
            Port::input("wr_en", None),
            Port::input("rd_en", None),
            Port::input("byte_en", Some(config.byte_lanes())),
            Port::input("req", None),
            Port::output_reg("rdata", Some(config.data_width)),
        ];
        if Self::registered(config) {
            ports.push(Port::output_reg("ack", None));
            ports.push(Port::output_reg("err", None));
        } else {
            ports.push(Port::output("ack", None));
            ports.push(Port::output("err", None));
        }
        ports
    }

    fn signals(&self, config: &RegisterFileConfig) -> BusSignals {
        let strobe = config.byte_enable.then(|| "byte_en".to_string());
        if Self::registered(config) {
            BusSignals {
                write_enable: "req & wr_en & ~ack".into(),
                write_addr: "addr".into(),
                write_data: "wdata".into(),
                write_strobe: strobe,
                read_enable: "req & rd_en & ~ack".into(),
                read_addr: "addr".into(),
                read_data: "custom_rd_data".into(),
            }
        } else {
            BusSignals {
                write_enable: "req & wr_en".into(),
                write_addr: "addr".into(),
                write_data: "wdata".into(),
                write_strobe: strobe,
                read_enable: "req & rd_en".into(),
                read_addr: "addr".into(),
                read_data: "rdata".into(),
            }
        }
    }

    fn declarations(&self, config: &RegisterFileConfig, out: &mut Snippet) {
        if Self::registered(config) {
            out.line(1, format!("reg  [{}:0] custom_rd_data;", config.data_width.saturating_sub(1)));
        }
    }

    fn handshake(&self, config: &RegisterFileConfig, reset: ResetStyle, out: &mut Snippet) {
        if Self::registered(config) {
            out.line(1, format!("always @({}) begin", reset.sensitivity()));
            out.line(2, format!("if ({}) begin", reset.active()));
            out.line(3, "ack   <= 1'b0;");
            out.line(3, "err   <= 1'b0;");
            out.line(3, format!("rdata <= {};", hex_literal(config.data_width, 0)));
            out.line(2, "end else begin");
            out.line(3, "ack <= req & ~ack;");
            out.line(
                3,
                format!(
                    "err <= req & ~ack & ((wr_en & {WRITE_ERROR}) | (rd_en & {READ_ERROR}));"
                ),
            );
            out.line(3, "if (req & rd_en & ~ack) begin");
            out.line(4, "rdata <= custom_rd_data;");
            out.line(3, "end");
            out.line(2, "end");
            out.line(1, "end");
            return;
        }

        out.line(1, "assign ack = req;");
        out.line(
            1,
            format!("assign err = req & ((wr_en & {WRITE_ERROR}) | (rd_en & {READ_ERROR}));"),
        );
    }

    fn error_encoding(&self) -> &'static str {
        "err asserted with ack"
    }

    fn read_latency(&self, config: &RegisterFileConfig) -> u32 {
        u32::from(Self::registered(config))
    }

    fn preferred_data_widths(&self) -> &'static [u32] {
        &[]
    }

    fn misaligned_is_error(&self, _config: &RegisterFileConfig) -> bool {
        false
    }
}
