// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{
    hex_literal, BusAdapter, BusSignals, Port, ResetStyle, Snippet, READ_ERROR, WRITE_ERROR,
};
use regforge_ir::{BusProtocol, RegisterFileConfig};

/// OCP slave, simple subset: commands are always accepted and every WR/RD gets
/// a registered response one cycle later (DVA, or ERR on failure).
#[derive(Debug, Clone, Copy, Default)]
pub struct OcpAdapter;

impl BusAdapter for OcpAdapter {
    fn protocol(&self) -> BusProtocol {
        BusProtocol::Ocp
    }

    fn ports(&self, config: &RegisterFileConfig) -> Vec<Port> {
        vec![
            Port::input("MCmd", Some(3)),
            Port::input("MAddr", Some(config.addr_width)),
            Port::input("MData", Some(config.data_width)),
            Port::input("MByteEn", Some(config.byte_lanes())),
            Port::output("SCmdAccept", None),
            Port::output_reg("SResp", Some(2)),
            Port::output_reg("SData", Some(config.data_width)),
        ]
    }

    fn signals(&self, config: &RegisterFileConfig) -> BusSignals {
        BusSignals {
            write_enable: "(MCmd == OCP_CMD_WR)".into(),
            write_addr: "MAddr".into(),
            write_data: "MData".into(),
            write_strobe: config.byte_enable.then(|| "MByteEn".to_string()),
            read_enable: "(MCmd == OCP_CMD_RD)".into(),
            read_addr: "MAddr".into(),
            read_data: "ocp_rd_data".into(),
        }
    }

    fn declarations(&self, config: &RegisterFileConfig, out: &mut Snippet) {
        out.line(1, "localparam OCP_CMD_WR    = 3'b001;");
        out.line(1, "localparam OCP_CMD_RD    = 3'b010;");
        out.line(1, "localparam OCP_RESP_NULL = 2'b00;");
        out.line(1, "localparam OCP_RESP_DVA  = 2'b01;");
        out.line(1, "localparam OCP_RESP_ERR  = 2'b11;");
        out.line(1, format!("reg  [{}:0] ocp_rd_data;", config.data_width.saturating_sub(1)));
    }

    fn handshake(&self, config: &RegisterFileConfig, reset: ResetStyle, out: &mut Snippet) {
        out.line(1, "assign SCmdAccept = 1'b1;");
        out.blank();
        out.line(1, format!("always @({}) begin", reset.sensitivity()));
        out.line(2, format!("if ({}) begin", reset.active()));
        out.line(3, "SResp <= OCP_RESP_NULL;");
        out.line(3, format!("SData <= {};", hex_literal(config.data_width, 0)));
        out.line(2, "end else begin");
        out.line(3, "SResp <= OCP_RESP_NULL;");
        out.line(3, "if (MCmd == OCP_CMD_WR) begin");
        out.line(
            4,
            format!("SResp <= {WRITE_ERROR} ? OCP_RESP_ERR : OCP_RESP_DVA;"),
        );
        out.line(3, "end else if (MCmd == OCP_CMD_RD) begin");
        out.line(
            4,
            format!("SResp <= {READ_ERROR} ? OCP_RESP_ERR : OCP_RESP_DVA;"),
        );
        out.line(4, "SData <= ocp_rd_data;");
        out.line(3, "end");
        out.line(2, "end");
        out.line(1, "end");
    }

    fn error_encoding(&self) -> &'static str {
        "SResp = ERR (2'b11)"
    }

    fn read_latency(&self, _config: &RegisterFileConfig) -> u32 {
        1
    }

    fn preferred_data_widths(&self) -> &'static [u32] {
        &[8, 16, 32, 64, 128]
    }

    fn misaligned_is_error(&self, _config: &RegisterFileConfig) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_encodings() {
        let cfg = RegisterFileConfig::new("rf");
        let mut out = Snippet::new();
        OcpAdapter.declarations(&cfg, &mut out);
        assert!(out.as_str().contains("OCP_CMD_WR    = 3'b001"));
        assert!(out.as_str().contains("OCP_RESP_ERR  = 2'b11"));
        assert_eq!(OcpAdapter.signals(&cfg).write_enable, "(MCmd == OCP_CMD_WR)");
    }
}
