// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{
    hex_literal, BusAdapter, BusSignals, Port, ResetStyle, Snippet, READ_ERROR, WRITE_ERROR,
};
use regforge_ir::{BusProtocol, RegisterFileConfig, TypeBehavior};

/// AMBA AXI4-Lite slave.
///
/// AW and W are accepted independently and latched; the write itself fires in
/// the single cycle where both are held and no response is outstanding, which
/// also raises `s_axi_bvalid`. Reads are accepted when no R beat is pending and
/// answered one cycle later with registered data. `SLVERR` is `2'b10`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxiLiteAdapter;

impl BusAdapter for AxiLiteAdapter {
    fn protocol(&self) -> BusProtocol {
        BusProtocol::Axi4Lite
    }

    fn ports(&self, config: &RegisterFileConfig) -> Vec<Port> {
        let aw = config.addr_width;
        let dw = config.data_width;
        vec![
            Port::input("s_axi_awaddr", Some(aw)),
            Port::input("s_axi_awprot", Some(3)),
            Port::input("s_axi_awvalid", None),
            Port::output("s_axi_awready", None),
            Port::input("s_axi_wdata", Some(dw)),
            Port::input("s_axi_wstrb", Some(config.byte_lanes())),
            Port::input("s_axi_wvalid", None),
            Port::output("s_axi_wready", None),
            Port::output_reg("s_axi_bresp", Some(2)),
            Port::output_reg("s_axi_bvalid", None),
            Port::input("s_axi_bready", None),
            Port::input("s_axi_araddr", Some(aw)),
            Port::input("s_axi_arprot", Some(3)),
            Port::input("s_axi_arvalid", None),
            Port::output("s_axi_arready", None),
            Port::output_reg("s_axi_rdata", Some(dw)),
            Port::output_reg("s_axi_rresp", Some(2)),
            Port::output_reg("s_axi_rvalid", None),
            Port::input("s_axi_rready", None),
        ]
    }

    fn signals(&self, config: &RegisterFileConfig) -> BusSignals {
        BusSignals {
            write_enable: "axi_wr_fire".into(),
            write_addr: "axi_awaddr_q".into(),
            write_data: "axi_wdata_q".into(),
            write_strobe: config.byte_enable.then(|| "axi_wstrb_q".to_string()),
            read_enable: "axi_rd_fire".into(),
            read_addr: "s_axi_araddr".into(),
            read_data: "axi_rd_data".into(),
        }
    }

    fn declarations(&self, config: &RegisterFileConfig, out: &mut Snippet) {
        let aw = config.addr_width;
        let dw = config.data_width;
        let lanes = config.byte_lanes();
        out.line(1, "reg         axi_aw_seen;");
        out.line(1, "reg         axi_w_seen;");
        out.line(1, format!("reg  [{}:0] axi_awaddr_q;", aw.saturating_sub(1)));
        out.line(1, format!("reg  [{}:0] axi_wdata_q;", dw.saturating_sub(1)));
        out.line(1, format!("reg  [{}:0] axi_wstrb_q;", lanes.saturating_sub(1)));
        out.line(1, format!("reg  [{}:0] axi_rd_data;", dw.saturating_sub(1)));
        out.line(1, "wire        axi_wr_fire = axi_aw_seen & axi_w_seen & ~s_axi_bvalid;");
        out.line(1, "wire        axi_rd_fire = s_axi_arvalid & s_axi_arready;");
    }

    fn handshake(&self, config: &RegisterFileConfig, reset: ResetStyle, out: &mut Snippet) {
        let aw = config.addr_width;
        let dw = config.data_width;
        let lanes = config.byte_lanes();

        out.line(1, "assign s_axi_awready = ~axi_aw_seen;");
        out.line(1, "assign s_axi_wready  = ~axi_w_seen;");
        out.line(1, "assign s_axi_arready = ~s_axi_rvalid;");
        out.blank();

        out.line(1, "// Write address/data capture and B channel");
        out.line(1, format!("always @({}) begin", reset.sensitivity()));
        out.line(2, format!("if ({}) begin", reset.active()));
        out.line(3, "axi_aw_seen  <= 1'b0;");
        out.line(3, "axi_w_seen   <= 1'b0;");
        out.line(3, format!("axi_awaddr_q <= {};", hex_literal(aw, 0)));
        out.line(3, format!("axi_wdata_q  <= {};", hex_literal(dw, 0)));
        out.line(3, format!("axi_wstrb_q  <= {};", hex_literal(lanes, 0)));
        out.line(3, "s_axi_bvalid <= 1'b0;");
        out.line(3, "s_axi_bresp  <= 2'b00;");
        out.line(2, "end else begin");
        out.line(3, "if (s_axi_awvalid & s_axi_awready) begin");
        out.line(4, "axi_aw_seen  <= 1'b1;");
        out.line(4, "axi_awaddr_q <= s_axi_awaddr;");
        out.line(3, "end");
        out.line(3, "if (s_axi_wvalid & s_axi_wready) begin");
        out.line(4, "axi_w_seen  <= 1'b1;");
        out.line(4, "axi_wdata_q <= s_axi_wdata;");
        out.line(4, "axi_wstrb_q <= s_axi_wstrb;");
        out.line(3, "end");
        out.line(3, "if (axi_wr_fire) begin");
        out.line(4, "axi_aw_seen  <= 1'b0;");
        out.line(4, "axi_w_seen   <= 1'b0;");
        out.line(4, "s_axi_bvalid <= 1'b1;");
        out.line(4, format!("s_axi_bresp  <= {WRITE_ERROR} ? 2'b10 : 2'b00;"));
        out.line(3, "end else if (s_axi_bvalid & s_axi_bready) begin");
        out.line(4, "s_axi_bvalid <= 1'b0;");
        out.line(3, "end");
        out.line(2, "end");
        out.line(1, "end");
        out.blank();

        out.line(1, "// R channel");
        out.line(1, format!("always @({}) begin", reset.sensitivity()));
        out.line(2, format!("if ({}) begin", reset.active()));
        out.line(3, "s_axi_rvalid <= 1'b0;");
        out.line(3, format!("s_axi_rdata  <= {};", hex_literal(dw, 0)));
        out.line(3, "s_axi_rresp  <= 2'b00;");
        out.line(2, "end else if (axi_rd_fire) begin");
        out.line(3, "s_axi_rvalid <= 1'b1;");
        out.line(3, "s_axi_rdata  <= axi_rd_data;");
        out.line(3, format!("s_axi_rresp  <= {READ_ERROR} ? 2'b10 : 2'b00;"));
        out.line(2, "end else if (s_axi_rvalid & s_axi_rready) begin");
        out.line(3, "s_axi_rvalid <= 1'b0;");
        out.line(2, "end");
        out.line(1, "end");
    }

    fn error_encoding(&self) -> &'static str {
        "BRESP/RRESP = SLVERR (2'b10)"
    }

    fn read_latency(&self, _config: &RegisterFileConfig) -> u32 {
        1
    }

    fn preferred_data_widths(&self) -> &'static [u32] {
        &[32, 64]
    }

    fn misaligned_is_error(&self, _config: &RegisterFileConfig) -> bool {
        true
    }

    fn type_conflict(&self, behavior: &TypeBehavior) -> Option<&'static str> {
        behavior
            .needs_pulse_output()
            .then_some("pulse is issued on the single-cycle write fire that raises BVALID")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_five_channels_present() {
        let cfg = RegisterFileConfig::new("rf");
        let ports = AxiLiteAdapter.ports(&cfg);
        for name in [
            "s_axi_awvalid",
            "s_axi_wvalid",
            "s_axi_bvalid",
            "s_axi_arvalid",
            "s_axi_rvalid",
        ] {
            assert!(ports.iter().any(|p| p.name == name), "missing {name}");
        }
    }

    #[test]
    fn test_write_fire_blocks_while_response_pending() {
        let cfg = RegisterFileConfig::new("rf");
        let mut out = Snippet::new();
        AxiLiteAdapter.declarations(&cfg, &mut out);
        assert!(out
            .as_str()
            .contains("axi_wr_fire = axi_aw_seen & axi_w_seen & ~s_axi_bvalid;"));

        let mut glue = Snippet::new();
        AxiLiteAdapter.handshake(&cfg, ResetStyle::new(true), &mut glue);
        assert!(glue.as_str().contains("s_axi_bresp  <= bus_wr_err ? 2'b10 : 2'b00;"));
        assert!(glue.as_str().contains("always @(posedge clk) begin"));
    }
}
