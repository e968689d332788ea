// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::{
    hex_literal, BusAdapter, BusSignals, Port, ResetStyle, Snippet, READ_ERROR, WRITE_ERROR,
};
use regforge_ir::{BusProtocol, Granularity, RegisterFileConfig};

/// Wishbone B4 classic slave with a registered, single-cycle `ack`/`err`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WishboneAdapter;

impl BusAdapter for WishboneAdapter {
    fn protocol(&self) -> BusProtocol {
        BusProtocol::Wishbone
    }

    fn ports(&self, config: &RegisterFileConfig) -> Vec<Port> {
        vec![
            Port::input("wb_adr_i", Some(config.addr_width)),
            Port::input("wb_dat_i", Some(config.data_width)),
            Port::output_reg("wb_dat_o", Some(config.data_width)),
            Port::input("wb_we_i", None),
            Port::input("wb_sel_i", Some(config.byte_lanes())),
            Port::input("wb_stb_i", None),
            Port::input("wb_cyc_i", None),
            Port::output_reg("wb_ack_o", None),
            Port::output_reg("wb_err_o", None),
        ]
    }

    fn signals(&self, config: &RegisterFileConfig) -> BusSignals {
        BusSignals {
            write_enable: "wb_access & wb_we_i".into(),
            write_addr: "wb_adr_i".into(),
            write_data: "wb_dat_i".into(),
            write_strobe: config.byte_enable.then(|| "wb_sel_i".to_string()),
            read_enable: "wb_access & ~wb_we_i".into(),
            read_addr: "wb_adr_i".into(),
            read_data: "wb_rd_data".into(),
        }
    }

    fn declarations(&self, config: &RegisterFileConfig, out: &mut Snippet) {
        out.line(1, format!("reg  [{}:0] wb_rd_data;", config.data_width.saturating_sub(1)));
        out.line(
            1,
            "wire        wb_access = wb_cyc_i & wb_stb_i & ~wb_ack_o & ~wb_err_o;",
        );
    }

    fn handshake(&self, config: &RegisterFileConfig, reset: ResetStyle, out: &mut Snippet) {
        out.line(1, format!("always @({}) begin", reset.sensitivity()));
        out.line(2, format!("if ({}) begin", reset.active()));
        out.line(3, "wb_ack_o <= 1'b0;");
        out.line(3, "wb_err_o <= 1'b0;");
        out.line(3, format!("wb_dat_o <= {};", hex_literal(config.data_width, 0)));
        out.line(2, "end else begin");
        out.line(3, "wb_ack_o <= 1'b0;");
        out.line(3, "wb_err_o <= 1'b0;");
        out.line(3, "if (wb_access) begin");
        out.line(4, format!("if (wb_we_i ? {WRITE_ERROR} : {READ_ERROR}) begin"));
        out.line(5, "wb_err_o <= 1'b1;");
        out.line(4, "end else begin");
        out.line(5, "wb_ack_o <= 1'b1;");
        out.line(4, "end");
        out.line(4, "if (~wb_we_i) begin");
        out.line(5, "wb_dat_o <= wb_rd_data;");
        out.line(4, "end");
        out.line(3, "end");
        out.line(2, "end");
        out.line(1, "end");
    }

    fn error_encoding(&self) -> &'static str {
        "wb_err_o instead of wb_ack_o"
    }

    fn read_latency(&self, _config: &RegisterFileConfig) -> u32 {
        1
    }

    fn preferred_data_widths(&self) -> &'static [u32] {
        &[8, 16, 32, 64]
    }

    fn misaligned_is_error(&self, config: &RegisterFileConfig) -> bool {
        config.bus_options.wishbone.granularity == Granularity::Word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_granularity_controls_alignment_severity() {
        let mut cfg = RegisterFileConfig::new("rf");
        assert!(!WishboneAdapter.misaligned_is_error(&cfg));
        cfg.bus_options.wishbone.granularity = Granularity::Word;
        assert!(WishboneAdapter.misaligned_is_error(&cfg));
    }

    #[test]
    fn test_access_excludes_acknowledged_cycle() {
        let cfg = RegisterFileConfig::new("rf");
        let mut out = Snippet::new();
        WishboneAdapter.declarations(&cfg, &mut out);
        assert!(out.as_str().contains("~wb_ack_o & ~wb_err_o"));
    }
}
