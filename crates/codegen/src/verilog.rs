// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Synthesizable Verilog for a register file.
//!
//! The module is laid out in a fixed order: banner, ports, address constants,
//! adapter declarations, storage, error wires, the register update block, the
//! read muxes, the bus handshake and finally the hardware field outputs. The
//! update block applies hardware writes first, then bus writes (one if/else-if
//! chain per segment, lower port index first) and read side effects last.

use crate::Provenance;
use regforge_core::bus::{
    adapter_for, hex_literal, BusAdapter, BusSignals, Port, ResetStyle, Snippet, READ_ERROR,
    WRITE_ERROR,
};
use regforge_core::layout::{FileLayout, LockTap, RegisterLayout, Segment};
use regforge_ir::{
    width_mask, BitRange, ErrorResponse, PulseLevel, ReadEffect, RegisterFileConfig, WriteEffect,
};
use tracing::debug;

pub struct VerilogGenerator;

impl VerilogGenerator {
    /// Renders the module for a planned, validated configuration.
    pub fn generate(config: &RegisterFileConfig, provenance: &Provenance) -> String {
        let adapter = adapter_for(config.bus_protocol);
        let layout = FileLayout::new(config);
        let emitter = Emitter::new(config, adapter.as_ref(), &layout);
        emitter.emit(provenance)
    }
}

struct WritePort {
    enable: String,
    addr: String,
    data: String,
    strobe: Option<String>,
}

struct ReadPort {
    enable: String,
    addr: String,
    data: String,
    reports_errors: bool,
}

struct Emitter<'a> {
    config: &'a RegisterFileConfig,
    adapter: &'a dyn BusAdapter,
    layout: &'a FileLayout,
    reset: ResetStyle,
    write_ports: Vec<WritePort>,
    read_ports: Vec<ReadPort>,
}

impl<'a> Emitter<'a> {
    fn new(
        config: &'a RegisterFileConfig,
        adapter: &'a dyn BusAdapter,
        layout: &'a FileLayout,
    ) -> Self {
        let BusSignals {
            write_enable,
            write_addr,
            write_data,
            write_strobe,
            read_enable,
            read_addr,
            read_data,
        } = adapter.signals(config);

        let mut write_ports = vec![WritePort {
            enable: write_enable,
            addr: write_addr,
            data: write_data,
            strobe: write_strobe,
        }];
        for i in 1..config.num_write_ports {
            write_ports.push(WritePort {
                enable: format!("wp{i}_en"),
                addr: format!("wp{i}_addr"),
                data: format!("wp{i}_wdata"),
                strobe: config.byte_enable.then(|| format!("wp{i}_strb")),
            });
        }

        let mut read_ports = vec![ReadPort {
            enable: read_enable,
            addr: read_addr,
            data: read_data,
            reports_errors: true,
        }];
        for i in 1..config.num_read_ports {
            read_ports.push(ReadPort {
                enable: format!("rp{i}_en"),
                addr: format!("rp{i}_addr"),
                data: format!("rp{i}_rdata"),
                reports_errors: false,
            });
        }

        Self {
            config,
            adapter,
            layout,
            reset: ResetStyle::from_config(config),
            write_ports,
            read_ports,
        }
    }

    fn emit(&self, provenance: &Provenance) -> String {
        let mut out = Snippet::new();
        self.banner(provenance, &mut out);
        self.module_header(&mut out);
        self.addresses(&mut out);
        self.declarations(&mut out);
        self.storage(&mut out);
        self.error_wires(&mut out);
        self.update_block(&mut out);
        for port in &self.read_ports {
            self.read_mux(port, &mut out);
        }
        self.handshake(&mut out);
        self.field_outputs(&mut out);
        out.line(0, "endmodule");
        out.into_string()
    }

    fn banner(&self, provenance: &Provenance, out: &mut Snippet) {
        let rule = format!("// {}", "-".repeat(77));
        out.line(0, &rule);
        out.line(
            0,
            format!(
                "// {}: {} register file",
                self.config.module_name,
                self.config.bus_protocol.display_name()
            ),
        );
        out.line(0, format!("// Generated by {}", provenance.tool));
        out.line(0, format!("// Timestamp:     {}", provenance.timestamp));
        out.line(0, format!("// Config digest: sha256:{}", provenance.digest));
        out.line(
            0,
            format!(
                "// Data width {}, address width {}, {} reset",
                self.config.data_width,
                self.config.addr_width,
                if self.reset.is_sync() {
                    "synchronous active-high"
                } else {
                    "asynchronous active-low"
                }
            ),
        );
        out.line(0, "// Do not edit by hand.");
        out.line(0, &rule);
        out.blank();
    }

    fn module_header(&self, out: &mut Snippet) {
        let cfg = self.config;
        let mut ports = vec![
            Port::input("clk", None),
            Port::input(self.reset.port(), None),
        ];
        ports.extend(self.adapter.ports(cfg));
        for i in 1..cfg.num_write_ports {
            ports.push(Port::input(format!("wp{i}_en"), None));
            ports.push(Port::input(format!("wp{i}_addr"), Some(cfg.addr_width)));
            ports.push(Port::input(format!("wp{i}_wdata"), Some(cfg.data_width)));
            if cfg.byte_enable {
                ports.push(Port::input(format!("wp{i}_strb"), Some(cfg.byte_lanes())));
            }
        }
        for i in 1..cfg.num_read_ports {
            ports.push(Port::input(format!("rp{i}_en"), None));
            ports.push(Port::input(format!("rp{i}_addr"), Some(cfg.addr_width)));
            ports.push(Port::output_reg(format!("rp{i}_rdata"), Some(cfg.data_width)));
        }
        for reg in &self.layout.registers {
            for hw in &reg.hw_fields {
                let width = Some(hw.range.width());
                if hw.output {
                    ports.push(Port::output(format!("{}_o", hw.stem), width));
                }
                if hw.input {
                    ports.push(Port::input(format!("{}_i", hw.stem), width));
                    ports.push(Port::input(format!("{}_we", hw.stem), None));
                }
            }
            for seg in &reg.segments {
                if let Some(pulse) = &seg.pulse_port {
                    ports.push(Port::output_reg(pulse, Some(seg.range.width())));
                }
            }
        }

        out.line(0, format!("module {} (", cfg.module_name));
        let last = ports.len().saturating_sub(1);
        for (i, port) in ports.iter().enumerate() {
            let sep = if i == last { "" } else { "," };
            out.line(1, format!("{}{sep}", port.declaration()));
        }
        out.line(0, ");");
        out.blank();
    }

    fn addresses(&self, out: &mut Snippet) {
        if self.layout.registers.is_empty() {
            return;
        }
        out.line(1, "// Register addresses");
        for reg in &self.layout.registers {
            out.line(
                1,
                format!(
                    "localparam {} = {};",
                    addr_param(reg),
                    hex_literal(self.config.addr_width, u128::from(reg.address))
                ),
            );
        }
        out.blank();
    }

    fn declarations(&self, out: &mut Snippet) {
        let mut decls = Snippet::new();
        self.adapter.declarations(self.config, &mut decls);
        if !decls.is_empty() {
            out.line(1, "// Bus interface state");
            out.append(decls);
            out.blank();
        }
    }

    fn storage(&self, out: &mut Snippet) {
        if self.layout.registers.is_empty() {
            return;
        }
        out.line(1, "// Register storage");
        for reg in &self.layout.registers {
            out.line(1, format!("reg [{}:0] {};", reg.width.saturating_sub(1), storage(reg)));
            for seg in &reg.segments {
                if let Some(flag) = &seg.written_flag {
                    out.line(1, format!("reg {flag};"));
                }
            }
        }
        out.blank();
    }

    fn error_wires(&self, out: &mut Snippet) {
        let cfg = self.config;
        let port = &self.write_ports[0];
        out.line(1, "// Bus error reporting");
        out.line(1, "reg  rd_decode_err;");

        let hits: Vec<String> = self
            .layout
            .registers
            .iter()
            .map(|reg| format!("({} == {})", port.addr, addr_param(reg)))
            .collect();
        let decode = if hits.is_empty() {
            "1'b1".to_string()
        } else {
            format!("~({})", hits.join(" | "))
        };
        out.line(1, format!("wire wr_decode_err = {decode};"));

        let mut locked = Vec::new();
        for reg in &self.layout.registers {
            for seg in reg.segments.iter().filter(|s| s.sw_write) {
                if let Some(active) = lock_active(&seg.locks) {
                    locked.push(format!(
                        "(({} == {}) & {active})",
                        port.addr,
                        addr_param(reg)
                    ));
                }
            }
        }
        let lock = if locked.is_empty() {
            "1'b0".to_string()
        } else {
            locked.join(" | ")
        };
        out.line(1, format!("wire wr_lock_err = {lock};"));

        let (write_err, read_err) = match cfg.bus_options.error_response {
            ErrorResponse::Okay => ("1'b0", "1'b0"),
            ErrorResponse::Slverr if cfg.bus_options.lock_error => {
                ("wr_decode_err | wr_lock_err", "rd_decode_err")
            }
            ErrorResponse::Slverr => ("wr_decode_err", "rd_decode_err"),
        };
        out.line(1, format!("wire {WRITE_ERROR} = {write_err};"));
        out.line(1, format!("wire {READ_ERROR} = {read_err};"));
        out.blank();
    }

    fn update_block(&self, out: &mut Snippet) {
        if self.layout.registers.is_empty() {
            return;
        }
        out.line(1, "// Register updates");
        out.line(1, format!("always @({}) begin", self.reset.sensitivity()));
        out.line(2, format!("if ({}) begin", self.reset.active()));
        for reg in &self.layout.registers {
            out.line(3, format!("{} <= {};", storage(reg), hex_literal(reg.width, reg.reset)));
            for seg in &reg.segments {
                if let Some(flag) = &seg.written_flag {
                    out.line(3, format!("{flag} <= 1'b0;"));
                }
                if let Some(pulse) = &seg.pulse_port {
                    out.line(3, format!("{pulse} <= {};", hex_literal(seg.range.width(), 0)));
                }
            }
        }
        out.line(2, "end else begin");
        self.hardware_writes(out);
        for reg in &self.layout.registers {
            for seg in reg.segments.iter().filter(|s| s.sw_write) {
                self.bus_write(reg, seg, out);
            }
        }
        self.read_effects(out);
        out.line(2, "end");
        out.line(1, "end");
        out.blank();
    }

    fn hardware_writes(&self, out: &mut Snippet) {
        for reg in &self.layout.registers {
            for hw in reg.hw_fields.iter().filter(|h| h.input) {
                out.line(3, format!("if ({}_we) begin", hw.stem));
                out.line(
                    4,
                    format!(
                        "{} <= {}_i;",
                        part(&storage(reg), hw.range.high(), hw.range.low(), reg.width),
                        hw.stem
                    ),
                );
                out.line(3, "end");
            }
        }
    }

    fn bus_write(&self, reg: &RegisterLayout, seg: &Segment, out: &mut Snippet) {
        debug!(register = %reg.name, field = ?seg.field, reg_type = %seg.reg_type, "emitting write path");
        let label = match &seg.field {
            Some(field) => format!("{}.{}", reg.name, field),
            None => reg.name.clone(),
        };
        out.line(3, format!("// {label}: {}", seg.reg_type));

        let gates = gate_terms(seg);
        for (i, port) in self.write_ports.iter().enumerate() {
            let mut cond = format!("{} & ({} == {})", port.enable, port.addr, addr_param(reg));
            for gate in &gates {
                cond.push_str(&format!(" & {gate}"));
            }
            if i == 0 {
                out.line(3, format!("if ({cond}) begin"));
            } else {
                out.line(3, format!("end else if ({cond}) begin"));
            }
            self.write_body(reg, seg, port, out);
        }
        if let Some(pulse) = &seg.pulse_port {
            out.line(3, "end else begin");
            out.line(4, format!("{pulse} <= {};", hex_literal(seg.range.width(), 0)));
        }
        out.line(3, "end");
    }

    fn write_body(&self, reg: &RegisterLayout, seg: &Segment, port: &WritePort, out: &mut Snippet) {
        let dw = self.config.data_width;
        let target = storage(reg);
        let pieces = self.pieces(seg.range, port.strobe.is_some());

        if let (WriteEffect::Pulse(level), Some(pulse)) =
            (seg.behavior.write_effect, &seg.pulse_port)
        {
            let invert = if level == PulseLevel::Low { "~" } else { "" };
            let seg_width = seg.range.width();
            if port.strobe.is_some() {
                out.line(4, format!("{pulse} <= {};", hex_literal(seg_width, 0)));
            }
            for (lane, hi, lo) in &pieces {
                let indent = self.open_lane(port, *lane, out);
                let rel = part(pulse, hi - seg.range.low(), lo - seg.range.low(), seg_width);
                out.line(
                    indent,
                    format!("{rel} <= {invert}{};", part(&port.data, *hi, *lo, dw)),
                );
                out.line(
                    indent,
                    format!(
                        "{} <= {};",
                        part(&target, *hi, *lo, reg.width),
                        hex_literal(hi - lo + 1, 0)
                    ),
                );
                self.close_lane(port, out);
            }
        } else {
            for (lane, hi, lo) in &pieces {
                let lhs = part(&target, *hi, *lo, reg.width);
                let data = part(&port.data, *hi, *lo, dw);
                let Some(rhs) = next_value(seg.behavior.write_effect, &lhs, &data) else {
                    continue;
                };
                let indent = self.open_lane(port, *lane, out);
                out.line(indent, format!("{lhs} <= {rhs};"));
                self.close_lane(port, out);
            }
        }

        if let Some(flag) = &seg.written_flag {
            out.line(4, format!("{flag} <= 1'b1;"));
        }
    }

    /// Splits `range` into `(lane, high, low)` pieces along byte lanes.
    fn pieces(&self, range: BitRange, strobed: bool) -> Vec<(u32, u32, u32)> {
        if !strobed {
            return vec![(0, range.high(), range.low())];
        }
        (0..self.config.byte_lanes())
            .filter_map(|lane| {
                let lo = range.low().max(lane * 8);
                let hi = range.high().min(lane * 8 + 7);
                (lo <= hi).then_some((lane, hi, lo))
            })
            .collect()
    }

    fn open_lane(&self, port: &WritePort, lane: u32, out: &mut Snippet) -> usize {
        match &port.strobe {
            Some(strobe) => {
                out.line(4, format!("if ({strobe}[{lane}]) begin"));
                5
            }
            None => 4,
        }
    }

    fn close_lane(&self, port: &WritePort, out: &mut Snippet) {
        if port.strobe.is_some() {
            out.line(4, "end");
        }
    }

    fn read_effects(&self, out: &mut Snippet) {
        for reg in &self.layout.registers {
            let effects: Vec<(&Segment, ReadEffect)> = reg
                .segments
                .iter()
                .filter_map(|s| s.read_effect().map(|e| (s, e)))
                .collect();
            if effects.is_empty() {
                continue;
            }
            // One strobe per cycle regardless of how many ports read the register.
            let strobes: Vec<String> = self
                .read_ports
                .iter()
                .map(|port| {
                    format!("({} & ({} == {}))", port.enable, port.addr, addr_param(reg))
                })
                .collect();
            out.line(3, format!("// {}: read side effect", reg.name));
            out.line(3, format!("if ({}) begin", strobes.join(" | ")));
            for (seg, effect) in effects {
                let width = seg.range.width();
                let value = match effect {
                    ReadEffect::Clear => hex_literal(width, 0),
                    ReadEffect::Set => hex_literal(width, width_mask(width)),
                };
                out.line(
                    4,
                    format!(
                        "{} <= {value};",
                        part(&storage(reg), seg.range.high(), seg.range.low(), reg.width)
                    ),
                );
            }
            out.line(3, "end");
        }
    }

    fn read_mux(&self, port: &ReadPort, out: &mut Snippet) {
        let dw = self.config.data_width;
        let zero = hex_literal(dw, 0);
        out.line(1, format!("// Read mux: {}", port.data));
        out.line(1, "always @(*) begin");
        out.line(2, format!("{} = {zero};", port.data));
        if port.reports_errors {
            out.line(2, "rd_decode_err = 1'b0;");
        }
        out.line(2, format!("case ({})", port.addr));
        for reg in &self.layout.registers {
            let mask = reg.read_mask();
            let value = if mask == 0 {
                zero.clone()
            } else if mask == reg.full_mask() {
                storage(reg)
            } else {
                format!("{} & {}", storage(reg), hex_literal(reg.width, mask))
            };
            out.line(3, format!("{}: {} = {value};", addr_param(reg), port.data));
        }
        if port.reports_errors {
            out.line(3, "default: rd_decode_err = 1'b1;");
        } else {
            out.line(3, "default: ;");
        }
        out.line(2, "endcase");
        out.line(1, "end");
        out.blank();
    }

    fn handshake(&self, out: &mut Snippet) {
        out.line(
            1,
            format!(
                "// {} handshake",
                self.adapter.protocol().display_name()
            ),
        );
        self.adapter.handshake(self.config, self.reset, out);
        out.blank();
    }

    fn field_outputs(&self, out: &mut Snippet) {
        let outputs: Vec<String> = self
            .layout
            .registers
            .iter()
            .flat_map(|reg| {
                reg.hw_fields.iter().filter(|h| h.output).map(move |hw| {
                    format!(
                        "assign {}_o = {};",
                        hw.stem,
                        part(&storage(reg), hw.range.high(), hw.range.low(), reg.width)
                    )
                })
            })
            .collect();
        if outputs.is_empty() {
            return;
        }
        out.line(1, "// Hardware field outputs");
        for line in outputs {
            out.line(1, line);
        }
        out.blank();
    }
}

fn addr_param(reg: &RegisterLayout) -> String {
    format!("ADDR_{}", reg.name.to_ascii_uppercase())
}

fn storage(reg: &RegisterLayout) -> String {
    format!("{}_reg", reg.ident)
}

/// `name`, `name[hi:lo]` or `name[bit]` depending on how much of a
/// `width`-bit vector the slice covers.
fn part(name: &str, hi: u32, lo: u32, width: u32) -> String {
    if lo == 0 && hi + 1 == width {
        name.to_string()
    } else if hi == lo {
        format!("{name}[{lo}]")
    } else {
        format!("{name}[{hi}:{lo}]")
    }
}

fn tap(tap: &LockTap) -> String {
    let source = format!("{}_reg", tap.register);
    if tap.range.is_single_bit() {
        format!("{source}[{}]", tap.range.low())
    } else {
        format!("(|{source}{})", tap.range.verilog_select())
    }
}

/// True while any of `locks` is set.
fn lock_active(locks: &[LockTap]) -> Option<String> {
    match locks {
        [] => None,
        [single] => Some(tap(single)),
        many => Some(format!(
            "({})",
            many.iter().map(tap).collect::<Vec<_>>().join(" | ")
        )),
    }
}

/// Write gates of a segment: lock, magic value, write-once flag.
fn gate_terms(seg: &Segment) -> Vec<String> {
    let mut gates = Vec::new();
    if let Some(active) = lock_active(&seg.locks) {
        gates.push(format!("~{active}"));
    }
    for magic in &seg.magic {
        gates.push(format!(
            "({}_reg == {})",
            magic.register,
            hex_literal(magic.width, magic.value)
        ));
    }
    if let Some(flag) = &seg.written_flag {
        gates.push(format!("~{flag}"));
    }
    gates
}

fn next_value(effect: WriteEffect, current: &str, data: &str) -> Option<String> {
    match effect {
        WriteEffect::Ignore | WriteEffect::Pulse(_) => None,
        WriteEffect::Store => Some(data.to_string()),
        WriteEffect::ClearOnOne => Some(format!("{current} & ~{data}")),
        WriteEffect::ClearOnZero => Some(format!("{current} & {data}")),
        WriteEffect::SetOnOne => Some(format!("{current} | {data}")),
        WriteEffect::SetOnZero => Some(format!("{current} | ~{data}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regforge_ir::{AccessHint, BusProtocol, Field, LockRelation, Register, RegisterType};

    fn render(cfg: &RegisterFileConfig) -> String {
        VerilogGenerator::generate(cfg, &Provenance::new("regforge test", "0", "00"))
    }

    fn config(regs: Vec<Register>) -> RegisterFileConfig {
        let mut cfg = RegisterFileConfig::new("rf");
        cfg.registers = regs;
        cfg
    }

    #[test]
    fn test_part_selects() {
        assert_eq!(part("x_reg", 31, 0, 32), "x_reg");
        assert_eq!(part("x_reg", 7, 0, 32), "x_reg[7:0]");
        assert_eq!(part("x_reg", 4, 4, 32), "x_reg[4]");
        assert_eq!(part("pwdata", 7, 0, 8), "pwdata");
    }

    #[test]
    fn test_empty_register_file() {
        let out = render(&config(vec![]));
        assert!(out.contains("module rf ("));
        assert!(out.contains("prdata = 32'h00000000;"));
        assert!(out.contains("default: rd_decode_err = 1'b1;"));
        assert!(out.contains("wire wr_decode_err = 1'b1;"));
        assert!(!out.contains("localparam ADDR_"));
        assert!(out.trim_end().ends_with("endmodule"));
    }

    #[test]
    fn test_reset_styles() {
        let mut cfg = config(vec![Register::new("CTRL").at(0).with_reset(0x12)]);
        let async_out = render(&cfg);
        assert!(async_out.contains("input  wire rst_n"));
        assert!(async_out.contains("always @(posedge clk or negedge rst_n) begin"));
        assert!(async_out.contains("ctrl_reg <= 32'h00000012;"));

        cfg.sync_reset = true;
        let sync_out = render(&cfg);
        assert!(sync_out.contains("input  wire rst,"));
        assert!(sync_out.contains("if (rst) begin"));
    }

    #[test]
    fn test_write_effects_per_type() {
        let cases = [
            (RegisterType::Write0Clean, "w_reg <= w_reg & pwdata;"),
            (RegisterType::Write1Set, "w_reg <= w_reg | pwdata;"),
            (RegisterType::Write0Set, "w_reg <= w_reg | ~pwdata;"),
            (RegisterType::ReadClean, "w_reg <= pwdata;"),
        ];
        for (ty, expected) in cases {
            let out = render(&config(vec![Register::new("W").at(0).with_type(ty)]));
            assert!(out.contains(expected), "{ty}: missing {expected}");
        }
    }

    #[test]
    fn test_read_only_has_no_write_path() {
        let out = render(&config(vec![Register::new("ID")
            .at(0)
            .with_type(RegisterType::ReadOnly)
            .with_reset(0xCAFE)]));
        assert!(!out.contains("id_reg <= pwdata"));
        assert!(out.contains("ADDR_ID: prdata = id_reg;"));
    }

    #[test]
    fn test_write_only_reads_zero() {
        let out = render(&config(vec![Register::new("KEY")
            .at(0)
            .with_type(RegisterType::WriteOnly)]));
        assert!(out.contains("ADDR_KEY: prdata = 32'h00000000;"));
        assert!(out.contains("key_reg <= pwdata;"));
    }

    #[test]
    fn test_read_clear_effect_after_read() {
        let out = render(&config(vec![Register::new("EVT")
            .at(0)
            .with_type(RegisterType::ReadClean)]));
        assert!(out.contains("if ((psel & penable & ~pwrite & (paddr == ADDR_EVT))) begin"));
        assert!(out.contains("evt_reg <= 32'h00000000;"));
    }

    #[test]
    fn test_read_effect_fires_once_for_all_read_ports() {
        let mut cfg = config(vec![Register::new("EVT")
            .at(0)
            .with_type(RegisterType::ReadSet)]);
        cfg.num_read_ports = 2;
        let out = render(&cfg);
        assert!(out.contains(
            "if ((psel & penable & ~pwrite & (paddr == ADDR_EVT)) | (rp1_en & (rp1_addr == ADDR_EVT))) begin"
        ));
        assert!(out.contains("evt_reg <= 32'hFFFFFFFF;"));
        assert!(out.contains("output reg  [31:0] rp1_rdata"));
        assert!(out.contains("ADDR_EVT: rp1_rdata = evt_reg;"));
    }

    #[test]
    fn test_extra_write_port_priority_chain() {
        let mut cfg = config(vec![Register::new("CTRL").at(0)]);
        cfg.num_write_ports = 2;
        let out = render(&cfg);
        assert!(out.contains("if (psel & penable & pwrite & (paddr == ADDR_CTRL)) begin"));
        assert!(out.contains("end else if (wp1_en & (wp1_addr == ADDR_CTRL)) begin"));
        assert!(out.contains("ctrl_reg <= wp1_wdata;"));
    }

    #[test]
    fn test_byte_enable_splits_lanes() {
        let mut cfg = config(vec![Register::new("DATA").at(0)]);
        cfg.byte_enable = true;
        let out = render(&cfg);
        assert!(out.contains("input  wire [3:0] pstrb"));
        assert!(out.contains("if (pstrb[0]) begin"));
        assert!(out.contains("data_reg[7:0] <= pwdata[7:0];"));
        assert!(out.contains("if (pstrb[3]) begin"));
        assert!(out.contains("data_reg[31:24] <= pwdata[31:24];"));
    }

    #[test]
    fn test_write_once_flag() {
        let out = render(&config(vec![Register::new("ID")
            .at(0)
            .with_type(RegisterType::WriteOnce)]));
        assert!(out.contains("reg id_written;"));
        assert!(out.contains("id_written <= 1'b0;"));
        assert!(out.contains("& ~id_written) begin"));
        assert!(out.contains("id_written <= 1'b1;"));
    }

    #[test]
    fn test_low_pulse_inverts_data() {
        let out = render(&config(vec![Register::new("STROBE")
            .at(0)
            .with_type(RegisterType::Write0Pulse)]));
        assert!(out.contains("output reg  [31:0] strobe_pulse"));
        assert!(out.contains("strobe_pulse <= ~pwdata;"));
        assert!(out.contains("strobe_pulse <= 32'h00000000;"));
    }

    #[test]
    fn test_sliced_register() {
        let mut reg = Register::new("IRQ").at(0);
        let mut status = Field::new("STATUS", BitRange::new(7, 0).unwrap());
        status.field_type = Some(RegisterType::Write1Clean);
        let mut go = Field::new("GO", BitRange::bit(8));
        go.field_type = Some(RegisterType::Write1Pulse);
        reg.fields = vec![status, go];
        let out = render(&config(vec![reg]));
        assert!(out.contains("// IRQ.STATUS: Write1Clean"));
        assert!(out.contains("irq_reg[7:0] <= irq_reg[7:0] & ~pwdata[7:0];"));
        assert!(out.contains("output reg  [0:0] irq_go_pulse"));
        assert!(out.contains("irq_go_pulse <= pwdata[8];"));
        assert!(out.contains("ADDR_IRQ: prdata = irq_reg & 32'h000000FF;"));
    }

    #[test]
    fn test_hardware_ports() {
        let mut reg = Register::new("STAT").at(0);
        let mut level = Field::new("LEVEL", BitRange::new(7, 4).unwrap());
        level.hw_access = Some(AccessHint::ReadWrite);
        reg.fields.push(level);
        let out = render(&config(vec![reg]));
        assert!(out.contains("output wire [3:0] level_o"));
        assert!(out.contains("input  wire [3:0] level_i"));
        assert!(out.contains("input  wire level_we"));
        assert!(out.contains("stat_reg[7:4] <= level_i;"));
        assert!(out.contains("assign level_o = stat_reg[7:4];"));
        let hw = out.find("if (level_we)").unwrap();
        let bus = out.find("// STAT: ReadWrite").unwrap();
        assert!(hw < bus);
    }

    #[test]
    fn test_multiple_lockers_and_lock_error() {
        let mut data = Register::new("DATA").at(8);
        data.locked_by = vec![LockRelation::new("LOCK_A"), LockRelation::bit("LOCK_B", 3)];
        let mut cfg = config(vec![
            Register::new("LOCK_A").at(0).with_type(RegisterType::LockField),
            Register::new("LOCK_B").at(4).with_type(RegisterType::LockField),
            data,
        ]);
        cfg.bus_options.lock_error = true;
        let out = render(&cfg);
        assert!(out.contains("& ~(lock_a_reg[0] | lock_b_reg[3])) begin"));
        assert!(out.contains("wire bus_wr_err = wr_decode_err | wr_lock_err;"));
        assert!(out.contains("wire wr_lock_err = ((paddr == ADDR_DATA) & (lock_a_reg[0] | lock_b_reg[3]));"));
    }

    #[test]
    fn test_okay_response_never_signals() {
        let mut cfg = config(vec![Register::new("CTRL").at(0)]);
        cfg.bus_options.error_response = ErrorResponse::Okay;
        let out = render(&cfg);
        assert!(out.contains("wire bus_wr_err = 1'b0;"));
        assert!(out.contains("wire bus_rd_err = 1'b0;"));
    }

    #[test]
    fn test_custom_pulse_fires_on_every_acknowledged_request() {
        let mut cfg = config(vec![
            Register::new("GO").at(0).with_type(RegisterType::Write1Pulse),
            Register::new("ST").at(4).with_type(RegisterType::ReadClean),
        ]);
        cfg.bus_protocol = BusProtocol::Custom;
        let out = render(&cfg);
        assert!(out.contains("if (req & wr_en & (addr == ADDR_GO)) begin"));
        assert!(out.contains("if ((req & rd_en & (addr == ADDR_ST))) begin"));
        assert!(out.contains("assign ack = req;"));
    }

    #[test]
    fn test_one_shot_paths_use_transfer_enables() {
        let mut variants: Vec<RegisterFileConfig> = BusProtocol::ALL
            .into_iter()
            .map(|protocol| {
                let mut cfg = config(vec![
                    Register::new("GO").at(0).with_type(RegisterType::Write1Pulse),
                    Register::new("ST").at(4).with_type(RegisterType::ReadClean),
                ]);
                cfg.bus_protocol = protocol;
                cfg
            })
            .collect();
        let mut apb_waits = variants[0].clone();
        apb_waits.bus_protocol = BusProtocol::Apb;
        apb_waits.bus_options.apb.wait_states = 2;
        let mut custom_registered = variants[0].clone();
        custom_registered.bus_protocol = BusProtocol::Custom;
        custom_registered.bus_options.custom.registered_read = true;
        variants.extend([apb_waits, custom_registered]);

        for cfg in &variants {
            let signals = adapter_for(cfg.bus_protocol).signals(cfg);
            let out = render(cfg);
            let write = format!(
                "if ({} & ({} == ADDR_GO)) begin",
                signals.write_enable, signals.write_addr
            );
            let read = format!(
                "if (({} & ({} == ADDR_ST))) begin",
                signals.read_enable, signals.read_addr
            );
            assert!(out.contains(&write), "{:?}: {write}", cfg.bus_protocol);
            assert!(out.contains(&read), "{:?}: {read}", cfg.bus_protocol);
        }
    }

    #[test]
    fn test_every_protocol_closes_module() {
        for protocol in BusProtocol::ALL {
            let mut cfg = config(vec![Register::new("CTRL").at(0)]);
            cfg.bus_protocol = protocol;
            let out = render(&cfg);
            assert_eq!(out.matches("endmodule").count(), 1, "{protocol:?}");
            assert_eq!(out.matches("localparam ADDR_CTRL").count(), 1);
        }
    }
}
