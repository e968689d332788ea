// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Markdown register map.

use crate::Provenance;
use regforge_core::bus::adapter_for;
use regforge_ir::{Field, Register, RegisterFileConfig};

pub struct DocGenerator;

impl DocGenerator {
    pub fn generate(config: &RegisterFileConfig, provenance: &Provenance) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {} register map\n\n", config.module_name));
        out.push_str(&format!(
            "Generated by {} at {}.\n\n",
            provenance.tool, provenance.timestamp
        ));
        Self::overview(config, &mut out);
        Self::memory_map(config, &mut out);
        for reg in &config.registers {
            Self::register(config, reg, &mut out);
        }
        out
    }

    fn overview(config: &RegisterFileConfig, out: &mut String) {
        let adapter = adapter_for(config.bus_protocol);
        let reset = if config.sync_reset {
            "synchronous, active-high `rst`"
        } else {
            "asynchronous, active-low `rst_n`"
        };
        out.push_str("## Overview\n\n");
        out.push_str("| Property | Value |\n|---|---|\n");
        out.push_str(&format!(
            "| Bus protocol | {} |\n",
            config.bus_protocol.display_name()
        ));
        out.push_str(&format!("| Data width | {} bits |\n", config.data_width));
        out.push_str(&format!("| Address width | {} bits |\n", config.addr_width));
        out.push_str(&format!("| Reset | {reset} |\n"));
        out.push_str(&format!(
            "| Byte enables | {} |\n",
            if config.byte_enable { "yes" } else { "no" }
        ));
        out.push_str(&format!(
            "| Read latency | {} cycle(s) |\n",
            adapter.read_latency(config)
        ));
        out.push_str(&format!("| Error response | {} |\n", adapter.error_encoding()));
        out.push_str(&format!(
            "| Ports | {} write, {} read |\n\n",
            config.num_write_ports, config.num_read_ports
        ));
    }

    fn memory_map(config: &RegisterFileConfig, out: &mut String) {
        out.push_str("## Memory map\n\n");
        if config.registers.is_empty() {
            out.push_str("No registers.\n\n");
            return;
        }
        out.push_str("| Address | Register | Type | Reset | Description |\n");
        out.push_str("|---|---|---|---|---|\n");
        let mut sorted: Vec<&Register> = config.registers.iter().collect();
        sorted.sort_by_key(|r| r.address.unwrap_or_default());
        for reg in sorted {
            let width = config.register_width(reg);
            out.push_str(&format!(
                "| {} | [{}](#{}) | {} | {} | {} |\n",
                address(config, reg),
                reg.name,
                reg.name.to_ascii_lowercase(),
                reg.reg_type,
                hex(reg.effective_reset(width), width),
                cell(&reg.description)
            ));
        }
        out.push('\n');
    }

    fn register(config: &RegisterFileConfig, reg: &Register, out: &mut String) {
        let width = config.register_width(reg);
        out.push_str(&format!("## {}\n\n", reg.name));
        out.push_str(&format!("- **Address:** `{}`\n", address(config, reg)));
        out.push_str(&format!("- **Type:** {}\n", reg.reg_type));
        out.push_str(&format!("- **Width:** {width} bits\n"));
        out.push_str(&format!(
            "- **Reset value:** `{}`\n",
            hex(reg.effective_reset(width), width)
        ));
        if !reg.locked_by.is_empty() {
            let lockers: Vec<String> = reg.locked_by.iter().map(|l| format!("`{l}`")).collect();
            out.push_str(&format!("- **Locked by:** {}\n", lockers.join(", ")));
        }
        if let Some(magic) = &reg.magic_dependency {
            out.push_str(&format!(
                "- **Writable when:** `{}` holds `{:#X}`\n",
                magic.source, magic.value
            ));
        }
        out.push('\n');
        if !reg.description.is_empty() {
            out.push_str(reg.description.trim());
            out.push_str("\n\n");
        }

        out.push_str("| Bits | Name | Type | Reset | Description |\n");
        out.push_str("|---|---|---|---|---|\n");
        if reg.fields.is_empty() {
            out.push_str(&format!(
                "| [{}:0] | {} | {} | {} | {} |\n",
                width.saturating_sub(1),
                reg.name,
                reg.reg_type,
                hex(reg.effective_reset(width), width),
                cell(&reg.description)
            ));
        }
        // Declaration order, matching the header.
        for field in &reg.fields {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                bits(field),
                field.name,
                field.effective_type(reg),
                hex(field.effective_reset(reg), field.bit_range.width()),
                cell(&field_text(field))
            ));
        }
        out.push('\n');
    }
}

fn address(config: &RegisterFileConfig, reg: &Register) -> String {
    let digits = config.addr_width.div_ceil(4).max(1) as usize;
    format!("0x{:0digits$X}", reg.address.unwrap_or_default())
}

fn hex(value: u128, width: u32) -> String {
    let digits = width.div_ceil(4).max(1) as usize;
    format!("0x{value:0digits$X}")
}

fn bits(field: &Field) -> String {
    if field.bit_range.is_single_bit() {
        field.bit_range.low().to_string()
    } else {
        format!("[{}:{}]", field.bit_range.high(), field.bit_range.low())
    }
}

fn field_text(field: &Field) -> String {
    match (field.description.trim(), field.function.trim()) {
        (d, "") => d.to_string(),
        ("", f) => f.to_string(),
        (d, f) => format!("{d} ({f})"),
    }
}

/// Single-line table cell text.
fn cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regforge_ir::{BitRange, LockRelation, RegisterType};

    #[test]
    fn test_sections_and_tables() {
        let mut cfg = RegisterFileConfig::new("rf");
        let mut ctrl = Register::new("CTRL").at(0x4).with_reset(0x1);
        ctrl.description = "Control | status".into();
        let mut en = regforge_ir::Field::new("EN", BitRange::bit(0));
        en.description = "Enable".into();
        ctrl.fields.push(en);
        ctrl.fields.push(regforge_ir::Field::new("MODE", BitRange::new(7, 4).unwrap()));
        ctrl.locked_by.push(LockRelation::new("LOCK"));
        cfg.registers.push(ctrl);
        cfg.registers.push(Register::new("LOCK").at(0x0).with_type(RegisterType::LockField));

        let out = DocGenerator::generate(&cfg, &Provenance::new("regforge test", "0", "00"));
        assert!(out.starts_with("# rf register map"));
        assert!(out.contains("| Bus protocol | APB |"));
        assert!(out.contains("| Reset | asynchronous, active-low `rst_n` |"));
        let lock_row = out.find("| 0x00 | [LOCK](#lock)").unwrap();
        let ctrl_row = out.find("| 0x04 | [CTRL](#ctrl)").unwrap();
        assert!(lock_row < ctrl_row);
        assert!(out.contains("Control \\| status"));
        assert!(out.contains("## CTRL"));
        assert!(out.contains("- **Locked by:** `LOCK`"));
        assert!(out.contains("| 0 | EN | ReadWrite | 0x1 | Enable |"));
        assert!(out.contains("| [7:4] | MODE | ReadWrite | 0x0 |  |"));
        assert!(out.contains("| [31:0] | LOCK | LockField | 0x00000000 |  |"));
    }

    #[test]
    fn test_field_rows_follow_declaration_order() {
        let mut cfg = RegisterFileConfig::new("rf");
        let mut ctrl = Register::new("CTRL").at(0x0);
        ctrl.fields.push(regforge_ir::Field::new("LO", BitRange::bit(0)));
        ctrl.fields.push(regforge_ir::Field::new("HI", BitRange::new(15, 8).unwrap()));
        ctrl.fields.push(regforge_ir::Field::new("MID", BitRange::new(4, 2).unwrap()));
        cfg.registers.push(ctrl);

        let provenance = Provenance::new("regforge test", "0", "00");
        let out = DocGenerator::generate(&cfg, &provenance);
        let header = crate::HeaderGenerator::generate(&cfg, &provenance);
        let rows: Vec<usize> = ["| LO |", "| HI |", "| MID |"]
            .iter()
            .map(|name| out.find(name).unwrap())
            .collect();
        let defines: Vec<usize> = ["RF_CTRL_LO_MASK", "RF_CTRL_HI_MASK", "RF_CTRL_MID_MASK"]
            .iter()
            .map(|name| header.find(name).unwrap())
            .collect();
        assert!(rows.windows(2).all(|w| w[0] < w[1]));
        assert!(defines.windows(2).all(|w| w[0] < w[1]));
    }
}
