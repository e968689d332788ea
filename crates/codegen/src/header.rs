// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! C header with register addresses, reset values and field masks.

use crate::Provenance;
use regforge_ir::{width_mask, Register, RegisterFileConfig};

pub struct HeaderGenerator;

impl HeaderGenerator {
    pub fn generate(config: &RegisterFileConfig, provenance: &Provenance) -> String {
        let module = config.module_name.to_ascii_uppercase();
        let guard = format!("{module}_H");
        let mut out = String::new();

        out.push_str("/*\n");
        out.push_str(&format!(" * {} register definitions\n", config.module_name));
        out.push_str(&format!(" * Generated by {}\n", provenance.tool));
        out.push_str(&format!(" * Timestamp: {}\n", provenance.timestamp));
        out.push_str(" * Do not edit by hand.\n");
        out.push_str(" */\n\n");
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        out.push_str("#include <stdint.h>\n\n");
        out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");
        out.push_str(&format!("#define {module}_DATA_WIDTH {}U\n", config.data_width));
        out.push_str(&format!("#define {module}_ADDR_WIDTH {}U\n", config.addr_width));

        for reg in &config.registers {
            out.push('\n');
            Self::register(config, &module, reg, &mut out);
        }

        out.push_str("\n#ifdef __cplusplus\n}\n#endif\n\n");
        out.push_str(&format!("#endif /* {guard} */\n"));
        out
    }

    fn register(config: &RegisterFileConfig, module: &str, reg: &Register, out: &mut String) {
        let prefix = format!("{module}_{}", reg.name.to_ascii_uppercase());
        let width = config.register_width(reg);
        if reg.description.is_empty() {
            out.push_str(&format!("/* {} ({}) */\n", reg.name, reg.reg_type));
        } else {
            out.push_str(&format!(
                "/* {} ({}): {} */\n",
                reg.name,
                reg.reg_type,
                one_line(&reg.description)
            ));
        }
        if width > 64 {
            out.push_str(&format!("/* {width}-bit register: values split into 64-bit halves */\n"));
        }
        let address = reg.address.unwrap_or_default();
        out.push_str(&format!(
            "#define {prefix}_ADDR 0x{address:0w$X}U\n",
            w = hex_digits(config.addr_width)
        ));
        constant(out, &format!("{prefix}_RESET"), reg.effective_reset(width), width);

        // A register without fields is one implicit full-width field.
        if reg.fields.is_empty() {
            constant(out, &format!("{prefix}_MASK"), width_mask(width), width);
            out.push_str(&format!("#define {prefix}_SHIFT 0U\n"));
            return;
        }

        for field in &reg.fields {
            let name = format!("{prefix}_{}", field.name.to_ascii_uppercase());
            let range = field.bit_range;
            constant(out, &format!("{name}_MASK"), range.mask(), width);
            out.push_str(&format!("#define {name}_SHIFT {}U\n", range.low()));
            if width > 64 {
                continue;
            }
            out.push_str(&format!(
                "#define {name}_GET(v) (((v) & {name}_MASK) >> {name}_SHIFT)\n"
            ));
            out.push_str(&format!(
                "#define {name}_SET(v, x) (((v) & ~{name}_MASK) | (((x) << {name}_SHIFT) & {name}_MASK))\n"
            ));
        }
    }
}

/// Defines `name` as one unsigned constant, or as `_LO`/`_HI` 64-bit halves
/// when the register is wider than any standard C integer.
fn constant(out: &mut String, name: &str, value: u128, width: u32) {
    if width <= 64 {
        let digits = hex_digits(width);
        out.push_str(&format!("#define {name} 0x{value:0digits$X}U\n"));
    } else {
        out.push_str(&format!("#define {name}_LO 0x{:016X}ULL\n", value as u64));
        out.push_str(&format!("#define {name}_HI 0x{:016X}ULL\n", (value >> 64) as u64));
    }
}

fn hex_digits(width: u32) -> usize {
    width.div_ceil(4).max(1) as usize
}

fn one_line(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("*/", "* /")
}
