// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Rust register-access module for firmware and host-side tooling.

use proc_macro2::{Literal, Span, TokenStream};
use quote::{format_ident, quote};
use regforge_ir::{width_mask, Field, Register, RegisterFileConfig};
use syn::LitInt;

pub struct RustApiGenerator;

impl RustApiGenerator {
    /// Renders one `pub mod` with a newtype per register. The tokens are parsed
    /// back with `syn` before they are returned.
    pub fn generate(config: &RegisterFileConfig) -> syn::Result<String> {
        let original_name = config.module_name.to_ascii_uppercase();
        let mut name = format_ident!("{}", Self::sanitize_name(&original_name));

        // The file-level struct must not clash with a register struct
        if config.registers.iter().any(|r| r.name == original_name) {
            name = format_ident!("{}_FILE", original_name);
        }

        let data_width = config.data_width;
        let addr_width = config.addr_width;
        let base_address = hex_lit(u128::from(config.base_address));
        let description = format!(
            "{} register file ({})",
            config.module_name,
            config.bus_protocol.display_name()
        );

        let mut registers_code = Vec::new();
        let mut seen_registers = std::collections::HashSet::new();
        for reg in &config.registers {
            if seen_registers.insert(reg.name.clone()) {
                registers_code.push(Self::generate_register(config, reg));
            }
        }

        let mod_name = format_ident!(
            "{}",
            Self::sanitize_name(&config.module_name.to_ascii_lowercase())
        );

        let expanded = quote! {
            #[allow(non_camel_case_types, clippy::new_without_default)]
            pub mod #mod_name {
                #[doc = #description]
                pub struct #name;

                impl #name {
                    pub const BASE_ADDR: u64 = #base_address;
                    pub const DATA_WIDTH: u32 = #data_width;
                    pub const ADDR_WIDTH: u32 = #addr_width;
                }

                #(#registers_code)*
            }
        };

        syn::parse2::<syn::File>(expanded.clone())?;
        Ok(expanded.to_string())
    }

    fn generate_register(config: &RegisterFileConfig, reg: &Register) -> TokenStream {
        let width = config.register_width(reg);
        let storage = storage_type(width);
        let struct_name = format_ident!("{}", Self::sanitize_name(&reg.name));
        let address = hex_lit(u128::from(reg.address.unwrap_or_default()));
        let reset_value = hex_lit(reg.effective_reset(width));
        let description = if reg.description.is_empty() {
            format!("{} ({})", reg.name, reg.reg_type)
        } else {
            reg.description.clone()
        };

        let field_methods: Vec<TokenStream> = reg
            .fields
            .iter()
            .map(|field| Self::generate_field(reg, field, &storage))
            .collect();

        quote! {
            #[doc = #description]
            #[derive(Debug, Clone, Copy, PartialEq, Eq)]
            pub struct #struct_name(#storage);

            impl #struct_name {
                pub const ADDR: u64 = #address;
                pub const RESET_VALUE: #storage = #reset_value;

                pub fn new() -> Self {
                    Self(Self::RESET_VALUE)
                }

                pub fn reset(&mut self) {
                    self.0 = Self::RESET_VALUE;
                }

                #(#field_methods)*

                pub fn raw(&self) -> #storage {
                    self.0
                }

                pub fn set_raw(&mut self, value: #storage) {
                    self.0 = value;
                }
            }
        }
    }

    fn sanitize_name(name: &str) -> String {
        let keywords = [
            "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for",
            "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
            "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
            "while", "async", "await", "dyn", "abstract", "become", "box", "do", "final", "macro",
            "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
        ];
        // Path keywords cannot be raw identifiers
        if ["self", "Self", "super", "crate"].contains(&name) {
            format!("{}_", name)
        } else if keywords.contains(&name) {
            format!("r#{}", name)
        } else {
            name.to_string()
        }
    }

    fn generate_field(reg: &Register, field: &Field, storage: &TokenStream) -> TokenStream {
        let name_str = field.name.to_lowercase();
        // Avoid collision with register methods
        let name_str = if ["reset", "new", "raw", "set_raw"].contains(&name_str.as_str()) {
            format!("{}_field", name_str)
        } else {
            name_str
        };

        let name = format_ident!("{}", Self::sanitize_name(&name_str));
        let set_name = format_ident!("set_{}", name_str);
        let bit_offset = Literal::u32_unsuffixed(field.bit_range.low());
        let mask = hex_lit(width_mask(field.bit_range.width()));
        let field_type = field.effective_type(reg);
        let description = if field.description.is_empty() {
            format!("{} [{}] ({})", field.name, field.bit_range, field_type)
        } else {
            field.description.clone()
        };

        // Generate getter (always)
        let getter = quote! {
            #[doc = #description]
            pub fn #name(&self) -> #storage {
                (self.0 >> #bit_offset) & #mask
            }
        };

        // Generate setter only if software can write the slice
        let writable = field_type.behavior().is_writable()
            && field
                .sw_access
                .or(reg.sw_access)
                .map_or(true, |hint| hint.can_write());
        let setter = if writable {
            quote! {
                #[doc = #description]
                pub fn #set_name(&mut self, value: #storage) {
                    let value_masked = value & #mask;
                    self.0 &= !(#mask << #bit_offset);
                    self.0 |= value_masked << #bit_offset;
                }
            }
        } else {
            quote! {}
        };

        quote! {
            #getter
            #setter
        }
    }
}

fn storage_type(width: u32) -> TokenStream {
    match width {
        0..=8 => quote! { u8 },
        9..=16 => quote! { u16 },
        17..=32 => quote! { u32 },
        33..=64 => quote! { u64 },
        _ => quote! { u128 },
    }
}

fn hex_lit(value: u128) -> LitInt {
    LitInt::new(&format!("0x{value:X}"), Span::call_site())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regforge_ir::{AccessHint, BitRange, RegisterType};

    fn field(name: &str, high: u32, low: u32) -> Field {
        Field::new(name, BitRange::new(high, low).unwrap())
    }

    #[test]
    fn test_codegen_basic() {
        let mut cfg = RegisterFileConfig::new("uart");
        let mut cr1 = Register::new("CR1").at(0x4).with_reset(0x1);
        cr1.description = "Control Register 1".into();
        cr1.fields.push(field("UE", 0, 0));
        cr1.fields.push(field("M", 12, 12));
        cfg.registers.push(cr1);

        let result = RustApiGenerator::generate(&cfg).unwrap();
        assert!(result.contains("pub mod uart {"));
        assert!(result.contains("struct UART"));
        assert!(result.contains("struct CR1 (u32)"));
        assert!(result.contains("const ADDR : u64 = 0x4"));
        assert!(result.contains("const RESET_VALUE : u32 = 0x1"));
        assert!(result.contains("pub fn reset"));
        assert!(result.contains("fn ue"));
        assert!(result.contains("fn set_ue"));
        assert!(syn::parse_file(&result).is_ok());
    }

    #[test]
    fn test_storage_follows_register_width() {
        let mut cfg = RegisterFileConfig::new("rf");
        let mut narrow = Register::new("NARROW").at(0);
        narrow.width = Some(8);
        cfg.registers.push(narrow);
        let mut wide = Register::new("WIDE").at(8);
        wide.width = Some(64);
        cfg.registers.push(wide);

        let result = RustApiGenerator::generate(&cfg).unwrap();
        assert!(result.contains("struct NARROW (u8)"));
        assert!(result.contains("struct WIDE (u64)"));
    }

    #[test]
    fn test_codegen_keywords() {
        let mut cfg = RegisterFileConfig::new("test");
        let mut reg = Register::new("REG").at(0);
        reg.fields.push(field("match", 0, 0));
        reg.fields.push(field("type", 1, 1));
        reg.fields.push(field("self", 2, 2));
        cfg.registers.push(reg);

        let result = RustApiGenerator::generate(&cfg).unwrap();
        assert!(result.contains("fn r#match"));
        assert!(result.contains("fn set_match"));
        assert!(result.contains("fn r#type"));
        assert!(result.contains("fn self_"));
    }

    #[test]
    fn test_codegen_reserved_names() {
        let mut cfg = RegisterFileConfig::new("test");
        let mut reg = Register::new("REG").at(0);
        reg.fields.push(field("reset", 0, 0));
        reg.fields.push(field("new", 1, 1));
        reg.fields.push(field("raw", 2, 2));
        cfg.registers.push(reg);

        let result = RustApiGenerator::generate(&cfg).unwrap();
        assert!(result.contains("fn reset_field"));
        assert!(result.contains("fn new_field"));
        assert!(result.contains("fn raw_field"));
    }

    #[test]
    fn test_read_only_fields_have_no_setter() {
        let mut cfg = RegisterFileConfig::new("rf");
        let mut reg = Register::new("STATUS").at(0).with_type(RegisterType::ReadOnly);
        reg.fields.push(field("BUSY", 0, 0));
        let mut cfg_reg = Register::new("CFG").at(4);
        let mut mode = field("MODE", 3, 1);
        mode.sw_access = Some(AccessHint::Read);
        cfg_reg.fields.push(mode);
        cfg.registers.push(reg);
        cfg.registers.push(cfg_reg);

        let result = RustApiGenerator::generate(&cfg).unwrap();
        assert!(result.contains("fn busy"));
        assert!(!result.contains("fn set_busy"));
        assert!(result.contains("fn mode"));
        assert!(!result.contains("fn set_mode"));
    }

    #[test]
    fn test_file_struct_collision() {
        let mut cfg = RegisterFileConfig::new("uart");
        cfg.registers.push(Register::new("UART").at(0));

        let result = RustApiGenerator::generate(&cfg).unwrap();
        assert!(result.contains("struct UART_FILE"));
        assert!(result.contains("struct UART (u32)"));
    }
}
