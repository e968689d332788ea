// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use regforge_codegen::{generate, GenerateError, GenerateOptions};
use regforge_core::{BusResponse, DiagnosticKind, RegisterFileModel};
use regforge_ir::{
    BitRange, BusProtocol, Field, LockRelation, MagicDependency, Register, RegisterFileConfig,
    RegisterType,
};

const ALL_LANES: u128 = u128::MAX;

fn options() -> GenerateOptions {
    GenerateOptions {
        timestamp: "2026-01-01T00:00:00Z".into(),
        ..Default::default()
    }
}

fn file(regs: Vec<Register>) -> RegisterFileConfig {
    let mut cfg = RegisterFileConfig::new("rf");
    cfg.registers = regs;
    cfg
}

#[test]
fn scenario_smoke_read_write() {
    let cfg = file(vec![Register::new("CTRL").at(0x00)]);
    let out = generate(&cfg, &options()).unwrap();
    let v = &out.verilog;
    assert!(v.contains("localparam ADDR_CTRL = 8'h00;"));
    assert!(v.contains("reg [31:0] ctrl_reg;"));
    assert!(v.contains("if (psel & penable & pwrite & (paddr == ADDR_CTRL)) begin"));
    assert!(v.contains("ctrl_reg <= pwdata;"));
    assert!(v.contains("ctrl_reg <= 32'h00000000;"));
    for port in ["paddr", "psel", "penable", "pwrite", "pwdata", "prdata", "pready", "pslverr"] {
        assert!(v.contains(&format!(" {port},")) || v.contains(&format!(" {port}\n")), "{port}");
    }
}

#[test]
fn scenario_write1_clean() {
    let cfg = file(vec![Register::new("STATUS")
        .at(0x0)
        .with_type(RegisterType::Write1Clean)
        .with_reset(0xFF)]);
    let out = generate(&cfg, &options()).unwrap();
    assert!(out.verilog.contains("status_reg <= status_reg & ~pwdata;"));

    let mut model = RegisterFileModel::new(&out.config);
    model.write(0x0, 0x0F, ALL_LANES);
    assert_eq!(model.value("STATUS"), Some(0xF0));
}

#[test]
fn scenario_lock_relation() {
    let mut data = Register::new("DATA").at(0x4);
    data.locked_by.push(LockRelation::new("LOCK"));
    let cfg = file(vec![
        Register::new("LOCK").at(0x0).with_type(RegisterType::LockField),
        data,
    ]);
    let out = generate(&cfg, &options()).unwrap();
    assert!(out
        .verilog
        .contains("if (psel & penable & pwrite & (paddr == ADDR_DATA) & ~lock_reg[0]) begin"));

    let mut model = RegisterFileModel::new(&out.config);
    assert_eq!(model.write(0x4, 0xAA, ALL_LANES), BusResponse::Okay);
    assert_eq!(model.value("DATA"), Some(0xAA));
    model.write(0x0, 0x1, ALL_LANES);
    model.write(0x4, 0x55, ALL_LANES);
    assert_eq!(model.value("DATA"), Some(0xAA));
    model.write(0x0, 0x0, ALL_LANES);
    model.write(0x4, 0x55, ALL_LANES);
    assert_eq!(model.value("DATA"), Some(0x55));
}

#[test]
fn scenario_magic_dependency() {
    let mut secure = Register::new("SECURE").at(0x4);
    secure.magic_dependency = Some(MagicDependency {
        source: "MAGIC".into(),
        value: 0xDEAD_BEEF,
    });
    let cfg = file(vec![Register::new("MAGIC").at(0x0).with_reset(0xDEAD_BEEF), secure]);
    let out = generate(&cfg, &options()).unwrap();
    assert!(out.verilog.contains("(magic_reg == 32'hDEADBEEF)"));

    let mut model = RegisterFileModel::new(&out.config);
    model.write(0x4, 0x1, ALL_LANES);
    assert_eq!(model.value("SECURE"), Some(0x1));
    model.write(0x0, 0x0, ALL_LANES);
    model.write(0x4, 0x2, ALL_LANES);
    assert_eq!(model.value("SECURE"), Some(0x1));
}

#[test]
fn scenario_auto_address() {
    let cfg = file(vec![
        Register::new("A"),
        Register::new("B"),
        Register::new("C"),
        Register::new("D"),
    ]);
    let opts = GenerateOptions {
        auto_address: true,
        ..options()
    };
    let out = generate(&cfg, &opts).unwrap();
    let addrs: Vec<_> = out.config.registers.iter().map(|r| r.address).collect();
    assert_eq!(addrs, [Some(0x0), Some(0x4), Some(0x8), Some(0xC)]);
    assert!(out.verilog.contains("localparam ADDR_D = 8'h0C;"));
}

#[test]
fn scenario_pulse_on_axi4_lite() {
    let cfg = file(vec![Register::new("GO")
        .at(0x0)
        .with_type(RegisterType::Write1Pulse)]);
    let opts = GenerateOptions {
        protocol: Some(BusProtocol::Axi4Lite),
        ..options()
    };
    let out = generate(&cfg, &opts).unwrap();
    let v = &out.verilog;
    assert!(v.contains("output reg  [31:0] go_pulse"));
    assert!(v.contains("if (axi_wr_fire & (axi_awaddr_q == ADDR_GO)) begin"));
    assert!(v.contains("go_pulse <= axi_wdata_q;"));
    assert!(v.contains("end else begin\n                go_pulse <= 32'h00000000;"));
    assert!(v.contains("wire        axi_wr_fire = axi_aw_seen & axi_w_seen & ~s_axi_bvalid;"));
    assert!(out.diagnostics.contains(DiagnosticKind::TypeProtocolMismatch));

    let mut model = RegisterFileModel::new(&out.config);
    model.write(0x0, 0x3, ALL_LANES);
    assert_eq!(model.pulse("GO"), Some(0x3));
    model.tick();
    assert_eq!(model.pulse("GO"), Some(0));
    assert_eq!(model.read(0x0).0, 0);
}

#[test]
fn boundary_empty_register_file() {
    let out = generate(&file(vec![]), &options()).unwrap();
    assert!(out.verilog.contains("prdata = 32'h00000000;"));
    assert!(!out.verilog.contains("_reg;"));
    assert!(out.header.contains("#define RF_DATA_WIDTH 32U"));
}

#[test]
fn boundary_single_bit_field_mask() {
    let mut reg = Register::new("CTRL").at(0);
    reg.fields.push(Field::new("EN", BitRange::bit(5)));
    let out = generate(&file(vec![reg]), &options()).unwrap();
    assert!(out.header.contains("#define RF_CTRL_EN_MASK 0x00000020U"));
    assert!(out.header.contains("#define RF_CTRL_EN_SHIFT 5U"));
}

#[test]
fn boundary_data_width_extremes() {
    let mut narrow = file(vec![Register::new("CTRL").at(0)]);
    narrow.data_width = 8;
    let out = generate(&narrow, &options()).unwrap();
    assert!(out.verilog.contains("reg [7:0] ctrl_reg;"));

    let mut wide = file(vec![Register::new("CTRL").at(0)]);
    wide.data_width = 128;
    let out = generate(&wide, &options()).unwrap();
    assert!(out.diagnostics.contains(DiagnosticKind::NonStandardDataWidth));
    assert!(out.verilog.contains("reg [127:0] ctrl_reg;"));
}

#[test]
fn boundary_misaligned_preassigned_address_with_planner() {
    let cfg = file(vec![Register::new("A").at(0x3), Register::new("B")]);
    let opts = GenerateOptions {
        auto_address: true,
        ..options()
    };
    match generate(&cfg, &opts) {
        Err(GenerateError::Validation(diags)) => {
            assert!(diags.contains(DiagnosticKind::MisalignedAddress))
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
}

#[test]
fn errors_abort_generation() {
    let cfg = file(vec![Register::new("A").at(0), Register::new("A").at(4)]);
    let err = generate(&cfg, &options()).unwrap_err();
    assert!(matches!(err, GenerateError::Validation(ref d) if d.contains(DiagnosticKind::DuplicateName)));
}

#[test]
fn scenario_custom_back_to_back_transfers() {
    let cfg = file(vec![
        Register::new("GO").at(0x0).with_type(RegisterType::Write1Pulse),
        Register::new("ST")
            .at(0x4)
            .with_type(RegisterType::ReadClean)
            .with_reset(0x5),
    ]);
    let opts = GenerateOptions {
        protocol: Some(BusProtocol::Custom),
        ..options()
    };
    let out = generate(&cfg, &opts).unwrap();
    let v = &out.verilog;
    // ack follows req, so each cycle with req high is its own transfer and
    // the one-shot paths use the plain transfer enables.
    assert!(v.contains("assign ack = req;"));
    assert!(v.contains("if (req & wr_en & (addr == ADDR_GO)) begin"));
    assert!(v.contains("go_pulse <= wdata;"));
    assert!(v.contains("if ((req & rd_en & (addr == ADDR_ST))) begin"));

    let mut model = RegisterFileModel::new(&out.config);
    model.write(0x0, 0x1, ALL_LANES);
    assert_eq!(model.pulse("GO"), Some(0x1));
    model.write(0x0, 0x1, ALL_LANES);
    assert_eq!(model.pulse("GO"), Some(0x1));
    assert_eq!(model.read(0x4).0, 0x5);
    assert_eq!(model.read(0x4).0, 0x0);
}
