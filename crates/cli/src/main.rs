// RegForge - Register File Generator
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use regforge_codegen::{generate, prepare, GenerateError, GenerateOptions, GenerationOutput};
use regforge_config::LoadedConfig;
use regforge_core::Diagnostics;
use regforge_ir::{BusProtocol, RegisterType};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{error, info, warn};

const EXIT_OK: u8 = 0;
const EXIT_VALIDATION_ERROR: u8 = 1;
const EXIT_IO_ERROR: u8 = 2;

fn parse_protocol(s: &str) -> Result<BusProtocol, String> {
    BusProtocol::from_str(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "RegForge register file generator",
    long_about = None
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate Verilog and optional header, documentation and Rust module.
    Generate(GenerateArgs),

    /// Check a configuration without writing anything.
    Validate(ValidateArgs),

    /// List the register type catalogue.
    Types,
}

#[derive(Parser, Debug)]
struct SourceArgs {
    /// Register file configuration (YAML, or JSON by extension)
    #[arg(short, long)]
    config: PathBuf,

    /// Override the bus protocol from the configuration
    #[arg(short, long, value_parser = parse_protocol)]
    protocol: Option<BusProtocol>,

    /// Assign addresses to registers that have none
    #[arg(long)]
    auto_address: bool,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Output path for the Verilog module
    #[arg(short, long)]
    output: PathBuf,

    /// Also write a C header
    #[arg(long)]
    header: Option<PathBuf>,

    /// Also write Markdown documentation
    #[arg(long)]
    doc: Option<PathBuf>,

    /// Also write a Rust register-access module
    #[arg(long)]
    rust: Option<PathBuf>,

    /// Timestamp stamped into generated files (default: SOURCE_DATE_EPOCH or now)
    #[arg(long)]
    timestamp: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    #[command(flatten)]
    source: SourceArgs,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    format: ReportFormat,
}

#[derive(Serialize)]
struct ValidationReport<'a> {
    module: &'a str,
    valid: bool,
    errors: usize,
    warnings: usize,
    diagnostics: &'a Diagnostics,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Validate(args) => run_validate(args),
        Commands::Types => run_types(),
    }
}

/// I/O failures anywhere in the chain map to exit code 2, everything else
/// is a configuration problem.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.chain().any(|c| c.is::<std::io::Error>()) {
        EXIT_IO_ERROR
    } else {
        EXIT_VALIDATION_ERROR
    }
}

fn load(source: &SourceArgs) -> anyhow::Result<(LoadedConfig, GenerateOptions)> {
    info!("Loading register file config: {:?}", source.config);
    let loaded = LoadedConfig::from_file(&source.config)?;
    let options = GenerateOptions {
        protocol: source.protocol,
        auto_address: source.auto_address || loaded.auto_address,
        ..GenerateOptions::default()
    };
    Ok((loaded, options))
}

fn log_diagnostics(diagnostics: &Diagnostics) {
    for d in diagnostics.errors() {
        error!("{}", d);
    }
}

fn run_generate(args: GenerateArgs) -> ExitCode {
    let (loaded, mut options) = match load(&args.source) {
        Ok(v) => v,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(exit_code_for(&e));
        }
    };
    options.timestamp = args.timestamp.clone().unwrap_or_else(default_timestamp);
    options.rust_api = args.rust.is_some();

    let output = match generate(&loaded.config, &options) {
        Ok(output) => output,
        Err(GenerateError::Validation(diagnostics)) => {
            log_diagnostics(&diagnostics);
            error!(
                "Generation aborted: {} error(s)",
                diagnostics.errors().count()
            );
            return ExitCode::from(EXIT_VALIDATION_ERROR);
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_VALIDATION_ERROR);
        }
    };

    match write_outputs(&args, &output) {
        Ok(()) => {
            info!(
                "Generated {} ({} registers, {} warning(s))",
                output.config.module_name,
                output.config.registers.len(),
                output.diagnostics.len()
            );
            ExitCode::from(EXIT_OK)
        }
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

fn write_outputs(args: &GenerateArgs, output: &GenerationOutput) -> anyhow::Result<()> {
    write_artifact(&args.output, &output.verilog)?;
    if let Some(path) = &args.header {
        write_artifact(path, &output.header)?;
    }
    if let Some(path) = &args.doc {
        write_artifact(path, &output.doc)?;
    }
    if let (Some(path), Some(rust)) = (&args.rust, &output.rust) {
        write_artifact(path, rust)?;
    }
    Ok(())
}

fn write_artifact(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    std::fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    info!("Wrote {:?}", path);
    Ok(())
}

fn run_validate(args: ValidateArgs) -> ExitCode {
    let (loaded, options) = match load(&args.source) {
        Ok(v) => v,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(exit_code_for(&e));
        }
    };
    let (config, diagnostics) = prepare(&loaded.config, &options);
    let valid = !diagnostics.has_errors();

    match args.format {
        ReportFormat::Text => {
            for d in &diagnostics {
                println!("{d}");
            }
            println!(
                "{}: {} ({} error(s), {} warning(s))",
                config.module_name,
                if valid { "OK" } else { "FAILED" },
                diagnostics.errors().count(),
                diagnostics.warnings().count()
            );
        }
        ReportFormat::Json => {
            let report = ValidationReport {
                module: &config.module_name,
                valid,
                errors: diagnostics.errors().count(),
                warnings: diagnostics.warnings().count(),
                diagnostics: &diagnostics,
            };
            match serde_json::to_string_pretty(&report) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    error!("Failed to serialize report: {}", e);
                    return ExitCode::from(EXIT_VALIDATION_ERROR);
                }
            }
        }
    }

    for d in diagnostics.warnings() {
        warn!("{}", d);
    }
    log_diagnostics(&diagnostics);

    if valid {
        ExitCode::from(EXIT_OK)
    } else {
        ExitCode::from(EXIT_VALIDATION_ERROR)
    }
}

fn run_types() -> ExitCode {
    for ty in RegisterType::ALL {
        println!("{:<16} {}", ty.as_str(), ty.behavior().summary);
    }
    ExitCode::from(EXIT_OK)
}

/// `SOURCE_DATE_EPOCH` keeps builds reproducible; otherwise seconds since the epoch.
fn default_timestamp() -> String {
    if let Ok(epoch) = std::env::var("SOURCE_DATE_EPOCH") {
        if !epoch.trim().is_empty() {
            return epoch.trim().to_string();
        }
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
