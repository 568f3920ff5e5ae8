/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Runs a raw 8080 image until it halts and prints the final processor state.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use i8080_engine::config::EngineConfig;
use i8080_engine::opcode::{Register, RegisterPair};
use i8080_engine::{ExitReason, Kernel, Proc8080};

#[derive(Parser, Debug)]
#[command(name = "i8080", author, version, about = "Intel 8080 instruction engine")]
struct Args {
    /// Image loaded at address 0.
    #[arg(short, long)]
    filename: PathBuf,

    /// JSON engine configuration.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured entry point.
    #[arg(long, value_parser = parse_address)]
    entry: Option<u16>,

    /// Overrides the configured step limit.
    #[arg(long)]
    max_steps: Option<u64>,

    /// Log filter, used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Accepts decimal or `0x` prefixed hexadecimal addresses.
fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {:?}: {}", s, e))
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> i8080_engine::Result<()> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(entry) = args.entry {
        config.entry_point = entry;
    }
    if args.max_steps.is_some() {
        config.max_steps = args.max_steps;
    }

    let mut kernel = Kernel::from_file(&args.filename, config)?;
    let result = kernel.boot();
    print_state(kernel.proc8080());

    match result? {
        ExitReason::Halted => println!("halted"),
        ExitReason::Stopped => println!("stopped"),
        ExitReason::StepLimit => println!("step limit reached"),
    }
    Ok(())
}

fn print_state(proc8080: &Proc8080) {
    println!(
        "PC={:04x} SP={:04x} steps={}",
        proc8080.pc(),
        proc8080.sp(),
        proc8080.steps()
    );
    let registers: Vec<String> = Register::ALL
        .iter()
        .map(|&reg| format!("{}={:02x}", reg, proc8080.register(reg)))
        .collect();
    println!("{}", registers.join(" "));
    println!(
        "BC={:04x} DE={:04x} HL={:04x}",
        proc8080.register_pair(RegisterPair::BC),
        proc8080.register_pair(RegisterPair::DE),
        proc8080.register_pair(RegisterPair::HL)
    );
    let flags = proc8080.flags();
    println!(
        "Z={} S={} P={} CY={} AC={}",
        u8::from(flags.z),
        u8::from(flags.s),
        u8::from(flags.p),
        u8::from(flags.cy),
        u8::from(flags.ac)
    );
}
