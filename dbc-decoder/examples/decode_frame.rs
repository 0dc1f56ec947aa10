//! Standalone frame decoder tool
//!
//! Loads a DBC file and decodes one CAN payload with it, printing every
//! signal with its unit and value description.
//!
//! Usage:
//!   decode_frame <file.dbc> <can_id> <hex_payload> [--sorted] [--json]
//!
//! Example:
//!   decode_frame powertrain.dbc 0x21D 0827a322e51f4514

use anyhow::{bail, Context, Result};
use dbc_decoder::{Decoder, DecoderConfig, SignalOrder};
use std::env;
use std::io::Write;
use std::path::PathBuf;

fn parse_can_id(text: &str) -> Result<u32> {
    let id = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => text.parse::<u32>(),
    };
    id.with_context(|| format!("Invalid CAN ID: {}", text))
}

fn parse_payload(text: &str) -> Result<Vec<u8>> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if !text.chars().all(|c| c.is_ascii_hexdigit()) {
        bail!("Payload must contain only hex digits: {}", text);
    }
    if text.len() % 2 != 0 {
        bail!("Payload must have an even number of hex digits: {}", text);
    }

    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let byte = std::str::from_utf8(pair)?;
            u8::from_str_radix(byte, 16).with_context(|| format!("Invalid hex byte '{}'", byte))
        })
        .collect()
}


fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args()))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <file.dbc> <can_id> <hex_payload> [--sorted] [--json]", args[0]);
        std::process::exit(1);
    }

    let dbc_path = PathBuf::from(&args[1]);
    let can_id = parse_can_id(&args[2])?;
    let payload = parse_payload(&args[3])?;
    let sorted = args.iter().any(|a| a == "--sorted");
    let json = args.iter().any(|a| a == "--json");

    let mut config = DecoderConfig::new();
    if sorted {
        config = config.with_signal_order(SignalOrder::StartBit);
    }

    let mut decoder = Decoder::with_config(config);
    decoder
        .load_dbc(&dbc_path)
        .with_context(|| format!("Failed to load {:?}", dbc_path))?;

    let stats = decoder.schema_stats();
    log::info!(
        "Schema version '{}': {} messages, {} signals",
        decoder.schema().version(),
        stats.num_messages,
        stats.num_signals
    );

    if json {
        let message = decoder
            .schema()
            .message(can_id)
            .with_context(|| format!("Message 0x{:X} not in {:?}", can_id, dbc_path))?;
        println!("{}", serde_json::to_string_pretty(message)?);
    }

    let signals = decoder.decode_signals(can_id, &payload)?;
    if let Some(message) = decoder.schema().message(can_id) {
        println!("{}", message);
    }

    for signal in signals {
        let description = signal
            .value_description
            .map(|d| format!(" ({})", d))
            .unwrap_or_default();
        println!(
            "  {} = {} {}{}  [raw: {}]",
            signal.name, signal.value, signal.unit, description, signal.raw_value
        );
    }

    Ok(())
}
