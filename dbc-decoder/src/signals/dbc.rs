//! DBC file parser
//!
//! Parses Vector DBC text into a [`Schema`]. The parser runs three phases in
//! a fixed order over a forward-only line stream:
//!
//! 1. Header: `VERSION "<text>"`, an optional `NS_ :` block, then `BS_:`.
//! 2. Nodes: the `BU_:` line.
//! 3. Body: `BO_` message lines, ` SG_` signal lines and `VAL_` lines.
//!    Every other line is skipped.
//!
//! Missing header sections abort the parse. Malformed or dangling body lines
//! are dropped, since real-world DBC files are not strictly standardized.

use crate::signals::database::{
    ByteOrder, Message, Schema, Signal, ValueType, NO_NODE,
};
use crate::signals::lines::{is_blank, LineReader};
use crate::signals::value_descriptions::{
    apply_value_descriptions, is_identifier, parse_value_descriptions,
};
use crate::types::{DbcError, Result};
use regex::{Captures, Regex};
use std::io::{BufRead, Cursor};
use std::path::Path;

type LazyRegex = once_cell::sync::Lazy<Regex>;

static VERSION_RE: LazyRegex =
    LazyRegex::new(|| Regex::new(r#"^\s*VERSION\s+"(?P<version>[^"]*)""#).unwrap());

static BIT_TIMING_RE: LazyRegex = LazyRegex::new(|| Regex::new(r"^\s*BS_\s*:").unwrap());

static NODES_RE: LazyRegex =
    LazyRegex::new(|| Regex::new(r"^\s*BU_\s*:(?P<nodes>(?:\s+[A-Za-z_][A-Za-z0-9_]*)*)\s*$").unwrap());

static MESSAGE_RE: LazyRegex = LazyRegex::new(|| {
    Regex::new(
        r"^\s*BO_\s+(?P<id>\d+)\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*:\s*(?P<size>\d+)\s+(?P<sender>[A-Za-z_][A-Za-z0-9_]*)\s*$",
    )
    .unwrap()
});

static SIGNAL_RE: LazyRegex = LazyRegex::new(|| {
    let number = r"[-+]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][-+]?\d+)?";
    Regex::new(&format!(
        r#"^\s*SG_\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)(?:\s+(?P<mux>M|m\d+))?\s*:\s*(?P<start_bit>\d+)\|(?P<length>\d+)@(?P<byte_order>[01])(?P<value_type>[+-])\s*\(\s*(?P<factor>{number})\s*,\s*(?P<offset>{number})\s*\)\s*\[\s*(?P<min>{number})\s*\|\s*(?P<max>{number})\s*\]\s*"(?P<unit>[^"]*)"\s*(?P<receivers>.*)$"#
    ))
    .unwrap()
});

static VALUE_DESCRIPTIONS_RE: LazyRegex = LazyRegex::new(|| Regex::new(r"^\s*VAL_\s").unwrap());

/// Keywords that mark a file as DBC even when its header is broken
const DBC_KEYWORDS: &[&str] = &[
    "VERSION", "NS_", "BS_", "BU_", "BO_", "SG_", "CM_", "BA_DEF_", "BA_", "VAL_", "VAL_TABLE_",
    "BO_TX_BU_", "EV_", "SIG_VALTYPE_", "SG_MUL_VAL_",
];

/// Parse DBC text from a buffered reader
pub fn parse<R: BufRead>(reader: R) -> Result<Schema> {
    let mut lines = LineReader::new(reader);

    let version = parse_header(&mut lines)?;
    let nodes = parse_nodes(&mut lines)?;
    let messages = parse_body(&mut lines)?;

    let schema = Schema {
        version,
        nodes,
        messages,
    };

    let stats = schema.stats();
    log::info!(
        "Parsed DBC version '{}': {} nodes, {} messages, {} signals",
        schema.version,
        stats.num_nodes,
        stats.num_messages,
        stats.num_signals
    );

    Ok(schema)
}

/// Parse DBC text held in memory
pub fn parse_str(text: &str) -> Result<Schema> {
    parse(Cursor::new(text.as_bytes()))
}

/// Parse a DBC file
pub fn parse_dbc_file(path: &Path) -> Result<Schema> {
    log::info!("Parsing DBC file: {:?}", path);

    // Read the DBC file as bytes first (handle non-UTF8 encodings)
    let bytes = std::fs::read(path)?;

    // Try UTF-8 first, then fallback to Latin-1/Windows-1252 encoding
    let dbc_content = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("DBC file is not UTF-8, trying Latin-1 encoding");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };

    parse_str(&dbc_content)
}

fn parse_header<R: BufRead>(lines: &mut LineReader<R>) -> Result<String> {
    let version = {
        let first = lines.next_non_blank()?.ok_or(DbcError::NonDbcFormat)?;
        match VERSION_RE.captures(first) {
            Some(cap) => cap["version"].to_string(),
            None if starts_with_dbc_keyword(first) => return Err(DbcError::MissingVersionHeader),
            None => return Err(DbcError::NonDbcFormat),
        }
    };

    // The namespace block is optional: BS_: may directly follow VERSION
    let next = lines.next_non_blank()?.ok_or(DbcError::MissingBitTiming)?;
    if BIT_TIMING_RE.is_match(next) {
        return Ok(version);
    }

    // Skip the rest of the namespace block up to the next blank line
    loop {
        match lines.next_line()? {
            None => return Err(DbcError::MissingBitTiming),
            Some(line) if is_blank(line) => break,
            Some(line) if BIT_TIMING_RE.is_match(line) => return Ok(version),
            Some(_) => {}
        }
    }

    let marker = lines.next_non_blank()?.ok_or(DbcError::MissingBitTiming)?;
    if !BIT_TIMING_RE.is_match(marker) {
        log::debug!("Expected BS_: at line {}", lines.line_number());
        return Err(DbcError::MissingBitTiming);
    }

    Ok(version)
}

fn parse_nodes<R: BufRead>(lines: &mut LineReader<R>) -> Result<Vec<String>> {
    let line = lines.next_non_blank()?.ok_or(DbcError::MissingNodeList)?;
    let cap = NODES_RE.captures(line).ok_or(DbcError::MissingNodeList)?;

    let mut nodes: Vec<String> = Vec::new();
    for node in cap["nodes"].split_whitespace() {
        if nodes.iter().any(|n| n == node) {
            log::warn!("Duplicate node '{}' in BU_ line", node);
        }
        nodes.push(node.to_string());
    }

    Ok(nodes)
}

fn parse_body<R: BufRead>(lines: &mut LineReader<R>) -> Result<Vec<Message>> {
    let mut messages: Vec<Message> = Vec::new();
    let mut pending = Vec::new();
    // Message receiving ` SG_` lines; `None` before the first valid `BO_`
    // and after a dropped one
    let mut current: Option<usize> = None;

    while let Some(line) = lines.next_line()? {
        if is_blank(line) {
            continue;
        }

        if let Some(cap) = MESSAGE_RE.captures(line) {
            match convert_message(&cap) {
                Some(message) => {
                    if messages.iter().any(|m| m.id == message.id) {
                        log::warn!("Duplicate message ID {} ({})", message.id, message.name);
                    }
                    messages.push(message);
                    current = Some(messages.len() - 1);
                }
                None => {
                    log::warn!("Dropping malformed message line: {}", line.trim());
                    current = None;
                }
            }
        } else if let Some(cap) = SIGNAL_RE.captures(line) {
            let Some(message) = current.and_then(|index| messages.get_mut(index)) else {
                log::debug!("Dropping signal line without a message: {}", line.trim());
                continue;
            };
            match convert_signal(&cap) {
                Some(signal) => {
                    if message.signal(&signal.name).is_some() {
                        log::debug!("Duplicate signal '{}' in message {}", signal.name, message.name);
                    }
                    message.signals.push(signal);
                }
                None => log::warn!("Dropping malformed signal line: {}", line.trim()),
            }
        } else if VALUE_DESCRIPTIONS_RE.is_match(line) {
            match parse_value_descriptions(line) {
                Some(entry) => pending.push(entry),
                None => log::debug!("Skipping value description line: {}", line.trim()),
            }
        }
    }

    apply_value_descriptions(&mut messages, pending);

    Ok(messages)
}

/// Convert a `BO_` match into a message. `None` if a number overflows.
fn convert_message(cap: &Captures<'_>) -> Option<Message> {
    let id = cap["id"].parse::<u32>().ok()?;
    let size = cap["size"].parse::<u8>().ok()?;
    let sender = match &cap["sender"] {
        NO_NODE => None,
        name => Some(name.to_string()),
    };

    Some(Message::new(id, &cap["name"], size, sender))
}

/// Convert a ` SG_` match into a signal. `None` if a number overflows or
/// the bit length is outside 1..=64.
fn convert_signal(cap: &Captures<'_>) -> Option<Signal> {
    let length = cap["length"].parse::<u16>().ok()?;
    if !(1..=64).contains(&length) {
        return None;
    }

    let byte_order = match &cap["byte_order"] {
        "0" => ByteOrder::BigEndian,
        _ => ByteOrder::LittleEndian,
    };

    let value_type = match &cap["value_type"] {
        "-" => ValueType::Signed,
        _ => ValueType::Unsigned,
    };

    Some(Signal {
        name: cap["name"].to_string(),
        is_multiplexed: cap.name("mux").is_some(),
        start_bit: cap["start_bit"].parse().ok()?,
        length,
        byte_order,
        value_type,
        factor: cap["factor"].parse().ok()?,
        offset: cap["offset"].parse().ok()?,
        min: cap["min"].parse().ok()?,
        max: cap["max"].parse().ok()?,
        unit: cap["unit"].to_string(),
        receivers: parse_receivers(&cap["receivers"]),
        value_descriptions: Vec::new(),
    })
}

/// Split a receiver list. Stray punctuation around names is ignored and the
/// `Vector__XXX` sentinel yields no entry.
fn parse_receivers(list: &str) -> Vec<String> {
    list.split(|c: char| c == ',' || c.is_whitespace())
        .map(|r| r.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == '_')))
        .filter(|r| is_identifier(r) && *r != NO_NODE)
        .map(str::to_string)
        .collect()
}

fn starts_with_dbc_keyword(line: &str) -> bool {
    let word = line
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == ':')
        .next()
        .unwrap_or("");
    DBC_KEYWORDS.contains(&word)
}
