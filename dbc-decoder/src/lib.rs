//! DBC Decoder Library
//!
//! Parses Vector DBC network descriptions into a typed schema and decodes raw
//! CAN payloads into physical values with it.
//!
//! # Architecture
//!
//! - The grammar parser reads the DBC text line by line, in a single forward
//!   pass, and produces a [`Schema`] of nodes, messages and signals.
//! - `VAL_` value tables are collected during the pass and attached to their
//!   signals once all messages are known.
//! - The signal codec turns a payload of up to 8 bytes into one physical
//!   value per signal, handling both byte orders and two's-complement signs.
//!
//! The library does NOT:
//! - Decode multiplexed signals (the indicator is recorded only)
//! - Handle signals wider than 64 bits or frames longer than 8 bytes
//! - Encode physical values back into frames
//!
//! # Example Usage
//!
//! ```no_run
//! use dbc_decoder::{Decoder, DecoderConfig, SignalOrder};
//! use std::path::Path;
//!
//! let config = DecoderConfig::new().with_signal_order(SignalOrder::Declaration);
//! let mut decoder = Decoder::with_config(config);
//! decoder.load_dbc(Path::new("powertrain.dbc")).unwrap();
//!
//! match decoder.decode(0x21D, &[0x08, 0x27, 0xA3, 0x22, 0xE5, 0x1F, 0x45, 0x14]) {
//!     Ok(values) => println!("{:?}", values),
//!     Err(e) => eprintln!("Decode error: {}", e),
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod types;

// Re-export main types for convenience
pub use config::{BigEndianSupport, DecoderConfig, SignalOrder};
pub use decoder::Decoder;
pub use message_decoder::{DecodedSignal, MessageDecoder, PayloadViews, MAX_PAYLOAD_LEN};
pub use signals::dbc::{parse, parse_dbc_file, parse_str};
pub use signals::{
    ByteOrder, Message, Schema, SchemaStats, Signal, ValueDescription, ValueType, NO_NODE,
};
pub use types::{DbcError, ErrorKind, Result};

// Internal modules (not exposed in public API)
mod message_decoder;
mod signals;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
