//! DBC schema types
//!
//! A [`Schema`] is the typed result of one parse call: the version string,
//! the node list and the messages with the signals they own.

use crate::config::DecoderConfig;
use crate::message_decoder::MessageDecoder;
use crate::types::{DbcError, Result};
use serde::Serialize;
use std::fmt;

/// Sentinel node name meaning "no node"
pub const NO_NODE: &str = "Vector__XXX";

/// A parsed DBC file
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    pub(crate) version: String,
    pub(crate) nodes: Vec<String>,
    pub(crate) messages: Vec<Message>,
}

/// A CAN message definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// CAN message ID (extended IDs keep their flag bit)
    pub id: u32,
    /// Message name
    pub name: String,
    /// Declared payload size in bytes
    pub size: u8,
    /// Transmitting node, `None` for the `Vector__XXX` sentinel
    pub sender: Option<String>,
    /// Signals in declaration order
    pub signals: Vec<Signal>,
}

/// A CAN signal definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    /// Signal name
    pub name: String,
    /// True if the signal carries a multiplexer indicator (`M` or `mN`).
    /// The indicator is recorded but not interpreted.
    pub is_multiplexed: bool,
    /// Start bit in the CAN frame, in DBC numbering
    pub start_bit: u16,
    /// Length in bits (1..=64)
    pub length: u16,
    /// Byte order
    pub byte_order: ByteOrder,
    /// Value type (signed/unsigned)
    pub value_type: ValueType,
    /// Scale factor to convert raw value to physical value
    pub factor: f64,
    /// Offset to add after scaling
    pub offset: f64,
    /// Minimum physical value
    pub min: f64,
    /// Maximum physical value
    pub max: f64,
    /// Engineering unit, verbatim from the file (may be empty)
    pub unit: String,
    /// Receiving nodes; empty when the sentinel is used
    pub receivers: Vec<String>,
    /// Enumerated values from `VAL_` lines
    pub value_descriptions: Vec<ValueDescription>,
}

/// One entry of a signal's value table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueDescription {
    pub value: u32,
    pub description: String,
}

/// Byte order for signal extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ByteOrder {
    /// Little-endian (Intel format), `@1` in DBC
    LittleEndian,
    /// Big-endian (Motorola format), `@0` in DBC
    BigEndian,
}

/// Value type for signal interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueType {
    /// Signed integer, `-` in DBC
    Signed,
    /// Unsigned integer, `+` in DBC
    Unsigned,
}

/// Schema statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaStats {
    /// Total number of message definitions
    pub num_messages: usize,
    /// Total number of signal definitions
    pub num_signals: usize,
    /// Number of nodes in the `BU_:` line
    pub num_nodes: usize,
}

impl Schema {
    /// Version string from the `VERSION` header (may be empty)
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Node names in `BU_:` order
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Messages in declaration order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Look up a message by CAN ID. With duplicate IDs the first one wins.
    pub fn message(&self, id: u32) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Decode a payload of the message with the given CAN ID into physical
    /// values, one per signal.
    ///
    /// # Errors
    /// * `UnknownMessageId` if no message has this ID
    /// * `PayloadTooLong` if the payload exceeds 8 bytes
    /// * `UnsupportedEndianness` if the message has a big-endian signal and
    ///   `config` rejects them
    pub fn decode(&self, id: u32, payload: &[u8], config: &DecoderConfig) -> Result<Vec<f64>> {
        let message = self.message(id).ok_or(DbcError::UnknownMessageId(id))?;
        MessageDecoder::decode_message(message, payload, config)
    }

    /// Get schema statistics
    pub fn stats(&self) -> SchemaStats {
        SchemaStats {
            num_messages: self.messages.len(),
            num_signals: self.messages.iter().map(|m| m.signals.len()).sum(),
            num_nodes: self.nodes.len(),
        }
    }
}

impl Message {
    pub fn new(id: u32, name: impl Into<String>, size: u8, sender: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            size,
            sender,
            signals: Vec::new(),
        }
    }

    /// Find a signal by exact name
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub(crate) fn signal_mut(&mut self, name: &str) -> Option<&mut Signal> {
        self.signals.iter_mut().find(|s| s.name == name)
    }
}

impl Signal {
    /// Look up the description of a raw value in this signal's value table
    pub fn describe(&self, raw_value: i128) -> Option<&str> {
        self.value_descriptions
            .iter()
            .find(|vd| i128::from(vd.value) == raw_value)
            .map(|vd| vd.description.as_str())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Message: {{id: {}, name: {}, size: {}, node: {}}}",
            self.id,
            self.name,
            self.size,
            self.sender.as_deref().unwrap_or(NO_NODE)
        )
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signal {{name: {}, ", self.name)?;
        write!(f, "Multiplexed: {}, ", if self.is_multiplexed { "True" } else { "False" })?;
        write!(f, "Start bit: {}, Size: {}, ", self.start_bit, self.length)?;
        write!(f, "Endianness: {}, ", self.byte_order)?;
        write!(f, "Value Type: {}, ", self.value_type)?;
        write!(f, "Min: {}, Max: {}, ", self.min, self.max)?;
        write!(f, "Unit: ({}), ", self.unit)?;
        write!(f, "receivers: {}}}", self.receivers.join(","))
    }
}

impl fmt::Display for ByteOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteOrder::LittleEndian => write!(f, "Little endian"),
            ByteOrder::BigEndian => write!(f, "Big endian"),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Signed => write!(f, "Signed"),
            ValueType::Unsigned => write!(f, "Unsigned"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_signal(name: &str, start_bit: u16, length: u16) -> Signal {
        Signal {
            name: name.to_string(),
            is_multiplexed: false,
            start_bit,
            length,
            byte_order: ByteOrder::LittleEndian,
            value_type: ValueType::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: String::new(),
            receivers: Vec::new(),
            value_descriptions: Vec::new(),
        }
    }

    #[test]
    fn test_empty_schema() {
        let schema = Schema::default();
        let stats = schema.stats();
        assert_eq!(stats.num_messages, 0);
        assert_eq!(stats.num_signals, 0);
        assert_eq!(stats.num_nodes, 0);
        assert!(schema.message(0x123).is_none());
    }

    #[test]
    fn test_message_lookup() {
        let mut message = Message::new(0x123, "EngineData", 8, Some("ECU1".to_string()));
        message.signals.push(test_signal("EngineSpeed", 0, 16));

        let schema = Schema {
            version: "1.0".to_string(),
            nodes: vec!["ECU1".to_string()],
            messages: vec![message],
        };

        let stats = schema.stats();
        assert_eq!(stats.num_messages, 1);
        assert_eq!(stats.num_signals, 1);

        let msg = schema.message(0x123).unwrap();
        assert_eq!(msg.name, "EngineData");
        assert!(msg.signal("EngineSpeed").is_some());
        assert!(msg.signal("enginespeed").is_none());
    }

    #[test]
    fn test_decode_unknown_id() {
        let schema = Schema::default();
        let result = schema.decode(578, &[0xFF, 0xA2], &DecoderConfig::default());
        assert!(matches!(result, Err(DbcError::UnknownMessageId(578))));
    }

    #[test]
    fn test_describe() {
        let mut signal = test_signal("State", 0, 8);
        signal.value_descriptions = vec![
            ValueDescription { value: 0, description: "Off".to_string() },
            ValueDescription { value: 1, description: "On".to_string() },
        ];
        assert_eq!(signal.describe(1), Some("On"));
        assert_eq!(signal.describe(2), None);
        assert_eq!(signal.describe(-1), None);
    }

    #[test]
    fn test_display() {
        let message = Message::new(500, "IO_DEBUG", 4, None);
        assert_eq!(
            message.to_string(),
            "Message: {id: 500, name: IO_DEBUG, size: 4, node: Vector__XXX}"
        );

        let mut signal = test_signal("IO_DEBUG_test_unsigned", 0, 8);
        signal.receivers = vec!["DBG".to_string()];
        assert_eq!(
            signal.to_string(),
            "Signal {name: IO_DEBUG_test_unsigned, Multiplexed: False, Start bit: 0, Size: 8, \
             Endianness: Little endian, Value Type: Unsigned, Min: 0, Max: 0, Unit: (), receivers: DBG}"
        );
    }
}
