//! Decoder configuration types
//!
//! This module defines the small set of knobs that change decode behavior.
//! Both are opt-in: the defaults decode every signal, in declaration order.

use serde::{Deserialize, Serialize};

/// Configuration for the signal codec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Order of the values returned by a decode call
    #[serde(default)]
    pub signal_order: SignalOrder,

    /// Whether big-endian (Motorola) signals are decoded or rejected
    #[serde(default)]
    pub big_endian: BigEndianSupport,
}

/// Output ordering of decoded values
///
/// `StartBit` changes the position of values in the output, so callers that
/// index the result by declaration order must not enable it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalOrder {
    /// Same order as the `SG_` lines in the DBC file
    #[default]
    Declaration,
    /// Ascending start bit; ties keep declaration order
    StartBit,
}

/// Support level for big-endian signals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BigEndianSupport {
    /// Decode big-endian signals
    #[default]
    Full,
    /// Fail the decode call with `UnsupportedEndianness`
    Reject,
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the output ordering
    pub fn with_signal_order(mut self, order: SignalOrder) -> Self {
        self.signal_order = order;
        self
    }

    /// Builder method: set big-endian support
    pub fn with_big_endian_support(mut self, support: BigEndianSupport) -> Self {
        self.big_endian = support;
        self
    }
}
