//! Main decoder API
//!
//! This module provides the primary interface for the decoder library.
//! The Decoder struct owns the schema loaded from a DBC file together with
//! the decode configuration.

use crate::config::DecoderConfig;
use crate::message_decoder::{DecodedSignal, MessageDecoder};
use crate::signals::{Schema, SchemaStats};
use crate::types::{DbcError, Result};
use std::io::BufRead;
use std::path::Path;

/// The main decoder struct - entry point for all decoding operations
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    /// Schema of the last successfully loaded DBC
    schema: Schema,
    /// Decode behavior
    config: DecoderConfig,
}

impl Decoder {
    /// Create a new decoder instance with an empty schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder with the given configuration
    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            schema: Schema::default(),
            config,
        }
    }

    /// Load a DBC file, replacing the current schema
    ///
    /// On error the current schema is left untouched.
    ///
    /// # Example
    /// ```no_run
    /// use dbc_decoder::Decoder;
    /// use std::path::Path;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder.load_dbc(Path::new("powertrain.dbc")).unwrap();
    /// ```
    pub fn load_dbc(&mut self, path: &Path) -> Result<()> {
        log::info!("Loading DBC file: {:?}", path);
        self.schema = crate::signals::dbc::parse_dbc_file(path)?;
        log::info!("DBC file loaded successfully: {:?}", path);
        Ok(())
    }

    /// Load DBC text from a reader, replacing the current schema
    pub fn load_dbc_reader<R: BufRead>(&mut self, reader: R) -> Result<()> {
        self.schema = crate::signals::dbc::parse(reader)?;
        Ok(())
    }

    /// Load DBC text held in memory, replacing the current schema
    pub fn load_dbc_str(&mut self, text: &str) -> Result<()> {
        self.schema = crate::signals::dbc::parse_str(text)?;
        Ok(())
    }

    /// Decode a payload into one physical value per signal
    ///
    /// # Example
    /// ```
    /// use dbc_decoder::Decoder;
    ///
    /// let mut decoder = Decoder::new();
    /// decoder
    ///     .load_dbc_str(
    ///         "VERSION \"1.0\"\n\nBS_:\n\nBU_: A B\n\nBO_ 10 M: 1 A\n SG_ S : 0|8@1+ (1,0) [0|255] \"\" A\n",
    ///     )
    ///     .unwrap();
    /// assert_eq!(decoder.decode(10, &[0x7F]).unwrap(), vec![127.0]);
    /// ```
    pub fn decode(&self, can_id: u32, payload: &[u8]) -> Result<Vec<f64>> {
        self.schema.decode(can_id, payload, &self.config)
    }

    /// Decode a payload into named signals with units and value descriptions
    pub fn decode_signals(&self, can_id: u32, payload: &[u8]) -> Result<Vec<DecodedSignal>> {
        let message = self
            .schema
            .message(can_id)
            .ok_or(DbcError::UnknownMessageId(can_id))?;
        log::debug!("Decoding message: {} (ID 0x{:X})", message.name, can_id);
        MessageDecoder::decode_signals(message, payload, &self.config)
    }

    /// The loaded schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The active configuration
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Replace the configuration
    pub fn set_config(&mut self, config: DecoderConfig) {
        self.config = config;
    }

    /// Get statistics about the loaded schema
    pub fn schema_stats(&self) -> SchemaStats {
        self.schema.stats()
    }
}
