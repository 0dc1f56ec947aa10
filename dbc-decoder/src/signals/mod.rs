//! DBC schema and parser
//!
//! This module contains the DBC grammar parser, its line source, the
//! value-description mapper and the schema types they produce.

pub mod database;
pub mod dbc;
pub mod lines;
pub mod value_descriptions;

// Re-export key types for convenience
pub use database::{
    ByteOrder, Message, Schema, SchemaStats, Signal, ValueDescription, ValueType, NO_NODE,
};
