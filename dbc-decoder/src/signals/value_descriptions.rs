//! Value descriptions (`VAL_` lines)
//!
//! `VAL_` lines carry an unbounded number of `value "text"` pairs, so they
//! are split by a small tokenizer instead of a single pattern. The parsed
//! tables are queued while the body is scanned and attached to their signals
//! once all messages are known, because a `VAL_` line usually appears long
//! after the `SG_` line it refers to.

use crate::signals::database::{Message, ValueDescription};

/// A parsed `VAL_` line waiting to be attached to its signal
#[derive(Debug, Clone, PartialEq)]
pub struct PendingValueDescriptions {
    pub message_id: u32,
    pub signal_name: String,
    pub descriptions: Vec<ValueDescription>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token<'a> {
    Word(&'a str),
    Quoted(&'a str),
    Semicolon,
}

struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    /// `Err(())` marks an unterminated quoted string
    type Item = Result<Token<'a>, ()>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rest = self.rest.trim_start();
        let mut chars = self.rest.chars();

        match chars.next()? {
            ';' => {
                self.rest = &self.rest[1..];
                Some(Ok(Token::Semicolon))
            }
            '"' => {
                let body = &self.rest[1..];
                match body.find('"') {
                    Some(end) => {
                        self.rest = &body[end + 1..];
                        Some(Ok(Token::Quoted(&body[..end])))
                    }
                    None => {
                        self.rest = "";
                        Some(Err(()))
                    }
                }
            }
            _ => {
                let end = self
                    .rest
                    .find(|c: char| c.is_whitespace() || c == '"' || c == ';')
                    .unwrap_or(self.rest.len());
                let word = &self.rest[..end];
                self.rest = &self.rest[end..];
                Some(Ok(Token::Word(word)))
            }
        }
    }
}

/// Parse a `VAL_ <id> <signal> (<value> "<text>")+ ;` line.
///
/// Returns `None` for anything that does not follow that shape, including
/// environment-variable value tables (`VAL_ <name> ...`), negative values and
/// a missing `;`.
pub fn parse_value_descriptions(line: &str) -> Option<PendingValueDescriptions> {
    let mut tokens = Tokenizer::new(line);

    if tokens.next()? != Ok(Token::Word("VAL_")) {
        return None;
    }

    let message_id = match tokens.next()? {
        Ok(Token::Word(id)) => id.parse::<u32>().ok()?,
        _ => return None,
    };

    let signal_name = match tokens.next()? {
        Ok(Token::Word(name)) if is_identifier(name) => name.to_string(),
        _ => return None,
    };

    let mut descriptions = Vec::new();
    loop {
        match tokens.next()? {
            Ok(Token::Word(value)) => {
                let value = value.parse::<u32>().ok()?;
                let description = match tokens.next()? {
                    Ok(Token::Quoted(text)) => text.to_string(),
                    _ => return None,
                };
                descriptions.push(ValueDescription { value, description });
            }
            Ok(Token::Semicolon) => break,
            _ => return None,
        }
    }

    if descriptions.is_empty() {
        return None;
    }

    Some(PendingValueDescriptions {
        message_id,
        signal_name,
        descriptions,
    })
}

/// Attach queued value tables to their signals.
///
/// Each table replaces the target signal's existing table. Entries naming a
/// message ID or signal that does not exist are dropped.
pub fn apply_value_descriptions(
    messages: &mut [Message],
    pending: Vec<PendingValueDescriptions>,
) {
    for entry in pending {
        let Some(message) = messages.iter_mut().find(|m| m.id == entry.message_id) else {
            log::debug!(
                "Dropping VAL_ for unknown message {} ({})",
                entry.message_id,
                entry.signal_name
            );
            continue;
        };

        match message.signal_mut(&entry.signal_name) {
            Some(signal) => signal.value_descriptions = entry.descriptions,
            None => log::debug!(
                "Dropping VAL_ for unknown signal {} in message {}",
                entry.signal_name,
                entry.message_id
            ),
        }
    }
}

pub(crate) fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
