//! Line source for the DBC parser
//!
//! Reads logical lines from any `BufRead`, independent of the line ending
//! convention the file was written with. The reader only moves forward, so
//! non-seekable streams are valid input.

use crate::types::{DbcError, Result};
use std::io::{self, BufRead};

/// Forward-only line reader
pub struct LineReader<R> {
    reader: R,
    buf: String,
    line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_number: 0,
        }
    }

    /// Read the next line without its `\n` / `\r\n` terminator.
    /// Returns `None` at end of input.
    ///
    /// Input that is not valid UTF-8 is reported as `NonDbcFormat`.
    pub fn next_line(&mut self) -> Result<Option<&str>> {
        self.buf.clear();
        let read = match self.reader.read_line(&mut self.buf) {
            Ok(read) => read,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                log::warn!("Input is not valid UTF-8 text (line {})", self.line_number + 1);
                return Err(DbcError::NonDbcFormat);
            }
            Err(e) => return Err(e.into()),
        };

        if read == 0 {
            return Ok(None);
        }

        self.line_number += 1;
        Ok(Some(self.buf.trim_end_matches(['\n', '\r'])))
    }

    /// Skip blank lines and return the next line with content
    pub fn next_non_blank(&mut self) -> Result<Option<&str>> {
        loop {
            let blank = match self.next_line()? {
                None => return Ok(None),
                Some(line) => is_blank(line),
            };
            if !blank {
                return Ok(Some(self.current()));
            }
        }
    }

    /// Number of lines read so far (1-based number of the current line)
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn current(&self) -> &str {
        self.buf.trim_end_matches(['\n', '\r'])
    }
}

/// True if the line holds nothing but whitespace
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}
