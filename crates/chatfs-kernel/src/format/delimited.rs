//! Delimited-text row encoding (RFC-4180).
//!
//! Fields are quoted only when they contain the delimiter, a quote, or a
//! line break; embedded quotes are doubled. Rows end with `\n`.

use csv_core::{Terminator, WriteResult, Writer, WriterBuilder};

use super::error::{FormatError, FormatResult};
use super::pool::Reset;

/// Room for a closing quote plus the delimiter or terminator.
const SEPARATOR_SLACK: usize = 4;

/// Validate a delimiter character and return its byte.
pub fn delimiter_byte(delimiter: char) -> FormatResult<u8> {
    match delimiter {
        '"' | '\r' | '\n' => Err(FormatError::InvalidDelimiter(delimiter)),
        c if c.is_ascii() => Ok(c as u8),
        c => Err(FormatError::InvalidDelimiter(c)),
    }
}

/// Encodes one row at a time into an owned buffer.
///
/// The buffer is reused between rows; each [`encode`](Self::encode) call
/// replaces the previous row.
#[derive(Debug)]
pub struct RowEncoder {
    delimiter: u8,
    writer: Writer,
    buf: Vec<u8>,
}

impl RowEncoder {
    pub fn new(delimiter: u8) -> Self {
        Self {
            delimiter,
            writer: Self::writer(delimiter),
            buf: Vec::with_capacity(256),
        }
    }

    fn writer(delimiter: u8) -> Writer {
        WriterBuilder::new()
            .delimiter(delimiter)
            .terminator(Terminator::Any(b'\n'))
            .build()
    }

    /// Encode `columns` as one terminated row.
    pub fn encode<S: AsRef<str>>(&mut self, columns: &[S]) -> FormatResult<&str> {
        self.reset();
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.separator(|writer, out| writer.delimiter(out));
            }
            self.field(column.as_ref().as_bytes());
        }
        self.separator(|writer, out| writer.terminator(out));
        Ok(std::str::from_utf8(&self.buf)?)
    }

    fn field(&mut self, input: &[u8]) {
        let start = self.buf.len();
        // Worst case: opening quote plus every byte doubled.
        self.buf.resize(start + 2 + 2 * input.len(), 0);
        let (result, _, written) = self.writer.field(input, &mut self.buf[start..]);
        debug_assert!(matches!(result, WriteResult::InputEmpty));
        self.buf.truncate(start + written);
    }

    fn separator(&mut self, write: impl FnOnce(&mut Writer, &mut [u8]) -> (WriteResult, usize)) {
        let start = self.buf.len();
        self.buf.resize(start + SEPARATOR_SLACK, 0);
        let (result, written) = write(&mut self.writer, &mut self.buf[start..]);
        debug_assert!(matches!(result, WriteResult::InputEmpty));
        self.buf.truncate(start + written);
    }
}

impl Reset for RowEncoder {
    fn reset(&mut self) {
        self.buf.clear();
        self.writer = Self::writer(self.delimiter);
    }
}
