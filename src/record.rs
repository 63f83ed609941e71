//! Positional text records shared by the mesh and matrix dumps.
//!
//! A dump is a sequence of blocks, each a count line followed by exactly
//! that many whitespace-delimited rows. Fields never contain whitespace,
//! so no quoting or escaping exists.

use std::fmt::{Display, Write};

use crate::error::BridgeError;

/// One positional field of a record row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Field {
    Index(usize),
    Label(u32),
    Real(f64),
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Index(v) => write!(f, "{v}"),
            Field::Label(v) => write!(f, "{v}"),
            Field::Real(v) => f.write_str(&format_real(*v)),
        }
    }
}

/// Formats a float so that parsing it back yields the same bits.
///
/// Uses the shortest round-trip representation with an exponent for very
/// large or small magnitudes (`0.5`, `1e-20`), which the solver's reader
/// also accepts.
pub fn format_real(value: f64) -> String {
    format!("{:?}", value)
}

/// Returns the line announcing a block of `count` records.
pub fn write_header_line(count: usize) -> String {
    format!("{count}\n")
}

/// Returns one record line with the fields separated by single spaces.
pub fn write_row(fields: &[Field]) -> String {
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i != 0 {
            line.push(' ');
        }
        // writing into a String cannot fail
        let _ = write!(line, "{field}");
    }
    line.push('\n');
    line
}

/// Accumulates dump text block by block.
#[derive(Debug, Default)]
pub struct RecordWriter {
    buffer: String,
}

impl RecordWriter {
    pub fn new() -> RecordWriter {
        RecordWriter::default()
    }

    pub fn header(&mut self, count: usize) -> &mut Self {
        self.buffer.push_str(&write_header_line(count));
        self
    }

    pub fn row(&mut self, fields: &[Field]) -> &mut Self {
        self.buffer.push_str(&write_row(fields));
        self
    }

    /// Appends a verbatim line such as a block marker.
    pub fn line(&mut self, text: &str) -> &mut Self {
        self.buffer.push_str(text);
        self.buffer.push('\n');
        self
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Reads a count line: exactly one non-negative integer token.
pub fn read_count(line: &str) -> Result<usize, BridgeError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 1 {
        return Err(BridgeError::Format(format!(
            "expected a single record count, found '{}'",
            line.trim()
        )));
    }

    match tokens[0].parse::<usize>() {
        Ok(count) => Ok(count),
        Err(_) => Err(BridgeError::Format(format!(
            "expected a non-negative record count, found '{}'",
            tokens[0]
        ))),
    }
}

/// Splits a record line on runs of whitespace and checks its arity.
pub fn read_row(line: &str, arity: usize) -> Result<Vec<&str>, BridgeError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != arity {
        return Err(BridgeError::Format(format!(
            "expected {arity} fields, found {} in '{}'",
            tokens.len(),
            line.trim()
        )));
    }
    Ok(tokens)
}

pub fn parse_index(token: &str) -> Result<usize, BridgeError> {
    token
        .parse()
        .map_err(|_| BridgeError::Format(format!("expected a non-negative integer, found '{token}'")))
}

pub fn parse_label(token: &str) -> Result<u32, BridgeError> {
    token
        .parse()
        .map_err(|_| BridgeError::Format(format!("expected a label, found '{token}'")))
}

pub fn parse_real(token: &str) -> Result<f64, BridgeError> {
    token
        .parse()
        .map_err(|_| BridgeError::Format(format!("expected a real number, found '{token}'")))
}

/// Returns the text following the first line equal to `marker`, ignoring
/// surrounding whitespace on that line.
pub fn after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let marker = marker.trim();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        offset += line.len();
        if line.trim() == marker {
            return Some(&text[offset..]);
        }
    }
    None
}

/// Cursor over captured text that hands out records line by line.
///
/// Blank lines are skipped. Errors carry the 1-based line number
/// relative to the start of the text given to [`RecordReader::new`].
#[derive(Debug, Clone)]
pub struct RecordReader<'a> {
    text: &'a str,
    offset: usize,
    line_number: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(text: &'a str) -> RecordReader<'a> {
        RecordReader {
            text,
            offset: 0,
            line_number: 0,
        }
    }

    /// Returns the next non-blank line, trimmed.
    pub fn next_line(&mut self) -> Option<&'a str> {
        while self.offset < self.text.len() {
            let rest = &self.text[self.offset..];
            let (line, consumed) = match rest.find('\n') {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };
            self.offset += consumed;
            self.line_number += 1;

            let line = line.trim();
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }

    /// Reads a count line announcing a block of `what`.
    pub fn count(&mut self, what: &str) -> Result<usize, BridgeError> {
        let line = match self.next_line() {
            Some(line) => line,
            None => {
                return Err(BridgeError::Format(format!(
                    "unexpected end of input, expected the {what} count"
                )))
            }
        };
        read_count(line).map_err(|err| self.at_line(err))
    }

    /// Reads one row of exactly `N` fields.
    pub fn row<const N: usize>(&mut self, what: &str) -> Result<[&'a str; N], BridgeError> {
        let line = match self.next_line() {
            Some(line) => line,
            None => {
                return Err(BridgeError::Format(format!(
                    "unexpected end of input while reading {what}"
                )))
            }
        };
        let tokens = read_row(line, N).map_err(|err| self.at_line(err))?;
        let fields: [&'a str; N] = tokens
            .try_into()
            .map_err(|_| BridgeError::Format(format!("expected {N} fields in {what}")))?;
        Ok(fields)
    }

    /// Attaches the current line number to a format error.
    pub fn at_line(&self, err: BridgeError) -> BridgeError {
        match err {
            BridgeError::Format(message) => {
                BridgeError::Format(format!("line {}: {message}", self.line_number))
            }
            other => other,
        }
    }

    /// Capacity to reserve for a block announcing `count` rows, bounded by
    /// what the unread text could hold (every row takes at least two bytes).
    pub fn capacity_for(&self, count: usize) -> usize {
        count.min(self.remainder().len() / 2)
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Text not yet consumed.
    pub fn remainder(&self) -> &'a str {
        &self.text[self.offset..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_row_mixed_fields() {
        let line = write_row(&[Field::Index(3), Field::Real(0.5), Field::Label(7)]);
        assert_eq!(line, "3 0.5 7\n");
        assert_eq!(write_header_line(12), "12\n");
    }

    #[test]
    fn test_format_real_is_exact() {
        for value in [0.0, -1.25, 1e-20, 6.02214076e23, 0.1 + 0.2] {
            let parsed: f64 = format_real(value).parse().unwrap();
            assert_eq!(parsed.to_bits(), value.to_bits());
        }
    }

    #[test]
    fn test_read_count() {
        assert_eq!(read_count("  42 ").unwrap(), 42);
        assert!(matches!(read_count("three"), Err(BridgeError::Format(_))));
        assert!(matches!(read_count("-1"), Err(BridgeError::Format(_))));
        assert!(matches!(read_count("1 2"), Err(BridgeError::Format(_))));
        assert!(matches!(read_count(""), Err(BridgeError::Format(_))));
    }

    #[test]
    fn test_read_row_arity() {
        assert_eq!(read_row("0\t1   2", 3).unwrap(), vec!["0", "1", "2"]);
        assert!(matches!(read_row("0 1", 3), Err(BridgeError::Format(_))));
    }

    #[test]
    fn test_reader_skips_blank_lines_and_tracks_remainder() {
        let mut reader = RecordReader::new("\n2\r\n1 2\n\n3 4\ntail\n");
        assert_eq!(reader.count("pairs").unwrap(), 2);
        assert_eq!(reader.row::<2>("pair").unwrap(), ["1", "2"]);
        assert_eq!(reader.row::<2>("pair").unwrap(), ["3", "4"]);
        assert_eq!(reader.remainder(), "tail\n");
    }

    #[test]
    fn test_reader_error_names_line() {
        let mut reader = RecordReader::new("1\n0 1\n");
        reader.count("triangles").unwrap();
        let err = reader.row::<3>("triangle").unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_after_marker() {
        let text = "banner\n# FLAG > A\n1\n0 0 1.0\n# FLAG > AB\n";
        assert_eq!(after_marker(text, "# FLAG > A"), Some("1\n0 0 1.0\n# FLAG > AB\n"));
        assert_eq!(after_marker(text, "# FLAG > AB"), Some(""));
        assert_eq!(after_marker(text, "# FLAG > B"), None);
        assert_eq!(after_marker("# FLAG > A\r\n2\n", "# FLAG > A"), Some("2\n"));
    }

    #[test]
    fn test_capacity_is_bounded_by_input() {
        let mut reader = RecordReader::new("18446744073709551615\n0 0 1.0\n");
        let count = reader.count("entries").unwrap();
        assert_eq!(count, usize::MAX);
        assert_eq!(reader.capacity_for(count), 4);
        assert_eq!(reader.capacity_for(1), 1);
    }

    #[test]
    fn test_reader_end_of_input() {
        let mut reader = RecordReader::new("");
        assert!(matches!(reader.count("nodes"), Err(BridgeError::Format(_))));
    }
}
