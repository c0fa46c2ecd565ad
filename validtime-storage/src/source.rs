//! Tabular snapshot source over CSV.
//!
//! The first record is the header naming the columns. Each further record
//! must have exactly as many fields as the header. Cells equal to the null
//! token load as NULL.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ErrorKind, ReaderBuilder, StringRecord};

use validtime_core::{ValidtimeError, ValidtimeResult};

pub struct TabularSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    null_token: String,
    record: StringRecord,
}

impl TabularSource<File> {
    pub fn from_path(path: &Path, null_token: &str) -> ValidtimeResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, null_token)
    }
}

impl<R: Read> TabularSource<R> {
    /// Wrap `reader` and read its header.
    ///
    /// Fails with `MalformedInput` when the header is missing, has a blank
    /// name or repeats a name.
    pub fn from_reader(reader: R, null_token: &str) -> ValidtimeResult<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() {
            return Err(malformed(1, "snapshot has no header fields"));
        }
        let mut seen = HashSet::new();
        for name in &headers {
            if name.is_empty() {
                return Err(malformed(1, "blank column name in header"));
            }
            if !seen.insert(name.as_str()) {
                return Err(malformed(1, &format!("duplicate column {name:?} in header")));
            }
        }

        Ok(Self {
            reader,
            headers,
            null_token: null_token.to_string(),
            record: StringRecord::new(),
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Next record with null-token cells mapped to `None`.
    pub fn next_record(&mut self) -> ValidtimeResult<Option<Vec<Option<String>>>> {
        if !self.reader.read_record(&mut self.record).map_err(csv_err)? {
            return Ok(None);
        }
        let row = self
            .record
            .iter()
            .map(|cell| (cell != self.null_token).then(|| cell.to_string()))
            .collect();
        Ok(Some(row))
    }
}

fn malformed(line: u64, message: &str) -> ValidtimeError {
    ValidtimeError::MalformedInput {
        line,
        message: message.to_string(),
    }
}

fn csv_err(e: csv::Error) -> ValidtimeError {
    let line = e.position().map(|p| p.line()).unwrap_or(0);
    match e.into_kind() {
        ErrorKind::Io(io) => ValidtimeError::Io(io),
        ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => malformed(
            line,
            &format!("expected {expected_len} fields, found {len}"),
        ),
        other => malformed(line, &format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn source(text: &str) -> ValidtimeResult<TabularSource<Cursor<Vec<u8>>>> {
        TabularSource::from_reader(Cursor::new(text.as_bytes().to_vec()), "")
    }

    #[test]
    fn test_reads_header_and_rows() {
        let mut src = source("a,b\n1,x\n2,\n").unwrap();
        assert_eq!(src.headers(), ["a", "b"]);
        assert_eq!(
            src.next_record().unwrap(),
            Some(vec![Some("1".to_string()), Some("x".to_string())])
        );
        assert_eq!(src.next_record().unwrap(), Some(vec![Some("2".to_string()), None]));
        assert_eq!(src.next_record().unwrap(), None);
    }

    #[test]
    fn test_custom_null_token() {
        let mut src =
            TabularSource::from_reader(Cursor::new(b"a,b\n\\N,\n".to_vec()), "\\N").unwrap();
        assert_eq!(
            src.next_record().unwrap(),
            Some(vec![None, Some(String::new())])
        );
    }

    #[test]
    fn test_fieldless_header_is_malformed() {
        assert!(matches!(
            source(""),
            Err(ValidtimeError::MalformedInput { line: 1, .. })
        ));
        assert!(matches!(
            source("a,a\n1,2\n"),
            Err(ValidtimeError::MalformedInput { .. })
        ));
    }

    #[test]
    fn test_short_row_reports_line() {
        let mut src = source("a,b\n1,2\n3\n").unwrap();
        assert!(src.next_record().unwrap().is_some());
        match src.next_record() {
            Err(ValidtimeError::MalformedInput { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed input, got {other:?}"),
        }
    }
}
