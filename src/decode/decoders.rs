//! Streaming CSV reader
//!
//! Wraps the csv crate's byte-record reader so that rows are decoded lazily
//! and in file order.

use super::types::{RawRow, TextEncoding};
use crate::error::{Error, Result};
use bytes::Bytes;
use csv::{ByteRecord, ReaderBuilder};
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use std::sync::Arc;

/// Iterator of rows over a headed CSV stream
pub struct CsvRowReader<R: Read> {
    reader: csv::Reader<R>,
    headers: Arc<Vec<String>>,
    encoding: TextEncoding,
    record: ByteRecord,
    finished: bool,
}

impl CsvRowReader<GzDecoder<Cursor<Bytes>>> {
    /// Read a gzip-compressed CSV body
    pub fn from_gzip(body: Bytes, encoding: TextEncoding) -> Result<Self> {
        Self::new(GzDecoder::new(Cursor::new(body)), encoding)
    }
}

impl<R: Read> CsvRowReader<R> {
    /// Read a plain CSV stream; the first record is the header
    pub fn new(input: R, encoding: TextEncoding) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(input);

        let headers = reader
            .byte_headers()
            .map_err(|e| Error::decode(format!("Failed to read CSV header: {e}")))?
            .iter()
            .map(|h| encoding.decode(h))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            reader,
            headers: Arc::new(headers),
            encoding,
            record: ByteRecord::new(),
            finished: false,
        })
    }

    /// Column names from the header row
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Result<Option<RawRow>> {
        let has_record = self.reader.read_byte_record(&mut self.record).map_err(|e| {
            let line = e.position().map_or(0, csv::Position::line);
            Error::decode(format!("Malformed CSV near line {line}: {e}"))
        })?;
        if !has_record {
            return Ok(None);
        }

        let values = self
            .record
            .iter()
            .map(|field| self.encoding.decode(field))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(RawRow::new(Arc::clone(&self.headers), values)))
    }
}

impl<R: Read> Iterator for CsvRowReader<R> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                // A decode failure poisons the rest of the stream
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
