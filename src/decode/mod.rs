//! Resource decoder module
//!
//! Turns a gzip-compressed CSV payload into a stream of rows without
//! materializing the decompressed file.
//!
//! # Overview
//!
//! - `CsvRowReader` - iterator of `RawRow`s over any `Read`
//! - `TextEncoding` - UTF-8 for dataset files, Latin-1 for crosswalks
//!
//! Corrupt gzip data and malformed CSV both surface as `Error::Decode`.

mod decoders;
mod types;

pub use decoders::CsvRowReader;
pub use types::{RawRow, TextEncoding};
