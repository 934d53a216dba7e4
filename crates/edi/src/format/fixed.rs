//! Fixed-width CWR-style records.
//!
//! Column ranges are 0-based byte offsets:
//!
//! ```text
//! HDR  type 0..3  sender type 3..5  sender id 5..14  sender name 14..59
//!      version 59..64  created 64..72 / 72..78  transmitted 78..86  charset 86..101
//! GRH  type 0..3  transaction type 3..6  group id 6..11  version 11..16  batch 16..26
//! GRT  type 0..3  group id 3..8  transactions 8..16  records 16..24
//! TRL  type 0..3  groups 3..8  transactions 8..16  records 16..24
//! ```
//!
//! Every transaction record carries its transaction sequence number at
//! 3..11 and its record sequence number at 11..19.

use std::ops::Range;

use super::{FixedWidth, RecordFormat};
use crate::{
    options::ReaderOptions,
    record::{FileHeader, FileTrailer, GroupHeader, GroupTrailer, RecordError},
    transaction::Transaction,
    validation::{Severity, TransactionError},
};

const TRANSACTION_SEQUENCE: Range<usize> = 3..11;
const RECORD_SEQUENCE: Range<usize> = 11..19;

/// Returns a mandatory column.
fn field<'a>(line: &'a str, range: Range<usize>, name: &'static str) -> Result<&'a str, RecordError> {
    line.get(range).ok_or(RecordError::Truncated { field: name, len: line.len() })
}

/// Returns a trailing column that may be cut short or missing entirely.
fn optional(line: &str, range: Range<usize>) -> &str {
    let end = range.end.min(line.len());
    line.get(range.start..end).unwrap_or("").trim()
}

fn number<T: std::str::FromStr>(
    line: &str,
    range: Range<usize>,
    name: &'static str,
) -> Result<T, RecordError> {
    let raw = field(line, range, name)?;
    raw.trim()
        .parse()
        .map_err(|_| RecordError::InvalidNumber { field: name, value: raw.to_string() })
}

impl RecordFormat for FixedWidth {
    const NAME: &'static str = "fixed-width";

    fn default_options() -> ReaderOptions {
        ReaderOptions::cwr()
    }

    fn parse_file_header(line: &str) -> Result<FileHeader, RecordError> {
        Ok(FileHeader {
            sender_type: field(line, 3..5, "sender_type")?.trim().to_string(),
            sender_id: field(line, 5..14, "sender_id")?.trim().to_string(),
            sender_name: field(line, 14..59, "sender_name")?.trim().to_string(),
            edi_version: field(line, 59..64, "edi_version")?.trim().to_string(),
            creation_date: field(line, 64..72, "creation_date")?.to_string(),
            creation_time: field(line, 72..78, "creation_time")?.to_string(),
            transmission_date: field(line, 78..86, "transmission_date")?.to_string(),
            character_set: optional(line, 86..101).to_string(),
        })
    }

    fn parse_file_trailer(line: &str) -> Result<FileTrailer, RecordError> {
        Ok(FileTrailer {
            group_count: number(line, 3..8, "group_count")?,
            transaction_count: number(line, 8..16, "transaction_count")?,
            record_count: number(line, 16..24, "record_count")?,
        })
    }

    fn parse_group_header(line: &str) -> Result<GroupHeader, RecordError> {
        let batch = optional(line, 16..26);
        Ok(GroupHeader {
            transaction_type: field(line, 3..6, "transaction_type")?.parse()?,
            group_id: number(line, 6..11, "group_id")?,
            version: field(line, 11..16, "version")?.trim().to_string(),
            batch_request: if batch.is_empty() {
                None
            } else {
                Some(batch.parse().map_err(|_| RecordError::InvalidNumber {
                    field: "batch_request",
                    value: batch.to_string(),
                })?)
            },
        })
    }

    fn parse_group_trailer(line: &str) -> Result<GroupTrailer, RecordError> {
        Ok(GroupTrailer {
            group_id: Some(number(line, 3..8, "group_id")?),
            transaction_count: number(line, 8..16, "transaction_count")?,
            record_count: number(line, 16..24, "record_count")?,
        })
    }

    fn check_transaction(tx: &Transaction) -> Vec<TransactionError> {
        let mut errors = Vec::new();
        for (index, (line, text)) in tx.numbered_lines().enumerate() {
            if text.len() < RECORD_SEQUENCE.end {
                errors.push(TransactionError::new(
                    Severity::File,
                    line,
                    format!("record is {} bytes, shorter than its sequence numbers", text.len()),
                ));
                continue;
            }

            match number::<usize>(text, TRANSACTION_SEQUENCE, "transaction_sequence") {
                Ok(seq) if seq == tx.sequence() => {}
                Ok(seq) => errors.push(TransactionError::new(
                    Severity::Transaction,
                    line,
                    format!("transaction sequence {seq}, expected {}", tx.sequence()),
                )),
                Err(e) => errors.push(TransactionError::new(Severity::Transaction, line, e.to_string())),
            }

            match number::<usize>(text, RECORD_SEQUENCE, "record_sequence") {
                Ok(seq) if seq == index => {}
                Ok(seq) => errors.push(TransactionError::new(
                    Severity::Transaction,
                    line,
                    format!("record sequence {seq}, expected {index}"),
                )),
                Err(e) => errors.push(TransactionError::new(Severity::Transaction, line, e.to_string())),
            }
        }
        errors
    }
}
