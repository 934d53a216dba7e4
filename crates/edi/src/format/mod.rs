//! Форматы управляющих записей.
//!
//! Ядро чтения (файл → группы → транзакции) одинаково для всех форматов;
//! формат отвечает только за разбор `HDR`/`GRH`/`GRT`/`TRL` и за
//! собственные проверки транзакций.
//!
//! - [`FixedWidth`] — фиксированные колонки в стиле CWR
//! - [`Delimited`] — `TAG|key=value|...`

mod delimited;
mod fixed;

use std::io::{self, BufRead};

use crate::{
    options::ReaderOptions,
    record::{FileHeader, FileTrailer, GroupHeader, GroupTrailer, RecordError},
    transaction::Transaction,
    validation::TransactionError,
};

/// Marker type for the fixed-width format.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedWidth;

/// Marker type for the delimited format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Delimited;

/// Trait for parsing control records of a concrete format.
///
/// Implemented by marker types (`FixedWidth`, `Delimited`); every parser gets
/// a whole line whose record type has already been recognised.
pub trait RecordFormat {
    /// Human-readable format name.
    const NAME: &'static str;

    /// Options a file of this format is checked with unless told otherwise.
    fn default_options() -> ReaderOptions {
        ReaderOptions::default()
    }

    fn parse_file_header(line: &str) -> Result<FileHeader, RecordError>;

    fn parse_file_trailer(line: &str) -> Result<FileTrailer, RecordError>;

    fn parse_group_header(line: &str) -> Result<GroupHeader, RecordError>;

    fn parse_group_trailer(line: &str) -> Result<GroupTrailer, RecordError>;

    /// Format-specific checks of a finished transaction.
    ///
    /// Default implementation finds nothing.
    fn check_transaction(_tx: &Transaction) -> Vec<TransactionError> {
        Vec::new()
    }
}

/// Format enum for runtime format selection.
///
/// Use this when the format is determined at runtime (e.g., from file extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// Fixed-width CWR-style columns.
    FixedWidth,
    /// `TAG|key=value` records.
    Delimited,
}

impl Format {
    /// Determines format from file extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use edi::format::Format;
    ///
    /// assert_eq!(Format::from_extension("CWR"), Some(Format::FixedWidth));
    /// assert_eq!(Format::from_extension("edi"), Some(Format::Delimited));
    /// assert_eq!(Format::from_extension("json"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "cwr" | "v21" | "v22" => Some(Self::FixedWidth),
            "edi" | "txt" => Some(Self::Delimited),
            _ => None,
        }
    }

    /// Detects format from the start of the input without consuming it.
    ///
    /// A fixed-width header continues with alphanumeric columns right after
    /// `HDR` and never contains `|`; any other header line is delimited.
    /// Returns `None` if the input does not start with `HDR`.
    pub fn detect<R: BufRead>(reader: &mut R) -> io::Result<Option<Self>> {
        let buf = reader.fill_buf()?;
        let Some(rest) = buf.strip_prefix(b"HDR") else {
            return Ok(None);
        };
        let line = rest.split(|&b| b == b'\n').next().unwrap_or(rest);
        Ok(Some(match line.first() {
            Some(b) if b.is_ascii_alphanumeric() && !line.contains(&b'|') => Self::FixedWidth,
            _ => Self::Delimited,
        }))
    }

    /// Human-readable format name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FixedWidth => FixedWidth::NAME,
            Self::Delimited => Delimited::NAME,
        }
    }
}
