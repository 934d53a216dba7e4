//! Мягкие ошибки проверки и правила сверки счётчиков.
//!
//! [`FileError`] не прерывает чтение: ошибка записывается в списки группы
//! и файла, а флаг `valid` сбрасывается. [`TransactionError`] принадлежит
//! транзакции и поднимается до [`FileError`] только при
//! [`Severity::File`].

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::{format::RecordFormat, record::RecordTag, transaction::Transaction};

/// Уровень, к которому относится счётчик.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Файл в целом (`TRL`).
    File,
    /// Группа с указанным номером (`GRT`).
    Group(u32),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Group(sequence) => write!(f, "group {sequence}"),
        }
    }
}

/// Сверяемый счётчик.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountField {
    GroupCount,
    TransactionCount,
    RecordCount,
}

impl CountField {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::GroupCount => "group_count",
            Self::TransactionCount => "transaction_count",
            Self::RecordCount => "record_count",
        }
    }
}

impl fmt::Display for CountField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ошибка уровня файла или группы.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileError {
    /// Заявленное количество не совпало с прочитанным.
    #[error("{field} mismatch in {scope}: declared {declared}, observed {observed}")]
    CountMismatch { scope: Scope, field: CountField, declared: u32, observed: u32 },

    /// Номер группы нарушает порядок.
    #[error("group sequence mismatch: expected {expected}, found {found}")]
    SequenceMismatch { expected: u32, found: u32 },

    /// Номер в `GRT` не совпал с номером в `GRH`.
    #[error("group {header} is closed by a trailer for group {trailer}")]
    GroupIdMismatch { header: u32, trailer: u32 },

    /// Управляющую запись не удалось разобрать.
    #[error("malformed {record} record at line {line}: {message}")]
    MalformedRecord { record: &'static str, line: usize, message: String },

    /// Ошибка транзакции с уровнем [`Severity::File`].
    #[error("transaction {sequence} of group {group}, line {line}: {message}")]
    Transaction { group: u32, sequence: usize, line: usize, message: String },

    /// После `TRL` есть непустые строки.
    #[error("unexpected record after file trailer at line {line}")]
    TrailingRecord { line: usize },
}

/// Сравнивает заявленное и фактическое значения счётчика.
pub(crate) fn check_count(
    scope: Scope,
    field: CountField,
    declared: u32,
    observed: u32,
) -> Option<FileError> {
    (declared != observed).then_some(FileError::CountMismatch { scope, field, declared, observed })
}

/// Уровень ошибки транзакции.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Остаётся в [`Transaction::errors`].
    Transaction,
    /// Поднимается в ошибки группы и файла.
    File,
}

/// Ошибка, найденная в строках одной транзакции.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("line {line}: {message}")]
pub struct TransactionError {
    pub severity: Severity,
    /// Номер строки (1-based).
    pub line: usize,
    pub message: String,
}

impl TransactionError {
    pub fn new(severity: Severity, line: usize, message: impl Into<String>) -> Self {
        Self { severity, line, message: message.into() }
    }
}

/// Общие проверки транзакции плюс проверки формата `F`.
pub(crate) fn check_transaction<F: RecordFormat>(tx: &Transaction) -> Vec<TransactionError> {
    let mut errors: Vec<TransactionError> = tx
        .numbered_lines()
        .filter(|(_, text)| RecordTag::of(text) == RecordTag::Unknown)
        .map(|(line, _)| TransactionError::new(Severity::File, line, "malformed record type code"))
        .collect();
    errors.extend(F::check_transaction(tx));
    errors
}
