//! Транзакция — строки между двумя границами внутри группы.

use serde::Serialize;

use crate::{record::TagCode, validation::TransactionError};

/// Одна транзакция группы.
///
/// Начинается строкой с кодом типа группы и включает все строки до
/// следующей такой строки или до `GRT`. Не изменяется после создания.
///
/// # Пример
///
/// ```
/// use edi::transaction::Transaction;
///
/// let tx = Transaction::new(
///     "ABC".parse().unwrap(),
///     vec!["ABC|tx=1".to_string(), "cont".to_string()],
///     0,
///     3,
/// );
/// assert_eq!(tx.lines().len(), 2);
/// assert!(tx.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    record_type: TagCode,
    lines: Vec<String>,
    sequence: usize,
    first_line: usize,
    errors: Vec<TransactionError>,
}

impl Transaction {
    /// Собирает транзакцию из строк. Ввода-вывода и проверок нет.
    #[must_use]
    pub fn new(record_type: TagCode, lines: Vec<String>, sequence: usize, first_line: usize) -> Self {
        Self { record_type, lines, sequence, first_line, errors: Vec::new() }
    }

    pub(crate) fn with_errors(mut self, errors: Vec<TransactionError>) -> Self {
        self.errors = errors;
        self
    }

    /// Код типа транзакций группы.
    #[must_use]
    pub fn record_type(&self) -> TagCode {
        self.record_type
    }

    /// Строки транзакции в порядке файла.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Порядковый номер в группе, начиная с 0.
    #[must_use]
    pub fn sequence(&self) -> usize {
        self.sequence
    }

    /// Номер первой строки в файле (1-based).
    #[must_use]
    pub fn first_line(&self) -> usize {
        self.first_line
    }

    /// Строки вместе с их номерами в файле.
    pub fn numbered_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.lines.iter().enumerate().map(|(i, text)| (self.first_line + i, text.as_str()))
    }

    /// Ошибки, найденные в строках транзакции.
    #[must_use]
    pub fn errors(&self) -> &[TransactionError] {
        &self.errors
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}
