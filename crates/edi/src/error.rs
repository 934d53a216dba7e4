//! Жёсткие ошибки чтения EDI-файла.

use thiserror::Error;

use crate::record::RecordError;

/// Ошибка, после которой чтение файла невозможно продолжить.
///
/// Расхождения счётчиков и номеров групп сюда не попадают: они
/// накапливаются как [`FileError`](crate::FileError) и не прерывают чтение.
#[derive(Debug, Error)]
pub enum EdiError {
    /// Ошибка ввода/вывода.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Строка не является корректным UTF-8.
    #[error("Invalid UTF-8 at line {line}: {source}")]
    InvalidUtf8 {
        /// Номер строки (1-based).
        line: usize,
        /// Исходная ошибка декодирования.
        source: std::string::FromUtf8Error,
    },

    /// Во входном потоке нет ни одной строки.
    #[error("Input is empty")]
    EmptyInput,

    /// Первая строка файла не является записью `HDR`.
    #[error("File header missing: line 1 starts with '{found}'")]
    FileHeaderMissing {
        /// Начало первой строки.
        found: String,
    },

    /// На месте очередной группы нет записи `GRH`.
    #[error("Group header missing for group {group} at line {line}")]
    GroupHeaderMissing {
        /// Ожидаемый номер группы.
        group: u32,
        /// Номер строки (1-based).
        line: usize,
    },

    /// Группа закончилась (`GRH`, `TRL` или конец потока) без записи `GRT`.
    #[error("Group trailer missing for group {group}{}", at_line(.line))]
    GroupTrailerMissing {
        /// Номер незакрытой группы.
        group: u32,
        /// Строка, на которой обнаружен разрыв; `None` для конца потока.
        line: Option<usize>,
    },

    /// Поток закончился без записи `TRL`.
    #[error("File trailer missing")]
    FileTrailerMissing,

    /// Запись `GRH` не удалось разобрать, граница транзакций неизвестна.
    #[error("Invalid group header at line {line}: {source}")]
    InvalidGroupHeader {
        /// Номер строки (1-based).
        line: usize,
        /// Причина.
        source: RecordError,
    },

    /// Повторный вызов [`Group::transactions`](crate::group::Group::transactions).
    #[error("get_transactions was already run for this group")]
    TransactionsAlreadyRead,
}

fn at_line(line: &Option<usize>) -> String {
    line.map(|line| format!(" at line {line}")).unwrap_or_else(|| " at end of input".to_string())
}

/// Удобный alias для Result с [`EdiError`].
pub type Result<T> = std::result::Result<T, EdiError>;
