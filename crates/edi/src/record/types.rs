//! Управляющие записи: заголовки и трейлеры файла и групп.

use serde::Serialize;
use thiserror::Error;

use super::TagCode;

/// Ошибка разбора отдельной записи.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// Обязательное поле отсутствует.
    #[error("missing field '{0}'")]
    MissingField(&'static str),

    /// Строка короче, чем нужно для поля фиксированной ширины.
    #[error("field '{field}' is truncated: record has {len} bytes")]
    Truncated {
        /// Имя поля.
        field: &'static str,
        /// Длина записи в байтах.
        len: usize,
    },

    /// Значение поля не является числом.
    #[error("field '{field}' is not a number: '{value}'")]
    InvalidNumber {
        /// Имя поля.
        field: &'static str,
        /// Фактическое значение.
        value: String,
    },

    /// Некорректный код типа транзакции.
    #[error("invalid record type code '{0}'")]
    InvalidTag(String),

    /// Сегмент разделённой записи не имеет вида `key=value`.
    #[error("malformed field '{0}', expected key=value")]
    MalformedField(String),

    /// Ключ разделённой записи встречается дважды.
    #[error("duplicate field '{0}'")]
    DuplicateField(String),
}

/// Заголовок файла (`HDR`).
///
/// Все поля текстовые: ядро только сохраняет их для отчёта.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    /// Тип отправителя (`PB`, `SO`, `AA`, ...).
    pub sender_type: String,
    /// Идентификатор отправителя.
    pub sender_id: String,
    /// Наименование отправителя.
    pub sender_name: String,
    /// Версия стандарта EDI.
    pub edi_version: String,
    /// Дата создания файла (`YYYYMMDD`).
    pub creation_date: String,
    /// Время создания файла (`HHMMSS`).
    pub creation_time: String,
    /// Дата передачи (`YYYYMMDD`).
    pub transmission_date: String,
    /// Кодировка, если указана.
    pub character_set: String,
}

/// Трейлер файла (`TRL`) с заявленными количествами.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileTrailer {
    /// Заявленное число групп.
    pub group_count: u32,
    /// Заявленное число транзакций во всех группах.
    pub transaction_count: u32,
    /// Заявленное число записей, включая `HDR` и `TRL`.
    pub record_count: u32,
}

/// Заголовок группы (`GRH`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupHeader {
    /// Код типа транзакций группы: строки с этим кодом открывают транзакцию.
    pub transaction_type: TagCode,
    /// Порядковый номер группы в файле.
    pub group_id: u32,
    /// Версия формата транзакций.
    pub version: String,
    /// Номер пакетного запроса, если указан.
    pub batch_request: Option<u64>,
}

/// Трейлер группы (`GRT`) с заявленными количествами.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupTrailer {
    /// Номер группы, если формат его передаёт.
    pub group_id: Option<u32>,
    /// Заявленное число транзакций.
    pub transaction_count: u32,
    /// Заявленное число записей, включая `GRH` и `GRT`.
    pub record_count: u32,
}
