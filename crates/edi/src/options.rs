//! Настройки проверки файла.

use std::io::Read;

use serde::{Deserialize, Serialize};

/// Правила подсчёта и нумерации, различающиеся между диалектами.
///
/// Загружается из JSON; отсутствующие ключи берутся из [`Default`].
///
/// ```
/// use edi::options::ReaderOptions;
///
/// let options = ReaderOptions::from_json(r#"{"first_group_sequence": 1}"#.as_bytes()).unwrap();
/// assert_eq!(options.first_group_sequence, 1);
/// assert!(options.check_group_sequence);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderOptions {
    /// Номер, который должна нести первая группа файла.
    pub first_group_sequence: u32,
    /// Сверять номера групп с их порядком в файле.
    pub check_group_sequence: bool,
    /// Учитывать строку, открывающую транзакцию, в счётчике записей группы.
    pub count_transaction_headers: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { first_group_sequence: 0, check_group_sequence: true, count_transaction_headers: false }
    }
}

impl ReaderOptions {
    /// Правила CWR: группы нумеруются с 1, в счётчик входит каждая запись.
    #[must_use]
    pub fn cwr() -> Self {
        Self { first_group_sequence: 1, check_group_sequence: true, count_transaction_headers: true }
    }

    /// Читает настройки из JSON.
    pub fn from_json<R: Read>(reader: R) -> serde_json::Result<Self> {
        serde_json::from_reader(reader)
    }
}
