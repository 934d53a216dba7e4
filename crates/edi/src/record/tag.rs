//! Коды типов записей.

use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

use super::RecordError;

/// Ширина кода типа записи в начале строки.
const TAG_WIDTH: usize = 3;

/// Трёхбайтовый ASCII-код типа записи, например `NWR` или `SPU`.
///
/// Конструируется только из латинских букв и цифр, поэтому всегда
/// представим как `&str`.
///
/// # Пример
/// ```
/// use edi::record::TagCode;
///
/// let code: TagCode = "NWR".parse().unwrap();
/// assert_eq!(code.as_str(), "NWR");
/// assert_eq!(TagCode::from_line("NWR0000000000000000"), Some(code));
/// assert_eq!(TagCode::from_line("N-"), None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TagCode([u8; TAG_WIDTH]);

impl TagCode {
    /// Читает код из первых трёх байт строки.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        match line.as_bytes().get(..TAG_WIDTH) {
            Some(&[a, b, c]) if [a, b, c].iter().all(u8::is_ascii_alphanumeric) => {
                Some(Self([a, b, c]))
            }
            _ => None,
        }
    }

    /// Возвращает код как строку.
    #[must_use]
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl FromStr for TagCode {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_line(s) {
            Some(code) if s.len() == TAG_WIDTH => Ok(code),
            _ => Err(RecordError::InvalidTag(s.to_string())),
        }
    }
}

impl fmt::Display for TagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TagCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Роль строки в файле, определяемая её кодом.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordTag {
    /// `HDR` — заголовок файла.
    FileHeader,
    /// `GRH` — заголовок группы.
    GroupHeader,
    /// `GRT` — трейлер группы.
    GroupTrailer,
    /// `TRL` — трейлер файла.
    FileTrailer,
    /// Любой другой код: начало или продолжение транзакции.
    Detail(TagCode),
    /// Строка короче кода или с недопустимыми символами.
    Unknown,
}

impl RecordTag {
    /// Классифицирует строку по её первым трём байтам.
    ///
    /// # Пример
    /// ```
    /// use edi::record::RecordTag;
    ///
    /// assert_eq!(RecordTag::of("GRH|seq=0|type=ABC"), RecordTag::GroupHeader);
    /// assert!(matches!(RecordTag::of("ABC|tx=1"), RecordTag::Detail(_)));
    /// assert_eq!(RecordTag::of(""), RecordTag::Unknown);
    /// ```
    #[must_use]
    pub fn of(line: &str) -> Self {
        let Some(code) = TagCode::from_line(line) else {
            return Self::Unknown;
        };
        match &code.0 {
            b"HDR" => Self::FileHeader,
            b"GRH" => Self::GroupHeader,
            b"GRT" => Self::GroupTrailer,
            b"TRL" => Self::FileTrailer,
            _ => Self::Detail(code),
        }
    }
}
