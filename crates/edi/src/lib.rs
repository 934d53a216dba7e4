//! Потоковое чтение и проверка EDI-файлов с групповой структурой.
//!
//! Файл состоит из вложенных блоков: `HDR` → группы `GRH`…`GRT` →
//! транзакции → записи → `TRL`. Заголовки и трейлеры несут заявленные
//! количества, которые сверяются с фактически прочитанными.
//!
//! Поддерживаются два формата записей:
//!
//! - **FixedWidth** — фиксированные колонки в стиле CWR
//! - **Delimited** — строки вида `TAG|key=value|key=value`
//!
//! # Быстрый старт
//!
//! ```
//! use std::io::Cursor;
//!
//! use edi::prelude::*;
//!
//! let input = "HDR|sender=TEST\n\
//!              GRH|seq=0|type=ABC\n\
//!              ABC|tx=1\n\
//!              cont\n\
//!              GRT|tx=1|rec=3\n\
//!              TRL|grp=1|tx=1|rec=5\n";
//!
//! let mut reader = EdiReader::<_, Delimited>::new(Cursor::new(input))?;
//! while let Some(mut group) = reader.next_group()? {
//!     assert_eq!(group.record_type().as_str(), "ABC");
//!     for tx in group.transactions()? {
//!         assert_eq!(tx?.lines().len(), 2);
//!     }
//!     assert!(group.is_valid());
//! }
//! assert!(reader.is_valid());
//! # Ok::<(), edi::EdiError>(())
//! ```
//!
//! Мягкие ошибки (расхождения счётчиков и номеров) накапливаются в
//! [`EdiReader::errors`], жёсткие (нет `GRH`, нет `TRL`) прерывают чтение
//! через [`EdiError`].

pub mod cursor;
mod error;
pub mod format;
pub mod group;
pub mod options;
pub mod reader;
pub mod record;
pub mod transaction;
pub mod validation;

pub use error::{EdiError, Result};
pub use validation::FileError;

/// Часто используемые типы одним импортом.
pub mod prelude {
    pub use crate::{
        EdiError, FileError,
        format::{Delimited, FixedWidth, Format, RecordFormat},
        group::{Group, GroupSummary},
        options::ReaderOptions,
        reader::{EdiReader, Report},
        record::{RecordTag, TagCode},
        transaction::Transaction,
    };
}
