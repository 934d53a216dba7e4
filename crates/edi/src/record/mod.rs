//! Модель записей EDI: коды типов и управляющие записи.
//!
//! Каждая строка файла начинается с трёхсимвольного кода типа записи.
//! [`RecordTag::of`] классифицирует строку; структуры заголовков и
//! трейлеров заполняются форматом ([`crate::format::RecordFormat`]).

mod tag;
mod types;

pub use tag::{RecordTag, TagCode};
pub use types::{FileHeader, FileTrailer, GroupHeader, GroupTrailer, RecordError};
