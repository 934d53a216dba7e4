//! # e2e-tests - End-to-end тесты CLI инструментов
//!
//! Этот крейт содержит e2e тесты для `edi_validate` — проверки структуры
//! и контрольных сумм EDI-файлов.
//!
//! ## Фикстуры
//!
//! Тестовые файлы расположены в `fixtures/`:
//! - `valid.edi` — корректный delimited-файл из двух групп
//! - `count_mismatch.edi` — неверное число транзакций в `GRT`
//! - `missing_grh.edi` — группа без `GRH`
//! - `valid.V21` — корректный fixed-width файл в стиле CWR

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

/// Получить путь к директории фикстур.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Получить путь к фикстуре по имени файла.
pub fn fixture(name: &str) -> PathBuf {
    fixtures_dir().join(name)
}

/// Прочитать фикстуру целиком.
pub fn read_fixture(name: &str) -> Result<String> {
    let path = fixture(name);
    fs::read_to_string(&path).with_context(|| format!("Failed to read fixture: {}", path.display()))
}
