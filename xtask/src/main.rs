//! # xtask - Автоматизация сборки проекта
//!
//! Этот крейт предоставляет команды автоматизации сборки для воркспейса.
//!
//! См. [`HELP_TEXT`] для полного списка доступных команд и информации по использованию.
use std::{fs, path::PathBuf};

use anyhow::{Context, Result, bail};
use xshell::{Shell, cmd};

/// Текст справки для команды xtask.
pub const HELP_TEXT: &str = r#"xtask

Использование:
  cargo run -p xtask -- <команда>

Команды:
  help         Показать это сообщение
  fmt          Запустить rustfmt
  fmt-check    Проверить форматирование (CI)
  clippy       Запустить clippy (воркспейс)
  test         Запустить тесты через nextest (воркспейс)
  ci           Запустить fmt-check + clippy + test (профиль CI)
  fixtures     Прогнать edi_validate по всем фикстурам e2e

Примечание:
  cargo-nextest устанавливается автоматически при первом запуске тестов
  фикстуры valid.* должны проходить проверку, остальные — падать
"#;

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "help".to_string());

    let sh = Shell::new()?;

    match cmd.as_str() {
        "help" | "-h" | "--help" => help(),
        "fmt" => Ok(cmd!(sh, "cargo +nightly fmt --all").run()?),
        "fmt-check" => Ok(cmd!(sh, "cargo +nightly fmt --all -- --check").run()?),
        "clippy" => Ok(cmd!(sh, "cargo +nightly clippy --workspace -- -D warnings").run()?),
        "test" => {
            ensure_nextest(&sh)?;
            cmd!(sh, "cargo nextest run --workspace").run()?;
            // nextest не запускает doctests
            cmd!(sh, "cargo +nightly test --workspace --doc").run()?;
            Ok(())
        }
        "ci" => {
            ensure_nextest(&sh)?;
            cmd!(sh, "cargo +nightly fmt --all -- --check").run()?;
            cmd!(sh, "cargo +nightly clippy --workspace -- -D warnings").run()?;
            // e2e тестам нужны собранные бинарники
            cmd!(sh, "cargo build --workspace").run()?;
            cmd!(sh, "cargo nextest run --workspace --profile ci").run()?;
            cmd!(sh, "cargo +nightly test --workspace --doc").run()?;
            Ok(())
        }
        "fixtures" => fixtures(&sh),
        other => bail!("Неизвестная команда: {other}\n\nЗапустите: cargo run -p xtask -- help"),
    }
}

/// Показать сообщение справки.
fn help() -> Result<()> {
    println!("{}", HELP_TEXT);
    Ok(())
}

/// Прогнать валидатор по каждой фикстуре и сверить код выхода с ожидаемым.
///
/// Файлы с именем `valid.*` должны быть корректными, все остальные — нет.
fn fixtures(sh: &Shell) -> Result<()> {
    let dir = project_root()?.join("tests/e2e/fixtures");
    cmd!(sh, "cargo build -q -p edi-validate").run()?;

    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("Не удалось прочитать {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()?;
    paths.sort();

    let mut unexpected = Vec::new();
    for path in &paths {
        let expect_valid = path.file_stem().is_some_and(|stem| stem == "valid");
        let output = cmd!(sh, "cargo run -q -p edi-validate -- --input {path}")
            .quiet()
            .ignore_status()
            .output()?;
        let valid = output.status.success();
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        eprintln!("{:<24} {}", name, if valid { "valid" } else { "invalid" });
        if valid != expect_valid {
            unexpected.push(name.into_owned());
        }
    }

    if !unexpected.is_empty() {
        bail!("Неожиданный результат для фикстур: {}", unexpected.join(", "));
    }
    eprintln!("Проверено фикстур: {}", paths.len());
    Ok(())
}

/// Корень воркспейса.
fn project_root() -> Result<PathBuf> {
    Ok(std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)?
        .parent()
        .context("CARGO_MANIFEST_DIR не имеет родительской директории")?
        .to_path_buf())
}

/// Проверить наличие cargo-nextest и установить при необходимости.
fn ensure_nextest(sh: &Shell) -> Result<()> {
    if cmd!(sh, "cargo nextest --version").quiet().run().is_ok() {
        return Ok(());
    }

    eprintln!("cargo-nextest не найден, устанавливаю...");
    cmd!(sh, "cargo install cargo-nextest --locked").run()?;
    eprintln!("cargo-nextest успешно установлен");
    Ok(())
}
