//! E2E тесты для CLI инструмента `edi_validate`.
//!
//! Тестируем проверку файлов:
//! - Корректные файлы обоих форматов
//! - Мягкие ошибки (расхождения счётчиков) и код выхода
//! - Жёсткие ошибки структуры
//! - Выбор формата, настройки и форматы отчёта

use std::fs;

use assert_cmd::Command;
use e2e_tests::{fixture, read_fixture};
use predicates::prelude::*;
use tempfile::tempdir;

/// Создать команду для запуска edi_validate.
///
/// `cargo_bin` deprecated из-за edge case с custom build directories,
/// но это единственный способ для кросс-крейтовых бинарников.
#[expect(deprecated)]
fn validator() -> Command {
    Command::cargo_bin("edi_validate").unwrap()
}

// ============================================================================
// Корректные файлы
// ============================================================================

#[test]
fn test_valid_delimited_file() {
    validator()
        .args(["--input", fixture("valid.edi").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("format: delimited"))
        .stdout(predicate::str::contains("sender: ACME (199)"))
        .stdout(predicate::str::contains("groups: 2, transactions: 3, records: 9"))
        .stdout(predicate::str::ends_with("VALID\n"))
        .stdout(predicate::str::contains("INVALID").not());
}

#[test]
fn test_valid_fixed_width_file_as_json() {
    let output = validator()
        .args(["-i", fixture("valid.V21").to_str().unwrap(), "--output", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["format"], "fixed-width");
    assert_eq!(report["valid"], true);
    assert_eq!(report["header"]["sender_name"], "SOCIETY OF AUTHORS");
    assert_eq!(report["trailer"]["record_count"], 12);
    assert_eq!(report["groups"][1]["record_type"], "REV");
    assert_eq!(report["errors"].as_array().map(Vec::len), Some(0));
}

#[test]
fn test_stdin_format_is_detected() {
    validator()
        .write_stdin(read_fixture("valid.edi").unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("format: delimited"));
}

#[test]
fn test_stdin_bare_header_is_delimited() {
    validator()
        .write_stdin("HDR...\nGRH|seq=0|type=ABC\nABC|tx=1\ncont\nGRT|tx=1|rec=3\nTRL|grp=1|tx=1|rec=5\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("format: delimited"))
        .stdout(predicate::str::contains("groups: 1, transactions: 1, records: 5"));
}

#[test]
fn test_csv_report() {
    validator()
        .args(["-i", fixture("valid.edi").to_str().unwrap(), "--output", "csv"])
        .assert()
        .success()
        .stdout(
            "sequence,record_type,line,transactions,records,valid,errors\n\
             0,ABC,2,2,3,true,0\n\
             1,XYZ,7,1,4,true,0\n",
        );
}

#[test]
fn test_list_groups_and_transactions() {
    validator()
        .args(["-i", fixture("valid.edi").to_str().unwrap(), "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("group 0 ABC at line 2"))
        .stdout(predicate::str::contains("  transaction 1 at line 5: 1 record(s)"))
        .stdout(predicate::str::contains("group 1 XYZ at line 7"))
        .stdout(predicate::str::contains("  transaction 0 at line 8: 3 record(s)"));
}

// ============================================================================
// Ошибки
// ============================================================================

#[test]
fn test_count_mismatch_fails() {
    validator()
        .args(["-i", fixture("count_mismatch.edi").to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "error: transaction_count mismatch in group 0: declared 3, observed 2",
        ))
        .stdout(predicate::str::contains("INVALID"))
        .stderr(predicate::str::contains("is not valid: 1 error(s)"));
}

#[test]
fn test_missing_group_header_is_fatal() {
    validator()
        .args(["-i", fixture("missing_grh.edi").to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Group header missing for group 1 at line 5"));
}

#[test]
fn test_missing_input_file() {
    validator()
        .args(["-i", "/nonexistent/batch.edi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open input file"));
}

#[test]
fn test_undetectable_format() {
    validator()
        .write_stdin("just some text\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot determine record format"));
}

// ============================================================================
// Настройки и выбор формата
// ============================================================================

#[test]
fn test_config_and_first_sequence_override() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{ "first_group_sequence": 1 }"#).unwrap();
    let input = fixture("valid.edi");

    validator()
        .args(["-i", input.to_str().unwrap(), "--config", config.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("group sequence"));

    validator()
        .args([
            "-i",
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--first-sequence",
            "0",
        ])
        .assert()
        .success();
}

#[test]
fn test_unknown_config_key_is_rejected() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("options.json");
    fs::write(&config, r#"{ "first_sequence": 1 }"#).unwrap();

    validator()
        .args([
            "-i",
            fixture("valid.edi").to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_record_sequence_error_stays_in_transaction() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("works.dat");
    let content = read_fixture("valid.V21")
        .unwrap()
        .replace("SPU0000000100000001", "SPU0000000100000005");
    fs::write(&input, content).unwrap();

    validator()
        .args(["-i", input.to_str().unwrap(), "--format", "fixed", "--list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("    line 7: record sequence 5, expected 1"))
        .stdout(predicate::str::ends_with("VALID\n"))
        .stdout(predicate::str::contains("INVALID").not());
}
