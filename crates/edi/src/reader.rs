//! Потоковый reader EDI-файла.
//!
//! Предоставляет [`EdiReader`] — файл целиком: заголовок, ленивая
//! последовательность групп и трейлер со сверкой итоговых счётчиков.

use std::{io::BufRead, marker::PhantomData};

use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    cursor::LineCursor,
    error::{EdiError, Result},
    format::RecordFormat,
    group::{Group, GroupState, GroupSummary, Scanner},
    options::ReaderOptions,
    record::{FileHeader, FileTrailer, RecordTag},
    validation::{CountField, FileError, Scope, check_count},
};

/// Общий для файла и его групп изменяемый контекст: ошибки и итоги.
#[derive(Debug)]
pub(crate) struct FileContext {
    valid: bool,
    errors: Vec<FileError>,
    group_count: u32,
    transaction_count: u32,
    record_count: u32,
    halted: bool,
}

impl FileContext {
    fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            group_count: 0,
            transaction_count: 0,
            record_count: 2,
            halted: false,
        }
    }

    pub(crate) fn record(&mut self, err: FileError) {
        warn!(%err, "validation error");
        self.valid = false;
        self.errors.push(err);
    }

    /// Отмечает жёсткую ошибку: дальнейшее чтение бессмысленно.
    pub(crate) fn halt(&mut self) {
        self.halted = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Курсор стоит на `HDR`.
    Header,
    Groups,
    Finished,
}

/// Потоковый reader EDI-файла.
///
/// Группы выдаются по одной через [`EdiReader::next_group`]: каждая
/// заимствует курсор файла, поэтому это не [`Iterator`], а цикл
/// `while let`.
///
/// # Type Parameters
///
/// - `R`: источник строк (реализует [`BufRead`])
/// - `F`: формат управляющих записей (реализует [`RecordFormat`])
///
/// # Пример
///
/// ```no_run
/// use std::{fs::File, io::BufReader};
///
/// use edi::prelude::*;
///
/// let file = BufReader::new(File::open("works.V21")?);
/// let report = EdiReader::<_, FixedWidth>::new(file)?.validate()?;
/// for err in &report.errors {
///     eprintln!("{err}");
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct EdiReader<R, F> {
    cursor: LineCursor<R>,
    options: ReaderOptions,
    context: FileContext,
    header: Option<FileHeader>,
    trailer: Option<FileTrailer>,
    active: Option<GroupState>,
    stage: Stage,
    _format: PhantomData<F>,
}

impl<R: BufRead, F: RecordFormat> EdiReader<R, F> {
    /// Открывает файл с настройками формата по умолчанию.
    pub fn new(reader: R) -> Result<Self> {
        Self::with_options(reader, F::default_options())
    }

    /// Открывает файл и читает первую строку.
    ///
    /// # Errors
    ///
    /// - [`EdiError::EmptyInput`] — во входе нет строк
    /// - [`EdiError::FileHeaderMissing`] — первая строка не `HDR`
    /// - [`EdiError::Io`] / [`EdiError::InvalidUtf8`] — ошибка чтения
    pub fn with_options(reader: R, options: ReaderOptions) -> Result<Self> {
        let mut cursor = LineCursor::new(reader);
        cursor.advance()?;
        let line = cursor.current().ok_or(EdiError::EmptyInput)?;
        if RecordTag::of(&line.text) != RecordTag::FileHeader {
            return Err(EdiError::FileHeaderMissing {
                found: line.text.chars().take(3).collect(),
            });
        }

        let mut context = FileContext::new();
        let header = match F::parse_file_header(&line.text) {
            Ok(header) => Some(header),
            Err(e) => {
                context.record(FileError::MalformedRecord {
                    record: "HDR",
                    line: line.number,
                    message: e.to_string(),
                });
                None
            }
        };
        debug!(format = F::NAME, ?options, "file opened");

        Ok(Self {
            cursor,
            options,
            context,
            header,
            trailer: None,
            active: None,
            stage: Stage::Header,
            _format: PhantomData,
        })
    }

    /// Следующая группа файла.
    ///
    /// Недочитанная предыдущая группа сначала дочитывается до `GRT`,
    /// поэтому новая группа всегда начинается сразу за ним. После `TRL`
    /// возвращает `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`EdiError::GroupHeaderMissing`] — на месте группы не `GRH`
    /// - [`EdiError::FileTrailerMissing`] — поток кончился без `TRL`
    /// - [`EdiError::InvalidGroupHeader`] — `GRH` не разбирается
    /// - [`EdiError::GroupTrailerMissing`] — при дочитывании группы
    ///
    /// После любой ошибки чтение останавливается: следующие вызовы
    /// возвращают `Ok(None)`.
    pub fn next_group(&mut self) -> Result<Option<Group<'_, R, F>>> {
        match self.open_next_group() {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(e) => {
                self.context.halt();
                self.stage = Stage::Finished;
                return Err(e);
            }
        }

        let Some(state) = self.active.as_mut() else {
            return Ok(None);
        };
        let scanner = Scanner::new(&mut self.cursor, &mut self.context, state, &self.options);
        Ok(Some(Group::new(scanner)))
    }

    /// Дочитывает файл и возвращает отчёт.
    pub fn validate(mut self) -> Result<Report> {
        let mut groups = Vec::new();
        while let Some(mut group) = self.next_group()? {
            group.drain()?;
            groups.push(group.summary());
        }
        Ok(self.into_report(groups))
    }

    /// Собирает отчёт из итогов групп, собранных вызывающим кодом.
    #[must_use]
    pub fn into_report(self, groups: Vec<GroupSummary>) -> Report {
        Report {
            format: F::NAME,
            valid: self.context.valid,
            header: self.header,
            trailer: self.trailer,
            group_count: self.context.group_count,
            transaction_count: self.context.transaction_count,
            record_count: self.context.record_count,
            groups,
            errors: self.context.errors,
        }
    }

    /// Закрывает текущую группу и переводит курсор к следующей границе.
    ///
    /// Возвращает `true`, если открыта новая группа.
    fn open_next_group(&mut self) -> Result<bool> {
        if self.context.halted {
            self.stage = Stage::Finished;
            return Ok(false);
        }
        match self.stage {
            Stage::Finished => return Ok(false),
            Stage::Header => {
                self.cursor.advance()?;
                self.stage = Stage::Groups;
            }
            Stage::Groups => {
                if let Some(state) = self.active.take() {
                    self.close_group(state)?;
                }
            }
        }

        // После u32::MAX номера групп идут с нуля.
        let expected = self.options.first_group_sequence.wrapping_add(self.context.group_count);
        let line = self.cursor.current().cloned().ok_or(EdiError::FileTrailerMissing)?;
        match RecordTag::of(&line.text) {
            RecordTag::GroupHeader => {}
            RecordTag::FileTrailer => {
                self.close_file(line.number, &line.text)?;
                return Ok(false);
            }
            _ => return Err(EdiError::GroupHeaderMissing { group: expected, line: line.number }),
        }

        let header = F::parse_group_header(&line.text)
            .map_err(|source| EdiError::InvalidGroupHeader { line: line.number, source })?;
        if self.options.check_group_sequence && header.group_id != expected {
            self.context.record(FileError::SequenceMismatch { expected, found: header.group_id });
        }
        debug!(
            group = header.group_id,
            record_type = %header.transaction_type,
            line = line.number,
            "group started"
        );

        self.active = Some(GroupState::new(header, line.number));
        self.cursor.advance()?;
        Ok(true)
    }

    /// Дочитывает группу, если нужно, и добавляет её итоги к файлу.
    fn close_group(&mut self, mut state: GroupState) -> Result<()> {
        if !state.is_finished() {
            Scanner::<R, F>::new(&mut self.cursor, &mut self.context, &mut state, &self.options)
                .drain()?;
        }

        self.context.group_count += 1;
        self.context.transaction_count += state.transaction_count();
        self.context.record_count += state.record_count();
        self.cursor.advance()
    }

    /// Разбирает `TRL`, сверяет итоги файла и проверяет хвост потока.
    fn close_file(&mut self, line: usize, text: &str) -> Result<()> {
        self.stage = Stage::Finished;
        match F::parse_file_trailer(text) {
            Ok(trailer) => {
                let checks = [
                    check_count(
                        Scope::File,
                        CountField::TransactionCount,
                        trailer.transaction_count,
                        self.context.transaction_count,
                    ),
                    check_count(
                        Scope::File,
                        CountField::RecordCount,
                        trailer.record_count,
                        self.context.record_count,
                    ),
                    check_count(
                        Scope::File,
                        CountField::GroupCount,
                        trailer.group_count,
                        self.context.group_count,
                    ),
                ];
                for err in checks.into_iter().flatten() {
                    self.context.record(err);
                }
                self.trailer = Some(trailer);
            }
            Err(e) => self.context.record(FileError::MalformedRecord {
                record: "TRL",
                line,
                message: e.to_string(),
            }),
        }

        loop {
            self.cursor.advance()?;
            match self.cursor.current() {
                None => break,
                Some(extra) if extra.text.trim().is_empty() => continue,
                Some(extra) => {
                    let line = extra.number;
                    self.context.record(FileError::TrailingRecord { line });
                    break;
                }
            }
        }

        debug!(
            groups = self.context.group_count,
            transactions = self.context.transaction_count,
            records = self.context.record_count,
            valid = self.context.valid,
            "file finished"
        );
        Ok(())
    }

    /// Разобранный заголовок; `None`, если `HDR` не разобрался.
    #[must_use]
    pub fn header(&self) -> Option<&FileHeader> {
        self.header.as_ref()
    }

    /// Трейлер файла; `None`, пока `TRL` не прочитан.
    #[must_use]
    pub fn trailer(&self) -> Option<&FileTrailer> {
        self.trailer.as_ref()
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.context.valid
    }

    /// Накопленные ошибки файла, включая ошибки групп.
    #[must_use]
    pub fn errors(&self) -> &[FileError] {
        &self.context.errors
    }

    /// Число закрытых групп.
    #[must_use]
    pub fn group_count(&self) -> u32 {
        self.context.group_count
    }

    /// Число транзакций в закрытых группах.
    #[must_use]
    pub fn transaction_count(&self) -> u32 {
        self.context.transaction_count
    }

    /// Число записей в закрытых группах плюс `HDR` и `TRL`.
    #[must_use]
    pub fn record_count(&self) -> u32 {
        self.context.record_count
    }

    /// Количество прочитанных строк.
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.cursor.lines_read()
    }

    #[must_use]
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }
}

/// Итог проверки файла.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub format: &'static str,
    pub valid: bool,
    pub header: Option<FileHeader>,
    pub trailer: Option<FileTrailer>,
    pub group_count: u32,
    pub transaction_count: u32,
    pub record_count: u32,
    pub groups: Vec<GroupSummary>,
    pub errors: Vec<FileError>,
}

#[cfg(test)]
mod tests {
    use std::io::{BufReader, Cursor, Seek, Write};

    use super::*;
    use crate::{
        format::{Delimited, FixedWidth},
        transaction::Transaction,
    };

    fn open(input: &str) -> EdiReader<Cursor<&str>, Delimited> {
        EdiReader::new(Cursor::new(input)).unwrap()
    }

    const SINGLE_GROUP: &str = "HDR...
GRH|seq=0|type=ABC
ABC|tx=1
cont
GRT|tx=1|rec=3
TRL|grp=1|tx=1|rec=5
";

    const TWO_GROUPS: &str = "HDR
GRH|seq=0|type=ABC
ABC|1
CN1|1
ABC|2
CN2|2
GRT|tx=2|rec=4
GRH|seq=1|type=XYZ
XYZ|1
GRT|tx=1|rec=2
TRL|grp=2|tx=3|rec=8
";

    #[test]
    fn single_group_file_is_valid() {
        let mut reader = open(SINGLE_GROUP);
        assert!(reader.trailer().is_none());

        let mut groups = 0;
        while let Some(mut group) = reader.next_group().unwrap() {
            groups += 1;
            assert_eq!(group.sequence(), 0);
            assert_eq!(group.record_type().as_str(), "ABC");
            let txs: Vec<_> = group.transactions().unwrap().collect::<Result<_>>().unwrap();
            assert_eq!(txs.len(), 1);
            assert_eq!(txs[0].lines().len(), 2);
            assert!(group.is_valid());
        }

        assert_eq!(groups, 1);
        assert!(reader.is_valid());
        assert!(reader.errors().is_empty());
        assert_eq!(reader.trailer().map(|t| t.record_count), Some(5));
        assert_eq!(reader.record_count(), 5);
        assert_eq!(reader.header(), Some(&FileHeader::default()));
    }

    #[test]
    fn declared_counts_match_for_every_group() {
        let report = open(TWO_GROUPS).validate().unwrap();
        assert!(report.valid);
        assert_eq!(report.group_count, 2);
        assert_eq!(report.transaction_count, 3);
        assert_eq!(report.record_count, 8);
        assert!(report.groups.iter().all(|g| g.valid));
        assert_eq!(report.groups[1].record_type.as_str(), "XYZ");
    }

    #[test]
    fn abandoned_group_is_drained() {
        let mut reader = open(TWO_GROUPS);
        {
            let mut first = reader.next_group().unwrap().unwrap();
            let tx = first.transactions().unwrap().next().unwrap().unwrap();
            assert_eq!(tx.lines(), ["ABC|1", "CN1|1"]);
        }

        let mut second = reader.next_group().unwrap().unwrap();
        assert_eq!(second.sequence(), 1);
        assert_eq!(second.line(), 8);
        let txs: Vec<_> = second.transactions().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(txs.len(), 1);
        assert_eq!(txs[0].lines(), ["XYZ|1"]);
        assert_eq!(txs[0].first_line(), 9);

        assert!(reader.next_group().unwrap().is_none());
        assert!(reader.is_valid());
        assert_eq!(reader.group_count(), 2);
    }

    #[test]
    fn untouched_group_is_drained() {
        let mut reader = open(TWO_GROUPS);
        assert!(reader.next_group().unwrap().is_some());
        let second = reader.next_group().unwrap().unwrap();
        assert_eq!(second.record_type().as_str(), "XYZ");
        assert_eq!(reader.transaction_count(), 2);
    }

    #[test]
    fn missing_group_header_is_fatal() {
        let mut reader = open(
            "HDR
GRH|seq=0|type=ABC
ABC|x
GRT|tx=1|rec=2
XYZ|oops
TRL|grp=1|tx=1|rec=4
",
        );
        assert!(reader.next_group().unwrap().is_some());

        let err = reader.next_group().err().unwrap();
        assert!(matches!(err, EdiError::GroupHeaderMissing { group: 1, line: 5 }));
        assert_eq!(err.to_string(), "Group header missing for group 1 at line 5");
        assert!(reader.next_group().unwrap().is_none());
        assert!(reader.trailer().is_none());
    }

    #[test]
    fn missing_file_trailer_is_fatal() {
        let mut reader = open("HDR\nGRH|seq=0|type=ABC\nABC\nGRT|tx=1|rec=2\n");
        assert!(reader.next_group().unwrap().is_some());
        let err = reader.next_group().err().unwrap();
        assert!(matches!(err, EdiError::FileTrailerMissing));
    }

    #[test]
    fn file_with_no_groups() {
        let report = open("HDR\nTRL|grp=0|tx=0|rec=2\n").validate().unwrap();
        assert!(report.valid);
        assert!(report.groups.is_empty());

        let err = open("HDR\n").validate().unwrap_err();
        assert!(matches!(err, EdiError::FileTrailerMissing));
    }

    #[test]
    fn file_count_mismatches_are_all_reported() {
        let report = open("HDR\nGRH|seq=0|type=ABC\nABC\nGRT|tx=1|rec=2\nTRL|grp=2|tx=3|rec=9\n")
            .validate()
            .unwrap();
        assert!(!report.valid);
        let fields: Vec<String> = report
            .errors
            .iter()
            .map(|e| match e {
                FileError::CountMismatch { scope: Scope::File, field, .. } => field.to_string(),
                other => panic!("unexpected error {other}"),
            })
            .collect();
        assert_eq!(fields, ["transaction_count", "record_count", "group_count"]);
    }

    #[test]
    fn group_sequence_is_checked_unless_disabled() {
        let input = "HDR\nGRH|seq=5|type=ABC\nABC\nGRT|tx=1|rec=2\nTRL|grp=1|tx=1|rec=4\n";
        let report = open(input).validate().unwrap();
        assert_eq!(report.errors, [FileError::SequenceMismatch { expected: 0, found: 5 }]);

        let options = ReaderOptions { check_group_sequence: false, ..ReaderOptions::default() };
        let report = EdiReader::<_, Delimited>::with_options(Cursor::new(input), options)
            .unwrap()
            .validate()
            .unwrap();
        assert!(report.valid);
    }

    #[test]
    fn group_sequence_wraps_after_max() {
        let options = ReaderOptions { first_group_sequence: u32::MAX, ..ReaderOptions::default() };
        let input = "HDR
GRH|seq=4294967295|type=ABC
ABC
GRT|tx=1|rec=2
GRH|seq=0|type=ABC
ABC
GRT|tx=1|rec=2
GRH|seq=2|type=ABC
ABC
GRT|tx=1|rec=2
TRL|grp=3|tx=3|rec=8
";
        let report = EdiReader::<_, Delimited>::with_options(Cursor::new(input), options)
            .unwrap()
            .validate()
            .unwrap();
        assert_eq!(report.group_count, 3);
        assert_eq!(report.errors, [FileError::SequenceMismatch { expected: 1, found: 2 }]);
    }

    #[test]
    fn short_continuation_lines_are_promoted() {
        let report = open("HDR\nGRH|seq=0|type=ABC\nABC|1\nc1\nGRT|tx=1|rec=3\nTRL|grp=1|tx=1|rec=5\n")
            .validate()
            .unwrap();
        assert!(!report.valid);
        assert_eq!(
            report.errors,
            [FileError::Transaction {
                group: 0,
                sequence: 0,
                line: 4,
                message: "malformed record type code".to_string(),
            }]
        );
    }

    #[test]
    fn records_after_trailer_are_reported() {
        let report = open("HDR\nTRL|grp=0|tx=0|rec=2\n\nGRH|seq=0|type=ABC\n").validate().unwrap();
        assert_eq!(report.errors, [FileError::TrailingRecord { line: 4 }]);
    }

    #[test]
    fn open_rejects_empty_input_and_missing_header() {
        let err = EdiReader::<_, Delimited>::new(Cursor::new("")).err().unwrap();
        assert!(matches!(err, EdiError::EmptyInput));

        let err = EdiReader::<_, Delimited>::new(Cursor::new("GRH|seq=0|type=ABC\n")).err().unwrap();
        assert!(matches!(err, EdiError::FileHeaderMissing { ref found } if found == "GRH"));
    }

    #[test]
    fn malformed_header_is_soft() {
        let reader = open("HDR|sender\nTRL|grp=0|tx=0|rec=2\n");
        assert!(reader.header().is_none());
        assert!(!reader.is_valid());
        assert!(matches!(reader.errors(), [FileError::MalformedRecord { record: "HDR", line: 1, .. }]));
    }

    #[test]
    fn unparsable_group_header_is_fatal() {
        let mut reader = open("HDR\nGRH|seq=zero|type=ABC\nGRT|tx=0|rec=2\nTRL|grp=1|tx=0|rec=4\n");
        let err = reader.next_group().err().unwrap();
        assert!(matches!(err, EdiError::InvalidGroupHeader { line: 2, .. }));
    }

    fn cwr_file(spu_record_sequence: u32) -> String {
        let hdr = format!(
            "HDR{}{}{:<45}{}{}{}{}",
            "PB", "000000199", "SOCIETY OF AUTHORS", "01.10", "20240101", "120000", "20240102"
        );
        let lines = [
            hdr,
            format!("GRH{}{:05}02.10{:010}", "NWR", 1, 0),
            format!("NWR{:08}{:08}FIRST TITLE", 0, 0),
            format!("SPU{:08}{:08}PUBLISHER", 0, 1),
            format!("NWR{:08}{:08}SECOND TITLE", 1, 0),
            format!("SPU{:08}{:08}PUBLISHER", 1, spu_record_sequence),
            format!("GRT{:05}{:08}{:08}", 1, 2, 6),
            format!("TRL{:05}{:08}{:08}", 1, 2, 8),
        ];
        lines.join("\r\n") + "\r\n"
    }

    #[test]
    fn cwr_file_is_valid() {
        let input = cwr_file(1);
        let mut reader = EdiReader::<_, FixedWidth>::new(Cursor::new(input.as_str())).unwrap();
        assert_eq!(reader.options(), &ReaderOptions::cwr());
        assert_eq!(reader.header().unwrap().sender_name, "SOCIETY OF AUTHORS");

        let mut group = reader.next_group().unwrap().unwrap();
        assert_eq!(group.header().version, "02.10");
        let txs: Vec<_> = group.transactions().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(txs.len(), 2);
        assert!(txs.iter().all(Transaction::is_valid));
        assert_eq!(group.record_count(), 6);

        assert!(reader.next_group().unwrap().is_none());
        assert!(reader.is_valid(), "{:?}", reader.errors());
        assert_eq!(reader.lines_read(), 8);
    }

    #[test]
    fn cwr_record_sequence_error_stays_in_transaction() {
        let input = cwr_file(7);
        let mut reader = EdiReader::<_, FixedWidth>::new(Cursor::new(input.as_str())).unwrap();
        let mut group = reader.next_group().unwrap().unwrap();
        let txs: Vec<_> = group.transactions().unwrap().collect::<Result<_>>().unwrap();

        assert!(txs[0].is_valid());
        assert_eq!(txs[1].errors().len(), 1);
        assert_eq!(txs[1].errors()[0].line, 6);
        assert!(group.is_valid());
    }

    #[test]
    fn reads_cwr_file_from_disk() {
        let mut file = tempfile::tempfile().unwrap();
        file.write_all(cwr_file(1).as_bytes()).unwrap();
        file.rewind().unwrap();

        let report = EdiReader::<_, FixedWidth>::new(BufReader::new(file)).unwrap().validate().unwrap();
        assert!(report.valid);
        assert_eq!(report.format, "fixed-width");
        assert_eq!(report.trailer.map(|t| t.group_count), Some(1));
    }
}
