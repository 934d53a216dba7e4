//! Группа `GRH`…`GRT` и ленивое чтение её транзакций.
//!
//! [`Group`] не владеет потоком: она держит заимствование курсора и
//! контекста файла на время одного шага [`EdiReader::next_group`].
//! Курсор общий, поэтому транзакции группы можно прочитать только один
//! раз; недочитанную группу файл дочитывает сам перед следующей.
//!
//! [`EdiReader::next_group`]: crate::reader::EdiReader::next_group

use std::{io::BufRead, marker::PhantomData, mem};

use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    cursor::LineCursor,
    error::{EdiError, Result},
    format::RecordFormat,
    options::ReaderOptions,
    reader::FileContext,
    record::{GroupHeader, GroupTrailer, RecordTag, TagCode},
    transaction::Transaction,
    validation::{self, CountField, FileError, Scope, Severity, check_count},
};

/// Состояние группы, живущее в файле, пока группа не закрыта.
#[derive(Debug)]
pub(crate) struct GroupState {
    header: GroupHeader,
    line: usize,
    trailer: Option<GroupTrailer>,
    transaction_count: u32,
    record_count: u32,
    valid: bool,
    errors: Vec<FileError>,
    /// Строки транзакции, которая ещё собирается.
    pending: Vec<String>,
    pending_line: usize,
    next_sequence: usize,
    started: bool,
    finished: bool,
}

impl GroupState {
    pub(crate) fn new(header: GroupHeader, line: usize) -> Self {
        Self {
            header,
            line,
            trailer: None,
            transaction_count: 0,
            record_count: 2,
            valid: true,
            errors: Vec::new(),
            pending: Vec::new(),
            pending_line: 0,
            next_sequence: 0,
            started: false,
            finished: false,
        }
    }

    pub(crate) fn transaction_count(&self) -> u32 {
        self.transaction_count
    }

    pub(crate) fn record_count(&self) -> u32 {
        self.record_count
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    fn sequence(&self) -> u32 {
        self.header.group_id
    }

    fn record_type(&self) -> TagCode {
        self.header.transaction_type
    }
}

/// Пошаговый разбор тела группы поверх курсора файла.
pub(crate) struct Scanner<'a, R, F> {
    cursor: &'a mut LineCursor<R>,
    context: &'a mut FileContext,
    state: &'a mut GroupState,
    options: &'a ReaderOptions,
    _format: PhantomData<F>,
}

impl<'a, R: BufRead, F: RecordFormat> Scanner<'a, R, F> {
    pub(crate) fn new(
        cursor: &'a mut LineCursor<R>,
        context: &'a mut FileContext,
        state: &'a mut GroupState,
        options: &'a ReaderOptions,
    ) -> Self {
        Self { cursor, context, state, options, _format: PhantomData }
    }

    fn reborrow(&mut self) -> Scanner<'_, R, F> {
        Scanner::new(self.cursor, self.context, self.state, self.options)
    }

    /// Читает строки до конца следующей транзакции.
    ///
    /// Возвращает `Ok(None)`, когда обработан `GRT`. Строка, на которой
    /// закончилась транзакция, остаётся текущей в курсоре.
    pub(crate) fn next_transaction(&mut self) -> Result<Option<Transaction>> {
        while !self.state.finished {
            let Some(line) = self.cursor.current().cloned() else {
                return Err(self.halt(None));
            };

            match RecordTag::of(&line.text) {
                RecordTag::GroupTrailer => {
                    if let Some(tx) = self.flush() {
                        return Ok(Some(tx));
                    }
                    self.close(line.number, &line.text);
                }
                RecordTag::GroupHeader | RecordTag::FileTrailer => {
                    return Err(self.halt(Some(line.number)));
                }
                RecordTag::Detail(code) if code == self.state.record_type() => {
                    if let Some(tx) = self.flush() {
                        return Ok(Some(tx));
                    }
                    self.state.pending_line = line.number;
                    self.state.pending.push(line.text);
                    if self.options.count_transaction_headers {
                        self.state.record_count += 1;
                    }
                    self.advance()?;
                }
                _ => {
                    if self.state.pending.is_empty() {
                        self.state.pending_line = line.number;
                    }
                    self.state.pending.push(line.text);
                    self.state.record_count += 1;
                    self.advance()?;
                }
            }
        }
        Ok(None)
    }

    /// Дочитывает группу до `GRT` включительно.
    pub(crate) fn drain(&mut self) -> Result<()> {
        while self.next_transaction()?.is_some() {}
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        let result = self.cursor.advance();
        result.map_err(|e| {
            self.context.halt();
            self.state.finished = true;
            e
        })
    }

    fn halt(&mut self, line: Option<usize>) -> EdiError {
        self.context.halt();
        self.state.finished = true;
        EdiError::GroupTrailerMissing { group: self.state.sequence(), line }
    }

    /// Отдаёт накопленную транзакцию, если она есть.
    fn flush(&mut self) -> Option<Transaction> {
        if self.state.pending.is_empty() {
            return None;
        }

        let lines = mem::take(&mut self.state.pending);
        let tx = Transaction::new(
            self.state.record_type(),
            lines,
            self.state.next_sequence,
            self.state.pending_line,
        );
        let errors = validation::check_transaction::<F>(&tx);
        let tx = tx.with_errors(errors);
        self.state.next_sequence += 1;
        self.state.transaction_count += 1;

        let group = self.state.sequence();
        for err in tx.errors().iter().filter(|e| e.severity == Severity::File) {
            self.record(FileError::Transaction {
                group,
                sequence: tx.sequence(),
                line: err.line,
                message: err.message.clone(),
            });
        }

        trace!(group, sequence = tx.sequence(), lines = tx.lines().len(), "transaction read");
        Some(tx)
    }

    /// Разбирает `GRT` и сверяет счётчики группы.
    fn close(&mut self, line: usize, text: &str) {
        let group = self.state.sequence();
        match F::parse_group_trailer(text) {
            Ok(trailer) => {
                if let Some(id) = trailer.group_id
                    && id != group
                {
                    self.record(FileError::GroupIdMismatch { header: group, trailer: id });
                }
                let scope = Scope::Group(group);
                let checks = [
                    check_count(
                        scope,
                        CountField::TransactionCount,
                        trailer.transaction_count,
                        self.state.transaction_count,
                    ),
                    check_count(
                        scope,
                        CountField::RecordCount,
                        trailer.record_count,
                        self.state.record_count,
                    ),
                ];
                for err in checks.into_iter().flatten() {
                    self.record(err);
                }
                self.state.trailer = Some(trailer);
            }
            Err(e) => self.record(FileError::MalformedRecord {
                record: "GRT",
                line,
                message: e.to_string(),
            }),
        }

        self.state.finished = true;
        debug!(
            group,
            transactions = self.state.transaction_count,
            records = self.state.record_count,
            valid = self.state.valid,
            "group finished"
        );
    }

    /// Записывает ошибку и в группу, и в файл.
    fn record(&mut self, err: FileError) {
        self.state.valid = false;
        self.state.errors.push(err.clone());
        self.context.record(err);
    }
}

/// Группа файла.
///
/// Получается из [`EdiReader::next_group`](crate::reader::EdiReader::next_group)
/// и живёт до следующего вызова.
pub struct Group<'r, R, F> {
    scanner: Scanner<'r, R, F>,
}

impl<'r, R: BufRead, F: RecordFormat> Group<'r, R, F> {
    pub(crate) fn new(scanner: Scanner<'r, R, F>) -> Self {
        Self { scanner }
    }

    fn state(&self) -> &GroupState {
        &*self.scanner.state
    }

    /// Разобранный заголовок `GRH`.
    #[must_use]
    pub fn header(&self) -> &GroupHeader {
        &self.state().header
    }

    /// Код, которым начинается каждая транзакция группы.
    #[must_use]
    pub fn record_type(&self) -> TagCode {
        self.state().record_type()
    }

    /// Номер группы из заголовка.
    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.state().sequence()
    }

    /// Номер строки `GRH` (1-based).
    #[must_use]
    pub fn line(&self) -> usize {
        self.state().line
    }

    /// Ленивая последовательность транзакций группы.
    ///
    /// Может быть вызвана только один раз: курсор файла после неё уже
    /// сдвинут.
    ///
    /// # Errors
    ///
    /// [`EdiError::TransactionsAlreadyRead`] при повторном вызове.
    pub fn transactions(&mut self) -> Result<Transactions<'_, R, F>> {
        if self.scanner.state.started {
            return Err(EdiError::TransactionsAlreadyRead);
        }
        self.scanner.state.started = true;
        Ok(Transactions { scanner: self.scanner.reborrow(), failed: false })
    }

    /// Дочитывает оставшиеся транзакции, отбрасывая их.
    pub fn drain(&mut self) -> Result<()> {
        self.scanner.state.started = true;
        self.scanner.drain()
    }

    /// Трейлер `GRT`; `None`, пока группа не дочитана.
    #[must_use]
    pub fn trailer(&self) -> Option<&GroupTrailer> {
        self.state().trailer.as_ref()
    }

    /// Число прочитанных транзакций.
    #[must_use]
    pub fn transaction_count(&self) -> u32 {
        self.state().transaction_count
    }

    /// Число прочитанных записей, включая `GRH` и `GRT`.
    #[must_use]
    pub fn record_count(&self) -> u32 {
        self.state().record_count
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.state().valid
    }

    #[must_use]
    pub fn errors(&self) -> &[FileError] {
        &self.state().errors
    }

    /// Прочитан ли `GRT`.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state().finished
    }

    /// Снимок итогов группы.
    #[must_use]
    pub fn summary(&self) -> GroupSummary {
        let state = self.state();
        GroupSummary {
            sequence: state.sequence(),
            record_type: state.record_type(),
            line: state.line,
            transaction_count: state.transaction_count,
            record_count: state.record_count,
            valid: state.valid,
            errors: state.errors.clone(),
        }
    }
}

/// Итоги одной группы для отчёта.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub sequence: u32,
    pub record_type: TagCode,
    pub line: usize,
    pub transaction_count: u32,
    pub record_count: u32,
    pub valid: bool,
    pub errors: Vec<FileError>,
}

/// Итератор по транзакциям группы.
///
/// После первой ошибки возвращает `None`.
pub struct Transactions<'g, R, F> {
    scanner: Scanner<'g, R, F>,
    failed: bool,
}

impl<R: BufRead, F: RecordFormat> Iterator for Transactions<'_, R, F> {
    type Item = Result<Transaction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.scanner.next_transaction() {
            Ok(tx) => tx.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
