//! Построчный курсор над входным потоком.
//!
//! [`LineCursor`] читает строки строго вперёд. Для потоков с произвольным
//! доступом (`BufRead + Seek`) доступны [`LineCursor::mark`] и
//! [`LineCursor::reset`], чтобы вложенный разборщик мог заглянуть вперёд и
//! вернуться. Для остальных потоков этих методов нет.

use std::io::{BufRead, Seek, SeekFrom};

use crate::error::{EdiError, Result};

/// Одна строка файла без завершающего перевода строки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Номер строки (1-based).
    pub number: usize,
    /// Текст строки.
    pub text: String,
}

/// Позиция курсора, сохранённая для последующего [`LineCursor::reset`].
#[derive(Debug, Clone)]
pub struct Mark {
    offset: u64,
    lines_read: usize,
    current: Option<Line>,
}

/// Построчный курсор.
///
/// Текущая строка — последняя прочитанная, но ещё не обработанная;
/// [`LineCursor::advance`] заменяет её следующей.
pub struct LineCursor<R> {
    reader: R,
    current: Option<Line>,
    lines_read: usize,
    /// Смещение в байтах сразу за текущей строкой.
    offset: u64,
    buf: Vec<u8>,
}

impl<R: BufRead> LineCursor<R> {
    /// Создаёт курсор перед первой строкой.
    pub fn new(reader: R) -> Self {
        Self { reader, current: None, lines_read: 0, offset: 0, buf: Vec::new() }
    }

    /// Читает следующую строку. В конце потока [`current`](Self::current)
    /// становится `None`.
    pub fn advance(&mut self) -> Result<()> {
        self.buf.clear();
        let read = self.reader.read_until(b'\n', &mut self.buf)?;
        if read == 0 {
            self.current = None;
            return Ok(());
        }

        self.offset += read as u64;
        self.lines_read += 1;
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        let text = String::from_utf8(std::mem::take(&mut self.buf))
            .map_err(|source| EdiError::InvalidUtf8 { line: self.lines_read, source })?;
        self.current = Some(Line { number: self.lines_read, text });
        Ok(())
    }

    /// Текущая строка.
    #[must_use]
    pub fn current(&self) -> Option<&Line> {
        self.current.as_ref()
    }

    /// Количество прочитанных строк.
    #[must_use]
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Смещение в байтах сразу за текущей строкой.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Извлекает внутренний reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead + Seek> LineCursor<R> {
    /// Запоминает текущую позицию.
    #[must_use]
    pub fn mark(&self) -> Mark {
        Mark { offset: self.offset, lines_read: self.lines_read, current: self.current.clone() }
    }

    /// Возвращает курсор в сохранённую позицию.
    pub fn reset(&mut self, mark: Mark) -> Result<()> {
        self.reader.seek(SeekFrom::Start(mark.offset))?;
        self.offset = mark.offset;
        self.lines_read = mark.lines_read;
        self.current = mark.current;
        Ok(())
    }
}
