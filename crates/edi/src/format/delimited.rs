//! `TAG|key=value|key=value` records.
//!
//! ```text
//! HDR|sender=ACME|version=01.10
//! GRH|seq=0|type=ABC
//! ABC|tx=1
//! GRT|tx=1|rec=3
//! TRL|grp=1|tx=1|rec=5
//! ```
//!
//! Unknown keys are ignored. A bare `HDR` line without fields is accepted.

use std::{collections::HashMap, str::FromStr};

use super::{Delimited, RecordFormat};
use crate::record::{FileHeader, FileTrailer, GroupHeader, GroupTrailer, RecordError};

const SEPARATOR: char = '|';

struct Fields<'a>(HashMap<&'a str, &'a str>);

impl<'a> Fields<'a> {
    fn parse(line: &'a str) -> Result<Self, RecordError> {
        let mut map = HashMap::new();
        for segment in line.split(SEPARATOR).skip(1) {
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| RecordError::MalformedField(segment.to_string()))?;
            let key = key.trim();
            if map.insert(key, value.trim()).is_some() {
                return Err(RecordError::DuplicateField(key.to_string()));
            }
        }
        Ok(Self(map))
    }

    fn text(&self, key: &str) -> String {
        self.0.get(key).map(|v| v.to_string()).unwrap_or_default()
    }

    fn optional<T: FromStr>(&self, key: &'static str) -> Result<Option<T>, RecordError> {
        self.0
            .get(key)
            .map(|raw| {
                raw.parse()
                    .map_err(|_| RecordError::InvalidNumber { field: key, value: raw.to_string() })
            })
            .transpose()
    }

    fn required<T: FromStr>(&self, key: &'static str) -> Result<T, RecordError> {
        self.optional(key)?.ok_or(RecordError::MissingField(key))
    }
}

impl RecordFormat for Delimited {
    const NAME: &'static str = "delimited";

    fn parse_file_header(line: &str) -> Result<FileHeader, RecordError> {
        let fields = Fields::parse(line)?;
        Ok(FileHeader {
            sender_type: fields.text("sender_type"),
            sender_id: fields.text("sender_id"),
            sender_name: fields.text("sender"),
            edi_version: fields.text("version"),
            creation_date: fields.text("date"),
            creation_time: fields.text("time"),
            transmission_date: fields.text("transmitted"),
            character_set: fields.text("charset"),
        })
    }

    fn parse_file_trailer(line: &str) -> Result<FileTrailer, RecordError> {
        let fields = Fields::parse(line)?;
        Ok(FileTrailer {
            group_count: fields.required("grp")?,
            transaction_count: fields.required("tx")?,
            record_count: fields.required("rec")?,
        })
    }

    fn parse_group_header(line: &str) -> Result<GroupHeader, RecordError> {
        let fields = Fields::parse(line)?;
        let transaction_type = match fields.0.get("type") {
            Some(raw) => raw.parse()?,
            None => return Err(RecordError::MissingField("type")),
        };
        Ok(GroupHeader {
            transaction_type,
            group_id: fields.required("seq")?,
            version: fields.text("version"),
            batch_request: fields.optional("batch")?,
        })
    }

    fn parse_group_trailer(line: &str) -> Result<GroupTrailer, RecordError> {
        let fields = Fields::parse(line)?;
        Ok(GroupTrailer {
            group_id: fields.optional("seq")?,
            transaction_count: fields.required("tx")?,
            record_count: fields.required("rec")?,
        })
    }
}
