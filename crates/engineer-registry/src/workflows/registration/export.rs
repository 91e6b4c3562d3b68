use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;

use super::domain::RegistrationRecord;

#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Encoding(std::string::FromUtf8Error),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(err) => write!(f, "failed to write registry export: {}", err),
            ExportError::Csv(err) => write!(f, "failed to encode registry CSV: {}", err),
            ExportError::Encoding(err) => write!(f, "registry export is not valid UTF-8: {}", err),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(err) => Some(err),
            ExportError::Csv(err) => Some(err),
            ExportError::Encoding(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ExportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<std::string::FromUtf8Error> for ExportError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::Encoding(err)
    }
}

#[derive(Serialize)]
struct ExportRow<'a> {
    registration_number: &'a str,
    engineer_name: &'a str,
    discipline: &'a str,
    level: &'static str,
    status: &'static str,
    registered_on: NaiveDate,
    expires_on: NaiveDate,
}

impl<'a> From<&'a RegistrationRecord> for ExportRow<'a> {
    fn from(record: &'a RegistrationRecord) -> Self {
        Self {
            registration_number: &record.registration_number,
            engineer_name: &record.engineer_name,
            discipline: &record.discipline,
            level: record.level.label(),
            status: record.status.label(),
            registered_on: record.registered_on,
            expires_on: record.expires_on,
        }
    }
}

/// Write one CSV row per record, header first. Returns the number of data rows.
pub fn write_csv<'a, W, I>(records: I, writer: W) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a RegistrationRecord>,
{
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0;
    for record in records {
        csv_writer.serialize(ExportRow::from(record))?;
        rows += 1;
    }
    if rows == 0 {
        csv_writer.write_record([
            "registration_number",
            "engineer_name",
            "discipline",
            "level",
            "status",
            "registered_on",
            "expires_on",
        ])?;
    }
    csv_writer.flush()?;
    Ok(rows)
}

pub fn to_csv_string<'a, I>(records: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a RegistrationRecord>,
{
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
