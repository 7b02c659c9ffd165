use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Severity attached to every [`LogRecord`] on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Error,
}

impl Level {
    /// Level implied by an HTTP-style status code.
    ///
    /// Anything at or above 400 is an `ERROR`; everything else, including an
    /// unset (zero) status, is `INFO`.
    pub fn from_status(status_code: u16) -> Self {
        if status_code >= 400 {
            Level::Error
        } else {
            Level::Info
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a [`LogRecord`] cannot be built.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("log record message must not be empty")]
    EmptyMessage,
}

/// One structured event, the unit of transmission to the collector.
///
/// Serializes to a single JSON object whose timestamp field is named
/// `@timestamp`. `labels`, `duration_ms` and `status_code` are left out of
/// the encoded object when empty or zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(
        rename = "@timestamp",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub service: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "is_zero_u64")]
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "is_zero_u16")]
    pub status_code: u16,
}

impl LogRecord {
    /// Build a record stamped with the current time whose level is derived
    /// from `status_code`.
    pub fn new(
        service: impl Into<String>,
        message: impl Into<String>,
        labels: BTreeMap<String, String>,
        duration_ms: u64,
        status_code: u16,
    ) -> Result<Self, RecordError> {
        let mut record = Self::with_level(Level::from_status(status_code), service, message)?;
        record.labels = labels;
        record.duration_ms = duration_ms;
        record.status_code = status_code;
        Ok(record)
    }

    /// Build a bare record with a caller-chosen level and no labels,
    /// duration or status.
    pub fn with_level(
        level: Level,
        service: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<Self, RecordError> {
        let message = message.into();
        if message.is_empty() {
            return Err(RecordError::EmptyMessage);
        }
        Ok(LogRecord {
            timestamp: Utc::now(),
            level,
            message,
            service: service.into(),
            labels: BTreeMap::new(),
            duration_ms: 0,
            status_code: 0,
        })
    }

    /// Encode as one JSON object followed by a single `\n`.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

fn is_zero_u16(value: &u16) -> bool {
    *value == 0
}

fn serialize_timestamp<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}
