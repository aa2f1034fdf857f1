//! Domain value objects for trail and event messages
//!
//! Defines the typed forms that inbound payloads are decoded into before a
//! handler sees them: [`Timestamp`] with its fixed textual format,
//! [`TrailValue`] as a closed scalar sum type, and the immutable [`Trail`]
//! and [`Event`] values handed to callbacks.

use crate::protocol::topics::{HandlerKind, ValidationError};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Fixed textual form of a message timestamp: UTC, second precision, `Z` suffix.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Wall-clock instant with second precision.
///
/// Round-trips exactly through its textual form: parsing a valid string and
/// re-serializing yields the identical string. Offsets other than `Z` and
/// sub-second digits are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Build from a `DateTime`, truncating sub-second precision so the
    /// round-trip invariant holds.
    pub fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Timestamp(datetime.with_nanosecond(0).unwrap_or(datetime))
    }

    pub fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }
}

impl FromStr for Timestamp {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let naive = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)?;
        Ok(Timestamp(naive.and_utc()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Scalar value carried by a trail sample.
///
/// Closed sum type: JSON booleans, nulls, arrays and objects are decode
/// errors, not values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrailValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for TrailValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailValue::Integer(v) => write!(f, "{v}"),
            TrailValue::Float(v) => write!(f, "{v}"),
            TrailValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for TrailValue {
    fn from(value: i64) -> Self {
        TrailValue::Integer(value)
    }
}

impl From<f64> for TrailValue {
    fn from(value: f64) -> Self {
        TrailValue::Float(value)
    }
}

impl From<&str> for TrailValue {
    fn from(value: &str) -> Self {
        TrailValue::Text(value.to_string())
    }
}

impl From<String> for TrailValue {
    fn from(value: String) -> Self {
        TrailValue::Text(value)
    }
}

/// A named, timestamped telemetry sample from an agent.
///
/// Immutable once constructed; created fresh per received message.
#[derive(Debug, Clone, PartialEq)]
pub struct Trail {
    name: String,
    value: TrailValue,
    timestamp: Timestamp,
}

impl Trail {
    pub fn new(
        name: impl Into<String>,
        value: TrailValue,
        timestamp: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName {
                kind: HandlerKind::Trail,
            });
        }
        Ok(Trail {
            name,
            value,
            timestamp,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &TrailValue {
        &self.value
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl fmt::Display for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trail(name={}, value={}, timestamp={})",
            self.name, self.value, self.timestamp
        )
    }
}

/// A named, timestamped textual notification from an agent.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    message: String,
    timestamp: Timestamp,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        timestamp: Timestamp,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName {
                kind: HandlerKind::Event,
            });
        }
        Ok(Event {
            name,
            message: message.into(),
            timestamp,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Event(name={}, message={}, timestamp={})",
            self.name, self.message, self.timestamp
        )
    }
}

/// Wire form of a trail payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailPayload {
    pub value: TrailValue,
    pub timestamp: Timestamp,
}

/// Wire form of an event payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub message: String,
    pub timestamp: Timestamp,
}
