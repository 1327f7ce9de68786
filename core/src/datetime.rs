//! Timestamp value used by every `created_at` field.
//!
//! # Design
//! The API documents its timestamps as RFC 3339 in UTC+0 and the records
//! expose them timezone-naive, e.g. `2019-08-24T14:15:22`. Input may carry a
//! trailing `Z`, an explicit offset, fractional seconds, a space separator or
//! no time part at all. Offset-aware input is shifted to UTC before the
//! offset is dropped, so `12:00+05:00` becomes `07:00`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// A UTC instant without a timezone suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDatetime(NaiveDateTime);

impl IsoDatetime {
    pub fn naive_utc(&self) -> NaiveDateTime {
        self.0
    }

    pub fn to_utc(&self) -> DateTime<Utc> {
        self.0.and_utc()
    }
}

impl FromStr for IsoDatetime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(aware) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self(aware.naive_utc()));
        }
        let naive = s.strip_suffix(['Z', 'z']).unwrap_or(s);
        for format in NAIVE_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
                return Ok(Self(dt));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(naive, "%Y-%m-%d") {
            return Ok(Self(date.and_time(chrono::NaiveTime::MIN)));
        }
        Err(ValidationError::new(
            "created_at",
            format!("expected an RFC 3339 datetime, got {s:?}"),
        ))
    }
}

impl From<NaiveDateTime> for IsoDatetime {
    fn from(value: NaiveDateTime) -> Self {
        Self(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for IsoDatetime {
    fn from(value: DateTime<Tz>) -> Self {
        Self(value.naive_utc())
    }
}

impl fmt::Display for IsoDatetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = if self.0.nanosecond() == 0 {
            "%Y-%m-%dT%H:%M:%S"
        } else {
            "%Y-%m-%dT%H:%M:%S%.6f"
        };
        write!(f, "{}", self.0.format(format))
    }
}

impl PartialEq<&str> for IsoDatetime {
    fn eq(&self, other: &&str) -> bool {
        other.parse::<IsoDatetime>().is_ok_and(|o| o == *self)
    }
}

impl Serialize for IsoDatetime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsoDatetime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
