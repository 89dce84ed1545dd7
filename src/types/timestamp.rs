// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;

/// Milliseconds in one day.
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// 9999-12-31T23:59:59.999Z. Later instants need a five-digit year, which
/// RFC 3339 text cannot carry.
const MAX_MILLIS: i64 = 253_402_300_799_999;

/// 0001-01-01T00:00:00.000Z.
const MIN_MILLIS: i64 = -62_135_596_800_000;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Wrap a chrono time, clamped to the storable range.
    pub fn new(ts: DateTime<Utc>) -> Self {
        if (MIN_MILLIS..=MAX_MILLIS).contains(&ts.timestamp_millis()) {
            Self(ts)
        } else {
            Self::from_clamped_millis(ts.timestamp_millis())
        }
    }

    /// The latest storable instant.
    pub fn latest() -> Self {
        Self::from_clamped_millis(MAX_MILLIS)
    }

    /// The earliest storable instant.
    pub fn earliest() -> Self {
        Self::from_clamped_millis(MIN_MILLIS)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn from_millis(millis: i64) -> Fallible<Self> {
        if !(MIN_MILLIS..=MAX_MILLIS).contains(&millis) {
            return Err(ErrorReport::invalid_argument("timestamp out of range"));
        }
        Ok(Self::from_clamped_millis(millis))
    }

    fn from_clamped_millis(millis: i64) -> Self {
        let millis = millis.clamp(MIN_MILLIS, MAX_MILLIS);
        // Every instant in the clamped range is representable.
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .unwrap_or(Self(DateTime::UNIX_EPOCH))
    }

    pub fn parse(s: &str) -> Fallible<Self> {
        let ts = DateTime::parse_from_rfc3339(s)?;
        Ok(Self::new(ts.with_timezone(&Utc)))
    }

    pub fn as_millis(self) -> i64 {
        self.0.timestamp_millis()
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }

    /// Add a (possibly fractional) number of days, rounded to the
    /// millisecond. The result saturates at [`Timestamp::latest`] and
    /// [`Timestamp::earliest`]; a NaN offset adds nothing.
    pub fn plus_days(self, days: f64) -> Self {
        // Float-to-int `as` saturates, and maps NaN to zero.
        let millis = (days * MS_PER_DAY).round() as i64;
        Self::from_clamped_millis(self.as_millis().saturating_add(millis))
    }

    /// The number of days from `self` to `later`. Negative if `later` is
    /// in the past.
    pub fn days_until(self, later: Timestamp) -> f64 {
        (later.0 - self.0).num_milliseconds() as f64 / MS_PER_DAY
    }

    pub fn to_rfc3339(self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::new(value)
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.to_rfc3339()))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts =
            DateTime::parse_from_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        Ok(Timestamp(ts.with_timezone(&Utc)))
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_days() -> Fallible<()> {
        let ts = Timestamp::parse("2025-01-01T00:00:00Z")?;
        assert_eq!(ts.plus_days(1.0).to_string(), "2025-01-02T00:00:00.000Z");
        let ten_minutes = ts.plus_days(10.0 / 1440.0);
        assert_eq!(ten_minutes.as_millis() - ts.as_millis(), 600_000);
        Ok(())
    }

    #[test]
    fn test_days_until() -> Fallible<()> {
        let a = Timestamp::parse("2025-01-01T00:00:00Z")?;
        let b = Timestamp::parse("2025-01-07T12:00:00Z")?;
        assert_eq!(a.days_until(b), 6.5);
        assert_eq!(b.days_until(a), -6.5);
        Ok(())
    }

    #[test]
    fn test_plus_days_saturates() -> Fallible<()> {
        let ts = Timestamp::parse("2025-01-01T00:00:00Z")?;
        let far = ts.plus_days(3e6);
        assert_eq!(far, Timestamp::latest());
        assert_eq!(far.to_string(), "9999-12-31T23:59:59.999Z");
        assert_eq!(Timestamp::parse(&far.to_string())?, far);
        assert_eq!(ts.plus_days(f64::INFINITY), Timestamp::latest());
        assert_eq!(far.plus_days(1.0), Timestamp::latest());
        assert_eq!(ts.plus_days(-1e12), Timestamp::earliest());
        assert_eq!(ts.plus_days(f64::NAN), ts);
        Ok(())
    }

    #[test]
    fn test_from_millis_rejects_unstorable() {
        assert!(Timestamp::from_millis(253_402_300_800_000).is_err());
        assert!(Timestamp::from_millis(i64::MIN).is_err());
    }

    #[test]
    fn test_from_millis_round_trips_through_display() -> Fallible<()> {
        let ts = Timestamp::from_millis(1_735_689_600_123)?;
        assert_eq!(Timestamp::parse(&ts.to_string())?, ts);
        Ok(())
    }
}
