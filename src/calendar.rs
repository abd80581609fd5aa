use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::types::Frequency;

const LEGACY_DATE_TIME: &str = "%d/%m/%Y %H:%M";
const LEGACY_DATE: &str = "%d/%m/%Y";
const ISO_DATE: &str = "%Y-%m-%d";

impl Frequency {
    /// move `instant` forward by `units` billing periods
    ///
    /// Month and year steps clamp to the last day of shorter months.
    pub fn advance(&self, instant: DateTime<Utc>, units: u32) -> DateTime<Utc> {
        let advanced = match self {
            Frequency::Hourly => instant.checked_add_signed(Duration::hours(units as i64)),
            Frequency::Daily => instant.checked_add_signed(Duration::days(units as i64)),
            Frequency::Weekly => instant.checked_add_signed(Duration::weeks(units as i64)),
            Frequency::Monthly => instant.checked_add_months(Months::new(units)),
            Frequency::Yearly => units
                .checked_mul(12)
                .and_then(|months| instant.checked_add_months(Months::new(months))),
        };
        advanced.unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// start of the period containing `instant`
    ///
    /// Weekly periods are anchored on the contract start rather than on a
    /// calendar week, so they truncate to the day.
    pub fn truncate(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let date = instant.date_naive();
        let (date, hour) = match self {
            Frequency::Hourly => (Some(date), instant.hour()),
            Frequency::Daily | Frequency::Weekly => (Some(date), 0),
            Frequency::Monthly => (date.with_day(1), 0),
            Frequency::Yearly => (NaiveDate::from_ymd_opt(date.year(), 1, 1), 0),
        };
        date.and_then(|d| d.and_hms_opt(hour, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap_or(instant)
    }

    /// `a <= b` at this frequency's granularity
    pub fn is_same_or_before(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        self.truncate(a) <= self.truncate(b)
    }

    /// `from <= instant <= to` at this frequency's granularity
    pub fn contains(&self, from: DateTime<Utc>, to: DateTime<Utc>, instant: DateTime<Utc>) -> bool {
        self.is_same_or_before(from, instant) && self.is_same_or_before(instant, to)
    }

    /// fractional number of periods between two instants
    pub fn duration_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
        match self {
            Frequency::Hourly => millis_ratio(end - start, Duration::hours(1)),
            Frequency::Daily => millis_ratio(end - start, Duration::days(1)),
            Frequency::Weekly => millis_ratio(end - start, Duration::weeks(1)),
            Frequency::Monthly => month_diff(start, end),
            Frequency::Yearly => month_diff(start, end) / Decimal::from(12),
        }
    }

    /// whole number of periods between two instants, half away from zero
    pub fn count_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> u32 {
        self.duration_between(start, end)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_u32()
            .unwrap_or(0)
    }
}

fn millis_ratio(span: Duration, unit: Duration) -> Decimal {
    Decimal::from(span.num_milliseconds()) / Decimal::from(unit.num_milliseconds())
}

fn shift_months(instant: DateTime<Utc>, months: i64) -> DateTime<Utc> {
    let magnitude = Months::new(months.unsigned_abs().min(u32::MAX as u64) as u32);
    let shifted = if months >= 0 {
        instant.checked_add_months(magnitude)
    } else {
        instant.checked_sub_months(magnitude)
    };
    shifted.unwrap_or(instant)
}

/// whole months plus the elapsed fraction of the month interval holding `end`
fn month_diff(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let whole = (end.year() as i64 - start.year() as i64) * 12
        + (end.month() as i64 - start.month() as i64);
    let anchor = shift_months(start, whole);

    let (lower, upper) = if end < anchor {
        (shift_months(start, whole - 1), anchor)
    } else {
        (anchor, shift_months(start, whole + 1))
    };

    let interval = (upper - lower).num_milliseconds();
    if interval == 0 {
        return Decimal::from(whole);
    }
    Decimal::from(whole)
        + Decimal::from((end - anchor).num_milliseconds()) / Decimal::from(interval)
}

/// midnight of the instant's day
pub fn start_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    Frequency::Daily.truncate(instant)
}

/// last second of the instant's day
pub fn end_of_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_opt(23, 59, 59)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(instant)
}

/// parse a date as found in lease documents
///
/// Accepts `DD/MM/YYYY HH:mm`, `DD/MM/YYYY`, `YYYY-MM-DD` and RFC 3339.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, LEGACY_DATE_TIME) {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    [LEGACY_DATE, ISO_DATE]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| LedgerError::InvalidDate {
            value: value.to_string(),
        })
}

/// serde adapter reading any format understood by [`parse_date`]
pub mod serde_date {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.trim().is_empty() => super::super::parse_date(&raw)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                _ => Ok(None),
            }
        }
    }

    /// absent field, explicit `null` and a date map to `None`, `Some(None)`
    /// and `Some(Some(date))`
    pub mod nullable {
        use chrono::{DateTime, Utc};
        use serde::{Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            date: &Option<Option<DateTime<Utc>>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(inner) => super::option::serialize(inner, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Option<DateTime<Utc>>>, D::Error> {
            super::option::deserialize(deserializer).map(Some)
        }
    }
}

/// sortable identifier of a rent: `YYYYMMDDHH` of its period start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermKey(u64);

impl TermKey {
    pub fn new(value: u64) -> Self {
        TermKey(value)
    }

    /// key of the period of `frequency` containing `instant`
    pub fn from_instant(frequency: Frequency, instant: DateTime<Utc>) -> Self {
        Self::encode(frequency.truncate(instant))
    }

    fn encode(instant: DateTime<Utc>) -> Self {
        let year = instant.year().max(0) as u64;
        TermKey(
            year * 1_000_000
                + instant.month() as u64 * 10_000
                + instant.day() as u64 * 100
                + instant.hour() as u64,
        )
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// instant encoded by the key
    pub fn to_instant(&self) -> Result<DateTime<Utc>> {
        let hour = (self.0 % 100) as u32;
        let day = (self.0 / 100 % 100) as u32;
        let month = (self.0 / 10_000 % 100) as u32;
        let year = i32::try_from(self.0 / 1_000_000).map_err(|_| self.invalid())?;

        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, 0, 0))
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or_else(|| self.invalid())
    }

    fn invalid(&self) -> LedgerError {
        LedgerError::InvalidTermKey {
            value: self.0.to_string(),
        }
    }
}

impl fmt::Display for TermKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TermKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidTermKey {
            value: s.to_string(),
        };
        if s.len() != 10 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let key = TermKey(s.parse().map_err(|_| invalid())?);
        key.to_instant()?;
        Ok(key)
    }
}

impl From<u64> for TermKey {
    fn from(value: u64) -> Self {
        TermKey(value)
    }
}
