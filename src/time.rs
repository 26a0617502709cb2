//! Timestamp derivation
//!
//! Turns the millisecond epoch column of the event log into `start_time`
//! (epoch seconds) and its calendar attributes.

use crate::error::Result;
use crate::table::Table;
use crate::types::TimeZoneMode;
use arrow::array::{Array, ArrayRef, Int32Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field};
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Weekday};
use std::sync::Arc;

/// Abbreviated English day names, Monday first
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Calendar attributes of one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarAttributes {
    pub hour: u32,
    pub day: u32,
    /// ISO 8601 week number
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: Weekday,
}

impl CalendarAttributes {
    fn from_instant<Tz: TimeZone>(instant: &DateTime<Tz>) -> Self {
        Self {
            hour: instant.hour(),
            day: instant.day(),
            week: instant.iso_week().week(),
            month: instant.month(),
            year: instant.year(),
            weekday: instant.weekday(),
        }
    }

    /// `Mon` .. `Sun`
    pub fn weekday_name(&self) -> &'static str {
        WEEKDAYS[self.weekday.num_days_from_monday() as usize]
    }
}

/// Epoch milliseconds to epoch seconds, truncating toward zero
pub fn epoch_seconds(ts_millis: i64) -> i64 {
    ts_millis / 1000
}

/// Calendar attributes of `seconds` since the epoch in the given zone
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn calendar(seconds: i64, zone: TimeZoneMode) -> Option<CalendarAttributes> {
    let utc = DateTime::from_timestamp(seconds, 0)?;
    let attributes = match zone {
        TimeZoneMode::Utc => CalendarAttributes::from_instant(&utc),
        TimeZoneMode::Local => CalendarAttributes::from_instant(&utc.with_timezone(&Local)),
    };
    Some(attributes)
}

/// Append `start_time`, `hour`, `day`, `week`, `month`, `year` and `weekday`
///
/// One output row per input row, in input order. A null `ts` gives nulls in
/// every derived column.
pub fn derive_time_columns(table: &Table, ts_column: &str, zone: TimeZoneMode) -> Result<Table> {
    let ts = table.i64_column(ts_column)?;
    let rows = ts.len();

    let mut start_time = Int64Builder::with_capacity(rows);
    let mut hour = Int32Builder::with_capacity(rows);
    let mut day = Int32Builder::with_capacity(rows);
    let mut week = Int32Builder::with_capacity(rows);
    let mut month = Int32Builder::with_capacity(rows);
    let mut year = Int32Builder::with_capacity(rows);
    let mut weekday = StringBuilder::with_capacity(rows, rows * 3);

    for row in 0..rows {
        let seconds = (!ts.is_null(row)).then(|| epoch_seconds(ts.value(row)));
        start_time.append_option(seconds);

        match seconds.and_then(|s| calendar(s, zone)) {
            Some(attrs) => {
                hour.append_value(attrs.hour as i32);
                day.append_value(attrs.day as i32);
                week.append_value(attrs.week as i32);
                month.append_value(attrs.month as i32);
                year.append_value(attrs.year);
                weekday.append_value(attrs.weekday_name());
            }
            None => {
                hour.append_null();
                day.append_null();
                week.append_null();
                month.append_null();
                year.append_null();
                weekday.append_null();
            }
        }
    }

    let int32 = |name: &str, mut builder: Int32Builder| {
        (
            Field::new(name, DataType::Int32, true),
            Arc::new(builder.finish()) as ArrayRef,
        )
    };

    table.with_columns(vec![
        (
            Field::new("start_time", DataType::Int64, true),
            Arc::new(start_time.finish()) as ArrayRef,
        ),
        int32("hour", hour),
        int32("day", day),
        int32("week", week),
        int32("month", month),
        int32("year", year),
        (
            Field::new("weekday", DataType::Utf8, true),
            Arc::new(weekday.finish()) as ArrayRef,
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int32Array, Int64Array, StringArray};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn events(ts: Vec<Option<i64>>) -> Table {
        Table::from_columns(
            "log_data",
            vec![(
                Field::new("ts", DataType::Int64, true),
                Arc::new(Int64Array::from(ts)) as ArrayRef,
            )],
        )
        .unwrap()
    }

    fn int32s(table: &Table, column: &str) -> Vec<Option<i32>> {
        table
            .column(column)
            .unwrap()
            .as_any()
            .downcast_ref::<Int32Array>()
            .unwrap()
            .iter()
            .collect()
    }

    #[test_case(1_542_241_826_796, 1_542_241_826 ; "real log timestamp")]
    #[test_case(1_000_000, 1000 ; "exact second")]
    #[test_case(1_999, 1 ; "truncates not rounds")]
    #[test_case(0, 0 ; "epoch")]
    fn test_epoch_seconds(ts: i64, expected: i64) {
        assert_eq!(epoch_seconds(ts), expected);
    }

    #[test]
    fn test_calendar_utc() {
        let attrs = calendar(1_542_241_826, TimeZoneMode::Utc).unwrap();
        assert_eq!(attrs.hour, 0);
        assert_eq!(attrs.day, 15);
        assert_eq!(attrs.week, 46);
        assert_eq!(attrs.month, 11);
        assert_eq!(attrs.year, 2018);
        assert_eq!(attrs.weekday_name(), "Thu");
    }

    #[test]
    fn test_calendar_iso_week_crosses_year() {
        // 2018-12-31 is in ISO week 1 of 2019
        let attrs = calendar(1_546_300_799, TimeZoneMode::Utc).unwrap();
        assert_eq!(attrs.year, 2018);
        assert_eq!(attrs.month, 12);
        assert_eq!(attrs.week, 1);
        assert_eq!(attrs.weekday_name(), "Mon");
    }

    #[test]
    fn test_calendar_is_deterministic() {
        for zone in [TimeZoneMode::Utc, TimeZoneMode::Local] {
            assert_eq!(calendar(1_542_241_826, zone), calendar(1_542_241_826, zone));
        }
    }

    #[test]
    fn test_derive_appends_columns() {
        let table = derive_time_columns(
            &events(vec![Some(1_542_241_826_796), Some(1_000_000)]),
            "ts",
            TimeZoneMode::Utc,
        )
        .unwrap();

        assert_eq!(
            table.column_names(),
            vec!["ts", "start_time", "hour", "day", "week", "month", "year", "weekday"]
        );
        assert_eq!(
            table.i64_column("start_time").unwrap().values().to_vec(),
            vec![1_542_241_826, 1000]
        );
        assert_eq!(int32s(&table, "year"), vec![Some(2018), Some(1970)]);
        assert_eq!(int32s(&table, "month"), vec![Some(11), Some(1)]);
        assert_eq!(int32s(&table, "hour"), vec![Some(0), Some(0)]);
        let weekday = table.string_column("weekday").unwrap();
        assert_eq!(weekday.value(0), "Thu");
        assert_eq!(weekday.value(1), "Thu");
    }

    #[test]
    fn test_derive_null_ts_gives_nulls() {
        let table =
            derive_time_columns(&events(vec![None, Some(5_000)]), "ts", TimeZoneMode::Utc).unwrap();
        assert_eq!(table.num_rows(), 2);
        assert!(table.column("start_time").unwrap().is_null(0));
        assert_eq!(int32s(&table, "day"), vec![None, Some(1)]);
        let weekday = table
            .column("weekday")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert!(weekday.is_null(0));
    }

    #[test]
    fn test_derive_keeps_duplicate_instants() {
        let table = derive_time_columns(
            &events(vec![Some(1_000_100), Some(1_000_900)]),
            "ts",
            TimeZoneMode::Local,
        )
        .unwrap();
        assert_eq!(
            table.i64_column("start_time").unwrap().values().to_vec(),
            vec![1000, 1000]
        );
    }

    #[test]
    fn test_derive_requires_integer_ts() {
        let table = Table::from_columns(
            "log_data",
            vec![(
                Field::new("ts", DataType::Utf8, true),
                Arc::new(StringArray::from(vec!["1000"])) as ArrayRef,
            )],
        )
        .unwrap();
        assert!(derive_time_columns(&table, "ts", TimeZoneMode::Utc).is_err());
        assert!(derive_time_columns(&table, "missing", TimeZoneMode::Utc).is_err());
    }
}
