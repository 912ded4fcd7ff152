// View mode and time-window arithmetic
use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const REALTIME_WINDOW_MS: i64 = 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Realtime,
    Daily,
    Monthly,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::Realtime => "realtime",
            ViewMode::Daily => "daily",
            ViewMode::Monthly => "monthly",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("unknown view mode: {0}")]
    Mode(String),
    #[error("invalid date (expected YYYY-MM-DD): {0}")]
    Day(String),
    #[error("invalid month (expected YYYY-MM): {0}")]
    Month(String),
}

impl FromStr for ViewMode {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "realtime" => Ok(ViewMode::Realtime),
            "daily" => Ok(ViewMode::Daily),
            "monthly" => Ok(ViewMode::Monthly),
            other => Err(SelectionError::Mode(other.to_string())),
        }
    }
}

/// Inclusive `[from_ms, to_ms]` range in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub from_ms: i64,
    pub to_ms: i64,
}

impl TimeWindow {
    pub fn new(from_ms: i64, to_ms: i64) -> Self {
        Self { from_ms, to_ms }
    }

    /// The trailing hour ending at `now_ms`
    pub fn trailing_hour(now_ms: i64) -> Self {
        Self::new(now_ms - REALTIME_WINDOW_MS, now_ms)
    }

    pub fn from_secs(&self) -> i64 {
        self.from_ms.div_euclid(1000)
    }

    pub fn to_secs(&self) -> i64 {
        self.to_ms.div_euclid(1000)
    }

    pub fn contains(&self, time_ms: i64) -> bool {
        (self.from_ms..=self.to_ms).contains(&time_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSelection {
    pub year: i32,
    pub month: u32,
}

impl MonthSelection {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
    }

    /// "February 2024"
    pub fn display_name(&self) -> String {
        match self.first_day() {
            Some(day) => day.format("%B %Y").to_string(),
            None => format!("{:04}-{:02}", self.year, self.month),
        }
    }
}

impl fmt::Display for MonthSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Days at the edge of the calendar range are rejected so their bounds stay computable
pub fn parse_day(value: &str) -> Result<NaiveDate, SelectionError> {
    let invalid = || SelectionError::Day(value.to_string());
    let date = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| invalid())?;
    date.pred_opt().and(date.succ_opt()).ok_or_else(invalid)?;
    Ok(date)
}

pub fn parse_month(value: &str) -> Result<MonthSelection, SelectionError> {
    let invalid = || SelectionError::Month(value.to_string());
    let (year, month) = value.trim().split_once('-').ok_or_else(invalid)?;
    let selection = MonthSelection {
        year: year.parse().map_err(|_| invalid())?,
        month: month.parse().map_err(|_| invalid())?,
    };
    selection
        .first_day()
        .and_then(|first| first.pred_opt())
        .and(selection.last_day().and_then(|last| last.succ_opt()))
        .ok_or_else(invalid)?;
    Ok(selection)
}

/// Resolve a wall-clock time in `tz`. Ambiguous times take the earlier instant,
/// times skipped by a DST gap fall back to the UTC reading of the wall clock.
fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => tz.from_utc_datetime(&naive),
    }
}

/// `[00:00:00.000, 23:59:59.999]` of `date` in the time zone `tz`
pub fn day_bounds<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> Option<TimeWindow> {
    let start = date.and_time(NaiveTime::MIN);
    let end = start
        .checked_add_signed(Duration::days(1))?
        .checked_sub_signed(Duration::milliseconds(1))?;
    Some(TimeWindow::new(
        resolve_local(tz, start).timestamp_millis(),
        resolve_local(tz, end).timestamp_millis(),
    ))
}

/// First day 00:00:00 through last day 23:59:59 of the month in `tz`
pub fn month_bounds<Tz: TimeZone>(month: MonthSelection, tz: &Tz) -> Option<TimeWindow> {
    let start = month.first_day()?.and_hms_opt(0, 0, 0)?;
    let end = month.last_day()?.and_hms_opt(23, 59, 59)?;
    Some(TimeWindow::new(
        resolve_local(tz, start).timestamp_millis(),
        resolve_local(tz, end).timestamp_millis(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Local, Utc};

    #[test]
    fn test_trailing_hour() {
        let window = TimeWindow::trailing_hour(10_000_000);
        assert_eq!(window.to_ms - window.from_ms, REALTIME_WINDOW_MS);
        assert_eq!(window.to_ms, 10_000_000);
        assert!(window.contains(10_000_000 - REALTIME_WINDOW_MS));
        assert!(!window.contains(10_000_000 - REALTIME_WINDOW_MS - 1));
    }

    #[test]
    fn test_window_seconds_floor() {
        let window = TimeWindow::new(1_999, 2_001);
        assert_eq!(window.from_secs(), 1);
        assert_eq!(window.to_secs(), 2);
    }

    #[test]
    fn test_day_bounds_follow_local_offset() {
        let date = parse_day("2024-03-15").unwrap();
        for offset_hours in [-11, -5, 0, 7, 14] {
            let tz = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            let window = day_bounds(date, &tz).unwrap();

            let start = tz.timestamp_millis_opt(window.from_ms).unwrap();
            let end = tz.timestamp_millis_opt(window.to_ms).unwrap();
            assert_eq!(start.naive_local().to_string(), "2024-03-15 00:00:00");
            assert_eq!(end.naive_local().to_string(), "2024-03-15 23:59:59.999");
        }
    }

    #[test]
    fn test_day_bounds_in_system_local_time() {
        let date = parse_day("2024-03-15").unwrap();
        let window = day_bounds(date, &Local).unwrap();
        let start = Local.timestamp_millis_opt(window.from_ms).unwrap();
        assert_eq!(start.date_naive(), date);
    }

    #[test]
    fn test_month_bounds_leap_year() {
        let month = parse_month("2024-02").unwrap();
        let window = month_bounds(month, &Utc).unwrap();
        let end = Utc.timestamp_millis_opt(window.to_ms).unwrap();
        assert_eq!(end.naive_utc().to_string(), "2024-02-29 23:59:59");

        let start = Utc.timestamp_millis_opt(window.from_ms).unwrap();
        assert_eq!(start.naive_utc().to_string(), "2024-02-01 00:00:00");
    }

    #[test]
    fn test_month_bounds_non_leap_and_december() {
        let february = MonthSelection { year: 2023, month: 2 };
        assert_eq!(february.last_day().unwrap().to_string(), "2023-02-28");

        let december = MonthSelection { year: 2024, month: 12 };
        assert_eq!(december.last_day().unwrap().to_string(), "2024-12-31");
    }

    #[test]
    fn test_parse_selection_errors() {
        assert!(parse_day("2024-13-01").is_err());
        assert!(parse_month("2024-00").is_err());
        assert!(parse_month("2024").is_err());
        assert_eq!("monthly".parse::<ViewMode>(), Ok(ViewMode::Monthly));
        assert!("weekly".parse::<ViewMode>().is_err());
    }

    #[test]
    fn test_rejects_days_at_calendar_edge() {
        assert!(parse_day("+262142-12-31").is_err());
        assert!(parse_day(&NaiveDate::MIN.to_string()).is_err());
        assert!(parse_month("+262142-12").is_err());
        assert!(parse_day("2024-12-31").is_ok());
        assert!(parse_month("2024-12").is_ok());
    }

    #[test]
    fn test_bounds_out_of_range_are_none() {
        assert_eq!(day_bounds(NaiveDate::MAX, &Utc), None);
        let last = MonthSelection::of(NaiveDate::MAX);
        assert_eq!(month_bounds(last, &Utc), None);
    }

    /// Central European time: 2024-03-31 02:00 springs to 03:00,
    /// 2024-10-27 03:00 falls back to 02:00.
    #[derive(Debug, Clone, Copy)]
    struct CentralEurope;

    impl CentralEurope {
        fn transitions() -> (NaiveDateTime, NaiveDateTime) {
            (naive("2024-03-31 01:00:00"), naive("2024-10-27 01:00:00"))
        }

        fn offset_at_utc(utc: &NaiveDateTime) -> FixedOffset {
            let (spring, autumn) = Self::transitions();
            let hours = if *utc >= spring && *utc < autumn { 2 } else { 1 };
            FixedOffset::east_opt(hours * 3600).unwrap()
        }
    }

    impl TimeZone for CentralEurope {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            CentralEurope
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let winter = FixedOffset::east_opt(3600).unwrap();
            let summer = FixedOffset::east_opt(2 * 3600).unwrap();
            let as_winter = Self::offset_at_utc(&(*local - Duration::hours(1))) == winter;
            let as_summer = Self::offset_at_utc(&(*local - Duration::hours(2))) == summer;
            match (as_winter, as_summer) {
                (true, true) => LocalResult::Ambiguous(summer, winter),
                (true, false) => LocalResult::Single(winter),
                (false, true) => LocalResult::Single(summer),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            Self::offset_at_utc(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            Self::offset_at_utc(utc)
        }
    }

    fn naive(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_resolve_local_in_dst_gap_reads_wall_clock_as_utc() {
        let skipped = naive("2024-03-31 02:30:00");
        assert_eq!(CentralEurope.from_local_datetime(&skipped), LocalResult::None);

        let resolved = resolve_local(&CentralEurope, skipped);
        assert_eq!(resolved.naive_utc(), skipped);
    }

    #[test]
    fn test_resolve_local_ambiguous_takes_earlier_instant() {
        let repeated = naive("2024-10-27 02:30:00");
        let resolved = resolve_local(&CentralEurope, repeated);
        assert_eq!(resolved.naive_utc(), naive("2024-10-27 00:30:00"));
        assert_eq!(resolved.offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_day_bounds_across_spring_forward() {
        let date = parse_day("2024-03-31").unwrap();
        let window = day_bounds(date, &CentralEurope).unwrap();
        // 23 hours long; midnight is still in winter time
        assert_eq!(
            Utc.timestamp_millis_opt(window.from_ms).unwrap().naive_utc(),
            naive("2024-03-30 23:00:00")
        );
        assert_eq!(window.to_ms - window.from_ms + 1, 23 * 60 * 60 * 1000);
    }

    #[test]
    fn test_month_display_name() {
        let month = MonthSelection { year: 2024, month: 2 };
        assert_eq!(month.display_name(), "February 2024");
        assert_eq!(month.to_string(), "2024-02");
    }
}
