// Named dashboard time ranges and the query windows they map to
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeRange {
    #[default]
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    PreviousMonth,
}

impl TimeRange {
    /// Unknown values fall back to `Today`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return TimeRange::Today;
        };
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "today" => TimeRange::Today,
            "yesterday" => TimeRange::Yesterday,
            "thisweek" => TimeRange::ThisWeek,
            "thismonth" => TimeRange::ThisMonth,
            "previousmonth" => TimeRange::PreviousMonth,
            _ => {
                tracing::debug!("Unknown time range '{}', using today", raw);
                TimeRange::Today
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Today => "today",
            TimeRange::Yesterday => "yesterday",
            TimeRange::ThisWeek => "this_week",
            TimeRange::ThisMonth => "this_month",
            TimeRange::PreviousMonth => "previous_month",
        }
    }

    /// Midnights are resolved in `now`'s zone, each with its own offset.
    pub fn window<Tz: TimeZone>(&self, now: DateTime<Tz>) -> RangeWindow {
        let tz = now.timezone();
        let today = now.date_naive();
        let midnight = |date: NaiveDate| RangeBound::Absolute(at_midnight(date, &tz));
        let first_of_month = today - Duration::days(i64::from(today.day0()));

        match self {
            TimeRange::Today => RangeWindow {
                start: midnight(today),
                stop: RangeBound::Now,
                every: Some(AggregateEvery::FifteenMinutes),
                limit: 96,
            },
            TimeRange::Yesterday => RangeWindow {
                start: midnight(today - Duration::days(1)),
                stop: midnight(today),
                every: Some(AggregateEvery::FifteenMinutes),
                limit: 96,
            },
            TimeRange::ThisWeek => RangeWindow {
                start: midnight(
                    today - Duration::days(i64::from(today.weekday().num_days_from_monday())),
                ),
                stop: RangeBound::Now,
                every: Some(AggregateEvery::OneHour),
                limit: 168,
            },
            TimeRange::ThisMonth => RangeWindow {
                start: midnight(first_of_month),
                stop: RangeBound::Now,
                every: Some(AggregateEvery::SixHours),
                limit: 124,
            },
            TimeRange::PreviousMonth => {
                let last_of_previous = first_of_month - Duration::days(1);
                let first_of_previous =
                    last_of_previous - Duration::days(i64::from(last_of_previous.day0()));
                RangeWindow {
                    start: midnight(first_of_previous),
                    stop: midnight(first_of_month),
                    every: Some(AggregateEvery::OneDay),
                    limit: 31,
                }
            }
        }
    }
}

fn at_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<FixedOffset> {
    let local = date.and_time(NaiveTime::MIN);
    // Zones that jump over midnight start the day at 01:00.
    let resolved = tz
        .from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest());
    match resolved {
        Some(t) => t.fixed_offset(),
        None => tz.from_utc_datetime(&local).fixed_offset(),
    }
}

/// One end of a query range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Now,
    /// Seconds before now.
    Ago(u32),
    Absolute(DateTime<FixedOffset>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateEvery {
    OneMinute,
    FifteenMinutes,
    OneHour,
    SixHours,
    OneDay,
}

impl fmt::Display for AggregateEvery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let literal = match self {
            AggregateEvery::OneMinute => "1m",
            AggregateEvery::FifteenMinutes => "15m",
            AggregateEvery::OneHour => "1h",
            AggregateEvery::SixHours => "6h",
            AggregateEvery::OneDay => "1d",
        };
        f.write_str(literal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeWindow {
    pub start: RangeBound,
    pub stop: RangeBound,
    pub every: Option<AggregateEvery>,
    pub limit: usize,
}

impl RangeWindow {
    /// Raw samples over the last `seconds`, newest `limit` only.
    pub fn trailing(seconds: u32, limit: usize) -> Self {
        Self {
            start: RangeBound::Ago(seconds),
            stop: RangeBound::Now,
            every: None,
            limit,
        }
    }
}
