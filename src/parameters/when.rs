use crate::NiceToolsError;
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone};
use std::str::FromStr;

/// The unit of the interval after which the log file is rotated.
///
/// Is parsed case-insensitively from `S`, `M`, `H`, `D`, `midnight`, or `W0` to `W6`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum When {
    /// Every `interval` seconds.
    Second,
    /// Every `interval` minutes.
    Minute,
    /// Every `interval` hours.
    Hour,
    /// Every `interval` days, counted from the creation of the file.
    Day,
    /// At midnight.
    Midnight,
    /// At the end of the given weekday (0 = Monday, ..., 6 = Sunday).
    Weekday(u8),
}

impl FromStr for When {
    type Err = NiceToolsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Ok(match upper.as_str() {
            "S" => Self::Second,
            "M" => Self::Minute,
            "H" => Self::Hour,
            "D" => Self::Day,
            "MIDNIGHT" => Self::Midnight,
            w if w.len() == 2 && w.starts_with('W') => match w[1..].parse::<u8>() {
                Ok(day) if day < 7 => Self::Weekday(day),
                _ => {
                    return Err(NiceToolsError::Schedule(format!(
                        "invalid weekday in '{s}', expected W0 (Monday) to W6 (Sunday)"
                    )))
                }
            },
            _ => {
                return Err(NiceToolsError::Schedule(format!(
                    "'{s}' is none of S, M, H, D, midnight, W0-W6"
                )))
            }
        })
    }
}

/// When the log file is rotated: a unit and a multiplier.
///
/// The multiplier is ignored for `Midnight` and `Weekday`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    when: When,
    interval: u32,
}

impl Default for Schedule {
    /// Rotation at midnight.
    fn default() -> Self {
        Self {
            when: When::Midnight,
            interval: 1,
        }
    }
}

impl Schedule {
    /// Creates a schedule; an interval of 0 is treated as 1.
    #[must_use]
    pub fn new(when: When, interval: u32) -> Self {
        Self {
            when,
            interval: interval.max(1),
        }
    }

    /// The unit.
    #[must_use]
    pub fn when(&self) -> When {
        self.when
    }

    // Length of one rotation period.
    pub(crate) fn period(&self) -> Duration {
        let interval = i64::from(self.interval);
        match self.when {
            When::Second => Duration::seconds(interval),
            When::Minute => Duration::minutes(interval),
            When::Hour => Duration::hours(interval),
            When::Day => Duration::days(interval),
            When::Midnight => Duration::days(1),
            When::Weekday(_) => Duration::weeks(1),
        }
    }

    /// Computes the first rotation point after `from`.
    #[must_use]
    pub fn next_rollover(&self, from: &DateTime<Local>) -> DateTime<Local> {
        match self.when {
            When::Second | When::Minute | When::Hour => *from + self.period(),
            When::Day => shift_days(from, i64::from(self.interval)),
            When::Midnight => next_midnight(from),
            When::Weekday(day) => {
                let today = u8::try_from(from.weekday().num_days_from_monday()).unwrap_or(0);
                let days_to_wait = (day + 7 - today) % 7;
                shift_days(&next_midnight(from), i64::from(days_to_wait))
            }
        }
    }

    // Start of the period that ends at `rollover_at`.
    //
    // Day based periods are counted in calendar days, since a day with a DST switch
    // has 23 or 25 hours.
    pub(crate) fn period_start(&self, rollover_at: &DateTime<Local>) -> DateTime<Local> {
        match self.when {
            When::Second | When::Minute | When::Hour => *rollover_at - self.period(),
            When::Day => shift_days(rollover_at, -i64::from(self.interval)),
            When::Midnight => shift_days(rollover_at, -1),
            When::Weekday(_) => shift_days(rollover_at, -7),
        }
    }

    // strftime pattern of the timestamp that is appended to rotated files
    pub(crate) fn suffix_format(&self) -> &'static str {
        match self.when {
            When::Second => "%Y-%m-%d_%H-%M-%S",
            When::Minute => "%Y-%m-%d_%H-%M",
            When::Hour => "%Y-%m-%d_%H",
            When::Day | When::Midnight | When::Weekday(_) => "%Y-%m-%d",
        }
    }

    // Regex matching the suffixes produced with suffix_format()
    pub(crate) fn suffix_pattern(&self) -> &'static str {
        match self.when {
            When::Second => r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}-\d{2}$",
            When::Minute => r"^\d{4}-\d{2}-\d{2}_\d{2}-\d{2}$",
            When::Hour => r"^\d{4}-\d{2}-\d{2}_\d{2}$",
            When::Day | When::Midnight | When::Weekday(_) => r"^\d{4}-\d{2}-\d{2}$",
        }
    }
}

impl FromStr for Schedule {
    type Err = NiceToolsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(When::from_str(s)?, 1))
    }
}

fn next_midnight(from: &DateTime<Local>) -> DateTime<Local> {
    let tomorrow: NaiveDate = from.date_naive() + Duration::days(1);
    let naive = tomorrow.and_hms_opt(0, 0, 0).unwrap(/* midnight exists */);
    // midnight can be skipped by a DST switch; fall back to a plain day then
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| *from + Duration::days(1))
}

// Moves `ts` by calendar days, keeping its wall clock time if that exists on the target day.
fn shift_days(ts: &DateTime<Local>, days: i64) -> DateTime<Local> {
    let naive = ts.naive_local() + Duration::days(days);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| *ts + Duration::days(days))
}
