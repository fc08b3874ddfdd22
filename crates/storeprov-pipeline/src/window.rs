//! Named reporting ranges resolved to concrete `[start, end)` windows.
//!
//! All calendar arithmetic happens in one canonical timezone so stores in
//! different locales bucket into the same days.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use storeprov_core::DateWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RangeToken {
    Today,
    Yesterday,
    ThisWeek,
    #[default]
    ThisMonth,
    Last3Weeks,
}

impl RangeToken {
    /// Parses a range token. Unknown tokens fall back to `ThisMonth`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "today" => RangeToken::Today,
            "yesterday" => RangeToken::Yesterday,
            "thisWeek" => RangeToken::ThisWeek,
            "thisMonth" => RangeToken::ThisMonth,
            "last3Weeks" => RangeToken::Last3Weeks,
            other => {
                tracing::debug!(token = other, "unknown range token, using thisMonth");
                RangeToken::ThisMonth
            }
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RangeToken::Today => "today",
            RangeToken::Yesterday => "yesterday",
            RangeToken::ThisWeek => "thisWeek",
            RangeToken::ThisMonth => "thisMonth",
            RangeToken::Last3Weeks => "last3Weeks",
        }
    }
}

impl std::fmt::Display for RangeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves `token` against `now` in `tz`.
///
/// `today`, `yesterday` and `thisMonth` cover whole local days; `thisWeek`
/// and `last3Weeks` start on a local Monday and end at `now`.
#[must_use]
pub fn resolve_window(token: RangeToken, now: DateTime<Utc>, tz: Tz) -> DateWindow {
    let today = now.with_timezone(&tz).date_naive();

    match token {
        RangeToken::Today => DateWindow::new(
            start_of_day(tz, today),
            start_of_day(tz, today.succ_opt().unwrap_or(NaiveDate::MAX)),
        ),
        RangeToken::Yesterday => DateWindow::new(
            start_of_day(tz, today.pred_opt().unwrap_or(NaiveDate::MIN)),
            start_of_day(tz, today),
        ),
        RangeToken::ThisMonth => {
            let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
            let next = first
                .checked_add_months(Months::new(1))
                .unwrap_or(NaiveDate::MAX);
            DateWindow::new(start_of_day(tz, first), start_of_day(tz, next))
        }
        RangeToken::ThisWeek => DateWindow::new(start_of_day(tz, week_start(today)), now),
        RangeToken::Last3Weeks => {
            let start = week_start(today) - Duration::weeks(3);
            DateWindow::new(start_of_day(tz, start), now)
        }
    }
}

/// Monday of the ISO week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First instant of `date` in `tz`.
///
/// An ambiguous midnight takes the earlier instant. A midnight skipped by a
/// DST jump resolves to the first valid local time after the gap.
fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            (1..=96).find_map(|quarter| {
                tz.from_local_datetime(&(midnight + Duration::minutes(15 * quarter)))
                    .earliest()
            })
        })
        .map_or_else(
            || Utc.from_utc_datetime(&midnight),
            |local| local.with_timezone(&Utc),
        )
}
