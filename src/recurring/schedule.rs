//! Works out when a recurring transaction is next due.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

use crate::Error;

/// How often a recurring transaction repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Frequency {
    Daily,
    Weekly,
    /// Every fourteen days.
    #[serde(alias = "biweekly", alias = "fortnightly")]
    BiWeekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    /// The canonical name of the frequency, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::BiWeekly => "bi-weekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Parse a stored frequency, treating anything unrecognised as monthly.
    pub fn parse_or_monthly(text: &str) -> Self {
        text.parse().unwrap_or_else(|_| {
            tracing::warn!("Unrecognised frequency {text:?}, falling back to monthly");
            Frequency::Monthly
        })
    }
}

impl Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "bi-weekly" | "biweekly" | "fortnightly" => Ok(Frequency::BiWeekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(Error::InvalidArgument(format!(
                "unknown frequency \"{s}\", expected one of daily, weekly, bi-weekly, monthly, quarterly or yearly"
            ))),
        }
    }
}

/// The first due date strictly after `anchor` for `frequency`.
///
/// Calendar-month frequencies keep the anchor's day of the month, clamped to
/// the last day of shorter months: Jan 31 plus one month is Feb 29 in 2024
/// and Feb 28 in 2023.
///
/// Returns `None` if the next due date is past the last supported date.
pub fn next_due_date(frequency: Frequency, anchor: Date) -> Option<Date> {
    match frequency {
        Frequency::Daily => anchor.next_day(),
        Frequency::Weekly => anchor.checked_add(Duration::weeks(1)),
        Frequency::BiWeekly => anchor.checked_add(Duration::weeks(2)),
        Frequency::Monthly => add_months(anchor, 1),
        Frequency::Quarterly => add_months(anchor, 3),
        Frequency::Yearly => add_months(anchor, 12),
    }
}

fn add_months(date: Date, months: i32) -> Option<Date> {
    let month_index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = month_index.div_euclid(12);
    let month = Month::try_from(u8::try_from(month_index.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(last_day_of_month(year, month)?);

    Date::from_calendar_date(year, month, day).ok()
}

fn last_day_of_month(year: i32, month: Month) -> Option<u8> {
    // December always has 31 days, and the first of the following January may
    // not be representable.
    if month == Month::December {
        return Some(31);
    }

    Date::from_calendar_date(year, month.next(), 1)
        .ok()?
        .previous_day()
        .map(|date| date.day())
}
