//! One-line human-readable summaries, used for `Display` and host UIs.

use std::fmt;

use chrono::Weekday;

use crate::rule::RecurrenceRule;

impl RecurrenceRule {
    /// A one-line summary such as
    /// `Monthly, last day of the month at 18:30 (UTC)`.
    pub fn describe(&self) -> String {
        match self {
            Self::LastDayOfMonth { hour, minute, tz, .. } => {
                format!("Monthly, last day of the month at {} ({tz})", clock(*hour, *minute))
            }
            Self::DayOfMonth { day, hour, minute, tz, .. } => {
                format!("Monthly, day {day} at {} ({tz})", clock(*hour, *minute))
            }
            Self::MultipleDaysOfMonth { days, hour, minute, tz, .. } => {
                format!("Monthly, days {} at {} ({tz})", day_list(days), clock(*hour, *minute))
            }
            Self::NthWeekdayOfMonth { weekday, n, hour, minute, tz, .. } => {
                format!(
                    "Monthly, {} {} at {} ({tz})",
                    ordinal_name(*n),
                    weekday_name(*weekday),
                    clock(*hour, *minute)
                )
            }
            Self::NthWeekdayOfYear { month, weekday, n, hour, minute, tz, .. } => {
                format!(
                    "Yearly, {} {} of {} at {} ({tz})",
                    ordinal_name(*n),
                    weekday_name(*weekday),
                    month_name(*month),
                    clock(*hour, *minute)
                )
            }
            Self::LastDayOfMonthSkipWeekend { hour, minute, tz, .. } => {
                format!(
                    "Monthly, last day (or previous Friday if weekend) at {} ({tz})",
                    clock(*hour, *minute)
                )
            }
            Self::FirstDayOfQuarter { hour, minute, tz, .. } => {
                format!("Quarterly, first day of the quarter at {} ({tz})", clock(*hour, *minute))
            }
            Self::LastDayOfQuarter { hour, minute, tz, .. } => {
                format!("Quarterly, last day of the quarter at {} ({tz})", clock(*hour, *minute))
            }
            Self::FirstDayOfYear { hour, minute, tz, .. } => {
                format!("Yearly, first day of the year at {} ({tz})", clock(*hour, *minute))
            }
            Self::WeeklyOnWeekday { weekday, hour, minute, tz, .. } => {
                format!("Weekly, on {} at {} ({tz})", weekday_name(*weekday), clock(*hour, *minute))
            }
            Self::BiweeklyOnWeekday { weekday, anchor, hour, minute, tz, .. } => {
                format!(
                    "Biweekly, every other {} at {} ({tz}), anchor {anchor}",
                    weekday_name(*weekday),
                    clock(*hour, *minute)
                )
            }
            Self::SemiMonthly { hour, minute, tz, .. } => {
                format!("Semi-monthly, 15th and last day at {} ({tz})", clock(*hour, *minute))
            }
            Self::NthBusinessDayOfMonth { n, hour, minute, tz, .. } => {
                format!(
                    "Monthly, {} business day at {} ({tz})",
                    ordinal_name(*n),
                    clock(*hour, *minute)
                )
            }
            Self::EveryNDays { interval_days, hour, minute, tz, .. } => {
                format!(
                    "Every {interval_days} {} at {} ({tz})",
                    plural(*interval_days, "day"),
                    clock(*hour, *minute)
                )
            }
            Self::EveryNInterval { interval_minutes, interval_hours, tz } => {
                let mut parts = Vec::new();
                if *interval_hours > 0 {
                    parts.push(format!("{interval_hours} {}", plural(*interval_hours, "hour")));
                }
                if *interval_minutes > 0 {
                    parts.push(format!("{interval_minutes} {}", plural(*interval_minutes, "minute")));
                }
                format!("Every {} ({tz})", parts.join(" and "))
            }
            Self::Cron { expression, tz } => format!("Cron: {expression} ({tz})"),
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

fn clock(hour: u32, minute: u32) -> String {
    format!("{hour:02}:{minute:02}")
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn ordinal_name(n: i32) -> String {
    match n {
        1 => "first".to_string(),
        2 => "second".to_string(),
        3 => "third".to_string(),
        4 => "fourth".to_string(),
        -1 => "last".to_string(),
        other => format!("{other}th"),
    }
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "?",
    }
}

fn day_list(days: &[u32]) -> String {
    let mut sorted: Vec<u32> = days.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn plural(n: u32, unit: &str) -> String {
    if n == 1 {
        unit.to_string()
    } else {
        format!("{unit}s")
    }
}
