//! Flat parameter codec: each rule round-trips through a JSON object with a
//! `kind` tag plus per-family fields, so hosts can persist and rebuild rules
//! without knowing the enum layout.
//!
//! Decoding is lenient about omitted optional fields (documented defaults
//! apply) and strict about present ones: a field of the wrong JSON type or
//! out of range is an error, never silently coerced.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RecurrenceError, Result};
use crate::rule::RecurrenceRule;

/// Wire form of a rule: a flat JSON object.
pub type Params = Map<String, Value>;

const DEFAULT_TZ: &str = "America/New_York";
const DEFAULT_ANCHOR: &str = "2024-01-01";

/// Discriminant tag stored under the `kind` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    LastDayOfMonth,
    DayOfMonth,
    MultipleDaysOfMonth,
    NthWeekdayOfMonth,
    NthWeekdayOfYear,
    LastDayOfMonthSkipWeekend,
    FirstDayOfQuarter,
    LastDayOfQuarter,
    FirstDayOfYear,
    WeeklyOnWeekday,
    BiweeklyOnWeekday,
    SemiMonthly,
    NthBusinessDayOfMonth,
    EveryNDays,
    EveryNInterval,
    Cron,
}

impl RuleKind {
    /// Every kind, in declaration order.
    pub const ALL: [RuleKind; 16] = [
        RuleKind::LastDayOfMonth,
        RuleKind::DayOfMonth,
        RuleKind::MultipleDaysOfMonth,
        RuleKind::NthWeekdayOfMonth,
        RuleKind::NthWeekdayOfYear,
        RuleKind::LastDayOfMonthSkipWeekend,
        RuleKind::FirstDayOfQuarter,
        RuleKind::LastDayOfQuarter,
        RuleKind::FirstDayOfYear,
        RuleKind::WeeklyOnWeekday,
        RuleKind::BiweeklyOnWeekday,
        RuleKind::SemiMonthly,
        RuleKind::NthBusinessDayOfMonth,
        RuleKind::EveryNDays,
        RuleKind::EveryNInterval,
        RuleKind::Cron,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::LastDayOfMonth => "last_day_of_month",
            RuleKind::DayOfMonth => "day_of_month",
            RuleKind::MultipleDaysOfMonth => "multiple_days_of_month",
            RuleKind::NthWeekdayOfMonth => "nth_weekday_of_month",
            RuleKind::NthWeekdayOfYear => "nth_weekday_of_year",
            RuleKind::LastDayOfMonthSkipWeekend => "last_day_of_month_skip_weekend",
            RuleKind::FirstDayOfQuarter => "first_day_of_quarter",
            RuleKind::LastDayOfQuarter => "last_day_of_quarter",
            RuleKind::FirstDayOfYear => "first_day_of_year",
            RuleKind::WeeklyOnWeekday => "weekly_on_weekday",
            RuleKind::BiweeklyOnWeekday => "biweekly_on_weekday",
            RuleKind::SemiMonthly => "semi_monthly",
            RuleKind::NthBusinessDayOfMonth => "nth_business_day_of_month",
            RuleKind::EveryNDays => "every_n_days",
            RuleKind::EveryNInterval => "every_n_interval",
            RuleKind::Cron => "cron",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = RecurrenceError;

    fn from_str(s: &str) -> Result<Self> {
        RuleKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| RecurrenceError::UnknownKind(s.to_string()))
    }
}

impl RecurrenceRule {
    /// Encode the rule as its flat parameter object.
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert("kind".into(), Value::String(self.kind().as_str().into()));

        fn time(params: &mut Params, h: u32, m: u32, s: u32, tz: &Tz) {
            params.insert("hour".into(), h.into());
            params.insert("minute".into(), m.into());
            params.insert("second".into(), s.into());
            params.insert("tz".into(), Value::String(tz.name().into()));
        }

        match self {
            Self::LastDayOfMonth { hour, minute, second, tz }
            | Self::LastDayOfMonthSkipWeekend { hour, minute, second, tz }
            | Self::FirstDayOfQuarter { hour, minute, second, tz }
            | Self::LastDayOfQuarter { hour, minute, second, tz }
            | Self::FirstDayOfYear { hour, minute, second, tz }
            | Self::SemiMonthly { hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
            }
            Self::DayOfMonth { day, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                params.insert("day".into(), (*day).into());
            }
            Self::MultipleDaysOfMonth { days, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                let mut sorted = days.clone();
                sorted.sort_unstable();
                sorted.dedup();
                params.insert("days".into(), sorted.into());
            }
            Self::NthWeekdayOfMonth { weekday, n, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                params.insert("weekday".into(), weekday_index(*weekday).into());
                params.insert("n".into(), (*n).into());
            }
            Self::NthWeekdayOfYear { month, weekday, n, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                params.insert("month".into(), (*month).into());
                params.insert("weekday".into(), weekday_index(*weekday).into());
                params.insert("n".into(), (*n).into());
            }
            Self::WeeklyOnWeekday { weekday, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                params.insert("weekday".into(), weekday_index(*weekday).into());
            }
            Self::BiweeklyOnWeekday { weekday, anchor, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                params.insert("weekday".into(), weekday_index(*weekday).into());
                params.insert("anchor_date".into(), Value::String(anchor.format("%Y-%m-%d").to_string()));
            }
            Self::NthBusinessDayOfMonth { n, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                params.insert("n".into(), (*n).into());
            }
            Self::EveryNDays { interval_days, hour, minute, second, tz } => {
                time(&mut params, *hour, *minute, *second, tz);
                params.insert("interval_days".into(), (*interval_days).into());
            }
            Self::EveryNInterval { interval_minutes, interval_hours, tz } => {
                params.insert("interval_minutes".into(), (*interval_minutes).into());
                params.insert("interval_hours".into(), (*interval_hours).into());
                params.insert("tz".into(), Value::String(tz.name().into()));
            }
            Self::Cron { expression, tz } => {
                params.insert("cron".into(), Value::String(expression.clone()));
                params.insert("timezone".into(), Value::String(tz.name().into()));
            }
        }

        params
    }

    /// Decode a rule from its flat parameter object and validate it.
    pub fn from_params(params: &Params) -> Result<Self> {
        let kind: RuleKind = str_field(params, "kind")?
            .ok_or(RecurrenceError::MissingParameter("kind"))?
            .parse()?;

        let tz = timezone(params, "tz")?;
        let hour = u32_field(params, "hour")?.unwrap_or(0);
        let minute = u32_field(params, "minute")?.unwrap_or(0);
        let second = u32_field(params, "second")?.unwrap_or(0);

        let rule = match kind {
            RuleKind::LastDayOfMonth => Self::LastDayOfMonth { hour, minute, second, tz },
            RuleKind::DayOfMonth => Self::DayOfMonth {
                day: u32_field(params, "day")?.unwrap_or(1),
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::MultipleDaysOfMonth => Self::MultipleDaysOfMonth {
                days: days_field(params)?,
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::NthWeekdayOfMonth => Self::NthWeekdayOfMonth {
                weekday: weekday_field(params)?,
                n: i32_field(params, "n")?.unwrap_or(1),
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::NthWeekdayOfYear => Self::NthWeekdayOfYear {
                month: u32_field(params, "month")?
                    .ok_or(RecurrenceError::MissingParameter("month"))?,
                weekday: weekday_field(params)?,
                n: i32_field(params, "n")?.unwrap_or(1),
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::LastDayOfMonthSkipWeekend => {
                Self::LastDayOfMonthSkipWeekend { hour, minute, second, tz }
            }
            RuleKind::FirstDayOfQuarter => Self::FirstDayOfQuarter { hour, minute, second, tz },
            RuleKind::LastDayOfQuarter => Self::LastDayOfQuarter { hour, minute, second, tz },
            RuleKind::FirstDayOfYear => Self::FirstDayOfYear { hour, minute, second, tz },
            RuleKind::WeeklyOnWeekday => Self::WeeklyOnWeekday {
                weekday: weekday_field(params)?,
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::BiweeklyOnWeekday => Self::BiweeklyOnWeekday {
                weekday: weekday_field(params)?,
                anchor: anchor_field(params)?,
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::SemiMonthly => Self::SemiMonthly { hour, minute, second, tz },
            RuleKind::NthBusinessDayOfMonth => Self::NthBusinessDayOfMonth {
                n: i32_field(params, "n")?.unwrap_or(1),
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::EveryNDays => Self::EveryNDays {
                interval_days: u32_field(params, "interval_days")?.unwrap_or(1),
                hour,
                minute,
                second,
                tz,
            },
            RuleKind::EveryNInterval => Self::EveryNInterval {
                interval_minutes: u32_field(params, "interval_minutes")?.unwrap_or(0),
                interval_hours: u32_field(params, "interval_hours")?.unwrap_or(0),
                tz,
            },
            RuleKind::Cron => Self::Cron {
                expression: str_field(params, "cron")?
                    .ok_or(RecurrenceError::MissingParameter("cron"))?
                    .to_string(),
                tz: timezone(params, "timezone")?,
            },
        };

        rule.validate()?;
        Ok(rule)
    }
}

// ── Field readers ───────────────────────────────────────────────────

fn str_field<'a>(params: &'a Params, key: &'static str) -> Result<Option<&'a str>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(type_error(key, "a string", other)),
    }
}

fn u32_field(params: &Params, key: &'static str) -> Result<Option<u32>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let n = value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| type_error(key, "a non-negative integer", value))?;
            Ok(Some(n))
        }
    }
}

fn i32_field(params: &Params, key: &'static str) -> Result<Option<i32>> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            let n = value
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .ok_or_else(|| type_error(key, "an integer", value))?;
            Ok(Some(n))
        }
    }
}

fn timezone(params: &Params, key: &'static str) -> Result<Tz> {
    let name = str_field(params, key)?.unwrap_or(DEFAULT_TZ);
    name.parse::<Tz>()
        .map_err(|_| RecurrenceError::Timezone(name.to_string()))
}

/// Weekday as the 0=Monday..6=Sunday integer convention.
fn weekday_field(params: &Params) -> Result<Weekday> {
    let index = u32_field(params, "weekday")?.unwrap_or(0);
    weekday_from_index(index)
}

fn days_field(params: &Params) -> Result<Vec<u32>> {
    match params.get("days") {
        None | Some(Value::Null) => Ok(vec![1]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| type_error("days", "an array of integers", item))
            })
            .collect(),
        Some(other) => Err(type_error("days", "an array of integers", other)),
    }
}

fn anchor_field(params: &Params) -> Result<NaiveDate> {
    let raw = str_field(params, "anchor_date")?.unwrap_or(DEFAULT_ANCHOR);
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        RecurrenceError::InvalidParameter(format!(
            "anchor_date must be a YYYY-MM-DD date, got {raw:?}"
        ))
    })
}

fn type_error(key: &str, expected: &str, got: &Value) -> RecurrenceError {
    RecurrenceError::InvalidParameter(format!("{key} must be {expected}, got {got}"))
}

fn weekday_from_index(index: u32) -> Result<Weekday> {
    Ok(match index {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        6 => Weekday::Sun,
        other => {
            return Err(RecurrenceError::InvalidParameter(format!(
                "weekday must be 0-6 (Monday-Sunday), got {other}"
            )))
        }
    })
}

fn weekday_index(weekday: Weekday) -> u32 {
    weekday.num_days_from_monday()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn kind_round_trips_through_strings() {
        for kind in RuleKind::ALL {
            assert_eq!(kind.as_str().parse::<RuleKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "hourly_maybe".parse::<RuleKind>().unwrap_err();
        assert_eq!(err, RecurrenceError::UnknownKind("hourly_maybe".to_string()));
    }

    #[test]
    fn defaults_fill_omitted_fields() {
        let rule = RecurrenceRule::from_params(&params(json!({
            "kind": "day_of_month",
        })))
        .unwrap();
        assert_eq!(
            rule,
            RecurrenceRule::DayOfMonth {
                day: 1,
                hour: 0,
                minute: 0,
                second: 0,
                tz: chrono_tz::America::New_York,
            }
        );
    }

    #[test]
    fn every_rule_round_trips_through_params() {
        let rules = vec![
            RecurrenceRule::LastDayOfMonth { hour: 18, minute: 30, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::DayOfMonth { day: 15, hour: 9, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::MultipleDaysOfMonth {
                days: vec![1, 11, 21],
                hour: 6,
                minute: 0,
                second: 0,
                tz: chrono_tz::America::New_York,
            },
            RecurrenceRule::NthWeekdayOfMonth {
                weekday: Weekday::Mon,
                n: 2,
                hour: 9,
                minute: 0,
                second: 0,
                tz: chrono_tz::UTC,
            },
            RecurrenceRule::NthWeekdayOfYear {
                month: 11,
                weekday: Weekday::Thu,
                n: 4,
                hour: 12,
                minute: 0,
                second: 0,
                tz: chrono_tz::America::New_York,
            },
            RecurrenceRule::LastDayOfMonthSkipWeekend { hour: 17, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::FirstDayOfQuarter { hour: 0, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::LastDayOfQuarter { hour: 23, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::FirstDayOfYear { hour: 0, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::WeeklyOnWeekday {
                weekday: Weekday::Fri,
                hour: 16,
                minute: 45,
                second: 0,
                tz: chrono_tz::UTC,
            },
            RecurrenceRule::BiweeklyOnWeekday {
                weekday: Weekday::Mon,
                anchor: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                hour: 8,
                minute: 0,
                second: 0,
                tz: chrono_tz::UTC,
            },
            RecurrenceRule::SemiMonthly { hour: 10, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::NthBusinessDayOfMonth { n: -1, hour: 18, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::EveryNDays { interval_days: 3, hour: 2, minute: 0, second: 0, tz: chrono_tz::UTC },
            RecurrenceRule::EveryNInterval { interval_minutes: 30, interval_hours: 1, tz: chrono_tz::UTC },
            RecurrenceRule::Cron { expression: "0 9 15 * *".to_string(), tz: chrono_tz::UTC },
        ];

        for rule in rules {
            let decoded = RecurrenceRule::from_params(&rule.to_params()).unwrap();
            assert_eq!(decoded, rule, "{} did not round-trip", rule.kind());
        }
    }

    #[test]
    fn days_are_sorted_and_deduplicated_on_encode() {
        let rule = RecurrenceRule::MultipleDaysOfMonth {
            days: vec![21, 1, 11, 21],
            hour: 0,
            minute: 0,
            second: 0,
            tz: chrono_tz::UTC,
        };
        assert_eq!(rule.to_params()["days"], json!([1, 11, 21]));
    }

    #[test]
    fn missing_required_fields_are_reported() {
        let err = RecurrenceRule::from_params(&params(json!({
            "kind": "nth_weekday_of_year",
        })))
        .unwrap_err();
        assert_eq!(err, RecurrenceError::MissingParameter("month"));

        let err = RecurrenceRule::from_params(&params(json!({
            "kind": "cron",
        })))
        .unwrap_err();
        assert_eq!(err, RecurrenceError::MissingParameter("cron"));
    }

    #[test]
    fn bad_timezone_and_weekday_are_rejected() {
        let err = RecurrenceRule::from_params(&params(json!({
            "kind": "last_day_of_month",
            "tz": "Mars/Olympus_Mons",
        })))
        .unwrap_err();
        assert_eq!(err, RecurrenceError::Timezone("Mars/Olympus_Mons".to_string()));

        let err = RecurrenceRule::from_params(&params(json!({
            "kind": "weekly_on_weekday",
            "weekday": 9,
        })))
        .unwrap_err();
        assert!(matches!(err, RecurrenceError::InvalidParameter(_)));
    }

    #[test]
    fn decode_validates_the_rule() {
        let err = RecurrenceRule::from_params(&params(json!({
            "kind": "every_n_days",
            "interval_days": 0,
        })))
        .unwrap_err();
        assert_eq!(err, RecurrenceError::ZeroInterval);
    }
}
