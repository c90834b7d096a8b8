use thiserror::Error;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime};

/// Day keys are ISO calendar dates; they double as directory names.
pub const DAY_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

#[derive(Debug, Error)]
#[error("invalid date {input:?}: expected YYYY-MM-DD")]
pub struct InvalidDate {
    pub input: String,
    #[source]
    source: time::error::Parse,
}

pub fn format_day(date: Date) -> String {
    date.format(DAY_FORMAT).unwrap_or_else(|_| {
        format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    })
}

pub fn parse_day(input: &str) -> Result<Date, InvalidDate> {
    let trimmed = input.trim();
    Date::parse(trimmed, DAY_FORMAT).map_err(|source| InvalidDate {
        input: trimmed.to_string(),
        source,
    })
}

/// Today's date in the local timezone, or UTC when the offset cannot be
/// determined (e.g. on multi-threaded unix processes).
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Moves by whole days, saturating at the calendar limits.
pub fn shift_days(date: Date, days: i64) -> Date {
    date.checked_add(Duration::days(days)).unwrap_or(date)
}

/// Moves by calendar months, clamping the day to the target month's length.
pub fn shift_months(date: Date, months: i32) -> Date {
    let index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = index.div_euclid(12);
    let month = Month::try_from((index.rem_euclid(12) + 1) as u8).unwrap_or(date.month());
    let day = date.day().min(month.length(year));
    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// First day of the month containing `date`.
pub fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_day(date!(2024 - 01 - 05)), "2024-01-05");
    }

    #[test]
    fn parses_trimmed_iso_dates() {
        assert_eq!(parse_day(" 2024-02-29 ").unwrap(), date!(2024 - 02 - 29));
    }

    #[test]
    fn month_shift_clamps_day() {
        assert_eq!(shift_months(date!(2024 - 01 - 31), 1), date!(2024 - 02 - 29));
        assert_eq!(shift_months(date!(2024 - 01 - 15), -1), date!(2023 - 12 - 15));
        assert_eq!(shift_months(date!(2023 - 11 - 30), 14), date!(2025 - 01 - 30));
    }

    #[test]
    fn day_shift_crosses_months() {
        assert_eq!(shift_days(date!(2024 - 02 - 28), 2), date!(2024 - 03 - 01));
        assert_eq!(shift_days(date!(2024 - 01 - 03), -7), date!(2023 - 12 - 27));
        assert_eq!(month_start(date!(2024 - 07 - 19)), date!(2024 - 07 - 01));
    }

    #[test]
    fn rejects_impossible_dates() {
        let err = parse_day("2023-02-29").unwrap_err();
        assert_eq!(err.input, "2023-02-29");
        assert!(parse_day("yesterday").is_err());
    }
}
