use chrono::{NaiveDate, NaiveDateTime};

use crate::data::Value;

/// Year-first layouts, used only when a value opens with a four-digit year.
const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const ISO_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Day-before-month layouts. Month-first layouts are never tried.
/// Two-digit years come first because `%Y` also accepts a two-digit year.
const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d-%b-%y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%Y",
];

const DAY_FIRST_DATETIME_FORMATS: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];

/// Parses a date under the day-first convention. `03/04/2024` is 3 April;
/// `12/31/2024` has no day-first reading and yields `None`.
pub fn parse_day_first_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    let (date_formats, datetime_formats) = if leads_with_year(value) {
        (ISO_DATE_FORMATS, ISO_DATETIME_FORMATS)
    } else {
        (DAY_FIRST_FORMATS, DAY_FIRST_DATETIME_FORMATS)
    };
    date_formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            datetime_formats
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn leads_with_year(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() > 4 && bytes[..4].iter().all(u8::is_ascii_digit) && !bytes[4].is_ascii_digit()
}

pub fn normalize_date_value(value: &Value) -> Value {
    match value {
        Value::Date(_) => value.clone(),
        Value::Text(raw) => parse_day_first_date(raw).map_or(Value::Missing, Value::Date),
        _ => Value::Missing,
    }
}

/// Rewrites a column in place; returns how many present cells were coerced to
/// missing.
pub fn normalize_dates(cells: &mut [Value]) -> usize {
    let mut coerced = 0;
    for cell in cells.iter_mut() {
        let normalized = normalize_date_value(cell);
        if normalized.is_missing() && !cell.is_missing() {
            coerced += 1;
        }
        *cell = normalized;
    }
    coerced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn slash_dates_are_day_first() {
        assert_eq!(parse_day_first_date("03/04/2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_day_first_date("3/4/2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_day_first_date("25-12-2023"), Some(ymd(2023, 12, 25)));
        assert_eq!(parse_day_first_date("03/04/24"), Some(ymd(2024, 4, 3)));
    }

    #[test]
    fn month_first_only_dates_become_missing() {
        assert_eq!(parse_day_first_date("12/31/2024"), None);
        assert_eq!(parse_day_first_date("02/30/2024"), None);
    }

    #[test]
    fn iso_and_textual_forms_parse() {
        assert_eq!(parse_day_first_date("2024-04-03"), Some(ymd(2024, 4, 3)));
        assert_eq!(
            parse_day_first_date("2024-04-03 10:15:00"),
            Some(ymd(2024, 4, 3))
        );
        assert_eq!(parse_day_first_date("3 Apr 2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_day_first_date("03-Apr-24"), Some(ymd(2024, 4, 3)));
    }

    #[test]
    fn garbage_and_empty_are_missing() {
        assert_eq!(parse_day_first_date(""), None);
        assert_eq!(parse_day_first_date("not a date"), None);
        assert_eq!(parse_day_first_date("31/02/2024"), None);
    }

    #[test]
    fn normalize_dates_counts_coercions() {
        let mut cells = vec![
            Value::Text("01/02/2024".into()),
            Value::Text("bogus".into()),
            Value::Missing,
        ];
        assert_eq!(normalize_dates(&mut cells), 1);
        assert_eq!(cells[0], Value::Date(ymd(2024, 2, 1)));
        assert_eq!(cells[1], Value::Missing);
        assert_eq!(cells[2], Value::Missing);
    }
}
