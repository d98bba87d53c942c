use std::sync::OnceLock;

use regex::Regex;

use crate::data::{Value, parse_numeric};

fn currency_noise() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[$,\s]").expect("valid currency pattern"))
}

/// Strips `$`, thousands separators and whitespace, then parses the rest.
pub fn parse_currency(raw: &str) -> Option<f64> {
    parse_numeric(&currency_noise().replace_all(raw, ""))
}

pub fn normalize_spend_value(value: &Value) -> Value {
    match value {
        Value::Text(raw) => parse_currency(raw).map_or(Value::Missing, Value::Number),
        other => other.clone(),
    }
}

pub fn coerce_numeric_value(value: &Value) -> Value {
    match value {
        Value::Number(_) => value.clone(),
        Value::Boolean(b) => Value::Number(if *b { 1.0 } else { 0.0 }),
        Value::Text(raw) => parse_numeric(raw).map_or(Value::Missing, Value::Number),
        Value::Missing | Value::Date(_) => Value::Missing,
    }
}

/// Returns how many present cells could not be parsed.
pub fn normalize_spend(cells: &mut [Value]) -> usize {
    rewrite(cells, normalize_spend_value)
}

/// Returns how many present cells could not be parsed.
pub fn normalize_count(cells: &mut [Value]) -> usize {
    rewrite(cells, coerce_numeric_value)
}

/// Replaces every missing cell with `0.0`; returns how many were filled.
pub fn fill_missing_with_zero(cells: &mut [Value]) -> usize {
    let mut filled = 0;
    for cell in cells.iter_mut().filter(|cell| cell.is_missing()) {
        *cell = Value::Number(0.0);
        filled += 1;
    }
    filled
}

fn rewrite(cells: &mut [Value], normalize: fn(&Value) -> Value) -> usize {
    let mut coerced = 0;
    for cell in cells.iter_mut() {
        let normalized = normalize(cell);
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

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn currency_strings_parse() {
        assert_eq!(parse_currency("$1,234.50"), Some(1234.5));
        assert_eq!(parse_currency(" $ 500 "), Some(500.0));
        assert_eq!(parse_currency("1 000"), Some(1000.0));
        assert_eq!(parse_currency("invalid"), None);
        assert_eq!(parse_currency("$"), None);
    }

    #[test]
    fn spend_passes_numbers_through() {
        assert_eq!(normalize_spend_value(&Value::Number(12.5)), Value::Number(12.5));
        assert_eq!(normalize_spend_value(&Value::Missing), Value::Missing);
    }

    #[test]
    fn count_coercion_marks_garbage_missing() {
        let mut cells = vec![text("10"), text("ten"), Value::Missing, text(" 7.5 ")];
        assert_eq!(normalize_count(&mut cells), 1);
        assert_eq!(
            cells,
            vec![
                Value::Number(10.0),
                Value::Missing,
                Value::Missing,
                Value::Number(7.5)
            ]
        );
    }

    #[test]
    fn fill_missing_with_zero_makes_column_total() {
        let mut cells = vec![Value::Missing, Value::Number(3.0)];
        assert_eq!(fill_missing_with_zero(&mut cells), 1);
        assert_eq!(cells, vec![Value::Number(0.0), Value::Number(3.0)]);
    }
}
