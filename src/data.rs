use std::fmt;

use chrono::NaiveDate;

/// Tokens a spreadsheet export uses for an empty cell.
pub const NULL_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether `raw` matches a null token once ASCII case is ignored.
pub fn is_null_token_ignore_case(raw: &str) -> bool {
    NULL_TOKENS.iter().any(|token| token.eq_ignore_ascii_case(raw))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Missing,
    Text(String),
    Number(f64),
    Boolean(bool),
    Date(NaiveDate),
}

impl Value {
    /// Builds a cell from raw delimited text, mapping null tokens to `Missing`.
    pub fn from_raw(raw: &str) -> Self {
        if NULL_TOKENS.contains(&raw) {
            Value::Missing
        } else {
            Value::Text(raw.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Missing => String::new(),
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Renders a float the way the cleaned export expects: integral values keep a
/// trailing `.0` so the column still reads as floating point.
pub fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Parses a trimmed decimal literal; non-finite results count as missing.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
