use crate::data::Value;

pub const TRUTHY_TOKENS: &[&str] = &["y", "yes", "true", "1", "1.0"];
pub const FALSY_TOKENS: &[&str] = &["n", "no", "false", "0", "0.0"];

/// How a raw flag was read before collapsing it to a strict boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagToken {
    Truthy,
    Falsy,
    Unrecognized,
    Missing,
}

impl FlagToken {
    /// Only an explicit truthy token is `true`.
    pub fn as_bool(self) -> bool {
        matches!(self, FlagToken::Truthy)
    }
}

pub fn classify_flag(value: &Value) -> FlagToken {
    let lowered = match value {
        Value::Missing => return FlagToken::Missing,
        Value::Boolean(b) => return if *b { FlagToken::Truthy } else { FlagToken::Falsy },
        Value::Text(raw) => raw.trim().to_lowercase(),
        other => other.as_display().trim().to_lowercase(),
    };
    if TRUTHY_TOKENS.contains(&lowered.as_str()) {
        FlagToken::Truthy
    } else if FALSY_TOKENS.contains(&lowered.as_str()) {
        FlagToken::Falsy
    } else {
        FlagToken::Unrecognized
    }
}

pub fn parse_active_flag(value: &Value) -> bool {
    classify_flag(value).as_bool()
}

/// Rewrites a column to strict booleans; returns the number of unrecognized
/// tokens that defaulted to `false`.
pub fn normalize_active(cells: &mut [Value]) -> usize {
    let mut unrecognized = 0;
    for cell in cells.iter_mut() {
        let token = classify_flag(cell);
        if token == FlagToken::Unrecognized {
            unrecognized += 1;
        }
        *cell = Value::Boolean(token.as_bool());
    }
    unrecognized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    #[test]
    fn known_tokens_map_both_ways() {
        assert!(parse_active_flag(&text("Y")));
        assert!(parse_active_flag(&text(" yes ")));
        assert!(parse_active_flag(&text("1.0")));
        assert!(!parse_active_flag(&text("0")));
        assert!(!parse_active_flag(&text("No")));
    }

    #[test]
    fn unknown_and_missing_default_to_false() {
        assert!(!parse_active_flag(&text("maybe")));
        assert!(!parse_active_flag(&text("")));
        assert!(!parse_active_flag(&Value::Missing));
        assert_eq!(classify_flag(&text("maybe")), FlagToken::Unrecognized);
        assert_eq!(classify_flag(&Value::Missing), FlagToken::Missing);
    }

    #[test]
    fn normalized_booleans_are_stable() {
        let mut cells = vec![Value::Boolean(true), text("true"), text("?")];
        assert_eq!(normalize_active(&mut cells), 1);
        assert_eq!(
            cells,
            vec![
                Value::Boolean(true),
                Value::Boolean(true),
                Value::Boolean(false)
            ]
        );
    }
}
