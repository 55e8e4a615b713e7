use crate::suggestion::source::SuggestionSource;

/// Date functions the query service evaluates.
pub const FUNCTIONS: [&str; 9] = [
    "now",
    "endOfDay",
    "endOfMonth",
    "endOfWeek",
    "endOfYear",
    "startOfDay",
    "startOfMonth",
    "startOfWeek",
    "startOfYear",
];

/// Offset units: years, months, weeks, days, hours, minutes.
pub const TIME_UNITS: [char; 6] = ['y', 'M', 'w', 'd', 'H', 'm'];

/// Completes `date` values.
///
/// A function name prefix proposes `name(`. Once an offset is typed,
/// `now(-5` or `now(-5d`, every unit is proposed as a finished call.
pub struct DateSource;

impl SuggestionSource for DateSource {
    fn candidates(&self, typed: &str) -> Vec<String> {
        if let Some((function, offset)) = split_call(typed) {
            return TIME_UNITS
                .iter()
                .map(|unit| format!("{function}({offset}{unit})"))
                .collect();
        }
        FUNCTIONS
            .iter()
            .filter(|function| function.starts_with(typed))
            .map(|function| format!("{function}("))
            .collect()
    }
}

/// `now(-5d` into `("now", "-5")`. The trailing unit is optional.
fn split_call(typed: &str) -> Option<(&str, &str)> {
    let (function, rest) = typed.split_once('(')?;
    if !FUNCTIONS.contains(&function) {
        return None;
    }
    let offset = match rest.char_indices().last() {
        Some((at, unit)) if TIME_UNITS.contains(&unit) => &rest[..at],
        _ => rest,
    };
    let digits = offset.strip_prefix('-').unwrap_or(offset);
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    Some((function, offset))
}
