//! Duration parsing for user timer requests and step instructions
//!
//! Accepts the forms people type while cooking: "10 min", "1 hour 30 minutes",
//! "45 sec", "1.5 hrs". A bare number is read as minutes.

use regex::Regex;
use std::sync::LazyLock;

use crate::timer::MAX_TIMER_SECS;

static DURATION_PART: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)\b").ok()
});

static INSTRUCTION_DURATION: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+(?:\.\d+)?)(?:\s*(?:-|to|–)\s*(\d+(?:\.\d+)?))?\s*(hours?|hrs?|minutes?|mins?|seconds?|secs?)\b",
    )
    .ok()
});

fn unit_seconds(unit: &str) -> f64 {
    match unit.to_ascii_lowercase().chars().next() {
        Some('h') => 3600.0,
        Some('s') => 1.0,
        _ => 60.0,
    }
}

/// Parse a duration typed by the user into whole seconds
pub fn parse_duration(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(minutes) = text.parse::<f64>() {
        return to_positive_seconds(minutes * 60.0);
    }

    let pattern = DURATION_PART.as_ref()?;
    let total: f64 = pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
            Some(amount * unit_seconds(caps.get(2)?.as_str()))
        })
        .sum();

    to_positive_seconds(total)
}

/// Find the first duration mentioned in a step instruction, such as
/// "simmer for 10 minutes". Ranges ("8-10 minutes") take the upper bound.
pub fn infer_step_duration(instruction: &str) -> Option<i64> {
    let pattern = INSTRUCTION_DURATION.as_ref()?;
    let caps = pattern.captures(instruction)?;

    let amount: f64 = caps
        .get(2)
        .or_else(|| caps.get(1))?
        .as_str()
        .parse()
        .ok()?;
    to_positive_seconds(amount * unit_seconds(caps.get(3)?.as_str()))
}

/// Whole seconds in `1..=MAX_TIMER_SECS`, anything else is not a usable duration
fn to_positive_seconds(seconds: f64) -> Option<i64> {
    let rounded = seconds.round();
    (rounded >= 1.0 && rounded <= MAX_TIMER_SECS as f64).then_some(rounded as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("10 min"), Some(600));
        assert_eq!(parse_duration("10 minutes"), Some(600));
        assert_eq!(parse_duration("1 hour"), Some(3600));
        assert_eq!(parse_duration("2hrs"), Some(7200));
        assert_eq!(parse_duration("30 sec"), Some(30));
        assert_eq!(parse_duration("1 hour 30 minutes"), Some(5400));
        assert_eq!(parse_duration("1.5 h"), Some(5400));
    }

    #[test]
    fn test_bare_number_means_minutes() {
        assert_eq!(parse_duration("5"), Some(300));
        assert_eq!(parse_duration(" 2.5 "), Some(150));
    }

    #[test]
    fn test_parse_duration_rejects_garbage_and_zero() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("soon"), None);
        assert_eq!(parse_duration("0"), None);
        assert_eq!(parse_duration("0 min"), None);
    }

    #[test]
    fn test_parse_duration_rejects_unrepresentable_amounts() {
        assert_eq!(parse_duration("1e300"), None);
        assert_eq!(parse_duration("99999999999999999999 hours"), None);
        assert_eq!(parse_duration("8 days"), None);
        assert_eq!(parse_duration("168 hours"), Some(MAX_TIMER_SECS));
        assert_eq!(infer_step_duration("Cure for 100000 hours"), None);
    }

    #[test]
    fn test_patterns_compile() {
        assert!(DURATION_PART.is_some());
        assert!(INSTRUCTION_DURATION.is_some());
    }

    #[test]
    fn test_infer_step_duration_from_instruction() {
        assert_eq!(
            infer_step_duration("Cover and simmer for 10 minutes, stirring occasionally"),
            Some(600)
        );
        assert_eq!(infer_step_duration("Bake 8-10 mins until golden"), Some(600));
        assert_eq!(infer_step_duration("Rest the dough for 1 hour"), Some(3600));
        assert_eq!(infer_step_duration("Season with salt and pepper"), None);
        // Bare numbers in an instruction are quantities, not durations
        assert_eq!(infer_step_duration("Add 2 eggs"), None);
    }
}
