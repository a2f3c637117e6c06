/// Text, time and password helpers shared by commands and the lifecycle manager
use crate::error::{BotError, BotResult};
use chrono::{DateTime, Datelike, Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};

/// Longest message body the chat platform accepts
pub const MESSAGE_LIMIT: usize = 2000;

/// Length of generated temporary passwords
pub const TEMP_PASSWORD_LENGTH: usize = 12;

/// Split `text` into chunks of at most `length` bytes, preferring to break
/// before the last newline that fits.
pub fn split_string(text: &str, length: usize) -> Vec<String> {
    if text.is_empty() || length == 0 {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while rest.len() > length {
        let mut cut = floor_char_boundary(rest, length);
        // A newline sitting exactly at `length` still counts as a break point
        let window = floor_char_boundary(rest, length + 1);
        if let Some(newline) = rest[..window].rfind('\n') {
            if newline > 0 {
                cut = newline;
            }
        }
        if cut == 0 {
            // A single character wider than `length`
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(cut);
        chunks.push(head.to_string());
        rest = tail;
    }
    chunks.push(rest.to_string());
    chunks
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Random alphanumeric password
pub fn random_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TEMP_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

/// Parse a lock duration such as `45s`, `30m`, `2h`, `7d` or `1w`
pub fn parse_duration(input: &str) -> BotResult<Duration> {
    let input = input.trim().to_lowercase();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| BotError::Validation(format!("Missing unit in duration '{}'", input)))?;
    let (amount, unit) = input.split_at(split);

    let amount: i64 = amount
        .parse()
        .map_err(|_| BotError::Validation(format!("Invalid duration '{}'", input)))?;
    if amount <= 0 {
        return Err(BotError::Validation("Duration must be positive".to_string()));
    }

    let duration = match unit {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        "w" => Duration::try_weeks(amount),
        _ => {
            return Err(BotError::Validation(format!(
                "Unknown duration unit '{}'",
                unit
            )))
        }
    };
    duration.ok_or_else(|| BotError::Validation(format!("Duration '{}' is too large", input)))
}

/// Whether `input` looks like a duration rather than the first word of a reason
pub fn is_duration(input: &str) -> bool {
    parse_duration(input).is_ok()
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Long human date, e.g. `Tuesday, March 5th 2024, 4:07:09 PM`
pub fn format_long_date(date: DateTime<Utc>) -> String {
    format!(
        "{}, {} {}{} {}",
        date.format("%A"),
        date.format("%B"),
        date.day(),
        ordinal_suffix(date.day()),
        date.format("%Y, %-I:%M:%S %p")
    )
}
