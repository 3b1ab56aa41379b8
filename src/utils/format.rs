//! Format - Label and Number Formatting for Charts

use chrono::{DateTime, Local, Utc};

use crate::constants::{ABBREVIATED_PRECISION, LABEL_MAX_LEN};

/// Preferred chart labels for carriers whose first word is a poor label
const SHORT_AIRLINE_NAMES: &[(&str, &str)] = &[
    ("Sun Country Airlines d/b/a MN Airlines", "Sun Country"),
    ("United Parcel Service", "UPS"),
    ("Federal Express Corporation", "FedEx"),
    ("Mesa Airlines Inc.", "Mesa"),
    ("GoJet Airlines LLC d/b/a United Express", "GoJet"),
    ("Polar Air Cargo Airways", "Polar Air Cargo"),
];

/// Lookup a preferred short carrier label
pub fn short_airline_name(name: &str) -> Option<&'static str> {
    SHORT_AIRLINE_NAMES
        .iter()
        .find(|(full, _)| *full == name)
        .map(|(_, short)| *short)
}

/// Shorten an airline name to fit a chart label
///
/// Names in the lookup table use their preferred label. Other names longer
/// than the label limit keep their first word, or the first two words when
/// the first one is four characters or fewer.
pub fn abbreviate_airline(name: &str) -> String {
    if let Some(short) = short_airline_name(name) {
        return short.to_string();
    }
    if name.chars().count() <= LABEL_MAX_LEN {
        return name.to_string();
    }

    let mut words = name.split_whitespace();
    let Some(first) = words.next() else {
        return name.to_string();
    };
    match words.next() {
        Some(second) if first.chars().count() <= 4 => format!("{first} {second}"),
        _ => first.to_string(),
    }
}

/// Format a number with thousand separators
pub fn format_number(n: i64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (len - i) % 3 == 0 && chars[i - 1] != '-' {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Abbreviate large values with M/B suffixes, preserving sign
///
/// Values below one million are rounded and printed with separators.
pub fn abbreviate_value(value: f64) -> String {
    const MILLION: f64 = 1_000_000.0;
    const BILLION: f64 = 1_000_000_000.0;

    let magnitude = value.abs();
    if magnitude >= BILLION {
        format!("{:.*}B", ABBREVIATED_PRECISION, value / BILLION)
    } else if magnitude >= MILLION {
        format!("{:.*}M", ABBREVIATED_PRECISION, value / MILLION)
    } else {
        format_number(value.round() as i64)
    }
}

/// Share of `total` as a one-decimal percentage
pub fn format_percent(part: f64, total: f64) -> String {
    if total == 0.0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part / total * 100.0)
}

/// Format a UTC datetime for display
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    let local: DateTime<Local> = dt.with_timezone(&Local);
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}
