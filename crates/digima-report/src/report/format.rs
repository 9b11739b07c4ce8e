//! Text formatting shared by every deck section.

use super::quantity::Quantity;
use chrono::NaiveDate;
use regex_lite::Regex;
use std::sync::OnceLock;

/// Placeholder for values the input did not provide.
pub const MISSING: &str = "-";

/// Groups the integer digits with commas: `12345` → `12,345`.
pub fn thousands(value: Quantity) -> String {
    match value {
        Quantity::Int(v) => group_digits(&v.to_string()),
        Quantity::Float(v) if v.is_finite() => {
            let mut text = v.to_string();
            if !text.contains('.') {
                text.push_str(".0");
            }
            group_digits(&text)
        }
        Quantity::Float(v) => v.to_string(),
    }
}

pub fn thousands_opt(value: Option<Quantity>) -> String {
    value.map(thousands).unwrap_or_else(|| MISSING.to_string())
}

/// Fixed decimals with grouped digits: `(12000.5, 2)` → `12,000.50`.
pub fn thousands_fixed(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    group_digits(&format!("{value:.decimals$}"))
}

/// Integers keep their digits, fractional amounts get two decimals.
pub fn amount(value: Quantity) -> String {
    match value {
        Quantity::Int(_) => thousands(value),
        Quantity::Float(v) => thousands_fixed(v, 2),
    }
}

pub fn yen(value: Quantity) -> String {
    format!("¥{}", thousands(value))
}

/// Signed change with grouped digits; `-` when the change is unknown.
pub fn signed_delta(value: Option<Quantity>) -> String {
    match value {
        None => MISSING.to_string(),
        Some(v) if v > Quantity::Int(0) => format!("+{}", thousands(v)),
        Some(v) => thousands(v),
    }
}

/// Month-over-month percentage as shown on the summary cards.
pub fn signed_percent(value: f64) -> String {
    format!("{value:+.1}%")
}

pub fn percent(value: Option<Quantity>) -> String {
    match value {
        Some(v) => format!("{v}%"),
        None => format!("{MISSING}%"),
    }
}

/// Ads exports mix fractions (0.031) and percentages (3.1) for CTR/CVR.
///
/// Above 2 the value is already a percentage, below 1 it is a fraction;
/// anything in between is printed unchanged.
pub fn ratio_percent(value: Quantity) -> String {
    let v = value.as_f64();
    if v > 2.0 {
        format!("{v:.2}%")
    } else if v < 1.0 {
        format!("{:.2}%", v * 100.0)
    } else {
        format!("{v:.2}%")
    }
}

fn period_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+)年(\d+)月.*?(\d+)-(\d+)-(\d+)").expect("period pattern compiles")
    })
}

/// Turns `2025年6月 (2025-06-20 時点)` into `2025/6/1～2025/6/20`.
///
/// The first date after the month is taken as the end of the range. Labels
/// in any other shape have their dashes replaced by `～`.
pub fn period_label(raw: &str) -> String {
    if let Some(caps) = period_pattern().captures(raw) {
        let year = &caps[1];
        let month = &caps[2];
        let end = end_date_label(&caps[3], &caps[4], &caps[5]);
        return format!("{year}/{month}/1～{end}");
    }
    raw.replace(" - ", "～").replace('-', "～")
}

fn end_date_label(year: &str, month: &str, day: &str) -> String {
    let parsed = (
        year.parse::<i32>(),
        month.parse::<u32>(),
        day.parse::<u32>(),
    );
    if let (Ok(y), Ok(m), Ok(d)) = parsed {
        if let Some(date) = NaiveDate::from_ymd_opt(y, m, d) {
            return date.format("%Y/%-m/%-d").to_string();
        }
    }
    let trim = |part: &str| part.trim_start_matches('0').to_string();
    let (month, day) = (trim(month), trim(day));
    format!(
        "{year}/{}/{}",
        if month.is_empty() { "0" } else { month.as_str() },
        if day.is_empty() { "0" } else { day.as_str() }
    )
}

/// `2025年6月` → `2025/6`.
pub fn month_short(ym: &str) -> String {
    ym.replace('年', "/").replace('月', "")
}

/// Chart category for an ads week.
///
/// ISO dates are reformatted through chrono (`2025-06-09` → `06-09`), so the
/// label no longer depends on the date string's exact width. Any other label
/// keeps its last five characters. No padding is appended; chart categories
/// are compared and rendered as-is.
pub fn week_label(week: &str) -> String {
    if let Ok(date) = NaiveDate::parse_from_str(week.trim(), "%Y-%m-%d") {
        return date.format("%m-%d").to_string();
    }
    let chars: Vec<char> = week.chars().collect();
    let start = chars.len().saturating_sub(5);
    chars[start..].iter().collect()
}

fn group_digits(text: &str) -> String {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (integer, fraction) = match unsigned.find('.') {
        Some(idx) => unsigned.split_at(idx),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(text.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{sign}{grouped}{fraction}")
}
