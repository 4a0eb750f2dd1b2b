// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

pub fn parse_boolish(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a user-typed amount. Accepts a decimal comma ("12,5").
pub fn parse_amount(raw: &str) -> Option<f64> {
    let normalized = raw.trim().replace(',', ".");
    let value: f64 = normalized.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Split a comma/whitespace separated identity list, dropping blanks and
/// surrounding quotes.
pub fn parse_identity_list(raw: &str) -> Vec<String> {
    raw.trim_matches(|c| c == '`' || c == '"' || c == '\'' || c == '[' || c == ']')
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|part| part.trim_matches(|c| c == '"' || c == '\''))
        .filter(|part| !part.is_empty())
        .map(ToString::to_string)
        .collect()
}
