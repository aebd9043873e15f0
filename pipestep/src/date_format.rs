//! Engine date patterns
//!
//! Table definitions describe their info-date column with the pattern
//! notation used by the compute engine (`yyyy-MM-dd`, `dd.MM.yyyy`, ...).
//! This module translates those patterns into chrono format strings.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors from translating or applying a date pattern
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateFormatError {
    #[error("Unsupported date pattern token '{token}' in '{pattern}'")]
    UnsupportedToken { pattern: String, token: String },

    #[error("Unterminated quote in date pattern '{0}'")]
    UnterminatedQuote(String),
}

/// Translate an engine date pattern into a chrono format string
pub fn to_chrono_format(pattern: &str) -> Result<String, DateFormatError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\'' {
            // '' outside a literal is an escaped single quote
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            i = push_quoted(&mut out, &chars, i + 1)
                .ok_or_else(|| DateFormatError::UnterminatedQuote(pattern.to_string()))?;
            continue;
        }

        if !c.is_ascii_alphabetic() {
            push_literal(&mut out, c);
            i += 1;
            continue;
        }

        let run = chars[i..].iter().take_while(|&&n| n == c).count();
        let spec = match (c, run) {
            ('y', 4) | ('u', 4) => "%Y",
            ('y', 2) | ('u', 2) => "%y",
            ('M', 1) => "%-m",
            ('M', 2) => "%m",
            ('M', 3) => "%b",
            ('M', 4) => "%B",
            ('d', 1) => "%-d",
            ('d', 2) => "%d",
            ('D', 3) => "%j",
            ('H', 2) => "%H",
            ('m', 2) => "%M",
            ('s', 2) => "%S",
            _ => {
                return Err(DateFormatError::UnsupportedToken {
                    pattern: pattern.to_string(),
                    token: std::iter::repeat_n(c, run).collect(),
                });
            }
        };
        out.push_str(spec);
        i += run;
    }

    Ok(out)
}

/// Copy a quoted literal starting at `start`, returning the index after its closing quote
fn push_quoted(out: &mut String, chars: &[char], start: usize) -> Option<usize> {
    let mut i = start;
    while i < chars.len() {
        if chars[i] == '\'' {
            if chars.get(i + 1) == Some(&'\'') {
                out.push('\'');
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        push_literal(out, chars[i]);
        i += 1;
    }
    None
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

/// Render a date with an engine date pattern
pub fn format_date(date: NaiveDate, pattern: &str) -> Result<String, DateFormatError> {
    let fmt = to_chrono_format(pattern)?;
    Ok(date.format(&fmt).to_string())
}
