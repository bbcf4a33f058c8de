//! Script parser for the serial-expect scripting language.
//!
//! The top-level entry point is [`parse_str`]. Scripts are parsed all-or-nothing:
//! one bad line rejects the whole script.

use crate::command::{Command, SerialCommand};
use crate::commands::{Expect, Monitor, SendInput};
use crate::error::{Error, InvalidDuration, Result};
use std::time::Duration;

/// Parse a script body and return the resulting commands.
///
/// Blank lines are ignored and every other line is trimmed. Line numbers in
/// errors are 1-based and count from the first non-blank line of the body.
///
/// # Errors
///
/// Returns [`Error::Parse`] for an unknown command, a missing argument, a
/// malformed expect pattern or a malformed monitor parameter.
///
/// # Example
///
/// ```
/// use serial_expect::parse_str;
///
/// let commands = parse_str("send 'root'\nexpect \"# \"\nmonitor 10\n").unwrap();
/// assert_eq!(commands.len(), 3);
/// ```
pub fn parse_str(body: &str) -> Result<Vec<Command>> {
    let mut commands = Vec::new();
    for (line_num, line) in body.trim().lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cmd = parse_line(line).map_err(|reason| Error::Parse {
            line: line_num + 1,
            content: line.to_string(),
            reason,
        })?;
        commands.push(cmd);
    }
    Ok(commands)
}

type ParseFn = fn(&str) -> Result<Command, String>;

static REGISTRY: &[(&str, ParseFn)] = &[
    (SendInput::NAME, SendInput::parse_command),
    (Expect::NAME, Expect::parse_command),
    (Monitor::NAME, Monitor::parse_command),
];

/// Dispatch a single trimmed, non-empty line to the matching command's parser.
fn parse_line(line: &str) -> Result<Command, String> {
    let (name, args) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(name, args)| (name, args.trim_start()));
    REGISTRY
        .iter()
        .find(|(cmd_name, _)| *cmd_name == name)
        .map(|(_, parse)| parse(args))
        .unwrap_or_else(|| Err("unknown command".to_string()))
}

/// Parse a duration literal: one or more `<number><unit>` pairs such as `1s`,
/// `500ms`, `1.5s` or `2m30s`, or the bare literal `0`.
///
/// Units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.
pub fn parse_duration(s: &str) -> Result<Duration, InvalidDuration> {
    let s = s.trim();
    let invalid = || InvalidDuration(s.to_string());
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.is_empty() {
        return Err(invalid());
    }

    let is_number = |c: char| c.is_ascii_digit() || c == '.';
    let mut total_nanos: u128 = 0;
    let mut rest = s;
    while !rest.is_empty() {
        let num_end = rest.find(|c| !is_number(c)).unwrap_or(rest.len());
        let (number, tail) = rest.split_at(num_end);
        let unit_end = tail.find(is_number).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);

        let unit_nanos: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3_600 * 1_000_000_000,
            _ => return Err(invalid()),
        };
        total_nanos = scaled_nanos(number, unit_nanos)
            .and_then(|nanos| total_nanos.checked_add(nanos))
            .ok_or_else(invalid)?;
        rest = tail;
    }

    let secs = u64::try_from(total_nanos / 1_000_000_000).map_err(|_| invalid())?;
    Ok(Duration::new(secs, (total_nanos % 1_000_000_000) as u32))
}

/// `number * unit_nanos`, where `number` is a decimal with an optional fraction.
fn scaled_nanos(number: &str, unit_nanos: u128) -> Option<u128> {
    let (int_part, frac_part) = number.split_once('.').unwrap_or((number, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let int: u128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };

    let mut frac: u128 = 0;
    let mut scale: u128 = 1;
    for ch in frac_part.chars() {
        let digit = ch.to_digit(10)?;
        // Digits past nanosecond precision of an hour do not change the result.
        if scale < 1_000_000_000_000_000_000 {
            frac = frac * 10 + u128::from(digit);
            scale *= 10;
        }
    }

    int.checked_mul(unit_nanos)?
        .checked_add(frac * unit_nanos / scale)
}
