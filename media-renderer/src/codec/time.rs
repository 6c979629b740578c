//! Conversion between second counts and the `HH:MM:SS` strings used by
//! AVTransport for targets, positions and durations.

use crate::error::{RendererError, Result};

/// Format a second count as zero-padded `HH:MM:SS`
///
/// The hours field grows past two digits instead of wrapping.
///
/// ```
/// use media_renderer::codec::format_time;
///
/// assert_eq!(format_time(0), "00:00:00");
/// assert_eq!(format_time(3723), "01:02:03");
/// assert_eq!(format_time(360_000), "100:00:00");
/// ```
pub fn format_time(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds - hours * 3600) / 60;
    let secs = seconds - hours * 3600 - minutes * 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Parse an `H+:MM:SS` string into a second count
///
/// A fractional suffix on the seconds field (`00:00:05.250`) is truncated.
/// Anything else that is not three unsigned integer fields with minutes and
/// seconds below 60, including the `NOT_IMPLEMENTED` sentinel, is rejected.
pub fn parse_time(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let fields: Vec<&str> = trimmed.split(':').collect();
    if fields.len() != 3 {
        return Err(RendererError::decoding(format!(
            "invalid time '{}': expected HH:MM:SS",
            input
        )));
    }

    let hours = parse_field(fields[0], input)?;
    let minutes = parse_field(fields[1], input)?;
    let whole_seconds = match fields[2].split_once('.') {
        Some((whole, fraction)) if !fraction.is_empty() && fraction.bytes().all(|b| b.is_ascii_digit()) => whole,
        Some(_) => {
            return Err(RendererError::decoding(format!(
                "invalid fractional seconds in '{}'",
                input
            )))
        }
        None => fields[2],
    };
    let seconds = parse_field(whole_seconds, input)?;

    if minutes >= 60 || seconds >= 60 {
        return Err(RendererError::decoding(format!(
            "invalid time '{}': minutes and seconds must be below 60",
            input
        )));
    }

    hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| RendererError::decoding(format!("time '{}' is out of range", input)))
}

fn parse_field(field: &str, input: &str) -> Result<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RendererError::decoding(format!(
            "invalid field '{}' in time '{}'",
            field, input
        )));
    }
    field
        .parse::<u64>()
        .map_err(|_| RendererError::decoding(format!("field '{}' in time '{}' is out of range", field, input)))
}
