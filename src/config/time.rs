//! Time zone resolution for the cached timestamp

use chrono::format::{Item, StrftimeItems};
use chrono::FixedOffset;
use chrono_tz::Tz;

/// Zone the `time` tag is rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZone {
    /// The process's local zone.
    #[default]
    Local,
    Utc,
    /// A fixed offset from UTC, e.g. `+02:00`.
    Fixed(FixedOffset),
    /// An IANA zone such as `Asia/Tokyo`, DST rules included.
    Named(Tz),
}

impl TimeZone {
    /// Look up a zone by name.
    ///
    /// Accepts `"Local"`, `"UTC"` (also `"Etc/UTC"`, `"GMT"`, `"Z"`), fixed
    /// offsets like `"+05:30"` and IANA names like `"America/New_York"`. Any
    /// other name resolves to [`TimeZone::Local`].
    pub fn resolve(name: &str) -> Self {
        match name.trim() {
            "" | "Local" => TimeZone::Local,
            "UTC" | "Etc/UTC" | "GMT" | "Z" => TimeZone::Utc,
            other => match parse_offset(other) {
                Some(offset) => TimeZone::Fixed(offset),
                None => match other.parse::<Tz>() {
                    Ok(tz) => TimeZone::Named(tz),
                    Err(_) => {
                        tracing::debug!(time_zone = %other, "unknown time zone, using local time");
                        TimeZone::Local
                    }
                },
            },
        }
    }

    /// Format the current instant in this zone.
    ///
    /// `layout` must have passed [`is_valid_time_format`].
    pub fn format_now(&self, layout: &str) -> String {
        match self {
            TimeZone::Local => chrono::Local::now().format(layout).to_string(),
            TimeZone::Utc => chrono::Utc::now().format(layout).to_string(),
            TimeZone::Fixed(offset) => chrono::Utc::now()
                .with_timezone(offset)
                .format(layout)
                .to_string(),
            TimeZone::Named(tz) => chrono::Utc::now()
                .with_timezone(tz)
                .format(layout)
                .to_string(),
        }
    }
}

/// Parse `+HH:MM`, `-HHMM` or `+HH`.
fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Whether `layout` is a strftime string chrono can render.
pub fn is_valid_time_format(layout: &str) -> bool {
    !StrftimeItems::new(layout).any(|item| matches!(item, Item::Error))
}
