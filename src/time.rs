//! Event timestamps and `strftime`-style rendering.

use std::ops::{Add, Sub};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::loglog;

const MICROS_PER_SEC: i64 = 1_000_000;

/// A point in time with microsecond resolution, as captured at a log call
/// site.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub struct Timestamp {
    secs: i64,
    micros: u32,
}

impl Timestamp {
    /// Captures the current wall-clock time.
    pub fn now() -> Timestamp {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => Timestamp {
                secs: elapsed.as_secs() as i64,
                micros: elapsed.subsec_micros(),
            },
            // Clock before the epoch; clamp rather than panic.
            Err(_) => Timestamp::default(),
        }
    }

    /// Builds a timestamp from epoch seconds and a microsecond fraction,
    /// normalizing an overflowing fraction into whole seconds.
    pub fn new(secs: i64, micros: i64) -> Timestamp {
        let extra = micros.div_euclid(MICROS_PER_SEC);
        let micros = micros.rem_euclid(MICROS_PER_SEC);
        Timestamp {
            secs: secs + extra,
            micros: micros as u32,
        }
    }

    /// Builds a timestamp from whole epoch seconds.
    pub fn from_secs(secs: i64) -> Timestamp {
        Timestamp { secs, micros: 0 }
    }

    /// Seconds since the epoch.
    pub fn secs(&self) -> i64 {
        self.secs
    }

    /// The sub-second microsecond fraction, always below one million.
    pub fn micros(&self) -> u32 {
        self.micros
    }

    /// Signed distance to an earlier timestamp, in milliseconds.
    pub fn millis_since(&self, earlier: Timestamp) -> i64 {
        (self.secs - earlier.secs) * 1000 + (self.micros as i64 - earlier.micros as i64) / 1000
    }

    pub(crate) fn to_utc(self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.secs, self.micros * 1000)
            .single()
            .unwrap_or_default()
    }

    pub(crate) fn to_local(self) -> DateTime<Local> {
        self.to_utc().with_timezone(&Local)
    }

    /// Renders the timestamp through a `strftime`-compatible format string.
    ///
    /// Two extensions are substituted before the calendar formatter runs:
    /// `%q` expands to the zero-padded 3-digit millisecond value and `%Q` to
    /// `.<millis>.<micro fraction>` with both groups zero-padded to 3 digits.
    pub fn format(&self, fmt: &str, use_gmtime: bool) -> String {
        use std::fmt::Write;

        if fmt.is_empty() {
            return String::new();
        }

        let expanded = self.expand_subsecond_specifiers(fmt);
        let mut out = String::with_capacity(expanded.len() + expanded.len() / 3);
        let rendered = if use_gmtime {
            write!(out, "{}", self.to_utc().format(&expanded))
        } else {
            write!(out, "{}", self.to_local().format(&expanded))
        };
        if rendered.is_err() {
            loglog::loglog().error(format!("invalid time format string `{}`", fmt));
            return String::new();
        }
        out
    }

    /// Replaces `%q` and `%Q` with their rendered values, leaving every other
    /// specifier for the calendar formatter.
    fn expand_subsecond_specifiers(&self, fmt: &str) -> String {
        let mut out = String::with_capacity(fmt.len());
        let mut chars = fmt.chars();
        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }
            match chars.next() {
                Some('q') => {
                    out.push_str(&format!("{:03}", self.micros / 1000));
                }
                Some('Q') => {
                    out.push_str(&format!(
                        ".{:03}.{:03}",
                        self.micros / 1000,
                        self.micros % 1000
                    ));
                }
                Some(other) => {
                    out.push('%');
                    out.push(other);
                }
                None => out.push('%'),
            }
        }
        out
    }
}

impl From<DateTime<Local>> for Timestamp {
    fn from(dt: DateTime<Local>) -> Timestamp {
        Timestamp {
            secs: dt.timestamp(),
            micros: dt.timestamp_subsec_micros() % 1_000_000,
        }
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp::new(
            self.secs + rhs.as_secs() as i64,
            self.micros as i64 + rhs.subsec_micros() as i64,
        )
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp::new(
            self.secs - rhs.as_secs() as i64,
            self.micros as i64 - rhs.subsec_micros() as i64,
        )
    }
}
