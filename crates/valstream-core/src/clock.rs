//! Simulated time: durations and the two clock variants.
//!
//! Time is modeled at minute granularity. A [`Duration`] is always kept
//! normalized (minutes < 60, hours < 24, seconds truncated to zero) and its
//! canonical scalar is [`Duration::to_minutes`]. The run is driven by an
//! [`IncrClock`] counting up to the run length; every recipe batch and the
//! worker resupply cycle are timed with a [`DecrClock`] counting down.

use std::fmt;
use std::str::FromStr;

const MINUTES_PER_HOUR: u64 = 60;
const HOURS_PER_DAY: u64 = 24;
const MINUTES_PER_DAY: u64 = MINUTES_PER_HOUR * HOURS_PER_DAY;
const SECONDS_PER_MINUTE: u64 = 60;

/// Errors produced while building or scaling a [`Duration`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DurationError {
    #[error("invalid duration '{spec}': {reason}")]
    InvalidFormat { spec: String, reason: String },
    #[error("efficiency must be positive, got {0}")]
    InvalidEfficiency(f64),
}

// ---------------------------------------------------------------------------
// Duration
// ---------------------------------------------------------------------------

/// A span of simulated time broken into days, hours and minutes.
///
/// Sub-minute precision is not modeled: seconds are carried into minutes on
/// construction and then dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    days: u64,
    hours: u64,
    minutes: u64,
}

impl Duration {
    pub const ZERO: Duration = Duration {
        days: 0,
        hours: 0,
        minutes: 0,
    };

    /// Parse a colon separated duration of up to four integer components,
    /// least significant first from the right: `"S"`, `"M:S"`, `"H:M:S"` or
    /// `"D:H:M:S"`. The display form `"DD HH:MM:SS"` is accepted as well.
    pub fn parse(spec: &str) -> Result<Self, DurationError> {
        let invalid = |reason: String| DurationError::InvalidFormat {
            spec: spec.to_string(),
            reason,
        };

        let parts: Vec<&str> = spec
            .trim()
            .split(|c: char| c == ':' || c.is_whitespace())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.is_empty() {
            return Err(invalid("no components".to_string()));
        }
        if parts.len() > 4 {
            return Err(invalid(format!("{} components, at most 4 allowed", parts.len())));
        }

        let mut vals = [0u64; 4];
        let offset = 4 - parts.len();
        for (i, part) in parts.iter().enumerate() {
            vals[offset + i] = part
                .parse::<u64>()
                .map_err(|e| invalid(format!("component '{part}': {e}")))?;
        }

        let [days, hours, minutes, seconds] = vals;
        Self::checked_total(days, hours, minutes, seconds)
            .map(Self::from_minutes)
            .ok_or_else(|| invalid("too long to represent in minutes".to_string()))
    }

    fn checked_total(days: u64, hours: u64, minutes: u64, seconds: u64) -> Option<u64> {
        days.checked_mul(MINUTES_PER_DAY)?
            .checked_add(hours.checked_mul(MINUTES_PER_HOUR)?)?
            .checked_add(minutes)?
            .checked_add(seconds / SECONDS_PER_MINUTE)
    }

    /// Build a normalized duration from raw, possibly overflowing components.
    /// Totals beyond `u64::MAX` minutes saturate.
    pub fn from_components(days: u64, hours: u64, minutes: u64, seconds: u64) -> Self {
        Self::from_minutes(Self::checked_total(days, hours, minutes, seconds).unwrap_or(u64::MAX))
    }

    /// Build a normalized duration from a total minute count.
    pub fn from_minutes(total: u64) -> Self {
        Self {
            days: total / MINUTES_PER_DAY,
            hours: (total % MINUTES_PER_DAY) / MINUTES_PER_HOUR,
            minutes: total % MINUTES_PER_HOUR,
        }
    }

    pub fn days(&self) -> u64 {
        self.days
    }

    pub fn hours(&self) -> u64 {
        self.hours
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }

    /// Always zero after normalization.
    pub fn seconds(&self) -> u64 {
        0
    }

    /// Canonical scalar representation.
    pub fn to_minutes(&self) -> u64 {
        self.days * MINUTES_PER_DAY + self.hours * MINUTES_PER_HOUR + self.minutes
    }

    /// Fractional days, used for per-day rate reporting.
    pub fn to_days(&self) -> f64 {
        self.to_minutes() as f64 / MINUTES_PER_DAY as f64
    }

    /// Scale the duration by a whole number of runs, saturating at
    /// `u64::MAX` minutes.
    pub fn apply_multiplier(&mut self, n: u64) {
        *self = Self::from_minutes(self.to_minutes().saturating_mul(n));
    }

    /// Stretch (efficiency < 1) or shrink (efficiency > 1) the duration.
    /// The result is truncated to whole minutes.
    pub fn apply_efficiency(&mut self, efficiency: f64) -> Result<(), DurationError> {
        if !efficiency.is_finite() || efficiency <= 0.0 {
            return Err(DurationError::InvalidEfficiency(efficiency));
        }
        let scaled = self.to_minutes() as f64 / efficiency;
        *self = Self::from_minutes(scaled as u64);
        Ok(())
    }

    pub fn is_zero(&self) -> bool {
        self.to_minutes() == 0
    }

    /// Advance by one minute, carrying into hours and days.
    fn advance_minute(&mut self) {
        if self.minutes + 1 < MINUTES_PER_HOUR {
            self.minutes += 1;
        } else if self.hours + 1 < HOURS_PER_DAY {
            self.minutes = 0;
            self.hours += 1;
        } else {
            self.minutes = 0;
            self.hours = 0;
            self.days += 1;
        }
    }

    /// Retreat by one minute, borrowing from hours and days. Saturates at zero.
    fn retreat_minute(&mut self) {
        if self.minutes > 0 {
            self.minutes -= 1;
        } else if self.hours > 0 {
            self.minutes = MINUTES_PER_HOUR - 1;
            self.hours -= 1;
        } else if self.days > 0 {
            self.minutes = MINUTES_PER_HOUR - 1;
            self.hours = HOURS_PER_DAY - 1;
            self.days -= 1;
        }
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02} {:02}:{:02}:{:02}",
            self.days,
            self.hours,
            self.minutes,
            self.seconds()
        )
    }
}

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Count-up clock driving a run. Starts at zero and steps toward `target`.
#[derive(Debug, Clone)]
pub struct IncrClock {
    now: Duration,
    target: Duration,
}

impl IncrClock {
    pub fn new(target: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            target,
        }
    }

    /// Advance one minute. Returns whether the clock is still short of its
    /// target; the tick that reaches the target returns `false`, and callers
    /// perform one more flush tick after the loop.
    pub fn step(&mut self) -> bool {
        self.now.advance_minute();
        self.now.to_minutes() < self.target.to_minutes()
    }

    pub fn to_minutes(&self) -> u64 {
        self.now.to_minutes()
    }

    pub fn now(&self) -> Duration {
        self.now
    }
}

impl fmt::Display for IncrClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.now.fmt(f)
    }
}

/// Count-down clock timing a single recipe batch or resupply cycle.
#[derive(Debug, Clone)]
pub struct DecrClock {
    remaining: Duration,
}

impl DecrClock {
    pub fn new(duration: Duration) -> Self {
        Self {
            remaining: duration,
        }
    }

    /// Retreat one minute. Returns whether time remains.
    pub fn step(&mut self) -> bool {
        self.remaining.retreat_minute();
        self.remaining.to_minutes() > 0
    }

    pub fn to_minutes(&self) -> u64 {
        self.remaining.to_minutes()
    }
}

impl fmt::Display for DecrClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.remaining.fmt(f)
    }
}
