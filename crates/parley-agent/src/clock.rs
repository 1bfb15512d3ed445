// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock source for schedules, greetings and message timestamps.

use chrono::{DateTime, FixedOffset, Local, Utc};

pub trait Clock: Send + Sync + 'static {
    /// Current time in the account owner's zone.
    fn now(&self) -> DateTime<FixedOffset>;

    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// System time, shifted to a fixed offset or to the host's local zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct WallClock {
    offset: Option<FixedOffset>,
}

impl WallClock {
    /// `None` or an out-of-range offset falls back to local time.
    pub fn new(utc_offset_minutes: Option<i32>) -> Self {
        Self {
            offset: utc_offset_minutes.and_then(|m| FixedOffset::east_opt(m * 60)),
        }
    }
}

impl Clock for WallClock {
    fn now(&self) -> DateTime<FixedOffset> {
        match self.offset {
            Some(offset) => Utc::now().with_timezone(&offset),
            None => Local::now().fixed_offset(),
        }
    }
}

/// A clock stopped at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_offset_is_applied() {
        let clock = WallClock::new(Some(330));
        assert_eq!(clock.now().offset().local_minus_utc(), 330 * 60);
    }

    #[test]
    fn fixed_clock_converts_to_utc() {
        let at = DateTime::parse_from_rfc3339("2025-01-06T10:30:00+05:30").unwrap();
        let clock = FixedClock(at);
        assert_eq!(clock.now_utc().to_rfc3339(), "2025-01-06T05:00:00+00:00");
    }
}
