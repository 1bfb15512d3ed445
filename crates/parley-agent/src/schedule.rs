// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Day schedule parsing and the dynamic assistant instruction.
//!
//! A schedule is free text where lines of the form `HH:MM-HH:MM: Activity`
//! describe what the owner is doing. Other lines are ignored.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Timelike};
use regex::Regex;

static SCHEDULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*-\s*(\d{1,2}):(\d{2})\s*:\s*(.+?)\s*$")
        .expect("schedule line pattern is valid")
});

/// One `HH:MM-HH:MM: Activity` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// Minutes since midnight.
    pub start: u32,
    pub end: u32,
    pub activity: String,
}

impl ScheduleEntry {
    /// Inclusive on both ends.
    pub fn covers(&self, minute_of_day: u32) -> bool {
        self.start <= minute_of_day && minute_of_day <= self.end
    }
}

/// What the owner is likely doing, as told to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Busy,
    AtSchool,
    Sleeping,
    Available,
}

impl Availability {
    /// Classifies an activity by keyword.
    pub fn of(activity: &str) -> Self {
        let activity = activity.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| activity.contains(w));
        if has(&["sleep", "nap", "bed"]) {
            Self::Sleeping
        } else if has(&["school", "class", "college", "lecture", "university"]) {
            Self::AtSchool
        } else if has(&["free", "available", "break", "relax"]) {
            Self::Available
        } else {
            Self::Busy
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Self::Busy => "The user is busy and may reply later.",
            Self::AtSchool => "The user is at school and cannot reply right now.",
            Self::Sleeping => "The user is sleeping and will reply in the morning.",
            Self::Available => "The user is available.",
        }
    }
}

fn minutes(hours: &str, mins: &str) -> Option<u32> {
    let (h, m) = (hours.parse::<u32>().ok()?, mins.parse::<u32>().ok()?);
    (h < 24 && m < 60).then_some(h * 60 + m)
}

/// Parses every well-formed schedule line, in order.
pub fn parse_schedule(text: &str) -> Vec<ScheduleEntry> {
    text.lines()
        .filter_map(|line| {
            let caps = SCHEDULE_LINE.captures(line)?;
            Some(ScheduleEntry {
                start: minutes(&caps[1], &caps[2])?,
                end: minutes(&caps[3], &caps[4])?,
                activity: caps[5].to_string(),
            })
        })
        .collect()
}

/// The entry in effect at `minute_of_day`. Later lines override earlier ones.
pub fn active_entry(entries: &[ScheduleEntry], minute_of_day: u32) -> Option<&ScheduleEntry> {
    entries
        .iter()
        .fold(None, |current, entry| {
            if entry.covers(minute_of_day) {
                Some(entry)
            } else {
                current
            }
        })
}

/// Sentence describing the current day, time and activity.
///
/// `None` when the schedule has no parseable lines.
pub fn schedule_clause(schedule: &str, now: DateTime<FixedOffset>) -> Option<String> {
    let entries = parse_schedule(schedule);
    if entries.is_empty() {
        return None;
    }

    let minute_of_day = now.hour() * 60 + now.minute();
    let when = now.format("%A %H:%M");
    Some(match active_entry(&entries, minute_of_day) {
        Some(entry) => format!(
            "It is currently {when}. According to the user's schedule they are doing: {}. {}",
            entry.activity,
            Availability::of(&entry.activity).hint()
        ),
        None => format!(
            "It is currently {when}. Nothing is scheduled right now. {}",
            Availability::Available.hint()
        ),
    })
}

/// Training text (or the fallback) followed by the schedule clause.
pub fn build_instruction(
    training_text: &str,
    fallback: &str,
    schedule: &str,
    now: DateTime<FixedOffset>,
) -> String {
    let base = if training_text.trim().is_empty() {
        fallback.trim()
    } else {
        training_text.trim()
    };
    match schedule_clause(schedule, now) {
        Some(clause) => format!("{base}\n\n{clause}"),
        None => base.to_string(),
    }
}
