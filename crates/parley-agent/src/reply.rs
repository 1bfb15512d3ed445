// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shaping of autonomous replies.

use chrono::{DateTime, FixedOffset, Timelike, Utc};

/// Keeps the first `max_words` words, marking the cut with `...`.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return words.join(" ");
    }
    format!("{}...", words[..max_words].join(" "))
}

/// Salutation for the local hour.
pub fn greeting(now: DateTime<FixedOffset>) -> &'static str {
    match now.hour() {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        17..=21 => "Good evening",
        _ => "Hello",
    }
}

/// True when no exchange happened within `gap_secs` of `now`.
pub fn is_fresh_exchange(
    previous_contact: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    gap_secs: u64,
) -> bool {
    match previous_contact {
        None => true,
        Some(previous) => (now - previous).num_seconds() >= gap_secs as i64,
    }
}

/// Final reply text: greeting and identity first when the exchange is fresh.
pub fn compose_reply(body: &str, greeting_prefix: Option<(&str, &str)>) -> String {
    match greeting_prefix {
        Some((salutation, identity)) if identity.trim().is_empty() => {
            format!("{salutation}! {body}")
        }
        Some((salutation, identity)) => format!("{salutation}! {} {body}", identity.trim()),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn truncates_past_limit() {
        let long = (1..=30).map(|i| i.to_string()).collect::<Vec<_>>().join(" ");
        let cut = truncate_words(&long, 25);
        assert!(cut.ends_with("25..."));
        assert_eq!(cut.split_whitespace().count(), 25);
        assert_eq!(truncate_words("short reply", 25), "short reply");
    }

    #[test]
    fn greeting_by_hour() {
        let at = |h: u32| {
            DateTime::parse_from_rfc3339(&format!("2025-01-06T{h:02}:00:00+00:00")).unwrap()
        };
        assert_eq!(greeting(at(7)), "Good morning");
        assert_eq!(greeting(at(13)), "Good afternoon");
        assert_eq!(greeting(at(19)), "Good evening");
        assert_eq!(greeting(at(23)), "Hello");
        assert_eq!(greeting(at(3)), "Hello");
    }

    #[test]
    fn three_hour_gate() {
        let now = Utc::now();
        let gap = 3 * 60 * 60;
        assert!(is_fresh_exchange(None, now, gap));
        assert!(is_fresh_exchange(Some(now - Duration::hours(3)), now, gap));
        assert!(!is_fresh_exchange(Some(now - Duration::minutes(179)), now, gap));
    }

    #[test]
    fn composes_with_identity() {
        assert_eq!(
            compose_reply("Will reply soon.", Some(("Hello", "I'm the assistant."))),
            "Hello! I'm the assistant. Will reply soon."
        );
        assert_eq!(compose_reply("ok", None), "ok");
    }
}
