// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Assisted-mode rewriting: instruction choice and output guard.

/// Romanized Hindi words common enough to mark a message as Hinglish.
const HINGLISH_TOKENS: &[&str] = &[
    "aap", "acha", "accha", "bahut", "bhai", "bohot", "chalo", "haan", "hai", "hain", "hoon",
    "hu", "kaisa", "kaise", "kuch", "kya", "kyun", "mai", "matlab", "mujhe", "nahi", "nahin",
    "raha", "rahi", "theek", "thik", "tum", "yaar",
];

/// Phrases that show the model talked about the text instead of rewriting it.
const FILLER_PHRASES: &[&str] = &[
    "here is",
    "here's",
    "sure,",
    "certainly",
    "as an ai",
    "i'd be happy",
    "rewritten",
    "corrected version",
    "translation:",
];

/// Rewrites longer than this multiple of the original are discarded.
const MAX_GROWTH: f64 = 1.5;

pub const TRANSLATE_INSTRUCTION: &str = "Translate the user's message into clear, formal English. \
    Keep the meaning and intent. Reply with the translated message only.";

pub const GRAMMAR_INSTRUCTION: &str = "Correct the grammar and spelling of the user's message \
    without changing its meaning or tone. Reply with the corrected message only.";

/// True for Devanagari script or recognizable Hinglish words.
pub fn needs_translation(text: &str) -> bool {
    if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
        return true;
    }
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .any(|w| HINGLISH_TOKENS.contains(&w.to_lowercase().as_str()))
}

pub fn instruction_for(text: &str) -> &'static str {
    if needs_translation(text) {
        TRANSLATE_INSTRUCTION
    } else {
        GRAMMAR_INSTRUCTION
    }
}

/// Returns the usable rewrite, or `None` when the original should be kept.
///
/// A rewrite identical to the original counts as no rewrite.
pub fn accept_rewrite(original: &str, candidate: &str) -> Option<String> {
    let rewrite = candidate.trim().trim_matches('"').trim();
    if rewrite.is_empty() || rewrite == original.trim() {
        return None;
    }

    let limit = original.trim().chars().count() as f64 * MAX_GROWTH;
    if rewrite.chars().count() as f64 > limit {
        return None;
    }

    let lower = rewrite.to_lowercase();
    if FILLER_PHRASES.iter().any(|p| lower.contains(p)) {
        return None;
    }
    Some(rewrite.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_devanagari_and_hinglish() {
        assert!(needs_translation("मैं ठीक हूँ"));
        assert!(needs_translation("mai theek hu"));
        assert!(needs_translation("Kya scene hai?"));
        assert!(!needs_translation("I is fine"));
        assert!(!needs_translation("humming along"));
    }

    #[test]
    fn picks_instruction() {
        assert_eq!(instruction_for("mai theek hu"), TRANSLATE_INSTRUCTION);
        assert_eq!(instruction_for("their going home"), GRAMMAR_INSTRUCTION);
    }

    #[test]
    fn growth_limit_is_one_and_a_half() {
        // 10 chars allows up to 15.
        assert_eq!(accept_rewrite("abcdefghij", "123456789012345").as_deref(), Some("123456789012345"));
        assert_eq!(accept_rewrite("abcdefghij", "1234567890123456"), None);
    }

    #[test]
    fn rejects_filler_and_empty() {
        assert_eq!(accept_rewrite("i am fine thanks", "Here is: fine"), None);
        assert_eq!(accept_rewrite("ok", "   "), None);
        assert_eq!(accept_rewrite("ok", "ok"), None);
    }

    #[test]
    fn strips_quotes() {
        assert_eq!(accept_rewrite("mai theek hu", "\"I am fine\"").as_deref(), Some("I am fine"));
    }
}
