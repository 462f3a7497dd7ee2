// src/engine/spam.rs - Stateless and behavioral spam indicators

use regex::Regex;

use crate::types::{SignalLevel, SpamReport, UserBehaviorState};

/// Spam heuristic ORed into the final verdict. Stateless indicators run on
/// the raw text; two behavioral indicators piggyback on the sender's
/// tracked state when it is available.
pub struct SpamDetector {
    number_spam: Regex,
    url_shorteners: Regex,
    caps_wall: Regex,
}

impl SpamDetector {
    pub fn new() -> Self {
        Self {
            number_spam: Regex::new(r"\d{10,}").unwrap(),
            url_shorteners: Regex::new(r"(?i)(bit\.ly|tinyurl|t\.co|short\.link)").unwrap(),
            caps_wall: Regex::new(r"^[A-Z\s!]{20,}$").unwrap(),
        }
    }

    pub fn detect(&self, text: &str, behavior: Option<&UserBehaviorState>) -> SpamReport {
        let indicators: [(&str, bool); 7] = [
            ("repeated_chars", has_repeated_pair_run(text)),
            ("unicode_spam", has_emoji_run(text)),
            ("number_spam", self.number_spam.is_match(text)),
            ("url_shorteners", self.url_shorteners.is_match(text)),
            ("suspicious_patterns", self.caps_wall.is_match(text)),
            ("zalgo_text", has_zalgo_marks(text)),
            ("repetitive_words", has_repeated_words(text)),
        ];

        let mut score = 0.0f32;
        let mut reasons: Vec<String> = Vec::new();
        for (reason, detected) in indicators {
            if detected {
                score += 1.0;
                reasons.push(reason.to_string());
            }
        }

        if let Some(state) = behavior {
            if state.repetitive_behavior > 2.0 {
                score += 2.0;
                reasons.push("repetitive_behavior".to_string());
            }
            if state.spam_score > 3.0 {
                score += 1.0;
                reasons.push("high_frequency_messaging".to_string());
            }
        }

        let level = if score >= 4.0 {
            SignalLevel::High
        } else if score >= 2.0 {
            SignalLevel::Medium
        } else {
            SignalLevel::Low
        };

        SpamReport {
            is_spam: score >= 2.0,
            score,
            reasons,
            level,
        }
    }
}

impl Default for SpamDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// A two-character pair repeated five or more times back to back
/// ("hahahahaha" stretched past conversational use).
fn has_repeated_pair_run(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() < 10 {
        return false;
    }
    'outer: for start in 0..chars.len().saturating_sub(9) {
        let a = chars[start];
        let b = chars[start + 1];
        for rep in 1..5 {
            if chars[start + rep * 2] != a || chars[start + rep * 2 + 1] != b {
                continue 'outer;
            }
        }
        // a uniform run like "aaaaaaaaaa" is single-char repetition, not a
        // pair pattern
        if a != b {
            return true;
        }
    }
    false
}

/// 4+ consecutive supplementary-plane characters (emoji walls).
fn has_emoji_run(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if (c as u32) >= 0x1_0000 {
            run += 1;
            if run >= 4 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// 3+ consecutive combining diacritical marks.
fn has_zalgo_marks(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if ('\u{0300}'..='\u{036F}').contains(&c) {
            run += 1;
            if run >= 3 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// The same word four or more times in a row.
fn has_repeated_words(text: &str) -> bool {
    let mut prev: Option<String> = None;
    let mut run = 1;
    for word in text.split_whitespace() {
        let lower = word.to_lowercase();
        if prev.as_deref() == Some(lower.as_str()) {
            run += 1;
            if run >= 4 {
                return true;
            }
        } else {
            run = 1;
        }
        prev = Some(lower);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn detector() -> SpamDetector {
        SpamDetector::new()
    }

    #[test]
    fn ordinary_message_is_not_spam() {
        let report = detector().detect("see you at the meetup tomorrow", None);
        assert!(!report.is_spam);
        assert_eq!(report.level, SignalLevel::Low);
    }

    #[test]
    fn repeated_pairs_and_words_flag() {
        let report = detector().detect("hahahahahaha buy buy buy buy now", None);
        assert!(report.reasons.iter().any(|r| r == "repeated_chars"));
        assert!(report.reasons.iter().any(|r| r == "repetitive_words"));
        assert!(report.is_spam);
    }

    #[test]
    fn shortener_and_number_walls_flag() {
        let report = detector().detect("win cash 09876543210 at bit.ly/xyz", None);
        assert!(report.reasons.iter().any(|r| r == "number_spam"));
        assert!(report.reasons.iter().any(|r| r == "url_shorteners"));
        assert!(report.is_spam);
    }

    #[test]
    fn caps_wall_flags() {
        let report = detector().detect("FREE MONEY CLICK NOW!!", None);
        assert!(report.reasons.iter().any(|r| r == "suspicious_patterns"));
    }

    #[test]
    fn behavioral_state_escalates_score() {
        let mut state = UserBehaviorState::new(Utc::now());
        state.repetitive_behavior = 3.0;
        state.spam_score = 4.0;

        let report = detector().detect("plain text", Some(&state));
        assert!(report.reasons.iter().any(|r| r == "repetitive_behavior"));
        assert!(report.reasons.iter().any(|r| r == "high_frequency_messaging"));
        assert!(report.is_spam);
    }

    #[test]
    fn emoji_wall_flags() {
        let report = detector().detect("😀😀😀😀😀", None);
        assert!(report.reasons.iter().any(|r| r == "unicode_spam"));
    }
}
