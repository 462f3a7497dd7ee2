// src/engine/toxicity.rs - Stylistic toxicity heuristic over raw text

use regex::Regex;

use crate::types::{SignalLevel, ToxicityReport};

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>?";

/// Deterministic additive toxicity scorer. Works on the raw message - caps
/// and punctuation abuse are authorship signals that normalization would
/// erase.
pub struct ToxicityScorer {
    aggressive: Regex,
    threats: Regex,
    derogatory: Regex,
}

impl ToxicityScorer {
    pub fn new() -> Self {
        Self {
            aggressive: Regex::new(r"(?i)(kill|die|hate|destroy|annihilate)").unwrap(),
            threats: Regex::new(r"(?i)(threat|warning|consequence|punishment)").unwrap(),
            derogatory: Regex::new(r"(?i)(loser|trash|garbage|waste)").unwrap(),
        }
    }

    pub fn score(&self, text: &str) -> ToxicityReport {
        let total_chars = text.chars().count();
        if total_chars == 0 {
            return ToxicityReport {
                score: 0.0,
                level: SignalLevel::Low,
                reasons: Vec::new(),
                is_suspicious: false,
            };
        }

        let mut score = 0.0f32;
        let mut reasons: Vec<&'static str> = Vec::new();

        let caps = text.chars().filter(|c| c.is_uppercase()).count();
        if caps as f32 / total_chars as f32 > 0.5 {
            score += 1.5;
            reasons.push("excessive_caps");
        }

        if text.chars().filter(|&c| c == '!').count() > 3 {
            score += 1.0;
            reasons.push("excessive_exclamation");
        }

        if has_repeated_run(text) {
            score += 1.0;
            reasons.push("repeated_characters");
        }

        let special = text.chars().filter(|c| SPECIAL_CHARS.contains(*c)).count();
        if special as f32 / total_chars as f32 > 0.3 {
            score += 1.5;
            reasons.push("special_char_spam");
        }

        if self.aggressive.is_match(text) {
            score += 2.0;
            reasons.push("aggressive_language");
        }

        if self.threats.is_match(text) {
            score += 1.5;
            reasons.push("threatening_tone");
        }

        if self.derogatory.is_match(text) {
            score += 1.0;
            reasons.push("derogatory_language");
        }

        let score = (score * 10.0).round() / 10.0;
        let level = if score >= 4.0 {
            SignalLevel::High
        } else if score >= 2.0 {
            SignalLevel::Medium
        } else {
            SignalLevel::Low
        };

        ToxicityReport {
            score,
            level,
            reasons,
            is_suspicious: score >= 2.0,
        }
    }
}

impl Default for ToxicityScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// 4+ identical consecutive characters anywhere in the text.
fn has_repeated_run(text: &str) -> bool {
    let mut prev: Option<char> = None;
    let mut run = 0;
    for c in text.chars() {
        if prev == Some(c) {
            run += 1;
            if run >= 4 {
                return true;
            }
        } else {
            run = 1;
        }
        prev = Some(c);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> ToxicityScorer {
        ToxicityScorer::new()
    }

    #[test]
    fn calm_text_scores_low() {
        let report = scorer().score("good morning, how is everyone doing");
        assert_eq!(report.score, 0.0);
        assert_eq!(report.level, SignalLevel::Low);
        assert!(!report.is_suspicious);
    }

    #[test]
    fn shouting_flags_excessive_caps() {
        let report = scorer().score("STOP TALKING RIGHT NOW");
        assert!(report.reasons.contains(&"excessive_caps"));
    }

    #[test]
    fn aggressive_vocabulary_scores_heavily() {
        let report = scorer().score("i will destroy you, this is your last warning");
        assert!(report.reasons.contains(&"aggressive_language"));
        assert!(report.reasons.contains(&"threatening_tone"));
        // 2.0 + 1.5
        assert!((report.score - 3.5).abs() < 1e-3);
        assert_eq!(report.level, SignalLevel::Medium);
        assert!(report.is_suspicious);
    }

    #[test]
    fn combined_indicators_reach_high() {
        let report = scorer().score("DIE DIE DIE!!!! YOU ABSOLUTE LOSER!!!!");
        assert!(report.reasons.contains(&"excessive_caps"));
        assert!(report.reasons.contains(&"excessive_exclamation"));
        assert!(report.reasons.contains(&"repeated_characters"));
        assert!(report.reasons.contains(&"aggressive_language"));
        assert!(report.reasons.contains(&"derogatory_language"));
        assert_eq!(report.level, SignalLevel::High);
    }

    #[test]
    fn punctuation_spam_flags_special_chars() {
        let report = scorer().score("!!!@@@###$$$ hi");
        assert!(report.reasons.contains(&"special_char_spam"));
    }

    #[test]
    fn empty_text_is_total() {
        let report = scorer().score("");
        assert_eq!(report.score, 0.0);
        assert!(!report.is_suspicious);
    }
}
