// src/engine/obfuscation.rs - Adversarial-evasion technique probes

use base64::engine::{general_purpose, Engine};
use log::debug;
use regex::Regex;
use std::sync::Arc;

use crate::engine::normalizer::{self, Normalizer};
use crate::types::{ObfuscationReport, SignalLevel};

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

/// Consonant clusters that legitimately open an English word. A word whose
/// onset falls outside this set reads as gibberish forward, which is what a
/// reversed word looks like.
const PLAUSIBLE_ONSETS: &[&str] = &[
    "bl", "br", "ch", "chr", "cl", "cr", "dr", "dw", "fl", "fr", "gh", "gl",
    "gr", "kn", "kr", "ph", "pl", "pr", "ps", "qu", "sc", "sch", "scr", "sh",
    "shr", "sk", "sl", "sm", "sn", "sp", "spl", "spr", "squ", "st", "str",
    "sw", "th", "thr", "tr", "tw", "wh", "wr",
];

/// Consonant clusters that legitimately close an English word.
const PLAUSIBLE_CODAS: &[&str] = &[
    "bs", "ch", "ck", "cks", "ct", "ds", "ft", "gh", "ght", "gs", "ks", "ld",
    "lds", "lf", "lk", "ll", "lls", "lm", "lp", "ls", "lt", "mb", "mp", "ms",
    "nch", "nd", "nds", "ng", "ngs", "nk", "ns", "nt", "nts", "ph", "ps",
    "pt", "rb", "rd", "rds", "rk", "rl", "rm", "rn", "rp", "rs", "rst", "rt",
    "sh", "sk", "sm", "sp", "ss", "st", "sts", "tch", "th", "ts", "wn", "ws",
    "xt",
];

/// Scores evasion techniques independent of any specific wordlist match.
/// Each probe contributes an additive, per-technique-capped amount; the
/// total is clamped to [0, 1].
pub struct ObfuscationDetector {
    normalizer: Arc<Normalizer>,
    spaced_patterns: Vec<Regex>,
    separator_run: Regex,
}

impl ObfuscationDetector {
    pub fn new(normalizer: Arc<Normalizer>) -> Self {
        let spaced_patterns = vec![
            Regex::new(r"(?i)\b[a-z]\s+[a-z]\s+[a-z]").unwrap(),
            Regex::new(r"(?i)\b[a-z]\.[a-z]\.[a-z]").unwrap(),
            Regex::new(r"(?i)\b[a-z]-[a-z]-[a-z]").unwrap(),
            Regex::new(r"(?i)\b[a-z]_[a-z]_[a-z]").unwrap(),
        ];
        Self {
            normalizer,
            spaced_patterns,
            separator_run: Regex::new(r"[-_.]{2,}").unwrap(),
        }
    }

    pub fn detect(&self, text: &str) -> ObfuscationReport {
        if text.is_empty() {
            return ObfuscationReport::clean();
        }

        let mut techniques: Vec<&'static str> = Vec::new();
        let mut score = 0.0f32;

        if self.spaced_patterns.iter().any(|p| p.is_match(text)) {
            techniques.push("spaced_out");
            score += 0.3;
        }

        let substitution_chars = distinct_substitution_chars(text);
        if substitution_chars > 0 {
            techniques.push("character_substitution");
            score += (substitution_chars as f32 / 3.0).min(1.0) * 0.4;
        }

        let separator_runs = self.separator_run.find_iter(text).count();
        if separator_runs > 0 {
            techniques.push("separator_abuse");
            score += (separator_runs as f32 * 0.1).min(0.3);
        }

        let scripts = script_count(text);
        if scripts > 1 {
            techniques.push("mixed_scripts");
            score += (scripts - 1) as f32 * 0.2;
        }

        if text.chars().any(normalizer::is_zero_width) {
            techniques.push("zero_width_chars");
            score += 0.4;
        }

        let repetition_runs = repetition_runs(text);
        if repetition_runs > 0 {
            techniques.push("character_repetition");
            score += (repetition_runs as f32 * 0.1).min(0.3);
        }

        let reversed_words = suspected_reversed_words(text);
        if reversed_words > 0 {
            techniques.push("reverse_text");
            score += (reversed_words as f32 * 0.2).min(0.4);
        }

        let total_chars = text.chars().count();
        if total_chars > 5 {
            let special = text.chars().filter(|&c| is_special(c)).count();
            let ratio = special as f32 / total_chars as f32;
            if ratio > 0.3 {
                techniques.push("excessive_special_chars");
                score += (ratio - 0.3).min(0.3);
            }
        }

        if self.looks_like_rot13(text) {
            techniques.push("simple_cipher");
            score += 0.3;
        }

        if looks_like_encoded_payload(text) {
            techniques.push("encoded_content");
            score += 0.3;
        }

        let score = score.min(1.0);
        let level = if score > 0.7 {
            SignalLevel::High
        } else if score > 0.4 {
            SignalLevel::Medium
        } else {
            SignalLevel::Low
        };

        if !techniques.is_empty() {
            debug!("obfuscation techniques {:?} (score {:.2})", techniques, score);
        }

        ObfuscationReport {
            has_obfuscation: !techniques.is_empty(),
            techniques,
            score,
            level,
        }
    }

    /// ROT13 hiding makes the visible text vowel-starved while its transform
    /// reads naturally. Compare vowel-bearing word counts of the normalized
    /// text against its ROT13 image.
    fn looks_like_rot13(&self, text: &str) -> bool {
        let normalized = self.normalizer.normalize(text);
        let original = vowel_word_count(&normalized);
        let transformed = vowel_word_count(&normalizer::rot13(&normalized));
        transformed >= 1 && transformed as f32 > original as f32 * 1.5
    }
}

fn distinct_substitution_chars(text: &str) -> usize {
    let mut seen: Vec<char> = Vec::new();
    for c in text.chars() {
        if normalizer::is_substitution_char(c) && !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen.len()
}

fn script_count(text: &str) -> usize {
    let latin = text.chars().any(|c| c.is_ascii_alphabetic());
    let cyrillic = text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c));
    let greek = text.chars().any(|c| ('\u{0370}'..='\u{03FF}').contains(&c));
    let mathematical = text.chars().any(|c| {
        ('\u{2100}'..='\u{214F}').contains(&c)
            || ('\u{2190}'..='\u{21FF}').contains(&c)
            || ('\u{2200}'..='\u{22FF}').contains(&c)
    });
    [latin, cyrillic, greek, mathematical].iter().filter(|&&s| s).count()
}

/// Number of runs of 4+ identical consecutive characters.
fn repetition_runs(text: &str) -> usize {
    let mut runs = 0;
    let mut prev: Option<char> = None;
    let mut run_len = 0;
    for c in text.chars() {
        if prev == Some(c) {
            run_len += 1;
            if run_len == 4 {
                runs += 1;
            }
        } else {
            run_len = 1;
        }
        prev = Some(c);
    }
    runs
}

fn is_special(c: char) -> bool {
    !(c.is_ascii_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        || ('\u{0900}'..='\u{097F}').contains(&c))
}

fn is_vowel(c: char) -> bool {
    VOWELS.contains(&c)
}

fn vowel_word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().count() > 2 && w.chars().any(is_vowel))
        .count()
}

/// Alphabetic words longer than 3 chars whose leading or trailing consonant
/// cluster is implausible in English. Forward gibberish with a clean
/// reversal is the signature of reversed profanity.
fn suspected_reversed_words(text: &str) -> usize {
    text.split_whitespace()
        .map(|w| w.to_lowercase())
        .filter(|w| w.len() > 3 && w.chars().all(|c| c.is_ascii_lowercase()))
        .filter(|w| {
            let onset: String = w.chars().take_while(|c| !is_vowel(*c)).collect();
            let coda: String = {
                let rev: String = w.chars().rev().take_while(|c| !is_vowel(*c)).collect();
                rev.chars().rev().collect()
            };
            (onset.len() >= 2 && !PLAUSIBLE_ONSETS.contains(&onset.as_str()))
                || (coda.len() >= 2 && !PLAUSIBLE_CODAS.contains(&coda.as_str()))
        })
        .count()
}

/// Base64-looking payload whose decoded form is mostly readable ASCII text.
fn looks_like_encoded_payload(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.len() < 8 || trimmed.len() % 4 != 0 {
        return false;
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=') {
        return false;
    }
    let Ok(decoded) = general_purpose::STANDARD.decode(trimmed) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    if decoded.is_empty() {
        return false;
    }
    let readable = decoded
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ')
        .count();
    readable as f32 / decoded.chars().count() as f32 > 0.7
}
