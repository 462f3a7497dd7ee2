// src/engine/normalizer.rs - Text canonicalization and obfuscation variants

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// One-to-one character substitutions for leetspeak and look-alike scripts.
/// Applied after lowercasing; outputs are never themselves substitution keys,
/// which keeps `normalize` idempotent.
fn substitute_char(c: char) -> Option<char> {
    let replacement = match c {
        // Digits to letters
        '0' => 'o',
        '1' => 'i',
        '3' => 'e',
        '4' => 'a',
        '5' => 's',
        '6' => 'g',
        '7' => 't',
        '8' => 'b',
        '9' => 'g',
        // Symbols to letters
        '@' => 'a',
        '€' => 'e',
        '$' => 's',
        '!' => 'i',
        '|' => 'i',
        // Cyrillic look-alikes
        'а' => 'a',
        'е' => 'e',
        'о' => 'o',
        'р' => 'p',
        'с' => 'c',
        'у' => 'y',
        'х' => 'x',
        // Greek look-alikes
        'α' => 'a',
        'ε' => 'e',
        'ο' => 'o',
        'ρ' => 'p',
        'τ' => 't',
        'υ' => 'y',
        'χ' => 'x',
        // Mathematical and typographic
        '∂' => 'd',
        'ℓ' => 'l',
        '†' => 't',
        '‡' => 't',
        '§' => 's',
        '¶' => 'p',
        _ => return None,
    };
    Some(replacement)
}

/// Whether `c` participates in the substitution table - used by the
/// obfuscation detector to score substitution density.
pub fn is_substitution_char(c: char) -> bool {
    substitute_char(c).is_some()
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F | 0x1AB0..=0x1AFF | 0x1DC0..=0x1DFF | 0x20D0..=0x20FF | 0xFE20..=0xFE2F)
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{00AD}' | '\u{2060}')
}

/// Whether `c` is a zero-width character abused to split banned words.
pub fn is_zero_width(c: char) -> bool {
    matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}')
}

/// ROT13 over ASCII letters, everything else untouched.
pub fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a' + 13) % 26) + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A' + 13) % 26) + b'A') as char,
            other => other,
        })
        .collect()
}

/// Collapse runs of identical characters to a single occurrence
/// (`aaaa` -> `a`).
pub fn collapse_repeats(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = None;
    for c in text.chars() {
        if prev != Some(c) {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

/// Canonicalizes text and generates the bounded variant set every matcher
/// operates on. Matchers never re-derive normalization on their own, so the
/// whole obfuscation surface stays testable in one place.
pub struct Normalizer {
    separators: Vec<Regex>,
    dash_underscore: Regex,
}

impl Normalizer {
    pub fn new() -> Self {
        // Separator classes abused to split banned words. Infallible sources,
        // compiled once.
        let separators = vec![
            Regex::new(r"[\s\-_.]+").unwrap(),
            Regex::new(r"[^\w\u{0900}-\u{097F}]+").unwrap(),
            Regex::new(r"[\u{200B}-\u{200D}\u{FEFF}]").unwrap(),
            Regex::new(r"[^\p{L}\p{N}]+").unwrap(),
        ];
        Self {
            separators,
            dash_underscore: Regex::new(r"[-_]").unwrap(),
        }
    }

    /// Canonical form: NFD-decompose and strip diacritics, drop invisible
    /// code points, lowercase, substitute look-alike characters, collapse
    /// whitespace runs. Idempotent and total - empty input yields an empty
    /// string.
    pub fn normalize(&self, text: &str) -> String {
        let stripped: String = text
            .nfd()
            .filter(|c| !is_combining_mark(*c) && !is_invisible(*c))
            .collect();

        let substituted: String = stripped
            .to_lowercase()
            .chars()
            .map(|c| substitute_char(c).unwrap_or(c))
            .collect();

        substituted.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Deterministic, deduplicated, bounded variant set: the raw text, its
    /// normalization, separator-stripped forms of both, the fully
    /// space-stripped form (catches "f u c k"), dash/underscore variants, the
    /// reversal, the ROT13 transform, and the duplicate-collapsed form.
    /// Empty strings are excluded; empty input yields an empty vec.
    pub fn variants(&self, text: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        let push = |candidate: String, out: &mut Vec<String>| {
            if !candidate.is_empty() && !out.contains(&candidate) {
                out.push(candidate);
            }
        };

        push(text.to_string(), &mut out);

        let normalized = self.normalize(text);
        push(normalized.clone(), &mut out);

        for sep in &self.separators {
            push(sep.replace_all(text, "").into_owned(), &mut out);
            push(sep.replace_all(&normalized, "").into_owned(), &mut out);
        }

        let spaceless: String = text.split_whitespace().collect();
        push(spaceless.clone(), &mut out);
        push(self.normalize(&spaceless), &mut out);

        push(self.dash_underscore.replace_all(text, "").into_owned(), &mut out);
        push(self.dash_underscore.replace_all(text, " ").into_owned(), &mut out);

        push(text.chars().rev().collect(), &mut out);
        push(rot13(text), &mut out);
        push(collapse_repeats(text), &mut out);

        out
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_leetspeak() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("$h1t"), "shit");
        assert_eq!(n.normalize("B4DW0RD"), "badword");
    }

    #[test]
    fn normalize_strips_diacritics_and_lookalikes() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("café"), "cafe");
        // Cyrillic 'а' and 'о'
        assert_eq!(n.normalize("bаdwоrd"), "badword");
    }

    #[test]
    fn normalize_removes_zero_width_and_collapses_whitespace() {
        let n = Normalizer::new();
        assert_eq!(n.normalize("ba\u{200B}d   word"), "bad word");
    }

    #[test]
    fn normalize_is_idempotent() {
        let n = Normalizer::new();
        for text in ["$h1t happens", "  HÉLLO  wörld ", "п р и в е т", "a-b_c.d"] {
            let once = n.normalize(text);
            assert_eq!(n.normalize(&once), once);
        }
    }

    #[test]
    fn variants_cover_obfuscation_renderings() {
        let n = Normalizer::new();
        let variants = n.variants("f u c k");
        assert!(variants.contains(&"fuck".to_string()), "space-stripped form missing: {variants:?}");

        let variants = n.variants("kcuf");
        assert!(variants.contains(&"fuck".to_string()), "reversed form missing");

        let variants = n.variants("shpx");
        assert!(variants.contains(&"fuck".to_string()), "rot13 form missing");

        let variants = n.variants("fuuuuck");
        assert!(variants.contains(&"fuck".to_string()), "repeat-collapsed form missing");

        let variants = n.variants("f-u-c-k");
        assert!(variants.contains(&"fuck".to_string()), "dash-stripped form missing");
    }

    #[test]
    fn variants_are_deduplicated_and_nonempty() {
        let n = Normalizer::new();
        let variants = n.variants("hello");
        let mut sorted = variants.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), variants.len());
        assert!(variants.iter().all(|v| !v.is_empty()));
    }

    #[test]
    fn empty_input_yields_empty_variant_set() {
        let n = Normalizer::new();
        assert!(n.variants("").is_empty());
        assert_eq!(n.normalize(""), "");
    }

    #[test]
    fn rot13_round_trips() {
        assert_eq!(rot13("fuck"), "shpx");
        assert_eq!(rot13(&rot13("Hello, World!")), "Hello, World!");
    }

    #[test]
    fn collapse_repeats_keeps_single_chars() {
        assert_eq!(collapse_repeats("aaaabbbc"), "abc");
        assert_eq!(collapse_repeats("abc"), "abc");
    }
}
