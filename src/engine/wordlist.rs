// src/engine/wordlist.rs - Obfuscation-resistant wordlist matching

use log::debug;
use std::sync::Arc;

use crate::engine::normalizer::Normalizer;
use crate::engine::similarity;
use crate::types::{MatchMethod, WordEntry, WordMatch};

/// Minimum confidence a candidate needs before it is surfaced at all.
const CONFIDENCE_FLOOR: f32 = 0.7;
/// Below this confidence the cheaper typo pass still gets a chance to win.
const TYPO_PASS_CEILING: f32 = 0.8;
/// Fixed confidence assigned to keyboard-adjacent typo matches.
const TYPO_CONFIDENCE: f32 = 0.85;

/// Matches configured word entries against a message's variant set.
///
/// Three tiers per entry, cheapest first: direct substring containment
/// across the variant cross-product, best fuzzy similarity, then a
/// keyboard-typo scan over whitespace tokens. Only the single best match per
/// entry survives, and only above the confidence floor.
pub struct WordlistMatcher {
    normalizer: Arc<Normalizer>,
}

impl WordlistMatcher {
    pub fn new(normalizer: Arc<Normalizer>) -> Self {
        Self { normalizer }
    }

    /// Scan `entries` against precomputed message variants. Entries whose
    /// severity falls below `min_severity` are skipped before any matching.
    pub fn scan(
        &self,
        message_variants: &[String],
        entries: &[WordEntry],
        min_severity: u8,
    ) -> Vec<WordMatch> {
        let mut matches = Vec::new();
        if message_variants.is_empty() {
            return matches;
        }

        for entry in entries {
            if entry.severity < min_severity {
                continue;
            }

            let target = entry.word.to_lowercase();
            let target_variants = self.normalizer.variants(&target);

            if let Some(found) = self.best_match(message_variants, &target_variants, &target) {
                if found.confidence > CONFIDENCE_FLOOR {
                    debug!(
                        "wordlist hit '{}' via {} (confidence {:.2}, variant '{}')",
                        entry.word,
                        found.method.as_str(),
                        found.confidence,
                        found.matched_variant
                    );
                    matches.push(WordMatch {
                        word: entry.word.clone(),
                        severity: entry.severity,
                        confidence: found.confidence,
                        matched_variant: found.matched_variant,
                        method: found.method,
                    });
                }
            }
        }

        matches
    }

    fn best_match(
        &self,
        message_variants: &[String],
        target_variants: &[String],
        target: &str,
    ) -> Option<Candidate> {
        // Tier 1: direct containment, first hit wins.
        for msg_var in message_variants {
            for target_var in target_variants {
                if msg_var.contains(target_var.as_str()) {
                    return Some(Candidate {
                        confidence: 1.0,
                        matched_variant: msg_var.clone(),
                        method: MatchMethod::Direct,
                    });
                }
            }
        }

        // Tier 2: best fuzzy similarity across the cross-product.
        let mut best: Option<Candidate> = None;
        for msg_var in message_variants {
            for target_var in target_variants {
                let score = similarity::similarity(msg_var, target_var);
                if score > CONFIDENCE_FLOOR
                    && score > best.as_ref().map_or(0.0, |b| b.confidence)
                {
                    best = Some(Candidate {
                        confidence: score,
                        matched_variant: msg_var.clone(),
                        method: MatchMethod::Fuzzy,
                    });
                }
            }
        }

        // Tier 3: keyboard-adjacent typos, only while fuzzy stayed weak.
        if best.as_ref().map_or(0.0, |b| b.confidence) < TYPO_PASS_CEILING {
            'outer: for msg_var in message_variants {
                for word in msg_var.split_whitespace() {
                    if similarity::is_keyboard_adjacent_typo(word, target) {
                        best = Some(Candidate {
                            confidence: TYPO_CONFIDENCE,
                            matched_variant: word.to_string(),
                            method: MatchMethod::Typo,
                        });
                        break 'outer;
                    }
                }
            }
        }

        best
    }
}

struct Candidate {
    confidence: f32,
    matched_variant: String,
    method: MatchMethod,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> (WordlistMatcher, Arc<Normalizer>) {
        let normalizer = Arc::new(Normalizer::new());
        (WordlistMatcher::new(Arc::clone(&normalizer)), normalizer)
    }

    fn entries() -> Vec<WordEntry> {
        vec![WordEntry { word: "fuck".into(), severity: 3 }]
    }

    // log-capturing test: `RUST_LOG=debug cargo test` shows the match trace
    #[test_log::test]
    fn literal_text_matches_direct() {
        let (m, n) = matcher();
        let hits = m.scan(&n.variants("what the fuck"), &entries(), 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].method, MatchMethod::Direct);
        assert_eq!(hits[0].confidence, 1.0);
    }

    #[test]
    fn leetspeak_matches_without_literal_form() {
        let (m, n) = matcher();
        let shit = vec![WordEntry { word: "shit".into(), severity: 1 }];
        let hits = m.scan(&n.variants("what a $h1t day"), &shit, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].method, MatchMethod::Direct);

        // lone obfuscated word still lands through the fuzzy tier
        let fuck = entries();
        let hits = m.scan(&n.variants("fu(k"), &fuck, 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].method, MatchMethod::Fuzzy);
    }

    #[test]
    fn spaced_out_letters_match_via_variant() {
        let (m, n) = matcher();
        let hits = m.scan(&n.variants("f u c k you"), &entries(), 1);
        assert_eq!(hits.len(), 1);
        // the literal word is absent; the space-stripped variant carried it
        assert_eq!(hits[0].method, MatchMethod::Direct);
        assert!(hits[0].matched_variant.contains("fuck"));
    }

    #[test]
    fn reversed_and_rot13_forms_match() {
        let (m, n) = matcher();
        assert!(!m.scan(&n.variants("kcuf"), &entries(), 1).is_empty());
        assert!(!m.scan(&n.variants("shpx"), &entries(), 1).is_empty());
    }

    #[test]
    fn keyboard_typo_matches_with_fixed_confidence() {
        let (m, n) = matcher();
        let hits = m.scan(&n.variants("serious fick here"), &entries(), 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].method, MatchMethod::Typo);
        assert!((hits[0].confidence - 0.85).abs() < f32::EPSILON);
    }

    #[test]
    fn severity_threshold_filters_entries_before_matching() {
        let (m, n) = matcher();
        let hits = m.scan(&n.variants("what the fuck"), &entries(), 4);
        assert!(hits.is_empty(), "severity-3 entry must be skipped at strict threshold");
    }

    #[test]
    fn unrelated_text_stays_clean() {
        let (m, n) = matcher();
        let hits = m.scan(&n.variants("have a lovely day"), &entries(), 1);
        assert!(hits.is_empty());
    }
}
