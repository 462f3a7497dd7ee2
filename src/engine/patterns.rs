// src/engine/patterns.rs - Compiled regex pattern scanning over variants

use log::debug;
use regex::Regex;

use crate::types::{PatternCategory, PatternHit};

/// A pattern entry resolved once at configuration load: category tag, the
/// original source for reason labeling, numeric severity, and the compiled
/// case-insensitive regex.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub category: PatternCategory,
    pub source: String,
    pub severity: u8,
    pub regex: Regex,
}

/// Matches configured regex entries against a message's variant set.
/// Categories are reason labels only; scoring treats them uniformly.
pub struct PatternMatcher {
    patterns: Vec<CompiledPattern>,
}

impl PatternMatcher {
    pub fn new(patterns: Vec<CompiledPattern>) -> Self {
        Self { patterns }
    }

    /// A pattern fires when it matches any variant and meets the severity
    /// threshold. The first variant is the raw text; a hit that only landed
    /// on a later (transformed) variant is marked `obfuscated`.
    pub fn scan(
        &self,
        variants: &[String],
        categories: &[PatternCategory],
        min_severity: u8,
    ) -> Vec<PatternHit> {
        let mut hits = Vec::new();

        for pattern in &self.patterns {
            if !categories.contains(&pattern.category) || pattern.severity < min_severity {
                continue;
            }

            for (index, variant) in variants.iter().enumerate() {
                if pattern.regex.is_match(variant) {
                    debug!(
                        "{} pattern '{}' fired on variant {}",
                        pattern.category.label(),
                        pattern.source,
                        index
                    );
                    hits.push(PatternHit {
                        category: pattern.category,
                        pattern: pattern.source.clone(),
                        severity: pattern.severity,
                        obfuscated: index > 0,
                    });
                    break;
                }
            }
        }

        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Ruleset;
    use crate::engine::normalizer::Normalizer;
    use crate::types::PatternEntry;

    fn matcher() -> PatternMatcher {
        let patterns = Ruleset::compile_patterns(&[
            (PatternCategory::Harassment, vec![
                PatternEntry { pattern: r"kill\s+yourself".into(), severity: 1 },
                PatternEntry { pattern: r"send\s+nudes".into(), severity: 3 },
            ]),
            (PatternCategory::HateSpeech, vec![
                PatternEntry { pattern: r"death\s+to\s+\w+".into(), severity: 1 },
            ]),
        ])
        .unwrap();
        PatternMatcher::new(patterns)
    }

    #[test]
    fn harassment_pattern_fires_on_raw_text() {
        let n = Normalizer::new();
        let hits = matcher().scan(
            &n.variants("please KILL  yourself now"),
            &[PatternCategory::Harassment],
            1,
        );
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, PatternCategory::Harassment);
        assert!(!hits[0].obfuscated);
    }

    #[test]
    fn pattern_fires_on_transformed_variant_only() {
        let n = Normalizer::new();
        // zero-width characters break the raw regex; the normalized variant
        // still carries the phrase
        let hits = matcher().scan(
            &n.variants("k\u{200B}ill yourself"),
            &[PatternCategory::Harassment],
            1,
        );
        assert_eq!(hits.len(), 1);
        assert!(hits[0].obfuscated);
    }

    #[test]
    fn severity_threshold_applies_per_pattern() {
        let n = Normalizer::new();
        let hits = matcher().scan(
            &n.variants("kill yourself"),
            &[PatternCategory::Harassment],
            3,
        );
        assert!(hits.is_empty());

        let hits = matcher().scan(
            &n.variants("send nudes"),
            &[PatternCategory::Harassment],
            3,
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn category_selection_limits_scan() {
        let n = Normalizer::new();
        let hits = matcher().scan(
            &n.variants("death to everyone"),
            &[PatternCategory::Harassment],
            1,
        );
        assert!(hits.is_empty(), "hate-speech pattern must not fire when only harassment is scanned");
    }
}
