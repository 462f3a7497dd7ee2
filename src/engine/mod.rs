// src/engine/mod.rs - Verdict aggregation, escalation, and the violation-store seam

pub mod behavior;
pub mod normalizer;
pub mod obfuscation;
pub mod patterns;
pub mod similarity;
pub mod spam;
pub mod toxicity;
pub mod wordlist;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Ruleset;
use crate::types::{
    EscalationDecision, MatchMethod, ModerationLevel, PatternCategory, SeverityLevel, SignalLevel,
    Verdict, ViolationRecord, WordEntry,
};

use behavior::BehaviorTracker;
use normalizer::Normalizer;
use obfuscation::ObfuscationDetector;
use patterns::PatternMatcher;
use spam::SpamDetector;
use toxicity::ToxicityScorer;
use wordlist::WordlistMatcher;

/// Combined risk score above which a message is flagged even without a
/// single wordlist or pattern hit. A tuned cutoff, not a derived value.
pub const ABUSIVE_RISK_THRESHOLD: f32 = 4.0;

/// Violations older than this never contribute to escalation.
const ESCALATION_WINDOW_HOURS: i64 = 24;

const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

/// One-stop message evaluator: composes the normalizer, the content
/// matchers, the heuristic scorers, and the per-user behavior tracker
/// behind a single `evaluate` call.
pub struct ModerationEngine {
    ruleset: Ruleset,
    normalizer: Arc<Normalizer>,
    wordlists: WordlistMatcher,
    patterns: PatternMatcher,
    obfuscation: ObfuscationDetector,
    toxicity: Arc<ToxicityScorer>,
    spam: SpamDetector,
    behavior: BehaviorTracker,
}

impl ModerationEngine {
    pub fn new(ruleset: Ruleset) -> Self {
        Self::with_tracker_capacity(ruleset, DEFAULT_MAX_TRACKED_KEYS)
    }

    /// Construct with an explicit bound on tracked (user, chat) keys.
    pub fn with_tracker_capacity(ruleset: Ruleset, max_tracked_keys: usize) -> Self {
        let normalizer = Arc::new(Normalizer::new());
        let toxicity = Arc::new(ToxicityScorer::new());
        Self {
            wordlists: WordlistMatcher::new(Arc::clone(&normalizer)),
            patterns: PatternMatcher::new(ruleset.patterns.clone()),
            obfuscation: ObfuscationDetector::new(Arc::clone(&normalizer)),
            spam: SpamDetector::new(),
            behavior: BehaviorTracker::new(Arc::clone(&toxicity), max_tracked_keys),
            normalizer,
            toxicity,
            ruleset,
        }
    }

    pub fn behavior(&self) -> &BehaviorTracker {
        &self.behavior
    }

    /// Evaluate one message. Returns a clean verdict when moderation is
    /// disabled or the text is empty; otherwise runs every layer and
    /// max-combines their severities.
    pub async fn evaluate(
        &self,
        text: &str,
        level: ModerationLevel,
        user_id: &str,
        chat_id: &str,
    ) -> Verdict {
        let Some(min_severity) = self.ruleset.min_severity(level) else {
            return Verdict::clean();
        };
        if text.trim().is_empty() {
            return Verdict::clean();
        }

        let variants = self.normalizer.variants(text);

        let mut reasons: Vec<String> = Vec::new();
        let mut severity = SeverityLevel::None;
        let mut content_hit = false;
        let mut obfuscation_detected = false;

        // Wordlist scan per language, in name order so reasons are stable.
        let mut languages: Vec<(&String, &Vec<WordEntry>)> = self.ruleset.wordlists.iter().collect();
        languages.sort_by(|a, b| a.0.cmp(b.0));
        for (language, entries) in languages {
            for hit in self.wordlists.scan(&variants, entries, min_severity) {
                let mut reason = format!(
                    "{} profanity ({}) via {}",
                    language,
                    hit.word,
                    hit.method.as_str()
                );
                if hit.confidence < 1.0 {
                    reason.push_str(&format!(" ({:.0}% confidence)", hit.confidence * 100.0));
                }
                if hit.method == MatchMethod::Direct && hit.matched_variant != text {
                    reason.push_str(" (obfuscated variant)");
                }
                if hit.method != MatchMethod::Direct || hit.matched_variant != text {
                    obfuscation_detected = true;
                }
                reasons.push(reason);
                severity = severity.max(SeverityLevel::from_numeric(hit.severity));
                content_hit = true;
            }
        }

        // Hate-speech and harassment patterns; spam patterns feed the spam
        // heuristic path instead.
        let pattern_hits = self.patterns.scan(
            &variants,
            &[PatternCategory::HateSpeech, PatternCategory::Harassment],
            min_severity,
        );
        for hit in pattern_hits {
            reasons.push(format!("{} pattern detected", hit.category.label()));
            severity = severity.max(SeverityLevel::from_numeric(hit.severity));
            if hit.obfuscated {
                obfuscation_detected = true;
            }
            content_hit = true;
        }

        let state = self.behavior.record(user_id, chat_id, text).await;
        if state.risk_score > 3.0 {
            severity = severity.max(SeverityLevel::Medium);
            reasons.push("high_risk_user_behavior".to_string());
        }
        if state.escalation_trend > 2.0 {
            severity = severity.max(SeverityLevel::High);
            reasons.push("escalating_behavior".to_string());
        }

        let spam = self.spam.detect(text, Some(&state));
        if spam.is_spam {
            reasons.extend(spam.reasons.iter().map(|r| format!("spam_{}", r)));
            if spam.level == SignalLevel::High {
                severity = severity.max(SeverityLevel::Medium);
            }
        }

        let toxicity = self.toxicity.score(text);
        if toxicity.level == SignalLevel::High {
            severity = severity.max(SeverityLevel::High);
            reasons.extend(toxicity.reasons.iter().map(|r| format!("toxicity_{}", r)));
        }

        let obfuscation = self.obfuscation.detect(text);
        if obfuscation.has_obfuscation {
            reasons.extend(
                obfuscation
                    .techniques
                    .iter()
                    .map(|t| format!("obfuscation_{}", t)),
            );
            if obfuscation.score > 0.6 {
                severity = severity.max(SeverityLevel::Medium);
            }
            obfuscation_detected = true;
        }

        let combined_risk = state.risk_score
            + if obfuscation.has_obfuscation {
                obfuscation.score * 2.0
            } else {
                0.0
            };

        let is_abusive = content_hit
            || spam.is_spam
            || toxicity.level == SignalLevel::High
            || combined_risk > ABUSIVE_RISK_THRESHOLD;

        let mut seen = HashSet::new();
        reasons.retain(|r| seen.insert(r.clone()));

        debug!(
            "verdict for {}:{}: abusive={} severity={:?} risk={:.2} reasons={:?}",
            user_id, chat_id, is_abusive, severity, combined_risk, reasons
        );

        Verdict {
            is_abusive,
            severity,
            reasons,
            risk_score: combined_risk,
            obfuscation_detected,
        }
    }

    /// Fetch a user's history from the store and compute their escalation.
    pub async fn escalation_for(
        &self,
        store: &dyn ViolationStore,
        user_id: &str,
        current: SeverityLevel,
    ) -> Result<EscalationDecision> {
        let history = store.recent_violations(user_id).await?;
        Ok(compute_escalation(&history, current))
    }
}

/// Escalation from recent violation frequency, independent of the current
/// message's own content.
pub fn compute_escalation(
    history: &[ViolationRecord],
    current: SeverityLevel,
) -> EscalationDecision {
    compute_escalation_at(history, current, Utc::now())
}

fn compute_escalation_at(
    history: &[ViolationRecord],
    current: SeverityLevel,
    now: DateTime<Utc>,
) -> EscalationDecision {
    let cutoff = now - Duration::hours(ESCALATION_WINDOW_HOURS);
    let recent_violation_count = history.iter().filter(|v| v.timestamp > cutoff).count();

    let escalation_multiplier = if recent_violation_count >= 10 {
        3.0
    } else if recent_violation_count >= 5 {
        2.0
    } else if recent_violation_count >= 3 {
        1.5
    } else {
        1.0
    };

    // A severity of none still escalates from 1, so a flagged user is never
    // left below the lowest actionable level.
    let base = current.numeric().max(1);
    let escalated = (base as f32 * escalation_multiplier).floor().min(4.0) as u8;

    EscalationDecision {
        escalated_severity: SeverityLevel::from_numeric(escalated),
        escalation_multiplier,
        recent_violation_count,
        should_escalate: escalation_multiplier > 1.0,
    }
}

/// Read-only access to a user's violation history. The authoritative store
/// lives with the caller; the engine only ever reads from it.
#[async_trait]
pub trait ViolationStore: Send + Sync {
    async fn recent_violations(&self, user_id: &str) -> Result<Vec<ViolationRecord>>;
}

/// In-memory store, suitable for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryViolationStore {
    records: RwLock<HashMap<String, Vec<ViolationRecord>>>,
}

impl MemoryViolationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, violation: ViolationRecord) {
        let mut records = self.records.write().await;
        records
            .entry(violation.user_id.clone())
            .or_default()
            .push(violation);
    }
}

#[async_trait]
impl ViolationStore for MemoryViolationStore {
    async fn recent_violations(&self, user_id: &str) -> Result<Vec<ViolationRecord>> {
        let records = self.records.read().await;
        Ok(records.get(user_id).cloned().unwrap_or_default())
    }
}
