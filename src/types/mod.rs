// src/types/mod.rs - Core data model for the content-risk engine

use serde::{Deserialize, Serialize};

/// Ordinal violation severity used everywhere inside the engine.
///
/// Numeric severities (1-4) exist only at the config boundary; conversion
/// happens once via [`SeverityLevel::from_numeric`]. Severities combine with
/// `max`, never by averaging: no detection layer may downgrade another's
/// finding within a single verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityLevel {
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Map a numeric config severity onto the decision-layer enum.
    pub fn from_numeric(severity: u8) -> Self {
        match severity {
            0 => SeverityLevel::None,
            1 => SeverityLevel::Low,
            2 => SeverityLevel::Medium,
            3 => SeverityLevel::High,
            _ => SeverityLevel::Critical,
        }
    }

    pub fn numeric(&self) -> u8 {
        match self {
            SeverityLevel::None => 0,
            SeverityLevel::Low => 1,
            SeverityLevel::Medium => 2,
            SeverityLevel::High => 3,
            SeverityLevel::Critical => 4,
        }
    }
}

/// Per-chat moderation strictness. `No` disables detection entirely; the
/// other levels map to the minimum numeric severity a word or pattern entry
/// must carry before it is considered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationLevel {
    No,
    Weak,
    Moderate,
    Strong,
    Strict,
}

impl ModerationLevel {
    /// Minimum numeric entry severity for this level, `None` when detection
    /// is disabled.
    pub fn min_severity(&self) -> Option<u8> {
        match self {
            ModerationLevel::No => None,
            ModerationLevel::Weak => Some(1),
            ModerationLevel::Moderate => Some(2),
            ModerationLevel::Strong => Some(3),
            ModerationLevel::Strict => Some(4),
        }
    }
}

/// A single configured word with its numeric severity (1-4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub severity: u8,
}

/// A single configured regex source with its numeric severity (1-4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternEntry {
    pub pattern: String,
    pub severity: u8,
}

/// Pattern grouping. Categories exist purely for reason labeling; scoring
/// treats them uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternCategory {
    HateSpeech,
    Harassment,
    Spam,
}

impl PatternCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PatternCategory::HateSpeech => "hate_speech",
            PatternCategory::Harassment => "harassment",
            PatternCategory::Spam => "spam",
        }
    }
}

/// How a wordlist entry was matched against the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMethod {
    Direct,
    Fuzzy,
    Typo,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Direct => "direct",
            MatchMethod::Fuzzy => "fuzzy",
            MatchMethod::Typo => "typo",
        }
    }
}

/// Best match found for a single wordlist entry. Only matches with
/// confidence above 0.7 are ever surfaced.
#[derive(Debug, Clone, Serialize)]
pub struct WordMatch {
    pub word: String,
    pub severity: u8,
    pub confidence: f32,
    pub matched_variant: String,
    pub method: MatchMethod,
}

/// A pattern that fired against at least one message variant.
/// `obfuscated` is set when only a transformed variant matched.
#[derive(Debug, Clone, Serialize)]
pub struct PatternHit {
    pub category: PatternCategory,
    pub pattern: String,
    pub severity: u8,
    pub obfuscated: bool,
}

/// Coarse three-step intensity used by the heuristic scorers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalLevel {
    Low,
    Medium,
    High,
}

/// Outcome of the obfuscation probes, independent of any wordlist match.
#[derive(Debug, Clone, Serialize)]
pub struct ObfuscationReport {
    pub techniques: Vec<&'static str>,
    pub score: f32,
    pub level: SignalLevel,
    pub has_obfuscation: bool,
}

impl ObfuscationReport {
    pub fn clean() -> Self {
        Self {
            techniques: Vec::new(),
            score: 0.0,
            level: SignalLevel::Low,
            has_obfuscation: false,
        }
    }
}

/// Outcome of the stylistic toxicity heuristic on raw text.
#[derive(Debug, Clone, Serialize)]
pub struct ToxicityReport {
    pub score: f32,
    pub level: SignalLevel,
    pub reasons: Vec<&'static str>,
    pub is_suspicious: bool,
}

/// Outcome of the stateless + behavioral spam indicators.
#[derive(Debug, Clone, Serialize)]
pub struct SpamReport {
    pub is_spam: bool,
    pub score: f32,
    pub reasons: Vec<String>,
    pub level: SignalLevel,
}

/// One message remembered in a user's rolling window.
#[derive(Debug, Clone, Serialize)]
pub struct MessageSample {
    pub text: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub length: usize,
    pub toxicity_score: f32,
}

/// Derived behavioral state for one (user, chat) key.
///
/// This is a cache, not source-of-truth data: eviction or process restart
/// only resets behavioral context and never loses authoritative violation
/// history, which the external store owns.
#[derive(Debug, Clone, Serialize)]
pub struct UserBehaviorState {
    pub messages: std::collections::VecDeque<MessageSample>,
    pub spam_score: f32,
    pub aggression_level: f32,
    pub repetitive_behavior: f32,
    pub escalation_trend: f32,
    pub risk_score: f32,
    pub last_analysis: chrono::DateTime<chrono::Utc>,
}

impl UserBehaviorState {
    pub fn new(now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            messages: std::collections::VecDeque::new(),
            spam_score: 0.0,
            aggression_level: 0.0,
            repetitive_behavior: 0.0,
            escalation_trend: 0.0,
            risk_score: 0.0,
            last_analysis: now,
        }
    }
}

/// Final per-message decision. The only output the moderation-action layer
/// needs to enact deletion, muting, or warnings.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub is_abusive: bool,
    pub severity: SeverityLevel,
    pub reasons: Vec<String>,
    pub risk_score: f32,
    pub obfuscation_detected: bool,
}

impl Verdict {
    /// Non-abusive verdict used for disabled moderation and empty input.
    pub fn clean() -> Self {
        Self {
            is_abusive: false,
            severity: SeverityLevel::None,
            reasons: Vec::new(),
            risk_score: 0.0,
            obfuscation_detected: false,
        }
    }
}

/// Historical violation owned by the external store, consumed read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViolationRecord {
    pub user_id: String,
    pub kind: String,
    pub severity: SeverityLevel,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Escalation computed purely from recent violation history plus a current
/// severity.
#[derive(Debug, Clone, Serialize)]
pub struct EscalationDecision {
    pub escalated_severity: SeverityLevel,
    pub escalation_multiplier: f32,
    pub recent_violation_count: usize,
    pub should_escalate: bool,
}
