//! # ChatGuard
//!
//! A deterministic content-risk engine for chat moderation. Takes a message
//! plus its `(user, chat)` context and produces a [`Verdict`](types::Verdict) the calling
//! moderation layer can act on — no network I/O, no side effects beyond the
//! in-memory behavior cache.
//!
//! ## Layers
//!
//! - **Normalizer**: Unicode/leetspeak normalization and variant generation
//! - **WordlistMatcher**: direct, fuzzy, and keyboard-typo matching per language
//! - **PatternMatcher**: compiled regex tables for hate speech and harassment
//! - **ObfuscationDetector / ToxicityScorer / SpamDetector**: additive heuristics
//! - **BehaviorTracker**: rolling per-user behavioral scores
//! - **ModerationEngine**: aggregates everything into one verdict, plus a
//!   pure escalation function over violation history
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chatguard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = ModerationEngine::new(Ruleset::builtin());
//!
//!     let verdict = engine
//!         .evaluate("f u c k you", ModerationLevel::Moderate, "user42", "chat7")
//!         .await;
//!
//!     if verdict.is_abusive {
//!         println!("flagged: {:?}", verdict.reasons);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod types;

// Re-export commonly used items
pub mod prelude {
    pub use crate::config::{ConfigError, Ruleset, RulesetConfig};
    pub use crate::engine::{
        compute_escalation, MemoryViolationStore, ModerationEngine, ViolationStore,
        ABUSIVE_RISK_THRESHOLD,
    };
    pub use crate::types::{
        EscalationDecision, ModerationLevel, SeverityLevel, Verdict, ViolationRecord,
    };
}
