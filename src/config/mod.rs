// src/config/mod.rs - Ruleset loading, validation, and pattern compilation

use log::info;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::engine::patterns::CompiledPattern;
use crate::types::{ModerationLevel, PatternCategory, PatternEntry, WordEntry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read ruleset: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse ruleset: {0}")]
    Parse(String),

    #[error("unsupported ruleset format '{0}' (expected yaml or toml)")]
    UnsupportedFormat(String),

    #[error("invalid severity {severity} for '{entry}' (expected 1..=4)")]
    InvalidSeverity { entry: String, severity: u8 },

    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// On-disk ruleset shape. Every section is optional so operators can
/// override just the tables they care about.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesetConfig {
    /// Language tag -> word entries. Language names are free-form labels
    /// surfaced in verdict reasons.
    #[serde(default)]
    pub wordlists: HashMap<String, Vec<WordEntry>>,

    #[serde(default)]
    pub patterns: PatternTables,

    #[serde(default)]
    pub thresholds: SeverityThresholds,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternTables {
    #[serde(default)]
    pub hate_speech: Vec<PatternEntry>,
    #[serde(default)]
    pub harassment: Vec<PatternEntry>,
    #[serde(default)]
    pub spam: Vec<PatternEntry>,
}

/// Minimum severity a word or pattern must carry to be considered at each
/// moderation level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeverityThresholds {
    #[serde(default = "default_weak")]
    pub weak: u8,
    #[serde(default = "default_moderate")]
    pub moderate: u8,
    #[serde(default = "default_strong")]
    pub strong: u8,
    #[serde(default = "default_strict")]
    pub strict: u8,
}

fn default_weak() -> u8 {
    1
}
fn default_moderate() -> u8 {
    2
}
fn default_strong() -> u8 {
    3
}
fn default_strict() -> u8 {
    4
}

impl Default for SeverityThresholds {
    fn default() -> Self {
        Self {
            weak: default_weak(),
            moderate: default_moderate(),
            strong: default_strong(),
            strict: default_strict(),
        }
    }
}

/// A validated ruleset with every regex compiled once at load time.
#[derive(Debug, Clone)]
pub struct Ruleset {
    pub wordlists: HashMap<String, Vec<WordEntry>>,
    pub patterns: Vec<CompiledPattern>,
    thresholds: SeverityThresholds,
}

impl Ruleset {
    /// Load a ruleset from a YAML or TOML file, selected by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        let config: RulesetConfig = match extension.as_str() {
            "yaml" | "yml" => {
                serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?
            }
            "toml" => toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };

        let ruleset = Self::from_config(config)?;
        info!(
            "loaded ruleset from {}: {} languages, {} patterns",
            path.display(),
            ruleset.wordlists.len(),
            ruleset.patterns.len()
        );
        Ok(ruleset)
    }

    /// Validate severities and compile every pattern. Malformed patterns
    /// fail the whole load rather than being skipped.
    pub fn from_config(config: RulesetConfig) -> Result<Self, ConfigError> {
        for entries in config.wordlists.values() {
            for entry in entries {
                validate_severity(&entry.word, entry.severity)?;
            }
        }

        let tables = [
            (PatternCategory::HateSpeech, config.patterns.hate_speech),
            (PatternCategory::Harassment, config.patterns.harassment),
            (PatternCategory::Spam, config.patterns.spam),
        ];
        let patterns = Self::compile_patterns(&tables)?;

        Ok(Self {
            wordlists: config.wordlists,
            patterns,
            thresholds: config.thresholds,
        })
    }

    /// Compile category-tagged pattern tables into case-insensitive regexes.
    pub fn compile_patterns(
        tables: &[(PatternCategory, Vec<PatternEntry>)],
    ) -> Result<Vec<CompiledPattern>, ConfigError> {
        let mut compiled = Vec::new();
        for (category, entries) in tables {
            for entry in entries {
                validate_severity(&entry.pattern, entry.severity)?;
                let regex = RegexBuilder::new(&entry.pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern {
                        pattern: entry.pattern.clone(),
                        source,
                    })?;
                compiled.push(CompiledPattern {
                    category: *category,
                    source: entry.pattern.clone(),
                    severity: entry.severity,
                    regex,
                });
            }
        }
        Ok(compiled)
    }

    /// Minimum entry severity considered at this moderation level, or
    /// `None` when the level disables content checks entirely.
    pub fn min_severity(&self, level: ModerationLevel) -> Option<u8> {
        match level {
            ModerationLevel::No => None,
            ModerationLevel::Weak => Some(self.thresholds.weak),
            ModerationLevel::Moderate => Some(self.thresholds.moderate),
            ModerationLevel::Strong => Some(self.thresholds.strong),
            ModerationLevel::Strict => Some(self.thresholds.strict),
        }
    }

    /// The default tables shipped with the engine.
    pub fn builtin() -> Self {
        Self::from_config(builtin_config()).expect("builtin ruleset compiles")
    }
}

fn validate_severity(entry: &str, severity: u8) -> Result<(), ConfigError> {
    if (1..=4).contains(&severity) {
        Ok(())
    } else {
        Err(ConfigError::InvalidSeverity {
            entry: entry.to_string(),
            severity,
        })
    }
}

fn words(table: &[(&str, u8)]) -> Vec<WordEntry> {
    table
        .iter()
        .map(|(word, severity)| WordEntry {
            word: (*word).to_string(),
            severity: *severity,
        })
        .collect()
}

fn patterns(table: &[(&str, u8)]) -> Vec<PatternEntry> {
    table
        .iter()
        .map(|(pattern, severity)| PatternEntry {
            pattern: (*pattern).to_string(),
            severity: *severity,
        })
        .collect()
}

fn builtin_config() -> RulesetConfig {
    let mut wordlists = HashMap::new();

    wordlists.insert(
        "english".to_string(),
        words(&[
            ("damn", 1),
            ("hell", 1),
            ("crap", 1),
            ("bloody", 1),
            ("sucks", 1),
            ("shit", 1),
            ("piss", 1),
            ("bitch", 1),
            ("bastard", 1),
            ("ass", 1),
            ("asshole", 1),
            ("bullshit", 1),
            ("dickhead", 1),
            ("moron", 1),
            ("idiot", 1),
            ("stupid", 1),
            ("dumb", 1),
            ("fuck", 3),
            ("fucking", 3),
            ("fucker", 3),
            ("motherfucker", 3),
            ("cocksucker", 3),
            ("whore", 3),
            ("slut", 3),
            ("pussy", 3),
            ("dick", 3),
            ("cock", 3),
            ("penis", 3),
            ("vagina", 3),
            ("nigger", 1),
            ("faggot", 1),
            ("retard", 1),
            ("nazi", 1),
            ("terrorist", 1),
            ("kill yourself", 1),
            ("kys", 1),
            ("suicide", 1),
        ]),
    );

    wordlists.insert(
        "hindi".to_string(),
        words(&[
            ("बेवकूफ", 1),
            ("मूर्ख", 1),
            ("गधा", 1),
            ("बकवास", 1),
            ("हरामी", 1),
            ("कुत्ता", 1),
            ("सुअर", 1),
            ("कमीना", 1),
            ("गंदा", 1),
            ("भेंचोद", 1),
            ("मादरचोद", 3),
            ("भोसड़ी", 3),
            ("गांडू", 3),
            ("लंड", 3),
            ("चूत", 3),
            ("रंडी", 3),
            ("भोसड़ा", 3),
            ("मार डालूंगा", 1),
            ("आतंकवादी", 1),
            ("मर जा", 1),
        ]),
    );

    wordlists.insert(
        "hinglish".to_string(),
        words(&[
            ("bakwas", 1),
            ("bewakoof", 1),
            ("gadha", 1),
            ("harami", 1),
            ("kutta", 1),
            ("suar", 1),
            ("kamina", 1),
            ("ganda", 1),
            ("saala", 1),
            ("ullu", 1),
            ("bhenchod", 3),
            ("bc", 3),
            ("randi", 3),
            ("madarchod", 3),
            ("mc", 3),
            ("bhosadi", 3),
            ("gandu", 3),
            ("lund", 3),
            ("chut", 3),
            ("bhosdike", 3),
            ("chutiya", 3),
            ("bhen ke laude", 3),
            ("bkl", 3),
            ("mar dalunga", 1),
            ("maar dalunga", 1),
            ("terrorist", 1),
            ("atankwadi", 1),
            ("mar ja", 1),
            ("suicide kar", 1),
        ]),
    );

    RulesetConfig {
        wordlists,
        patterns: PatternTables {
            hate_speech: patterns(&[
                (r"kill\s+all\s+\w+", 1),
                (r"death\s+to\s+\w+", 1),
                (r"\w+\s+should\s+die", 1),
                (r"gas\s+the\s+\w+", 1),
                (r"lynch\s+\w+", 1),
                (r"rape\s+\w+", 3),
                (r"burn\s+\w+\s+alive", 1),
                (r"hitler\s+was\s+right", 1),
                (r"final\s+solution", 1),
                (r"inferior\s+race", 1),
                (r"master\s+race", 1),
                (r"subhuman", 1),
            ]),
            harassment: patterns(&[
                (r"kill\s+yourself", 1),
                (r"go\s+die", 1),
                (r"commit\s+suicide", 1),
                (r"end\s+your\s+life", 1),
                (r"nobody\s+likes\s+you", 1),
                (r"you\s+are\s+worthless", 1),
                (r"waste\s+of\s+space", 1),
                (r"i\s+hope\s+you\s+die", 1),
                (r"rot\s+in\s+hell", 1),
                (r"send\s+nudes", 3),
                (r"show\s+me\s+your", 3),
                (r"i\s+want\s+to\s+fuck\s+you", 4),
                (r"suck\s+my", 3),
                (r"come\s+to\s+my\s+room", 3),
                (r"i\s+know\s+where\s+you\s+live", 1),
                (r"i\s+will\s+find\s+you", 1),
                (r"your\s+address\s+is", 1),
                (r"i\s+have\s+your\s+photos", 1),
            ]),
            spam: patterns(&[
                (r"\s{5,}", 1),
                (r"[!@#$%^&*()]{5,}", 1),
                (r"[A-Z]{20,}", 1),
            ]),
        },
        thresholds: SeverityThresholds::default(),
    }
}
