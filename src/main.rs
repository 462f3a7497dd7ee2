// src/main.rs - Demo binary: moderate stdin lines against a ruleset

use anyhow::{Context, Result};
use log::{info, warn};
use std::env;
use std::io::{self, BufRead, Write};

use chatguard::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting ChatGuard v{}", env!("CARGO_PKG_VERSION"));

    let ruleset = match env::args().nth(1) {
        Some(path) => {
            Ruleset::load(&path).with_context(|| format!("loading ruleset from {}", path))?
        }
        None => {
            info!("No ruleset path given, using builtin tables");
            Ruleset::builtin()
        }
    };

    let level = match env::var("CHATGUARD_LEVEL").as_deref() {
        Ok("no") => ModerationLevel::No,
        Ok("weak") => ModerationLevel::Weak,
        Ok("moderate") | Err(_) => ModerationLevel::Moderate,
        Ok("strong") => ModerationLevel::Strong,
        Ok("strict") => ModerationLevel::Strict,
        Ok(other) => {
            warn!("Unknown CHATGUARD_LEVEL '{}', defaulting to moderate", other);
            ModerationLevel::Moderate
        }
    };
    info!("Moderation level: {:?}", level);

    let engine = ModerationEngine::new(ruleset);

    // Each input line is "<user> <chat> <text...>"; the verdict goes out as
    // one JSON object per line.
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let mut parts = line.splitn(3, ' ');
        let (user, chat, text) = match (parts.next(), parts.next(), parts.next()) {
            (Some(user), Some(chat), Some(text)) => (user, chat, text),
            _ => {
                warn!("Skipping malformed line (expected '<user> <chat> <text>')");
                continue;
            }
        };

        let verdict = engine.evaluate(text, level, user, chat).await;
        serde_json::to_writer(&mut stdout, &verdict)?;
        writeln!(stdout)?;
    }

    Ok(())
}
