// src/engine/behavior.rs - Per-(user,chat) rolling behavioral state

use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::similarity;
use crate::engine::toxicity::ToxicityScorer;
use crate::types::{MessageSample, UserBehaviorState};

/// Ring-buffer capacity per key. The O(n²) pairwise similarity scan stays
/// trivial at this bound.
const WINDOW_CAPACITY: usize = 20;
/// Window used for the message-frequency spam score.
const SPAM_WINDOW_SECONDS: i64 = 300;
/// Toxicity samples averaged for the aggression level.
const AGGRESSION_SAMPLE: usize = 5;

/// Maintains the rolling window and derived sub-scores for every
/// (user, chat) key seen recently.
///
/// The map is a derived cache: eviction or restart resets behavioral
/// context, never correctness. The write lock makes each record's
/// append-plus-recompute atomic, so concurrent messages for the same key
/// are strictly ordered.
pub struct BehaviorTracker {
    states: RwLock<HashMap<String, UserBehaviorState>>,
    toxicity: Arc<ToxicityScorer>,
    max_tracked_keys: usize,
}

impl BehaviorTracker {
    pub fn new(toxicity: Arc<ToxicityScorer>, max_tracked_keys: usize) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            toxicity,
            max_tracked_keys,
        }
    }

    fn key(user_id: &str, chat_id: &str) -> String {
        format!("{}:{}", user_id, chat_id)
    }

    /// Record a message and return the updated state snapshot.
    pub async fn record(&self, user_id: &str, chat_id: &str, text: &str) -> UserBehaviorState {
        self.record_at(user_id, chat_id, text, Utc::now()).await
    }

    /// Same as [`record`](Self::record) with an explicit clock, so tests can
    /// drive the 5-minute window deterministically.
    pub async fn record_at(
        &self,
        user_id: &str,
        chat_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> UserBehaviorState {
        let toxicity_score = self.toxicity.score(text).score;
        let key = Self::key(user_id, chat_id);

        let mut states = self.states.write().await;

        if states.len() >= self.max_tracked_keys && !states.contains_key(&key) {
            evict_stalest(&mut states);
        }

        let state = states
            .entry(key.clone())
            .or_insert_with(|| UserBehaviorState::new(now));

        state.messages.push_back(MessageSample {
            text: text.to_string(),
            timestamp: now,
            length: text.chars().count(),
            toxicity_score,
        });
        while state.messages.len() > WINDOW_CAPACITY {
            state.messages.pop_front();
        }

        recompute(state, now);
        state.last_analysis = now;

        debug!(
            "behavior {}: spam {:.2} repeat {:.2} aggression {:.2} trend {:.2} risk {:.2}",
            key,
            state.spam_score,
            state.repetitive_behavior,
            state.aggression_level,
            state.escalation_trend,
            state.risk_score
        );

        state.clone()
    }

    /// Snapshot without mutation; `None` means a fresh user (risk 0).
    pub async fn state_of(&self, user_id: &str, chat_id: &str) -> Option<UserBehaviorState> {
        let states = self.states.read().await;
        states.get(&Self::key(user_id, chat_id)).cloned()
    }

    pub async fn tracked_keys(&self) -> usize {
        self.states.read().await.len()
    }
}

fn recompute(state: &mut UserBehaviorState, now: DateTime<Utc>) {
    let messages = &state.messages;

    let cutoff = now - Duration::seconds(SPAM_WINDOW_SECONDS);
    let recent = messages.iter().filter(|m| m.timestamp > cutoff).count();
    state.spam_score = (recent as f32 / 5.0 / 2.0).min(5.0);

    let mut similar_pairs = 0;
    let samples: Vec<&MessageSample> = messages.iter().collect();
    for i in 0..samples.len() {
        for j in (i + 1)..samples.len() {
            if similarity::token_overlap(&samples[i].text, &samples[j].text) > 0.7 {
                similar_pairs += 1;
            }
        }
    }
    state.repetitive_behavior = (similar_pairs as f32 / 3.0).min(5.0);

    let tail: Vec<f32> = messages
        .iter()
        .rev()
        .take(AGGRESSION_SAMPLE)
        .map(|m| m.toxicity_score)
        .collect();
    state.aggression_level = if tail.is_empty() {
        0.0
    } else {
        tail.iter().sum::<f32>() / tail.len() as f32
    };

    if messages.len() >= 3 {
        let last3: Vec<f32> = messages
            .iter()
            .rev()
            .take(3)
            .map(|m| m.toxicity_score)
            .collect();
        // last3 is newest-first
        let escalating = last3[0] > last3[1] && last3[1] > last3[2];
        state.escalation_trend = if escalating {
            3.0
        } else {
            (state.escalation_trend - 0.5).max(0.0)
        };
    } else {
        state.escalation_trend = (state.escalation_trend - 0.5).max(0.0);
    }

    state.risk_score = (state.spam_score
        + state.aggression_level
        + state.repetitive_behavior
        + state.escalation_trend)
        / 4.0;
}

/// Drop the key with the oldest analysis timestamp. Called when the key
/// space hits its cap, so growth in distinct (user, chat) pairs stays
/// bounded.
fn evict_stalest(states: &mut HashMap<String, UserBehaviorState>) {
    if let Some(stalest) = states
        .iter()
        .min_by_key(|(_, s)| s.last_analysis)
        .map(|(k, _)| k.clone())
    {
        debug!("evicting stale behavior state {}", stalest);
        states.remove(&stalest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> BehaviorTracker {
        BehaviorTracker::new(Arc::new(ToxicityScorer::new()), 1000)
    }

    #[tokio::test]
    async fn repetition_rises_on_identical_messages() {
        let t = tracker();
        let now = Utc::now();
        let mut last = None;
        for i in 0..4 {
            let at = now + Duration::seconds(i);
            last = Some(t.record_at("u1", "c1", "buy my stuff", at).await);
        }
        let state = last.unwrap();
        // 4 identical messages -> 6 similar pairs -> 6/3 = 2.0
        assert!(state.repetitive_behavior > 0.0);
        assert!((state.repetitive_behavior - 2.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn repetition_visible_from_third_occurrence() {
        let t = tracker();
        let now = Utc::now();
        t.record_at("u1", "c1", "same text", now).await;
        t.record_at("u1", "c1", "same text", now + Duration::seconds(1)).await;
        let third = t
            .record_at("u1", "c1", "same text", now + Duration::seconds(2))
            .await;
        assert!(third.repetitive_behavior > 0.0);
    }

    #[tokio::test]
    async fn spam_score_tracks_five_minute_frequency() {
        let t = tracker();
        let now = Utc::now();
        let mut state = None;
        for i in 0..10 {
            let at = now + Duration::seconds(i * 10);
            state = Some(t.record_at("u1", "c1", &format!("message number {}", i), at).await);
        }
        let state = state.unwrap();
        // 10 messages inside 5 minutes -> 10/5/2 = 1.0
        assert!((state.spam_score - 1.0).abs() < 1e-6);

        // an hour later the window is empty again
        let later = t
            .record_at("u1", "c1", "hello again", now + Duration::hours(1))
            .await;
        assert!((later.spam_score - 0.1).abs() < 1e-6);
    }

    #[tokio::test]
    async fn escalation_trend_fires_on_rising_toxicity() {
        let t = tracker();
        let now = Utc::now();
        t.record_at("u1", "c1", "hello there", now).await;
        t.record_at("u1", "c1", "you are garbage", now + Duration::seconds(1)).await;
        let third = t
            .record_at("u1", "c1", "I WILL DESTROY YOU!!!! LOSER", now + Duration::seconds(2))
            .await;
        assert_eq!(third.escalation_trend, 3.0);

        // a calm follow-up decays the trend instead of resetting it
        let fourth = t
            .record_at("u1", "c1", "ok", now + Duration::seconds(3))
            .await;
        assert_eq!(fourth.escalation_trend, 2.5);
    }

    #[tokio::test]
    async fn window_is_capped_at_twenty_entries() {
        let t = tracker();
        let now = Utc::now();
        for i in 0..30 {
            t.record_at("u1", "c1", &format!("unique message {}", i), now + Duration::seconds(i)).await;
        }
        let state = t.state_of("u1", "c1").await.unwrap();
        assert_eq!(state.messages.len(), 20);
        assert!(state.messages.front().unwrap().text.contains("10"));
    }

    #[tokio::test]
    async fn keys_are_independent_and_bounded() {
        let t = BehaviorTracker::new(Arc::new(ToxicityScorer::new()), 3);
        let now = Utc::now();
        for (i, user) in ["a", "b", "c", "d"].iter().enumerate() {
            t.record_at(user, "chat", "hi all", now + Duration::seconds(i as i64)).await;
        }
        // cap is 3, the stalest key ("a") was evicted
        assert_eq!(t.tracked_keys().await, 3);
        assert!(t.state_of("a", "chat").await.is_none());
        assert!(t.state_of("d", "chat").await.is_some());
    }

    #[tokio::test]
    async fn fresh_user_has_no_state() {
        let t = tracker();
        assert!(t.state_of("nobody", "nowhere").await.is_none());
    }
}
