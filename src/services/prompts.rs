//! Reflection prompts: when to ask the model for a fresh one, and what to
//! serve when it cannot or should not be asked.

use chrono::{DateTime, Utc};
use rand::{seq::SliceRandom, Rng};
use serde::Serialize;

use crate::models::journal_entry::{JournalEntry, Mood};
use crate::services::claude::{PromptRequest, PromptType, ReflectionModel};

pub const PROMPT_HISTORY_LEN: usize = 10;

pub const FALLBACK_PROMPTS: [&str; 8] = [
    "What's one thing you're grateful for today?",
    "How are you feeling right now, and what might be contributing to that feeling?",
    "What's been on your mind lately?",
    "Describe a moment from today that stood out to you.",
    "What would you like to let go of today?",
    "What's something you learned about yourself recently?",
    "How would you describe your energy level today?",
    "What's one small thing that brought you joy today?",
];

pub const QUICK_PROMPTS: [&str; 4] = [
    "How are you feeling right now?",
    "What's on your mind today?",
    "Take a moment to check in with yourself.",
    "What would be helpful to explore today?",
];

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    Ai,
    Fallback,
    Quick,
}

#[derive(Debug, Clone, Default)]
pub struct PromptContext<'a> {
    pub mood: Option<Mood>,
    pub recent_thoughts: Option<String>,
    pub recent_entries: &'a [JournalEntry],
    pub prompt_history: &'a [String],
    pub prompt_type: PromptType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptResult {
    pub prompt: String,
    pub source: PromptSource,
    pub error: Option<String>,
}

/// `true` when there is no record of a prompt, when a full day has passed
/// since the last one, or when the user has already gone through more than
/// three prompts.
pub fn should_generate_new_prompt(
    last_prompt_date: Option<DateTime<Utc>>,
    prompt_history: &[String],
    now: DateTime<Utc>,
) -> bool {
    let Some(last) = last_prompt_date else {
        return true;
    };

    (now - last).num_days() >= 1 || prompt_history.len() > 3
}

/// Picks a static prompt not seen in `history`; repeats only once every
/// prompt has been used.
pub fn fallback_prompt_with<R: Rng + ?Sized>(history: &[String], rng: &mut R) -> &'static str {
    let fresh: Vec<&'static str> = FALLBACK_PROMPTS
        .iter()
        .copied()
        .filter(|p| !history.iter().any(|h| h == p))
        .collect();

    fresh
        .choose(rng)
        .or_else(|| FALLBACK_PROMPTS.choose(rng))
        .copied()
        .unwrap_or(FALLBACK_PROMPTS[0])
}

pub fn fallback_prompt(history: &[String]) -> &'static str {
    fallback_prompt_with(history, &mut rand::thread_rng())
}

pub fn quick_check_in_prompt_with<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    QUICK_PROMPTS.choose(rng).copied().unwrap_or(QUICK_PROMPTS[0])
}

pub fn quick_check_in_prompt() -> &'static str {
    quick_check_in_prompt_with(&mut rand::thread_rng())
}

/// Appends `prompt`, dropping the oldest items beyond `keep` (at least one
/// is always kept).
pub fn append_to_history(history: &mut Vec<String>, prompt: impl Into<String>, keep: usize) {
    history.push(prompt.into());
    let keep = keep.max(1);
    if history.len() > keep {
        let excess = history.len() - keep;
        history.drain(..excess);
    }
}

/// Asks the model for a prompt shaped by the user's mood, falling back to a
/// static prompt on any failure.
pub async fn generate_reflection_prompt(
    model: &dyn ReflectionModel,
    ctx: &PromptContext<'_>,
) -> PromptResult {
    let request = build_prompt_request(ctx);

    match model.generate_prompt(&request).await {
        Ok(generated) => PromptResult {
            prompt: generated.prompt,
            source: PromptSource::Ai,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Prompt generation failed, using fallback prompt");
            PromptResult {
                prompt: fallback_prompt(ctx.prompt_history).to_string(),
                source: PromptSource::Fallback,
                error: Some(e.to_string()),
            }
        }
    }
}

fn build_prompt_request(ctx: &PromptContext<'_>) -> PromptRequest {
    let mood = ctx
        .mood
        .or_else(|| infer_mood_from_recent(ctx.recent_entries))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "neutral".to_string());

    PromptRequest {
        mood,
        recent_thoughts: ctx.recent_thoughts.clone(),
        prompt_type: ctx.prompt_type,
    }
}

fn infer_mood_from_recent(entries: &[JournalEntry]) -> Option<Mood> {
    entries.iter().max_by_key(|e| e.recorded_at()).map(|e| e.mood)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::journal_entry::EntryAnalysis;
    use crate::services::claude::{AiError, GeneratedPrompt};
    use crate::services::dates::EntryDate;
    use async_trait::async_trait;
    use chrono::Duration;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::Mutex;
    use uuid::Uuid;

    struct ScriptedModel {
        reply: Option<String>,
        seen: Mutex<Vec<PromptRequest>>,
    }

    impl ScriptedModel {
        fn replying(prompt: Option<&str>) -> Self {
            Self {
                reply: prompt.map(str::to_string),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ReflectionModel for ScriptedModel {
        async fn generate_prompt(&self, request: &PromptRequest) -> Result<GeneratedPrompt, AiError> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Some(prompt) => Ok(GeneratedPrompt {
                    prompt: prompt.clone(),
                }),
                None => Err(AiError::Api {
                    status: 529,
                    body: "overloaded".into(),
                }),
            }
        }

        async fn analyze_entry(&self, _entry_text: &str) -> Result<EntryAnalysis, AiError> {
            Err(AiError::NotConfigured)
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-14T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn history(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("p{i}")).collect()
    }

    #[test]
    fn test_generate_when_no_previous_prompt() {
        assert!(should_generate_new_prompt(None, &[], now()));
    }

    #[test]
    fn test_generate_after_a_full_day() {
        let yesterday = now() - Duration::days(1);
        assert!(should_generate_new_prompt(Some(yesterday), &[], now()));
    }

    #[test]
    fn test_same_day_with_short_history_reuses() {
        let earlier = now() - Duration::hours(2);
        assert!(!should_generate_new_prompt(Some(earlier), &history(3), now()));
        // 23h is not a full day
        let almost = now() - Duration::hours(23);
        assert!(!should_generate_new_prompt(Some(almost), &[], now()));
    }

    #[test]
    fn test_long_history_overrides_recency() {
        assert!(should_generate_new_prompt(Some(now()), &history(4), now()));
    }

    #[test]
    fn test_fallback_avoids_history() {
        let mut rng = StdRng::seed_from_u64(7);
        let used: Vec<String> = FALLBACK_PROMPTS[..7].iter().map(|p| p.to_string()).collect();
        for _ in 0..20 {
            assert_eq!(fallback_prompt_with(&used, &mut rng), FALLBACK_PROMPTS[7]);
        }
    }

    #[test]
    fn test_fallback_repeats_once_exhausted() {
        let mut rng = StdRng::seed_from_u64(11);
        let used: Vec<String> = FALLBACK_PROMPTS.iter().map(|p| p.to_string()).collect();
        let picked = fallback_prompt_with(&used, &mut rng);
        assert!(FALLBACK_PROMPTS.contains(&picked));
    }

    #[test]
    fn test_quick_prompt_is_from_fixed_list() {
        assert!(QUICK_PROMPTS.contains(&quick_check_in_prompt()));
    }

    #[test]
    fn test_history_keeps_newest_ten() {
        let mut h = history(PROMPT_HISTORY_LEN);
        append_to_history(&mut h, "p11", PROMPT_HISTORY_LEN);
        assert_eq!(h.len(), PROMPT_HISTORY_LEN);
        assert_eq!(h.first().map(String::as_str), Some("p2"));
        assert_eq!(h.last().map(String::as_str), Some("p11"));

        let mut short = Vec::new();
        append_to_history(&mut short, "only", 0);
        assert_eq!(short, vec!["only".to_string()]);
    }

    #[tokio::test]
    async fn test_generated_prompt_uses_recent_mood() {
        let model = ScriptedModel::replying(Some("What felt heavy today?"));
        let entries = vec![
            JournalEntry {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                date: EntryDate::Instant(now() - Duration::days(2)),
                mood: Mood::Happy,
                pain_level: 0,
                entry_text: "older".into(),
                analysis: None,
            },
            JournalEntry {
                id: Uuid::new_v4(),
                user_id: Uuid::nil(),
                date: EntryDate::Instant(now()),
                mood: Mood::Anxious,
                pain_level: 5,
                entry_text: "newer".into(),
                analysis: None,
            },
        ];
        let ctx = PromptContext {
            recent_entries: &entries,
            ..Default::default()
        };

        let result = generate_reflection_prompt(&model, &ctx).await;
        assert_eq!(result.source, PromptSource::Ai);
        assert_eq!(result.prompt, "What felt heavy today?");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0].mood, "Anxious");
        assert_eq!(seen[0].prompt_type, PromptType::CheckIn);
    }

    #[tokio::test]
    async fn test_neutral_mood_without_context() {
        let model = ScriptedModel::replying(Some("Hello"));
        generate_reflection_prompt(&model, &PromptContext::default()).await;
        assert_eq!(model.seen.lock().unwrap()[0].mood, "neutral");
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_fresh_static_prompt() {
        let model = ScriptedModel::replying(None);
        let used: Vec<String> = FALLBACK_PROMPTS[1..].iter().map(|p| p.to_string()).collect();
        let ctx = PromptContext {
            mood: Some(Mood::Sad),
            prompt_history: &used,
            ..Default::default()
        };

        let result = generate_reflection_prompt(&model, &ctx).await;
        assert_eq!(result.source, PromptSource::Fallback);
        assert_eq!(result.prompt, FALLBACK_PROMPTS[0]);
        assert!(result.error.unwrap().contains("529"));
    }
}
