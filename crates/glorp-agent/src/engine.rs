//! AI response engine.
//!
//! One completion may be in flight per process. The guard is a capacity limit,
//! not a data-race protection: a second caller is told the bot is busy instead
//! of being queued behind the first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::{error, info, warn};

use glorp_core::config::{GlorpConfig, DEFAULT_SYSTEM_PROMPT};
use glorp_core::Backoff;

use crate::history::{ConversationTurn, HistoryStore};
use crate::provider::{ChatRequest, LlmProvider, Message, ProviderError, Role};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("another completion is already in flight")]
    Busy,

    #[error("completion timed out after {attempts} attempts")]
    TimedOut { attempts: u32 },

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Model, prompt, and retry settings for [`AiEngine`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub model: String,
    pub system_prompt: String,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Attempts and delays for timed-out calls.
    pub backoff: Backoff,
}

impl EngineSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            backoff: Backoff::default(),
        }
    }

    pub fn from_config(config: &GlorpConfig) -> glorp_core::Result<Self> {
        let resolved = config.resolve_model()?;
        let system_prompt = if config.system_prompt.trim().is_empty() {
            DEFAULT_SYSTEM_PROMPT.to_string()
        } else {
            config.system_prompt.clone()
        };
        Ok(Self {
            model: resolved.model,
            system_prompt,
            timeout: Duration::from_secs(config.ai.timeout_secs),
            backoff: Backoff::new(
                Duration::from_millis(config.ai.backoff_base_ms),
                config.ai.max_attempts,
            ),
        })
    }
}

/// Builds prompts, calls the provider with timeout and retry, and keeps
/// channel history up to date.
pub struct AiEngine {
    provider: Arc<dyn LlmProvider>,
    history: Arc<HistoryStore>,
    settings: EngineSettings,
    guard: Mutex<()>,
}

/// Proof that the caller holds the engine's single completion slot.
///
/// Dropping it frees the slot, so every exit path releases the guard.
pub struct AiPermit<'a> {
    engine: &'a AiEngine,
    _slot: MutexGuard<'a, ()>,
}

impl AiEngine {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        history: Arc<HistoryStore>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            provider,
            history,
            settings,
            guard: Mutex::new(()),
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn is_busy(&self) -> bool {
        self.guard.try_lock().is_err()
    }

    /// Claim the completion slot without waiting.
    pub fn try_acquire(&self) -> Result<AiPermit<'_>, EngineError> {
        let slot = self.guard.try_lock().map_err(|_| EngineError::Busy)?;
        Ok(AiPermit {
            engine: self,
            _slot: slot,
        })
    }

    /// Acquire the slot and run one completion.
    pub async fn respond(
        &self,
        channel_id: u64,
        new_message: &str,
        prior: Vec<ConversationTurn>,
    ) -> Result<String, EngineError> {
        self.try_acquire()?
            .respond(channel_id, new_message, prior)
            .await
    }

    /// System prompt, then prior turns oldest first, then the new user turn.
    pub fn build_messages(&self, prior: &[ConversationTurn], new_message: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(prior.len() + 2);
        messages.push(Message::new(Role::System, self.settings.system_prompt.clone()));
        messages.extend(prior.iter().map(ConversationTurn::to_message));
        messages.push(Message::new(Role::User, new_message));
        messages
    }
}

impl AiPermit<'_> {
    /// Answer `new_message` in the context of `prior` and store the exchange
    /// as the channel's history on success.
    pub async fn respond(
        self,
        channel_id: u64,
        new_message: &str,
        prior: Vec<ConversationTurn>,
    ) -> Result<String, EngineError> {
        let engine = self.engine;
        let messages = engine.build_messages(&prior, new_message);
        info!(
            channel_id,
            provider = %engine.provider.name(),
            history = prior.len(),
            "processing AI chat request"
        );

        let reply = self.complete(channel_id, messages).await?;
        engine
            .history
            .record_exchange(channel_id, prior, new_message, &reply, Instant::now());
        Ok(reply)
    }

    /// Single-turn completion that leaves channel history alone.
    pub async fn ask(self, channel_id: u64, prompt: &str) -> Result<String, EngineError> {
        let messages = self.engine.build_messages(&[], prompt);
        info!(channel_id, "processing one-shot AI request");
        self.complete(channel_id, messages).await
    }

    /// Call the provider with timeout and exponential backoff.
    ///
    /// Only timeouts are retried. After the last timed-out attempt the final
    /// backoff delay still elapses before [`EngineError::TimedOut`] is
    /// returned.
    async fn complete(&self, channel_id: u64, messages: Vec<Message>) -> Result<String, EngineError> {
        let engine = self.engine;
        let settings = &engine.settings;
        let req = ChatRequest {
            model: settings.model.clone(),
            messages,
        };
        let attempts = settings.backoff.max_attempts;

        for attempt in 0..attempts {
            match tokio::time::timeout(settings.timeout, engine.provider.send(&req)).await {
                Ok(Ok(resp)) => {
                    info!(
                        channel_id,
                        model = %resp.model,
                        tokens_in = resp.tokens_in,
                        tokens_out = resp.tokens_out,
                        attempt = attempt + 1,
                        "AI chat complete"
                    );
                    return Ok(resp.content.trim().to_string());
                }
                Ok(Err(e)) => {
                    error!(channel_id, error = %e, "error generating AI response");
                    return Err(EngineError::Provider(e));
                }
                Err(_) => {
                    let delay = settings.backoff.delay(attempt);
                    warn!(
                        channel_id,
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        timeout_secs = settings.timeout.as_secs(),
                        delay_ms = delay.as_millis() as u64,
                        "AI request timed out, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        error!(channel_id, attempts, "max retries reached for AI request");
        Err(EngineError::TimedOut { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChatResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    enum Step {
        Reply(&'static str),
        Hang,
        Fail,
        Wait(Arc<Notify>),
    }

    /// Replays a fixed script; the last step repeats forever.
    struct ScriptedProvider {
        script: std::sync::Mutex<VecDeque<Step>>,
        calls: AtomicU32,
        seen: std::sync::Mutex<Vec<ChatRequest>>,
        started: Notify,
    }

    impl ScriptedProvider {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                script: std::sync::Mutex::new(steps.into()),
                calls: AtomicU32::new(0),
                seen: std::sync::Mutex::new(Vec::new()),
                started: Notify::new(),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn next_step(&self) -> Step {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                return script.pop_front().unwrap();
            }
            match script.front().unwrap() {
                Step::Reply(s) => Step::Reply(s),
                Step::Hang => Step::Hang,
                Step::Fail => Step::Fail,
                Step::Wait(n) => Step::Wait(Arc::clone(n)),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(req.clone());
            self.started.notify_one();
            let content = match self.next_step() {
                Step::Reply(s) => s.to_string(),
                Step::Hang => std::future::pending::<String>().await,
                Step::Fail => {
                    return Err(ProviderError::Api {
                        status: 500,
                        message: "boom".to_string(),
                    })
                }
                Step::Wait(release) => {
                    release.notified().await;
                    "finally".to_string()
                }
            };
            Ok(ChatResponse {
                content,
                model: req.model.clone(),
                tokens_in: 1,
                tokens_out: 1,
                stop_reason: "stop".to_string(),
            })
        }
    }

    fn engine(provider: Arc<ScriptedProvider>) -> AiEngine {
        AiEngine::new(
            provider,
            Arc::new(HistoryStore::default()),
            EngineSettings::new("test-model"),
        )
    }

    fn prior(n: usize) -> Vec<ConversationTurn> {
        (0..n)
            .map(|i| {
                let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
                ConversationTurn::new(role, format!("turn {i}"), Instant::now())
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn prompt_is_system_then_history_then_user() {
        let provider = ScriptedProvider::new(vec![Step::Reply(" hello! ")]);
        let engine = engine(Arc::clone(&provider));

        let reply = engine.respond(5, "how are you", prior(2)).await.unwrap();
        assert_eq!(reply, "hello!");

        let seen = provider.seen.lock().unwrap();
        let messages = &seen[0].messages;
        assert_eq!(seen[0].model, "test-model");
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::new(Role::System, DEFAULT_SYSTEM_PROMPT));
        assert_eq!(messages[1], Message::new(Role::User, "turn 0"));
        assert_eq!(messages[2], Message::new(Role::Assistant, "turn 1"));
        assert_eq!(messages[3], Message::new(Role::User, "how are you"));
    }

    #[tokio::test(start_paused = true)]
    async fn success_updates_history_and_caps_it() {
        let provider = ScriptedProvider::new(vec![Step::Reply("reply")]);
        let engine = engine(provider);

        engine.respond(5, "new question", prior(20)).await.unwrap();

        let stored = engine.history().get(5);
        assert_eq!(stored.len(), 20);
        assert_eq!(stored[18].content, "new question");
        assert_eq!(stored[19].content, "reply");
        assert_eq!(stored[19].role, Role::Assistant);
    }

    #[tokio::test(start_paused = true)]
    async fn timeouts_retry_with_doubling_backoff_then_give_up() {
        let provider = ScriptedProvider::new(vec![Step::Hang]);
        let engine = engine(Arc::clone(&provider));
        let before = prior(2);
        engine.history().store(5, before.clone());

        let started = Instant::now();
        let err = engine.respond(5, "hello?", before.clone()).await.unwrap_err();

        assert!(matches!(err, EngineError::TimedOut { attempts: 5 }));
        assert_eq!(provider.calls(), 5);
        // five 120s timeouts plus 1 + 2 + 4 + 8 + 16 seconds of backoff
        assert_eq!(started.elapsed(), Duration::from_secs(5 * 120 + 31));
        assert_eq!(engine.history().get(5), before);
        assert!(!engine.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_then_success_recovers() {
        let provider = ScriptedProvider::new(vec![Step::Hang, Step::Hang, Step::Reply("late")]);
        let engine = engine(Arc::clone(&provider));

        let started = Instant::now();
        let reply = engine.respond(1, "q", Vec::new()).await.unwrap();
        assert_eq!(reply, "late");
        assert_eq!(provider.calls(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2 * 120 + 1 + 2));
    }

    #[tokio::test(start_paused = true)]
    async fn hard_failure_is_not_retried() {
        let provider = ScriptedProvider::new(vec![Step::Fail]);
        let engine = engine(Arc::clone(&provider));

        let err = engine.respond(1, "q", Vec::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Provider(ProviderError::Api { status: 500, .. })));
        assert_eq!(provider.calls(), 1);
        assert!(engine.history().is_empty());
        assert!(!engine.is_busy());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_call_is_rejected_as_busy() {
        let release = Arc::new(Notify::new());
        let provider = ScriptedProvider::new(vec![Step::Wait(Arc::clone(&release)), Step::Reply("second")]);
        let engine = Arc::new(engine(Arc::clone(&provider)));

        let first = {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move { engine.respond(1, "first", Vec::new()).await })
        };
        provider.started.notified().await;

        let err = engine.respond(2, "second", Vec::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::Busy));
        assert_eq!(provider.calls(), 1);

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), "finally");

        // Slot is free again once the first call finished.
        assert_eq!(engine.respond(2, "again", Vec::new()).await.unwrap(), "second");
    }

    #[tokio::test(start_paused = true)]
    async fn ask_does_not_touch_history() {
        let provider = ScriptedProvider::new(vec![Step::Reply("summary")]);
        let engine = engine(Arc::clone(&provider));

        let reply = engine.try_acquire().unwrap().ask(3, "summarize this").await.unwrap();
        assert_eq!(reply, "summary");
        assert!(engine.history().is_empty());

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].messages.len(), 2);
        assert_eq!(seen[0].messages[1], Message::new(Role::User, "summarize this"));
    }
}
