pub mod engine;
pub mod history;
pub mod openai;
pub mod provider;

pub use engine::{AiEngine, AiPermit, EngineError, EngineSettings};
pub use history::{ConversationTurn, HistoryStore};
pub use provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError, Role};
