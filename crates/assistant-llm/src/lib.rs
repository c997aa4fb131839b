pub mod assistant;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod providers;

pub use assistant::{AssistantPersona, ChatAssistant, SendOutcome};
pub use error::LLMError;
pub use protocol::{ParsedReply, ProtocolError};
pub use provider::{GenerationSettings, LLMProvider, Prompt, Result};
pub use providers::GeminiProvider;
