pub use crate::provider::LLMError;
