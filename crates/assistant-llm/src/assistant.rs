//! Chat assistant flow: transcript bookkeeping around single-turn requests.
//!
//! Each call to [`ChatAssistant::send_message`] appends the user's text right
//! away, sends exactly one prompt (system prompt plus the new turn, no
//! history), and appends one assistant reply. Failures never escape: they
//! become a fallback message in the transcript.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use site_core::{Config, Message, Transcript};

use crate::protocol::ParsedReply;
use crate::provider::{GenerationSettings, LLMProvider, Prompt};

pub const UNPROCESSABLE_REPLY: &str = "Sorry, I couldn't process that. Please try again.";

/// Text and contact details the assistant speaks with.
#[derive(Debug, Clone)]
pub struct AssistantPersona {
    pub owner: String,
    pub contact_email: String,
    pub greeting: String,
    pub system_prompt: String,
}

impl AssistantPersona {
    pub fn from_config(config: &Config) -> Self {
        Self {
            owner: config.owner.clone(),
            contact_email: config.contact_email.clone(),
            greeting: config.greeting(),
            system_prompt: config.system_prompt(),
        }
    }

    pub fn connection_fallback(&self) -> String {
        format!(
            "Sorry, I'm having trouble connecting. Please try again or contact {} directly at {}",
            self.owner, self.contact_email
        )
    }

    fn compose_prompt(&self, user_text: &str) -> String {
        format!("{}\n\nUser: {}\n\nAssistant:", self.system_prompt, user_text)
    }
}

/// What a call to [`ChatAssistant::send_message`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Input was blank; nothing happened.
    Empty,
    /// Another request was in flight; nothing happened.
    Busy,
    /// The provider's reply text was appended.
    Replied,
    /// The response had no reply text; the unprocessable fallback was appended.
    Malformed,
    /// The request failed; the connection fallback was appended.
    Failed,
}

pub struct ChatAssistant {
    provider: Arc<dyn LLMProvider>,
    persona: AssistantPersona,
    settings: GenerationSettings,
    transcript: Mutex<Transcript>,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when dropped, including on cancellation.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl ChatAssistant {
    pub fn new(provider: Arc<dyn LLMProvider>, persona: AssistantPersona) -> Self {
        let transcript = Transcript::new(persona.greeting.clone());
        Self {
            provider,
            persona,
            settings: GenerationSettings::default(),
            transcript: Mutex::new(transcript),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &Config) -> Self {
        Self::new(provider, AssistantPersona::from_config(config))
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn transcript(&self) -> Transcript {
        self.lock_transcript().clone()
    }

    fn lock_transcript(&self) -> MutexGuard<'_, Transcript> {
        self.transcript
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn append(&self, message: Message) {
        self.lock_transcript().push(message);
    }

    pub async fn send_message(&self, user_text: &str) -> SendOutcome {
        let text = user_text.trim();
        if text.is_empty() {
            return SendOutcome::Empty;
        }

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            log::debug!("Chat request already in flight, ignoring new message");
            return SendOutcome::Busy;
        };

        self.append(Message::user(text));

        let prompt = Prompt::new(self.persona.compose_prompt(text), self.settings);
        let (reply, outcome) = match self.provider.generate(&prompt).await {
            Ok(ParsedReply::Text(reply)) => (reply, SendOutcome::Replied),
            Ok(ParsedReply::Malformed) => {
                log::warn!("Gemini response had no reply text");
                (UNPROCESSABLE_REPLY.to_string(), SendOutcome::Malformed)
            }
            Err(e) => {
                log::error!("Gemini API error: {}", e);
                (self.persona.connection_fallback(), SendOutcome::Failed)
            }
        };

        self.append(Message::assistant(reply));
        outcome
    }
}
