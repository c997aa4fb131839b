//! site_core - Shared building blocks for the portfolio site clients
//!
//! - `config` - file and environment backed configuration
//! - `message` - chat transcript entries
//! - `timer` - one-shot timers with a real and a manual implementation

pub mod config;
pub mod message;
pub mod timer;

pub use config::{AssistantConfig, Config, ConfigError, MailConfig};
pub use message::{Message, Role, Transcript};
pub use timer::{ManualTimer, Timer, TimerHandle, TimerTask, TokioTimer};
