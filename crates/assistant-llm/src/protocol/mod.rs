//! Wire formats for the generative endpoint.
//!
//! Internal request types convert into provider types through [`ToProvider`];
//! provider responses are reduced to a [`ParsedReply`].

mod errors;
pub mod gemini;

pub use errors::{ProtocolError, ProtocolResult};
pub use gemini::ParsedReply;

/// Trait for converting internal types to provider-specific types.
pub trait ToProvider<T>: Sized {
    fn to_provider(&self) -> ProtocolResult<T>;
}
