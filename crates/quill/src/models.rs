//! Objects passed between the agent, the provider, and the toolkit.
//!
//! The provider's wire format (OpenAI-style chat completions) is converted
//! into these internal structs at the provider boundary; nothing outside
//! `providers` sees the wire shapes.
pub mod message;
pub mod tool;
