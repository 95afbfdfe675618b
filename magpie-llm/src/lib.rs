//! Completion backends for magpie.
//!
//! The [`traits::LlmClient`] trait is the seam between the bot and whatever
//! model is behind it. The only production backend is OpenAI's Responses API
//! ([`openai::OpenAiClient`]); tests stand up mock servers against the same
//! trait. Prompt construction lives in [`prompt`] and reply handling in
//! [`parse`] so the two can be unit-tested without a network in sight.

pub mod openai;
pub mod parse;
pub mod prompt;
pub mod traits;

pub use traits::{LlmClient, LlmResponse};
