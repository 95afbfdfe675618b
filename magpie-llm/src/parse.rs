//! Turning raw model replies into post text.
//!
//! Models mostly follow the envelope contract, but some wrap the JSON in a
//! markdown code fence anyway. Parsing tries the strict reading first and
//! falls back to unfencing; anything else is treated as no post, never as an
//! error.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;

/// The envelope the system prompt asks for. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct PostEnvelope {
    tweet: String,
}

type ParseStrategy = fn(&str) -> Option<PostEnvelope>;

const STRATEGIES: &[ParseStrategy] = &[parse_strict, parse_fenced];

/// Extract the post text from a raw model reply.
///
/// Returns `None` when the reply is not the expected envelope or carries an
/// empty post; the caller decides whether that is worth logging.
pub fn parse_post(raw: &str) -> Option<String> {
    let envelope = STRATEGIES.iter().find_map(|strategy| strategy(raw));
    let Some(envelope) = envelope else {
        tracing::debug!(snippet = %snippet(raw), "llm.parse.miss");
        return None;
    };

    let text = envelope.tweet.trim();
    if text.is_empty() {
        tracing::debug!("llm.parse.empty_tweet");
        return None;
    }
    Some(text.to_string())
}

fn parse_strict(raw: &str) -> Option<PostEnvelope> {
    serde_json::from_str(raw.trim()).ok()
}

/// Strip one outer code fence (with or without a language tag) and re-parse.
fn parse_fenced(raw: &str) -> Option<PostEnvelope> {
    static FENCE_RE: OnceLock<Regex> = OnceLock::new();
    let fence_re = FENCE_RE.get_or_init(|| {
        Regex::new(r"(?s)^\s*```[A-Za-z0-9_+-]*\s*(.*?)\s*```\s*$").expect("fence regex")
    });

    let captures = fence_re.captures(raw)?;
    serde_json::from_str(captures.get(1)?.as_str()).ok()
}

fn snippet(raw: &str) -> &str {
    let end = raw
        .char_indices()
        .nth(120)
        .map(|(idx, _)| idx)
        .unwrap_or(raw.len());
    &raw[..end]
}
