//! Prompt construction for the two post flavours.
//!
//! Comments arrive from the discussion API as an HTML fragment; they get
//! stripped, entity-decoded and truncated here so the model only ever sees
//! plain text of a bounded size.

use std::sync::OnceLock;

use regex::Regex;

/// Longest discussion excerpt we will put in front of the model, in chars.
pub const TOP_COMMENT_MAX_CHARS: usize = 500;

/// System prompt shared by both flavours. The JSON envelope is the contract
/// that [`crate::parse::parse_post`] relies on.
pub const SYSTEM_PROMPT: &str = r#"You are a sharp, funny writer for a small social media account. Your posts read like a clever human wrote them: conversational, specific, never corporate. No hashtag soup, at most one emoji, no exclamation-point pileups.

Reply with ONLY a JSON object of the form {"tweet": "..."} and nothing else around it. The tweet value must be 280 characters or fewer."#;

/// Source material for one post.
#[derive(Debug, Clone)]
pub enum PostMaterial {
    /// Two random words to riff on.
    WordPair { first: String, second: String },
    /// A trending story, with the top reply from its discussion when one
    /// carried any text.
    Story {
        title: String,
        url: String,
        top_comment: Option<String>,
    },
}

/// Render the user prompt for a piece of material.
pub fn build_prompt(material: &PostMaterial) -> String {
    match material {
        PostMaterial::WordPair { first, second } => format!(
            "Write a tweet inspired by these two random words: \"{first}\" and \"{second}\". \
             Work both words in naturally; the connection between them is yours to invent."
        ),
        PostMaterial::Story {
            title,
            url,
            top_comment,
        } => {
            let mut prompt = format!(
                "Write a tweet reacting to this trending story.\n\nTitle: {title}\nLink: {url}\n"
            );
            if let Some(comment) = top_comment {
                let cleaned = clean_comment(comment);
                if !cleaned.is_empty() {
                    let excerpt = truncate_chars(&cleaned, TOP_COMMENT_MAX_CHARS);
                    prompt.push_str(&format!("\nWhat readers are saying: {excerpt}\n"));
                }
            }
            prompt.push_str(
                "\nReact with your own take; do not just restate the headline. \
                 Do not include the link in the tweet.",
            );
            prompt
        }
    }
}

/// Reduce a discussion-API HTML fragment to plain text.
///
/// Tags become spaces, the handful of entities the API actually emits are
/// decoded, and whitespace is collapsed to single spaces.
pub fn clean_comment(raw: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("comment tag regex"));

    let stripped = tag_re.replace_all(raw, " ");
    // `&amp;` last, so an escaped entity decodes to its literal spelling
    // rather than decoding twice.
    let decoded = stripped
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&#39;", "'")
        .replace("&#x2F;", "/")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters, on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
