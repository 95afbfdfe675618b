//! Wire types for the trending-discussion API.

use serde::{Deserialize, Serialize};

/// One item from the discussion API. Stories and comments share this shape;
/// absent fields decode to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub descendants: Option<u64>,
    #[serde(default)]
    pub kids: Vec<u64>,
    #[serde(default)]
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub parent: Option<u64>,
}

impl Item {
    /// A story qualifies as post material when it links somewhere and has at
    /// least one reply to quote. Text-only posts never qualify.
    pub fn is_postable_story(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty()) && !self.kids.is_empty()
    }
}

/// A selected story plus the first textual reply beneath it. The reply text
/// is kept raw; prompt building handles markup stripping.
#[derive(Debug, Clone)]
pub struct Story {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub top_comment: String,
}
