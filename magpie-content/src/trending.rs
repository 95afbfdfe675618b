//! Trending-story selection: a dedup-filtered scan over the ranked ids with
//! a clear-and-rescan fallback when everything near the top has already been
//! posted.

use chrono::Utc;
use tokio::sync::Mutex;

use magpie_common::Result;
use magpie_http::{HttpClient, RequestOpts};

use crate::dedup::DedupCache;
use crate::http_to_magpie;
use crate::types::{Item, Story};

pub const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0/";

/// Ranked ids examined in the dedup-filtered pass.
pub const SCAN_LIMIT: usize = 30;
/// Ranked ids examined after the dedup set is cleared by the fallback.
pub const FALLBACK_SCAN_LIMIT: usize = 10;
/// Replies probed for quotable text under the selected story.
pub const REPLY_PROBE_LIMIT: usize = 3;

pub struct TrendingSource {
    http: HttpClient,
    // Held across the whole selection pass so the window roll, scan and
    // insert happen as one step.
    cache: Mutex<DedupCache>,
}

impl TrendingSource {
    pub fn new() -> Result<Self> {
        Self::with_base(HN_API_BASE)
    }

    /// Same source against a different base URL. Tests point this at a mock
    /// server.
    pub fn with_base(base: &str) -> Result<Self> {
        let http = HttpClient::new(base).map_err(http_to_magpie)?;
        Ok(Self {
            http,
            cache: Mutex::new(DedupCache::new(Utc::now())),
        })
    }

    /// Pick the next story to post.
    ///
    /// `Ok(None)` means nothing qualified right now, which is a normal
    /// outcome, not a failure. A selected story always carries a textual
    /// reply; a winner whose first replies are all textless is dropped, but
    /// its id stays in the dedup set so the next run moves on.
    pub async fn select_story(&self) -> Result<Option<Story>> {
        let ids = self.fetch_ranked_ids().await?;
        let mut cache = self.cache.lock().await;
        cache.roll_window(Utc::now());

        let mut scanned = 0usize;
        let mut dedup_skipped = 0usize;
        let mut winner: Option<Item> = None;

        for &id in ids.iter().take(SCAN_LIMIT) {
            scanned += 1;
            if cache.contains(id) {
                dedup_skipped += 1;
                continue;
            }
            if let Some(item) = self.fetch_item(id).await? {
                if item.is_postable_story() {
                    winner = Some(item);
                    break;
                }
            }
        }

        // Every ranked candidate is something we already posted: start the
        // window over and take the head of the list unfiltered, so a post is
        // still attempted whenever any valid candidate exists.
        if winner.is_none() && scanned > 0 && dedup_skipped == scanned && !cache.is_empty() {
            tracing::info!(scanned, "trending.dedup_exhausted");
            cache.reset(Utc::now());
            for &id in ids.iter().take(FALLBACK_SCAN_LIMIT) {
                if let Some(item) = self.fetch_item(id).await? {
                    if item.is_postable_story() {
                        winner = Some(item);
                        break;
                    }
                }
            }
        }

        let Some(item) = winner else {
            tracing::info!("trending.no_candidate");
            return Ok(None);
        };
        cache.insert(item.id);
        drop(cache);

        let Some(top_comment) = self.probe_top_comment(&item).await else {
            tracing::info!(story_id = item.id, "trending.no_textual_reply");
            return Ok(None);
        };

        tracing::debug!(story_id = item.id, "trending.selected");
        Ok(Some(Story {
            id: item.id,
            title: item.title.clone().unwrap_or_default(),
            url: item.url.clone().unwrap_or_default(),
            top_comment,
        }))
    }

    async fn fetch_ranked_ids(&self) -> Result<Vec<u64>> {
        self.http
            .get_json("topstories.json", RequestOpts::default())
            .await
            .map_err(http_to_magpie)
    }

    /// The API answers `null` for ids that no longer resolve; that decodes
    /// to `None` here rather than an error.
    async fn fetch_item(&self, id: u64) -> Result<Option<Item>> {
        self.http
            .get_json(&format!("item/{id}.json"), RequestOpts::default())
            .await
            .map_err(http_to_magpie)
    }

    /// First reply among the first [`REPLY_PROBE_LIMIT`] with any text.
    /// A reply fetch that fails counts as textless.
    async fn probe_top_comment(&self, story: &Item) -> Option<String> {
        for &kid in story.kids.iter().take(REPLY_PROBE_LIMIT) {
            match self.fetch_item(kid).await {
                Ok(Some(reply)) => {
                    if let Some(text) = reply.text.as_deref() {
                        if !text.trim().is_empty() {
                            return Some(text.to_string());
                        }
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(reply_id = kid, error = %err, "trending.reply_fetch_failed");
                }
            }
        }
        None
    }
}
