//! Fan-out of one finished post to every configured surface.

use crate::escape::escape_markup;
use crate::telegram::TelegramApi;
use crate::twitter::TwitterApi;

/// Delivery fan-out. Each surface is optional; a surface without credentials
/// simply is not here, so publishing degrades to a no-op for it.
pub struct Publisher {
    twitter: Option<TwitterApi>,
    telegram: Option<TelegramApi>,
}

impl Publisher {
    pub fn new(twitter: Option<TwitterApi>, telegram: Option<TelegramApi>) -> Self {
        Self { twitter, telegram }
    }

    /// Whether any surface is configured at all.
    pub fn has_surface(&self) -> bool {
        self.twitter.is_some() || self.telegram.is_some()
    }

    /// Deliver `text` to every configured surface.
    ///
    /// The microblog gets the raw text; the chat surface gets it escaped and
    /// prefixed with `chat_prefix` (which is trusted markup and not escaped).
    /// Returns true when at least one surface accepted the post. A surface
    /// failure is logged and never blocks the other surface.
    pub async fn publish(&self, text: &str, chat_prefix: &str) -> bool {
        let mut delivered = false;

        if let Some(twitter) = &self.twitter {
            match twitter.post_status(text).await {
                Ok(id) => {
                    tracing::info!(status_id = %id, "publish.microblog.ok");
                    delivered = true;
                }
                Err(err) => tracing::warn!(error = %err, "publish.microblog.failed"),
            }
        } else {
            tracing::debug!("publish.microblog.unconfigured");
        }

        if let Some(telegram) = &self.telegram {
            let message = format!("{chat_prefix}{}", escape_markup(text));
            match telegram.send_message(&message).await {
                Ok(()) => {
                    tracing::info!("publish.chat.ok");
                    delivered = true;
                }
                Err(err) => tracing::warn!(error = %err, "publish.chat.failed"),
            }
        } else {
            tracing::debug!("publish.chat.unconfigured");
        }

        delivered
    }
}
