//! Chat-bot delivery. Quiet by design: notifications and link previews are
//! both suppressed on every message.

use serde::{Deserialize, Serialize};

use magpie_common::{MagpieError, Result};
use magpie_http::{HttpClient, RequestOpts};

use crate::http_to_magpie;

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org/";

#[derive(Clone)]
pub struct TelegramApi {
    http: HttpClient,
    token: String,
    chat_id: String,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
    disable_notification: bool,
}

#[derive(Debug, Deserialize)]
struct SendMessageResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramApi {
    pub fn new(token: String, chat_id: String) -> Result<Self> {
        Self::with_base(TELEGRAM_API_BASE, token, chat_id)
    }

    /// Same client against a different base URL. Tests point this at a mock
    /// server.
    pub fn with_base(base: &str, token: String, chat_id: String) -> Result<Self> {
        let http = HttpClient::new(base).map_err(http_to_magpie)?;
        Ok(Self {
            http,
            token,
            chat_id,
        })
    }

    /// Send one MarkdownV2 message. The caller escapes markup beforehand.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        // The token carries a colon; the leading "./" keeps the first path
        // segment from being read as a URL scheme during resolution.
        let path = format!("./bot{}/sendMessage", self.token);
        let response: SendMessageResponse = self
            .http
            .post_json(
                &path,
                &SendMessageRequest {
                    chat_id: &self.chat_id,
                    text,
                    parse_mode: "MarkdownV2",
                    disable_web_page_preview: true,
                    disable_notification: true,
                },
                RequestOpts::default(),
            )
            .await
            .map_err(http_to_magpie)?;

        if !response.ok {
            return Err(MagpieError::Publish(format!(
                "chat API rejected message: {}",
                response.description.as_deref().unwrap_or("no description")
            )));
        }
        tracing::debug!(chat_id = %self.chat_id, "telegram.sent");
        Ok(())
    }
}
