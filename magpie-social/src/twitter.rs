//! Posting to the microblog's v2 write endpoint with a hand-signed
//! user-context header.

use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};

use magpie_common::{MagpieError, Result};
use magpie_http::{Auth, HttpClient, RequestOpts};

use crate::http_to_magpie;
use crate::oauth::{self, OAuthCredentials};

pub const TWITTER_API_BASE: &str = "https://api.twitter.com/";

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    creds: OAuthCredentials,
}

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    #[serde(default)]
    data: Option<TweetData>,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
}

impl TwitterApi {
    pub fn new(creds: OAuthCredentials) -> Result<Self> {
        Self::with_base(TWITTER_API_BASE, creds)
    }

    /// Same client against a different base URL. Tests point this at a mock
    /// server.
    pub fn with_base(base: &str, creds: OAuthCredentials) -> Result<Self> {
        let http = HttpClient::new(base).map_err(http_to_magpie)?;
        Ok(Self { http, creds })
    }

    /// Publish one post, returning the created status id.
    ///
    /// The signature covers only the protocol parameters; a JSON body never
    /// enters the base string.
    pub async fn post_status(&self, text: &str) -> Result<String> {
        let url = self.http.join("2/tweets").map_err(http_to_magpie)?;
        let header = oauth::sign(&self.creds, "POST", url.as_str(), &[]);
        let header_value = HeaderValue::from_str(&header)
            .map_err(|e| MagpieError::Publish(format!("authorization header: {e}")))?;

        let response: CreateTweetResponse = self
            .http
            .post_json(
                "2/tweets",
                &CreateTweetRequest { text },
                RequestOpts {
                    auth: Some(Auth::Header {
                        name: AUTHORIZATION,
                        value: header_value,
                    }),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_magpie)?;

        let id = response.data.map(|data| data.id).unwrap_or_default();
        tracing::debug!(status_id = %id, "twitter.posted");
        Ok(id)
    }
}
