//! Random word pairs from the public word service.

use magpie_common::{MagpieError, Result};
use magpie_http::{HttpClient, RequestOpts};

use crate::http_to_magpie;

pub const WORD_API_BASE: &str = "https://random-word-api.herokuapp.com/";

#[derive(Clone)]
pub struct WordPairClient {
    http: HttpClient,
}

impl WordPairClient {
    pub fn new() -> Result<Self> {
        Self::with_base(WORD_API_BASE)
    }

    /// Same client against a different base URL. Tests point this at a mock
    /// server.
    pub fn with_base(base: &str) -> Result<Self> {
        let http = HttpClient::new(base).map_err(http_to_magpie)?;
        Ok(Self { http })
    }

    /// Fetch exactly two words. Anything else the service sends back is a
    /// content failure, not something to paper over.
    pub async fn fetch_pair(&self) -> Result<(String, String)> {
        let words: Vec<String> = self
            .http
            .get_json(
                "word",
                RequestOpts {
                    query: Some(vec![("number", "2".into())]),
                    ..Default::default()
                },
            )
            .await
            .map_err(http_to_magpie)?;

        tracing::debug!(?words, "words.fetched");
        match <[String; 2]>::try_from(words) {
            Ok([first, second]) if !first.trim().is_empty() && !second.trim().is_empty() => {
                Ok((first, second))
            }
            Ok(pair) => Err(MagpieError::Content(format!(
                "word service returned blank words: {pair:?}"
            ))),
            Err(words) => Err(MagpieError::Content(format!(
                "word service returned {} words, wanted 2",
                words.len()
            ))),
        }
    }
}
