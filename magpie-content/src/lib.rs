//! Source material for posts: a random word pair, or a trending story with
//! the top reply from its discussion.
//!
//! The trending source owns the rolling dedup window that keeps the bot from
//! posting the same story twice in a day; [`dedup::DedupCache`] holds the
//! exact rules and [`trending::TrendingSource`] the two-pass selection that
//! sits on top of it.

pub mod dedup;
pub mod trending;
pub mod types;
pub mod words;

pub use trending::TrendingSource;
pub use types::Story;
pub use words::WordPairClient;

use magpie_common::MagpieError;
use magpie_http::HttpError;

pub(crate) fn http_to_magpie(err: HttpError) -> MagpieError {
    MagpieError::Content(err.to_string())
}
