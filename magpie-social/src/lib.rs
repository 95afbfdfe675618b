//! Delivery surfaces for finished posts.
//!
//! The microblog side signs every request by hand with OAuth 1.0a
//! ([`oauth`]); the chat side needs markup escaping ([`escape`]) but plain
//! bot-token auth. [`publisher::Publisher`] fans one post out to whichever
//! surfaces are configured and reports whether anyone accepted it.

pub mod escape;
pub mod oauth;
pub mod publisher;
pub mod telegram;
pub mod twitter;

pub use escape::escape_markup;
pub use oauth::OAuthCredentials;
pub use publisher::Publisher;
pub use telegram::TelegramApi;
pub use twitter::TwitterApi;

use magpie_common::MagpieError;
use magpie_http::HttpError;

pub(crate) fn http_to_magpie(err: HttpError) -> MagpieError {
    MagpieError::Publish(err.to_string())
}
