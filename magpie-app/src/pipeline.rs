//! The two job pipelines: fetch material, compose a post, fan it out.
//!
//! Upstream fetch and completion failures bubble up as errors and end the
//! run; an unusable model reply, a missing completion key, or no fresh
//! story are quiet no-ops. Delivery failures are logged per surface inside
//! the publisher and never abort the run.

use magpie_llm::prompt::PostMaterial;
use uuid::Uuid;

use crate::bot::Bot;

/// Chat-surface prefix for word-pair posts; prepended after escaping, so
/// the markup in it stays live.
const WORDS_CHAT_PREFIX: &str = "🎲 *Wordplay:* ";
/// Chat-surface prefix for trending-story posts.
const STORY_CHAT_PREFIX: &str = "🔥 *Trending:* ";

/// Post a riff on a pair of random words.
pub async fn run_words(bot: &Bot, override_text: Option<String>) -> anyhow::Result<()> {
    let run = Uuid::new_v4();

    if let Some(text) = override_text {
        tracing::info!(%run, "words.override");
        publish(bot, &text, WORDS_CHAT_PREFIX, run).await;
        return Ok(());
    }

    let Some(completion) = bot.completion.as_ref() else {
        tracing::info!(%run, "words.no_completion");
        return Ok(());
    };

    let (first, second) = bot.words.fetch_pair().await?;
    tracing::info!(%run, %first, %second, "words.pair");

    let material = PostMaterial::WordPair { first, second };
    let Some(text) = completion.compose_post(&material).await? else {
        tracing::info!(%run, "words.no_post");
        return Ok(());
    };

    publish(bot, &text, WORDS_CHAT_PREFIX, run).await;
    Ok(())
}

/// Post a take on a trending story and its top reply.
pub async fn run_story(bot: &Bot, override_text: Option<String>) -> anyhow::Result<()> {
    let run = Uuid::new_v4();

    if let Some(text) = override_text {
        tracing::info!(%run, "story.override");
        publish(bot, &text, STORY_CHAT_PREFIX, run).await;
        return Ok(());
    }

    let Some(completion) = bot.completion.as_ref() else {
        tracing::info!(%run, "story.no_completion");
        return Ok(());
    };

    let Some(story) = bot.trending.select_story().await? else {
        tracing::info!(%run, "story.nothing_fresh");
        return Ok(());
    };
    tracing::info!(%run, id = story.id, title = %story.title, "story.selected");

    let material = PostMaterial::Story {
        title: story.title,
        url: story.url,
        top_comment: Some(story.top_comment),
    };
    let Some(text) = completion.compose_post(&material).await? else {
        tracing::info!(%run, "story.no_post");
        return Ok(());
    };

    publish(bot, &text, STORY_CHAT_PREFIX, run).await;
    Ok(())
}

async fn publish(bot: &Bot, text: &str, chat_prefix: &str, run: Uuid) {
    if !bot.publisher.has_surface() {
        tracing::info!(%run, "post.no_surfaces");
        return;
    }
    if bot.publisher.publish(text, chat_prefix).await {
        tracing::info!(%run, chars = text.chars().count(), "post.delivered");
    } else {
        tracing::warn!(%run, "post.undelivered");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use wiremock::matchers::{any, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use magpie_common::MagpieError;
    use magpie_content::{TrendingSource, WordPairClient};
    use magpie_llm::openai::OpenAiClient;
    use magpie_llm::prompt::build_prompt;
    use magpie_social::{OAuthCredentials, Publisher, TelegramApi, TwitterApi};

    use super::*;
    use crate::bot::Bot;

    const BOT_TOKEN: &str = "777000:app-token";
    const CHAT_ID: &str = "-1002468";

    struct Mocks {
        content: MockServer,
        llm: MockServer,
        microblog: MockServer,
        chat: MockServer,
    }

    /// A fully configured bot with every upstream pointed at a mock server.
    /// The word and trending sources share the `content` server; their
    /// paths never overlap.
    async fn mock_bot() -> (Bot, Mocks) {
        let content = MockServer::start().await;
        let llm = MockServer::start().await;
        let microblog = MockServer::start().await;
        let chat = MockServer::start().await;

        let creds = OAuthCredentials {
            consumer_key: "ck".into(),
            consumer_secret: "cs".into(),
            access_token: "tok".into(),
            access_token_secret: "ts".into(),
        };

        let bot = Bot {
            completion: Some(Arc::new(
                OpenAiClient::with_base(&llm.uri(), "key".into(), "gpt-4o-mini".into())
                    .expect("completion client"),
            )),
            words: WordPairClient::with_base(&content.uri()).expect("word client"),
            trending: TrendingSource::with_base(&content.uri()).expect("trending source"),
            publisher: Publisher::new(
                Some(TwitterApi::with_base(&microblog.uri(), creds).expect("microblog client")),
                Some(
                    TelegramApi::with_base(&chat.uri(), BOT_TOKEN.into(), CHAT_ID.into())
                        .expect("chat client"),
                ),
            ),
        };

        (
            bot,
            Mocks {
                content,
                llm,
                microblog,
                chat,
            },
        )
    }

    async fn mount_words(server: &MockServer, first: &str, second: &str) {
        Mock::given(method("GET"))
            .and(path("/word"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([first, second])))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_completion(server: &MockServer, text: &str) {
        Mock::given(method("POST"))
            .and(path("/responses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "model": "gpt-4o-mini",
                "output": [{
                    "type": "message",
                    "content": [{ "type": "output_text", "text": text }]
                }]
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    async fn mount_surfaces_ok(mocks: &Mocks, microblog_text: &str, chat_text: &str) {
        Mock::given(method("POST"))
            .and(path("/2/tweets"))
            .and(body_partial_json(json!({"text": microblog_text})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "data": { "id": "42", "text": microblog_text }
            })))
            .expect(1)
            .mount(&mocks.microblog)
            .await;

        Mock::given(method("POST"))
            .and(path(format!("/bot{BOT_TOKEN}/sendMessage")))
            .and(body_partial_json(json!({"chat_id": CHAT_ID, "text": chat_text})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true, "result": { "message_id": 7 }
            })))
            .expect(1)
            .mount(&mocks.chat)
            .await;
    }

    /// Guard a server that the scenario must never reach.
    async fn mount_untouched(server: &MockServer) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn word_job_delivers_to_each_surface_exactly_once() {
        let (bot, mocks) = mock_bot().await;
        mount_words(&mocks.content, "gloaming", "harbor").await;

        let expected_prompt = build_prompt(&PostMaterial::WordPair {
            first: "gloaming".into(),
            second: "harbor".into(),
        });
        Mock::given(method("POST"))
            .and(path("/responses"))
            .and(body_partial_json(json!({"input": expected_prompt})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "completed",
                "model": "gpt-4o-mini",
                "output": [{
                    "type": "message",
                    "content": [{ "type": "output_text", "text": "{\"tweet\": \"Hello #AI 🚀\"}" }]
                }]
            })))
            .expect(1)
            .mount(&mocks.llm)
            .await;

        mount_surfaces_ok(&mocks, "Hello #AI 🚀", "🎲 *Wordplay:* Hello \\#AI 🚀").await;

        run_words(&bot, None).await.expect("run");
    }

    #[tokio::test]
    async fn override_text_goes_straight_to_the_surfaces() {
        let (bot, mocks) = mock_bot().await;
        mount_untouched(&mocks.content).await;
        mount_untouched(&mocks.llm).await;
        mount_surfaces_ok(&mocks, "posted by hand", "🎲 *Wordplay:* posted by hand").await;

        run_words(&bot, Some("posted by hand".into()))
            .await
            .expect("run");
    }

    #[tokio::test]
    async fn prose_completion_quietly_skips_the_run() {
        let (bot, mocks) = mock_bot().await;
        mount_words(&mocks.content, "velvet", "draught").await;
        mount_completion(&mocks.llm, "I'd rather speak in prose today.").await;
        mount_untouched(&mocks.microblog).await;
        mount_untouched(&mocks.chat).await;

        run_words(&bot, None)
            .await
            .expect("a parse miss is not an error");
    }

    #[tokio::test]
    async fn word_fetch_failure_surfaces_as_an_error() {
        let (bot, mocks) = mock_bot().await;
        Mock::given(method("GET"))
            .and(path("/word"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&mocks.content)
            .await;
        mount_untouched(&mocks.llm).await;
        mount_untouched(&mocks.microblog).await;
        mount_untouched(&mocks.chat).await;

        let err = run_words(&bot, None)
            .await
            .expect_err("a fetch failure aborts the run");
        assert!(
            matches!(err.downcast_ref::<MagpieError>(), Some(MagpieError::Content(_))),
            "{err}"
        );
    }

    #[tokio::test]
    async fn no_completion_configured_is_a_quiet_no_op() {
        let (mut bot, mocks) = mock_bot().await;
        bot.completion = None;
        mount_untouched(&mocks.content).await;
        mount_untouched(&mocks.llm).await;
        mount_untouched(&mocks.microblog).await;
        mount_untouched(&mocks.chat).await;

        run_words(&bot, None).await.expect("run");
        run_story(&bot, None).await.expect("run");
    }

    #[tokio::test]
    async fn story_job_delivers_the_generated_take() {
        let (bot, mocks) = mock_bot().await;
        Mock::given(method("GET"))
            .and(path("/topstories.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([7])))
            .mount(&mocks.content)
            .await;
        Mock::given(method("GET"))
            .and(path("/item/7.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "type": "story",
                "title": "Compilers are fast now",
                "url": "https://example.com/compilers",
                "kids": [8],
            })))
            .mount(&mocks.content)
            .await;
        Mock::given(method("GET"))
            .and(path("/item/8.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 8,
                "type": "comment",
                "text": "Benchmarks or it didn&#x27;t happen",
            })))
            .mount(&mocks.content)
            .await;
        mount_completion(&mocks.llm, "{\"tweet\": \"Fast compilers, slow takes.\"}").await;
        mount_surfaces_ok(
            &mocks,
            "Fast compilers, slow takes.",
            "🔥 *Trending:* Fast compilers, slow takes\\.",
        )
        .await;

        run_story(&bot, None).await.expect("run");
    }
}
