//! Startup wiring: build the bot's collaborators from configuration and
//! register the recurring jobs.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use magpie_config::{MagpieConfig, ScheduleSection};
use magpie_content::{TrendingSource, WordPairClient};
use magpie_llm::LlmClient;
use magpie_llm::openai::OpenAiClient;
use magpie_scheduler::Scheduler;
use magpie_social::{OAuthCredentials, Publisher, TelegramApi, TwitterApi};

use crate::pipeline;

/// Everything a pipeline run needs, built once at startup.
pub struct Bot {
    pub(crate) completion: Option<Arc<dyn LlmClient>>,
    pub(crate) words: WordPairClient,
    pub(crate) trending: TrendingSource,
    pub(crate) publisher: Publisher,
}

/// Assemble the bot from configuration. A missing credential disables the
/// surface (or the completion step) it belongs to; it never fails startup.
pub fn build_from_config(cfg: &MagpieConfig) -> Result<Bot> {
    let completion: Option<Arc<dyn LlmClient>> = match cfg.completion() {
        Some(settings) => {
            tracing::info!(model = %settings.model, "bot.completion.configured");
            Some(Arc::new(OpenAiClient::new(settings.api_key, settings.model)?))
        }
        None => {
            tracing::warn!("bot.completion.unconfigured");
            None
        }
    };

    let twitter = match cfg.microblog_keys() {
        Some(keys) => Some(TwitterApi::new(OAuthCredentials {
            consumer_key: keys.consumer_key,
            consumer_secret: keys.consumer_secret,
            access_token: keys.access_token,
            access_token_secret: keys.access_token_secret,
        })?),
        None => {
            tracing::info!("bot.microblog.unconfigured");
            None
        }
    };

    let telegram = match cfg.chat_bot() {
        Some(chat) => Some(TelegramApi::new(chat.bot_token, chat.chat_id)?),
        None => {
            tracing::info!("bot.chat.unconfigured");
            None
        }
    };

    let publisher = Publisher::new(twitter, telegram);
    if !publisher.has_surface() {
        tracing::warn!("bot.no_surfaces");
    }

    Ok(Bot {
        completion,
        words: WordPairClient::new()?,
        trending: TrendingSource::new()?,
        publisher,
    })
}

/// Register the two recurring jobs with their configured intervals.
pub async fn register_jobs(bot: Arc<Bot>, scheduler: &Scheduler, schedule: &ScheduleSection) {
    let words_bot = bot.clone();
    scheduler
        .register(
            "random-words",
            "Riff on a pair of random words",
            Duration::seconds(schedule.words_interval_secs as i64),
            Arc::new(move |override_text| {
                let bot = words_bot.clone();
                Box::pin(async move { pipeline::run_words(&bot, override_text).await })
            }),
        )
        .await;

    let story_bot = bot;
    scheduler
        .register(
            "trending-story",
            "React to a trending story and its top reply",
            Duration::seconds(schedule.story_interval_secs as i64),
            Arc::new(move |override_text| {
                let bot = story_bot.clone();
                Box::pin(async move { pipeline::run_story(&bot, override_text).await })
            }),
        )
        .await;
}
