//! Loader for bot configuration with YAML + environment overlays.
//!
//! Every credential is optional: a missing section simply disables the
//! surface or service that needs it. Environment variables use the `MAGPIE`
//! prefix with `__` as the nesting separator, e.g.
//! `MAGPIE_CHAT__BOT_TOKEN` and `MAGPIE_MICROBLOG__CONSUMER_KEY`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Model used when only the completion API key is configured.
pub const DEFAULT_COMPLETION_MODEL: &str = "gpt-4o-mini";

const DEFAULT_WORDS_INTERVAL_SECS: u64 = 21_600; // 6h
const DEFAULT_STORY_INTERVAL_SECS: u64 = 10_800; // 3h
const DEFAULT_TICK_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MagpieConfig {
    #[serde(default)]
    pub completion: CompletionSection,
    #[serde(default)]
    pub chat: ChatSection,
    #[serde(default)]
    pub microblog: MicroblogSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
}

/// Completion-service (LLM) access.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionSection {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Chat-bot surface (Telegram).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatSection {
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Telegram chat ids are numeric; accept either form and keep the string.
    #[serde(default, deserialize_with = "de_string_or_number")]
    pub chat_id: Option<String>,
}

fn de_string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Microblog surface (Twitter, OAuth 1.0a user context).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MicroblogSection {
    #[serde(default)]
    pub consumer_key: Option<String>,
    #[serde(default)]
    pub consumer_secret: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_token_secret: Option<String>,
}

/// Job cadence. All values in seconds.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleSection {
    #[serde(default = "default_words_interval")]
    pub words_interval_secs: u64,
    #[serde(default = "default_story_interval")]
    pub story_interval_secs: u64,
    #[serde(default = "default_tick")]
    pub tick_secs: u64,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            words_interval_secs: default_words_interval(),
            story_interval_secs: default_story_interval(),
            tick_secs: default_tick(),
        }
    }
}

fn default_words_interval() -> u64 {
    DEFAULT_WORDS_INTERVAL_SECS
}
fn default_story_interval() -> u64 {
    DEFAULT_STORY_INTERVAL_SECS
}
fn default_tick() -> u64 {
    DEFAULT_TICK_SECS
}

/// A fully assembled completion-service binding.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_key: String,
    pub model: String,
}

/// A fully assembled chat-bot binding.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub bot_token: String,
    pub chat_id: String,
}

/// A fully assembled OAuth 1.0a credential set.
#[derive(Debug, Clone)]
pub struct MicroblogKeys {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl MagpieConfig {
    /// Completion service binding, if an API key is present. The model falls
    /// back to [`DEFAULT_COMPLETION_MODEL`].
    pub fn completion(&self) -> Option<CompletionSettings> {
        let api_key = non_empty(self.completion.api_key.as_deref())?;
        let model = non_empty(self.completion.model.as_deref())
            .unwrap_or_else(|| DEFAULT_COMPLETION_MODEL.to_string());
        Some(CompletionSettings { api_key, model })
    }

    /// Chat surface binding, if both the bot token and the target chat are set.
    pub fn chat_bot(&self) -> Option<ChatSettings> {
        Some(ChatSettings {
            bot_token: non_empty(self.chat.bot_token.as_deref())?,
            chat_id: non_empty(self.chat.chat_id.as_deref())?,
        })
    }

    /// Microblog credential set, present only when all four values are set.
    /// A partial set counts as absent: signing with a hole in the credentials
    /// can only produce rejected requests.
    pub fn microblog_keys(&self) -> Option<MicroblogKeys> {
        Some(MicroblogKeys {
            consumer_key: non_empty(self.microblog.consumer_key.as_deref())?,
            consumer_secret: non_empty(self.microblog.consumer_secret.as_deref())?,
            access_token: non_empty(self.microblog.access_token.as_deref())?,
            access_token_secret: non_empty(self.microblog.access_token_secret.as_deref())?,
        })
    }
}

fn non_empty(v: Option<&str>) -> Option<String> {
    match v {
        Some(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct MagpieConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for MagpieConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MagpieConfigLoader {
    /// Start an empty loader. `MAGPIE_`-prefixed environment variables are
    /// always applied on top of whatever files are attached.
    ///
    /// ```
    /// use magpie_config::MagpieConfigLoader;
    ///
    /// let config = MagpieConfigLoader::new()
    ///     .with_yaml_str("chat:\n  bot_token: tok\n  chat_id: '42'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// let chat = config.chat_bot().expect("chat configured");
    /// assert_eq!(chat.chat_id, "42");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by
    /// suffix. The file may be absent, so headless deployments can rely
    /// purely on environment variables.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// `${VAR}` placeholders are expanded before materialising the typed
    /// config, so secrets can stay out of the YAML file.
    ///
    /// ```
    /// use magpie_config::MagpieConfigLoader;
    ///
    /// unsafe { std::env::set_var("DEMO_OPENAI_KEY", "sk-demo"); }
    ///
    /// let config = MagpieConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// completion:
    ///   api_key: "${DEMO_OPENAI_KEY}"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// let completion = config.completion().expect("completion configured");
    /// assert_eq!(completion.api_key, "sk-demo");
    /// assert_eq!(completion.model, magpie_config::DEFAULT_COMPLETION_MODEL);
    ///
    /// unsafe { std::env::remove_var("DEMO_OPENAI_KEY"); }
    /// ```
    pub fn load(self) -> Result<MagpieConfig, ConfigError> {
        // The env source is layered last so it overrides any file values.
        // try_parsing lets numeric overrides like MAGPIE_SCHEDULE__TICK_SECS
        // come through as numbers instead of strings.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("MAGPIE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        // Convert to serde_json::Value first
        let mut v: Value = cfg.try_deserialize()?;
        // Recursively expand environment variables
        expand_env_in_value(&mut v);

        let typed: MagpieConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
