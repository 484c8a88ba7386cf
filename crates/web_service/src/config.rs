use std::env;

use anyhow::{bail, Context, Result};

/// The qualification script steering the model. Opaque content: the relay
/// never inspects it.
const DEFAULT_SYSTEM_PROMPT: &str = include_str!("../prompts/system_prompt.md");

const DEFAULT_ALLOWED_ORIGIN: &str = "https://matyladesign.pl";
const DEFAULT_PORT: u16 = 5001;
const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 5;
const DEFAULT_RATE_LIMIT_PER_DAY: u32 = 100;

/// Static configuration, loaded once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub allowed_origin: String,
    pub port: u16,
    pub rate_limit_per_minute: u32,
    pub rate_limit_per_day: u32,
    pub system_prompt: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = match env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => bail!("OPENAI_API_KEY is not set"),
        };

        Ok(Self {
            api_key,
            model: env::var("CHAT_MODEL").unwrap_or_else(|_| openai_client::DEFAULT_MODEL.to_string()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| openai_client::DEFAULT_BASE_URL.to_string()),
            allowed_origin: env::var("ALLOWED_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGIN.to_string()),
            port: parse_env("PORT", DEFAULT_PORT)?,
            rate_limit_per_minute: parse_env(
                "RATE_LIMIT_PER_MINUTE",
                DEFAULT_RATE_LIMIT_PER_MINUTE,
            )?,
            rate_limit_per_day: parse_env("RATE_LIMIT_PER_DAY", DEFAULT_RATE_LIMIT_PER_DAY)?,
            system_prompt: env::var("SYSTEM_PROMPT")
                .unwrap_or_else(|_| DEFAULT_SYSTEM_PROMPT.to_string()),
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("{name} is not a valid value: {value}")),
        Err(_) => Ok(default),
    }
}
