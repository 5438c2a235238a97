use crate::domain::error::{AppError, Result};
use crate::domain::llm_config::{LLMConfig, LLMProvider};
use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> Option<u32> {
    Some(1024)
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cases_dir() -> String {
    "data/cases".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

/// Application settings, layered from an optional `vsp.toml` and `VSP_*`
/// environment variables (env wins).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub api_key: Option<String>,
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cases_dir")]
    pub cases_dir: String,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Settings {
    /// Missing credentials are fatal at startup; everything else has a
    /// workable default.
    pub fn load() -> Result<Self> {
        let settings: Settings = Figment::new()
            .merge(Toml::file("vsp.toml"))
            .merge(Env::prefixed("VSP_"))
            .extract()
            .map_err(|err| AppError::ConfigError(err.to_string()))?;

        match settings.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(settings),
            _ => Err(AppError::ConfigError(
                "VSP_API_KEY is not set".to_string(),
            )),
        }
    }

    pub fn llm_config(&self) -> LLMConfig {
        let provider = match self.provider.to_lowercase().as_str() {
            "gemini" | "google" => LLMProvider::Gemini,
            _ => LLMProvider::OpenAI,
        };

        let base_url = self.base_url.clone().unwrap_or_else(|| match provider {
            LLMProvider::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/models".to_string()
            }
            LLMProvider::OpenAI => "https://api.openai.com/v1".to_string(),
        });

        LLMConfig {
            provider,
            base_url,
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            max_tokens: self.max_tokens,
            temperature: Some(self.temperature),
        }
    }
}
