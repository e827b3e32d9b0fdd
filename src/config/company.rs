use serde::{Deserialize, Serialize};

use crate::rules::RemainderPolicy;

pub const DEFAULT_COMPANY_NAME: &str = "Timax Auto Garage";
pub const DEFAULT_COMPANY_TAGLINE: &str = "Quality service, every time";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub company: Company,
    pub api: ApiSettings,
    #[serde(default)]
    pub tips: TipSettings,
    #[serde(default)]
    pub documents: DocumentSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Company {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Company {
    /// Name and tagline with environment overrides and static fallbacks applied.
    pub fn resolved(&self) -> Company {
        Company {
            name: pick(std::env::var("TIMAX_COMPANY_NAME").ok(), &self.name, DEFAULT_COMPANY_NAME),
            tagline: pick(
                std::env::var("TIMAX_COMPANY_TAGLINE").ok(),
                &self.tagline,
                DEFAULT_COMPANY_TAGLINE,
            ),
            ..self.clone()
        }
    }
}

fn pick(env: Option<String>, configured: &str, fallback: &str) -> String {
    env.filter(|v| !v.trim().is_empty())
        .or_else(|| Some(configured.to_string()).filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| fallback.to_string())
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retries")]
    pub retries: u32,
}

impl ApiSettings {
    /// Bearer token, `TIMAX_API_TOKEN` taking precedence over the config file.
    pub fn resolved_token(&self) -> Option<String> {
        std::env::var("TIMAX_API_TOKEN")
            .ok()
            .or_else(|| self.token.clone())
            .filter(|t| !t.trim().is_empty())
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_retries() -> u32 {
    1
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TipSettings {
    #[serde(default)]
    pub remainder: RemainderPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DocumentSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default)]
    pub phone_country_code: Option<String>,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            currency_symbol: default_currency_symbol(),
            phone_country_code: None,
        }
    }
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_currency_symbol() -> String {
    "KSh ".to_string()
}
