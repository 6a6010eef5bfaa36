use anyhow::{Context, Result};
use url::Url;

// Default endpoints for the hosted results API and its companion web portal.
const DEFAULT_API_BASE_URL: &str = "https://jntuhresults.dhethi.com/api";
const WEB_PORTAL_URL: &str = "https://jntuhresults.vercel.app/academicresult";

#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub api_base_url: String,
    pub portal_url: Url,
}

impl Config {
    // Reads the bot configuration from environment variables. The caller is
    // expected to have loaded a `.env` file beforehand if one exists.
    pub fn from_env() -> Result<Config> {
        let bot_token = std::env::var("BOT_TOKEN")
            .context("BOT_TOKEN environment variable not found")?;

        let api_base_url = std::env::var("RESULTS_API_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string());

        let portal_url = Url::parse(WEB_PORTAL_URL)
            .context("Failed to parse the web portal URL")?;

        Ok(Config {
            bot_token,
            api_base_url,
            portal_url,
        })
    }
}
