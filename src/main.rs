mod config;
mod models;
mod utils;

use dotenv::dotenv;
use log::{error, info};
use simplelog::{ColorChoice, Config as LogConfig, LevelFilter, TermLogger, TerminalMode};

use crate::config::Config;
use crate::utils::api::ResultsApi;
use crate::utils::telegram::ResultsBot;

// Entry point for the async main function, powered by tokio runtime.
#[tokio::main]
async fn main() {
    // Loads environment variables from a `.env` file, if present.
    dotenv().ok();

    // Initializes logging with simplelog to the terminal with mixed output (both stdout and stderr) and automatic color support.
    TermLogger::init(
        LevelFilter::Info,
        LogConfig::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto
    ).unwrap();

    // Reads the bot token and API endpoint before anything touches the network.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            return;
        }
    };

    // Builds the shared results client with its single timeout policy.
    let api = match ResultsApi::new(config.api_base_url.clone()) {
        Ok(api) => api,
        Err(e) => {
            error!("Error building the results client: {}", e);
            return;
        }
    };

    info!("JNTUH Results Bot is running...");

    // Polls for messages and button presses until the process is interrupted.
    ResultsBot::new(config, api).run().await;
}
