use std::sync::Arc;

use log::{error, info, warn};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::requests::ResponseResult;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::config::Config;
use crate::utils::api::ResultsApi;
use crate::utils::report::{backlog_report, format_result, has_details};

const BACKLOG_CALLBACK_PREFIX: &str = "backlog_";

const WELCOME_MESSAGE: &str = "\
👋 *Welcome to JNTUH Results Bot!*

I can help you fetch your academic results quickly.

*How to use:*
📝 Simply send me your roll number (e.g., 22A51A0501)

*Commands:*
/start - Show this welcome message
/help - Get help and usage instructions

Let's get started! Send your roll number now. 🎓";

const HELP_MESSAGE: &str = "\
📚 *JNTUH Results Bot - Help*

*How to get your results:*
1. Send your 10-digit roll number
2. Wait a few seconds while I fetch your results
3. View your complete academic performance!

*Examples of valid roll numbers:*
• 22A51A0501 (B.Tech R22)
• 18A51A0501 (B.Tech R18)
• 22R51A0501 (B.Pharmacy)
• 22E51A0501 (MBA)

*Available Commands:*
/start - Welcome message
/help - This help message

*Need more help?*
Visit: https://jntuhresults.vercel.app

Happy learning! 🎓✨";

const FETCHING_MESSAGE: &str = "⏳ Fetching your results...";
const INVALID_ROLL_MESSAGE: &str =
    "❌ Invalid roll number format! Please enter a 10-digit roll number.";
const NO_RESULTS_SHORT_MESSAGE: &str = "❌ No results found.";
const FETCH_FAILED_MESSAGE: &str = "❌ Failed to fetch results. Please try again later.";
const BACKLOG_FAILED_MESSAGE: &str = "❌ Failed to fetch backlog report. Please try again.";

// The long-lived bot service. Built once at startup; `run` polls Telegram
// until the process receives ctrl-c.
pub struct ResultsBot {
    bot: Bot,
    api: Arc<ResultsApi>,
    config: Config,
}

impl ResultsBot {
    pub fn new(config: Config, api: ResultsApi) -> ResultsBot {
        ResultsBot {
            bot: Bot::new(config.bot_token.clone()),
            api: Arc::new(api),
            config,
        }
    }

    pub async fn run(self) {
        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint(handle_message))
            .branch(Update::filter_callback_query().endpoint(handle_callback));

        Dispatcher::builder(self.bot, handler)
            .dependencies(dptree::deps![self.api, self.config])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }
}

// A submission is accepted only as a 10-character roll number, uppercased
// before it reaches the API. Anything else is rejected without a network
// call.
fn normalize_roll_number(text: &str) -> Option<String> {
    let roll_number = text.trim().to_uppercase();
    (roll_number.chars().count() == 10).then_some(roll_number)
}

// Inline keyboard attached to every successful result summary: the backlog
// action plus the external web portal link.
fn result_keyboard(roll_number: &str, config: &Config) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[
        InlineKeyboardButton::callback(
            "📜 Backlog Report",
            format!("{BACKLOG_CALLBACK_PREFIX}{roll_number}"),
        ),
        InlineKeyboardButton::url("🌐 View on Web", config.portal_url.clone()),
    ]])
}

// Routes an incoming chat message: known commands get canned replies, other
// commands are ignored, and any remaining text is treated as a roll-number
// lookup.
async fn handle_message(
    bot: Bot,
    msg: Message,
    api: Arc<ResultsApi>,
    config: Config,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let trimmed = text.trim();
    if trimmed.starts_with('/') {
        let command = trimmed.split('@').next().unwrap_or(trimmed);
        match command {
            "/start" => {
                bot.send_message(msg.chat.id, WELCOME_MESSAGE)
                    .parse_mode(ParseMode::Markdown)
                    .await?;
            }
            "/help" => {
                bot.send_message(msg.chat.id, HELP_MESSAGE)
                    .parse_mode(ParseMode::Markdown)
                    .await?;
            }
            _ => {}
        }
        return Ok(());
    }

    let Some(roll_number) = normalize_roll_number(text) else {
        bot.send_message(msg.chat.id, INVALID_ROLL_MESSAGE).await?;
        return Ok(());
    };

    let fetching = bot.send_message(msg.chat.id, FETCHING_MESSAGE).await?;
    let outcome = api.fetch_academic_result(&roll_number).await;

    // The pending indicator comes down on every branch before the reply
    // goes out.
    if let Err(e) = bot.delete_message(msg.chat.id, fetching.id).await {
        warn!("Could not remove the fetching indicator: {}", e);
    }

    match outcome {
        Ok(document) if has_details(&document) => {
            bot.send_message(msg.chat.id, format_result(&document))
                .parse_mode(ParseMode::Markdown)
                .reply_markup(result_keyboard(&roll_number, &config))
                .await?;
            info!("Result summary sent for {}", roll_number);
        }
        Ok(_) => {
            bot.send_message(msg.chat.id, NO_RESULTS_SHORT_MESSAGE)
                .await?;
        }
        Err(e) => {
            error!("Error fetching results for {}: {}", roll_number, e);
            bot.send_message(msg.chat.id, FETCH_FAILED_MESSAGE).await?;
        }
    }

    Ok(())
}

// Handles inline button presses. The backlog button re-fetches the document
// instead of holding any state between interactions.
async fn handle_callback(bot: Bot, query: CallbackQuery, api: Arc<ResultsApi>) -> ResponseResult<()> {
    if let (Some(data), Some(message)) = (query.data.as_deref(), query.message.as_ref()) {
        if let Some(roll_number) = data.strip_prefix(BACKLOG_CALLBACK_PREFIX) {
            match api.fetch_academic_result(roll_number).await {
                Ok(document) => {
                    bot.send_message(message.chat.id, backlog_report(&document))
                        .parse_mode(ParseMode::Markdown)
                        .await?;
                    info!("Backlog report sent for {}", roll_number);
                }
                Err(e) => {
                    error!("Error fetching backlog report for {}: {}", roll_number, e);
                    bot.send_message(message.chat.id, BACKLOG_FAILED_MESSAGE)
                        .await?;
                }
            }
        }
    }

    // Answered on every path, otherwise the client keeps its loading
    // animation running.
    bot.answer_callback_query(query.id).await?;
    Ok(())
}
