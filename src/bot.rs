use std::{ops::Deref, sync::Arc, time::Duration};

use teloxide::{
    dispatching::UpdateFilterExt,
    dptree,
    error_handlers::LoggingErrorHandler,
    prelude::*,
    types::ChatAction,
    utils::command::BotCommands,
};

use crate::{config, generator, health, live, location};

const LIVE_CLEANUP_PERIOD: Duration = Duration::from_secs(3600);

const WELCOME_TEXT: &str = "🌍 Hi! I find engaging facts about places near you.\n\n\
    📍 Send me your location and I'll tell you something fascinating about \
    a notable place nearby.\n\n\
    To share your location, tap the attachment icon and pick 'Location'.";

const HELP_TEXT: &str = "🤖 How to use this bot:\n\n\
    📍 Regular location:\n\
    1. Send me your location\n\
    2. Get an engaging fact about a notable place nearby\n\n\
    🔄 Live location:\n\
    1. Share a live location to start tracking\n\
    2. Get a fresh fact every 10 minutes while you move\n\n\
    Commands:\n\
    /start - start the bot\n\
    /help - show this message\n\
    /status - live location tracking status\n\
    /stop_live - stop live location tracking";

const SEND_LOCATION_TEXT: &str = "📍 Send me your location to get an engaging \
    fact about a place nearby.\n\
    Tap the attachment icon → Location";

const INVALID_LOCATION_TEXT: &str =
    "❌ I couldn't read those coordinates. Please send your location again.";

const APOLOGY_TEXT: &str = "😔 Sorry, I couldn't find anything engaging about \
    your location right now. Please try again a bit later.";

const LIVE_STARTED_TEXT: &str = "🔄 Tracking your live location! I'll send you \
    a new fact every 10 minutes while you move.";

const LIVE_TOO_SOON_TEXT: &str =
    "⏰ You moved! I'll fetch a new fact in a few minutes, once enough time has passed.";

const LIVE_STOPPED_TEXT: &str =
    "⏹️ Live location tracking stopped. Thanks for using the bot!";

const LIVE_NOT_ACTIVE_TEXT: &str = "ℹ️ Live location is not active.\n\n\
    Share a live location to start tracking.";

struct BotDataInner {
    generator: generator::FactGenerator,
    live: live::LiveSessions,
}

#[derive(Clone)]
struct BotData {
    inner: Arc<BotDataInner>,
}

impl BotData {
    fn new(generator: generator::FactGenerator) -> Self {
        Self {
            inner: Arc::new(BotDataInner {
                generator,
                live: live::LiveSessions::new(),
            }),
        }
    }
}

impl Deref for BotData {
    type Target = BotDataInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

type InternalError = Box<dyn std::error::Error + Send + Sync>;
type HandlerResult = Result<(), InternalError>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to create generation client")]
    Generator(#[source] reqwest::Error),
    #[error("failed to start health endpoint")]
    Health(#[source] health::Error),
}

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "snake_case")]
enum Command {
    Start,
    Help,
    Status,
    StopLive,
}

fn status_text(status: Option<live::Status>) -> String {
    match status {
        Some(status) => format!(
            "📊 Live location status:\n\n\
            ✅ Active\n\
            📍 Last update: {} min ago\n\
            🔢 Facts sent: {}\n\
            ⏱️ Next fact: in {} min\n\n\
            Use /stop_live to stop tracking.",
            status.minutes_since_update, status.facts_sent, status.minutes_until_refresh
        ),
        None => LIVE_NOT_ACTIVE_TEXT.to_string(),
    }
}

async fn handle_command(bot: Bot, msg: Message, command: Command, data: BotData) -> HandlerResult {
    let chat = msg.chat.id;

    log::info!("received {command:?} command from chat {chat}");

    let reply = match command {
        Command::Start => WELCOME_TEXT.to_string(),
        Command::Help => HELP_TEXT.to_string(),
        Command::Status => status_text(data.live.status(chat.0)),
        Command::StopLive => {
            if data.live.stop(chat.0) {
                LIVE_STOPPED_TEXT.to_string()
            } else {
                LIVE_NOT_ACTIVE_TEXT.to_string()
            }
        }
    };

    bot.send_message(chat, reply).await?;

    Ok(())
}

/// Builds the prompt, awaits one completion and sends exactly one reply to
/// the chat, the generated fact or the fixed apology.
async fn reply_fact(
    bot: &Bot,
    chat: ChatId,
    data: &BotData,
    location: location::Location,
) -> HandlerResult {
    bot.send_chat_action(chat, ChatAction::Typing).await?;

    match data.generator.generate(&location.prompt()).await {
        Ok(fact) => {
            bot.send_message(chat, fact).await?;
            log::info!("sent fact to chat {chat}");
        }
        Err(err) => {
            log::error!("failed to generate fact for chat {chat}: {err}");
            bot.send_message(chat, APOLOGY_TEXT).await?;
        }
    }

    Ok(())
}

async fn handle_live_location(
    bot: &Bot,
    chat: ChatId,
    data: &BotData,
    location: location::Location,
) -> HandlerResult {
    match data.live.track(chat.0, location) {
        live::Track::Started => {
            bot.send_message(chat, LIVE_STARTED_TEXT).await?;
            reply_fact(bot, chat, data, location).await?;
        }
        live::Track::Refresh => {
            reply_fact(bot, chat, data, location).await?;
        }
        live::Track::TooSoon => {
            bot.send_message(chat, LIVE_TOO_SOON_TEXT).await?;
        }
        live::Track::Unchanged => (),
    }

    Ok(())
}

async fn handle_location(bot: Bot, msg: Message, data: BotData) -> HandlerResult {
    let Some(received) = msg.location() else {
        return Ok(());
    };

    let chat = msg.chat.id;
    let live = received.live_period.is_some();

    let location = match location::Location::new(received.latitude, received.longitude, live) {
        Ok(location) => location,
        Err(err) => {
            log::warn!("rejected location from chat {chat}: {err}");
            bot.send_message(chat, INVALID_LOCATION_TEXT).await?;

            return Ok(());
        }
    };

    log::info!(
        "received {} location from chat {chat}: {:.6}, {:.6}",
        if live { "live" } else { "regular" },
        location.latitude(),
        location.longitude()
    );

    if live {
        handle_live_location(&bot, chat, &data, location).await
    } else {
        reply_fact(&bot, chat, &data, location).await
    }
}

async fn handle_text(bot: Bot, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, SEND_LOCATION_TEXT).await?;

    Ok(())
}

fn start_live_sessions_cleaner(data: BotData) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(LIVE_CLEANUP_PERIOD).await;

            let removed = data
                .live
                .cleanup(chrono::Duration::hours(live::MAX_SESSION_AGE_HOURS));
            if removed > 0 {
                log::info!(
                    "dropped {} stale live location session{}",
                    removed,
                    if removed != 1 { "s" } else { "" }
                );
            }
        }
    });
}

fn start_health_server(server: health::Server) {
    tokio::spawn(async move {
        if let Err(err) = server.serve().await {
            log::error!("health endpoint failed: {err}");
        }
    });
}

pub async fn run(conf: config::App) -> Result<(), Error> {
    let generator = generator::FactGenerator::new(&conf.generator).map_err(Error::Generator)?;

    let server = health::bind(conf.health.port).await.map_err(Error::Health)?;
    start_health_server(server);

    let data = BotData::new(generator);
    start_live_sessions_cleaner(data.clone());

    let bot = Bot::new(conf.bot.telegram_token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.location().is_some())
                .endpoint(handle_location),
        )
        .branch(
            Update::filter_message()
                .filter(|msg: Message| msg.text().is_some())
                .endpoint(handle_text),
        );

    log::info!("starting long polling (commands: /start, /help, /status, /stop_live)");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![data])
        .default_handler(|update| async move {
            log::debug!("ignoring unhandled update {}", update.id.0);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "failed to dispatch update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
