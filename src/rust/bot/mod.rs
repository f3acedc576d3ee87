//! Telegram front end: forwards chat messages to the sentiment service and replies with
//! its verdict.
//!
//! Updates are long-polled with `teloxide`. The poll loop hands each chat's messages to
//! a worker task of that chat, so replies in a chat keep the order of its messages while
//! chats never wait on each other. A worker exits after [`CHAT_IDLE_TIMEOUT`] without
//! messages and is started again on the chat's next message.

mod analysis;
mod error;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use teloxide::payloads::{GetUpdatesSetters, SendMessageSetters};
use teloxide::requests::{Request, Requester};
use teloxide::types::{ChatId, MessageId, ReplyParameters, Update, UpdateKind};
use teloxide::Bot;
use tokio::sync::mpsc;

pub use analysis::{
    reply_for, SentimentApiClient, ANALYSIS_FAILED, DEFAULT_API_URL, NOT_RECOGNIZED,
};
pub use error::BotError;

pub const GREETING: &str = "Привет! Отправь мне текст, и я определю его настроение.";

/// Server-side wait of each `getUpdates` call. Must stay below the HTTP timeout of
/// teloxide's default client.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(10);
/// Pause after a failed `getUpdates` call.
pub const RETRY_DELAY: Duration = Duration::from_secs(3);
/// How long a chat worker waits for the next message before exiting.
pub const CHAT_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// What an incoming text asks the bot to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Analyze(&'a str),
}

impl<'a> Command<'a> {
    /// `/start`, `/start@SomeBot` and `/start <payload>` greet; everything else,
    /// other slash commands included, is analysed as-is.
    pub fn parse(text: &'a str) -> Self {
        let first = text.split_whitespace().next().unwrap_or("");
        let name = first.split('@').next().unwrap_or(first);
        if name == "/start" {
            Command::Start
        } else {
            Command::Analyze(text)
        }
    }
}

/// Computes the reply to one text message.
pub async fn respond(analysis: &SentimentApiClient, text: &str) -> String {
    match Command::parse(text) {
        Command::Start => GREETING.to_string(),
        Command::Analyze(text) => {
            let outcome = analysis.get_analysis(text).await;
            analysis::log_failure(&outcome);
            reply_for(&outcome)
        }
    }
}

type ChatMessage = (MessageId, String);

async fn answer(
    bot: &Bot,
    analysis: &SentimentApiClient,
    chat_id: ChatId,
    (message_id, text): ChatMessage,
) {
    let reply = respond(analysis, &text).await;
    let sent = bot
        .send_message(chat_id, reply)
        .reply_parameters(ReplyParameters::new(message_id))
        .send()
        .await;
    if let Err(e) = sent {
        error!("Failed to reply in chat {}: {}", chat_id.0, BotError::from(e));
    }
}

async fn chat_worker(
    chat_id: ChatId,
    mut messages: mpsc::UnboundedReceiver<ChatMessage>,
    bot: Bot,
    analysis: Arc<SentimentApiClient>,
    idle_timeout: Duration,
) {
    debug!("Worker for chat {} started", chat_id.0);
    loop {
        match tokio::time::timeout(idle_timeout, messages.recv()).await {
            Ok(Some(message)) => answer(&bot, &analysis, chat_id, message).await,
            Ok(None) => break,
            Err(_) => {
                // Refuse new messages, then answer whatever slipped in before closing.
                messages.close();
                while let Some(message) = messages.recv().await {
                    answer(&bot, &analysis, chat_id, message).await;
                }
                break;
            }
        }
    }
    debug!("Worker for chat {} finished", chat_id.0);
}

/// Routes messages to per-chat workers, starting a worker when a chat has none.
pub struct ChatRouter {
    bot: Bot,
    analysis: Arc<SentimentApiClient>,
    idle_timeout: Duration,
    chats: HashMap<ChatId, mpsc::UnboundedSender<ChatMessage>>,
}

impl ChatRouter {
    pub fn new(bot: Bot, analysis: SentimentApiClient, idle_timeout: Duration) -> Self {
        Self {
            bot,
            analysis: Arc::new(analysis),
            idle_timeout,
            chats: HashMap::new(),
        }
    }

    /// Queues the update's text message for its chat; anything else is ignored.
    pub fn dispatch(&mut self, update: Update) {
        let message = match update.kind {
            UpdateKind::Message(message) => message,
            _ => {
                debug!("Ignoring update {:?} without a new message", update.id);
                return;
            }
        };
        let chat_id = message.chat.id;
        let Some(text) = message.text() else {
            debug!("Ignoring non-text message {} in chat {}", message.id.0, chat_id.0);
            return;
        };
        debug!("Message {} in chat {}: {:?}", message.id.0, chat_id.0, text);

        let mut item = (message.id, text.to_string());
        if let Some(sender) = self.chats.get(&chat_id) {
            match sender.send(item) {
                Ok(()) => return,
                Err(mpsc::error::SendError(returned)) => {
                    debug!("Worker for chat {} has exited, starting a new one", chat_id.0);
                    item = returned;
                }
            }
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(chat_worker(
            chat_id,
            receiver,
            self.bot.clone(),
            Arc::clone(&self.analysis),
            self.idle_timeout,
        ));
        if sender.send(item).is_err() {
            warn!("Worker for chat {} stopped before its first message", chat_id.0);
        }
        self.chats.insert(chat_id, sender);
    }

    /// Drops the channels of workers that have exited.
    pub fn prune(&mut self) {
        self.chats.retain(|_, sender| !sender.is_closed());
    }

    /// Number of chats with a running worker.
    pub fn active_chats(&mut self) -> usize {
        self.prune();
        self.chats.len()
    }
}

/// Polls Telegram and answers messages until `shutdown` completes.
///
/// Failed polls are logged and retried after [`RETRY_DELAY`]; nothing a chat sends can
/// stop the loop.
pub async fn run_until<F>(bot: Bot, analysis: SentimentApiClient, shutdown: F)
where
    F: Future<Output = ()>,
{
    let mut router = ChatRouter::new(bot.clone(), analysis, CHAT_IDLE_TIMEOUT);
    let mut offset: Option<i32> = None;

    tokio::pin!(shutdown);
    info!("Bot started");
    loop {
        let mut request = bot.get_updates().timeout(POLL_TIMEOUT.as_secs() as u32);
        if let Some(offset) = offset {
            request = request.offset(offset);
        }

        tokio::select! {
            _ = &mut shutdown => break,
            polled = request.send() => match polled {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.id.as_offset());
                        router.dispatch(update);
                    }
                    router.prune();
                }
                Err(e) => {
                    error!("Failed to fetch updates: {}", BotError::from(e));
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(RETRY_DELAY) => {}
                    }
                }
            },
        }
    }
    info!("Bot stopped");
}

/// Runs the bot until Ctrl-C.
pub async fn run(bot: Bot, analysis: SentimentApiClient) {
    run_until(bot, analysis, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await
}
