//! Rest timer notifications
//!
//! At most one rest notification is pending at any time. Scheduling a new
//! one replaces the old, and dropping the timer cancels it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::ChatId;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Delivery channel for a notification
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> anyhow::Result<()>;
}

/// Writes the notification to the log and rings the terminal bell
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
        info!("{}: {}", title, body);
        eprint!("\x07");
        Ok(())
    }
}

/// Sends the notification as a Telegram message
pub struct TelegramNotifier {
    bot: Bot,
    chat_id: ChatId,
}

impl TelegramNotifier {
    pub fn new(token: String, chat_id: i64) -> Self {
        Self {
            bot: Bot::new(token),
            chat_id: ChatId(chat_id),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, title: &str, body: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(self.chat_id, format!("⏰ {}\n\n{}", title, body))
            .await?;
        Ok(())
    }
}

/// Single pending rest-over notification
pub struct RestTimer {
    notifier: Arc<dyn Notifier>,
    pending: Option<JoinHandle<()>>,
}

impl RestTimer {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier, pending: None }
    }

    /// Notify after `rest`, replacing anything already scheduled
    pub fn schedule(&mut self, rest: Duration, exercise: &str) {
        self.cancel();

        let notifier = Arc::clone(&self.notifier);
        let body = format!("Rest is over, next set of {}", exercise);
        debug!("Rest timer set for {}s", rest.as_secs());

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(rest).await;
            if let Err(e) = notifier.notify("Rest over", &body).await {
                error!("Failed to send rest notification: {}", e);
            }
        }));
    }

    /// Drop the pending notification. Returns true if one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for RestTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
