//! Runtime configuration from flags, environment and `.env`

use std::fs::OpenOptions;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Args;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::notify::{LogNotifier, Notifier, TelegramNotifier};

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Base URL of the workout API
    #[arg(long, env = "TREINO_API_URL", default_value = "http://localhost:3333", global = true)]
    pub api_url: String,

    /// Local database for the login session
    #[arg(long, env = "TREINO_DB", default_value = "treino.db", global = true)]
    pub db_path: String,

    /// Telegram bot token for rest notifications
    #[arg(long, env = "TREINO_TELEGRAM_TOKEN", hide_env_values = true, global = true)]
    pub telegram_token: Option<String>,

    /// Telegram chat that receives rest notifications
    #[arg(long, env = "TREINO_TELEGRAM_CHAT", global = true)]
    pub telegram_chat: Option<i64>,

    /// Rest between sets when the exercise has none configured
    #[arg(long, env = "TREINO_REST_SECS", default_value_t = 90, global = true)]
    pub rest_secs: u64,

    /// Log file used while the workout screen owns the terminal
    #[arg(long, env = "TREINO_LOG", default_value = "treino.log", global = true)]
    pub log_path: String,
}

impl Config {
    pub fn default_rest(&self) -> Duration {
        Duration::from_secs(self.rest_secs)
    }

    /// Where log lines go: the log file while the TUI is up, stderr otherwise
    pub fn log_writer(&self, tui: bool) -> io::Result<BoxMakeWriter> {
        if !tui {
            return Ok(BoxMakeWriter::new(io::stderr));
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        Ok(BoxMakeWriter::new(Mutex::new(file)))
    }

    /// Telegram when both token and chat are set, the log otherwise
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        match (&self.telegram_token, self.telegram_chat) {
            (Some(token), Some(chat)) => Arc::new(TelegramNotifier::new(token.clone(), chat)),
            _ => Arc::new(LogNotifier),
        }
    }
}
