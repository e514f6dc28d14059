use std::env;

use chrono::NaiveDate;
use reqwest::Client;

use crate::kst;
use crate::resolve::MenuEntry;

#[cfg(test)]
use std::sync::{Arc, Mutex};

/// Where failure reports and daily pushes go. `Log` only writes to the
/// process log; `Telegram` additionally forwards the message to a chat.
#[derive(Debug, Clone)]
pub enum Notifier {
    Log,
    Telegram {
        endpoint: String,
        chat_id: String,
        client: Client,
    },
    #[cfg(test)]
    Capture(Arc<Mutex<Vec<String>>>),
}

impl Notifier {
    /// Selects the channel from `NOTIFY_METHOD`. Telegram needs
    /// `TELEGRAM_BOT_TOKEN` and `TELEGRAM_CHAT_ID`; without them the
    /// notifier falls back to plain logging.
    pub fn from_env(client: &Client) -> Self {
        match env::var("NOTIFY_METHOD").as_deref() {
            Ok("telegram") => {
                let (Ok(token), Ok(chat_id)) =
                    (env::var("TELEGRAM_BOT_TOKEN"), env::var("TELEGRAM_CHAT_ID"))
                else {
                    log::warn!(
                        "NOTIFY_METHOD=telegram without TELEGRAM_BOT_TOKEN and \
                         TELEGRAM_CHAT_ID, falling back to log notifications"
                    );
                    return Self::Log;
                };
                Self::Telegram {
                    endpoint: format!("https://api.telegram.org/bot{token}/sendMessage"),
                    chat_id,
                    client: client.clone(),
                }
            }
            _ => Self::Log,
        }
    }

    #[cfg(test)]
    pub fn capture() -> (Self, Arc<Mutex<Vec<String>>>) {
        let sink = Arc::new(Mutex::new(Vec::new()));
        (Self::Capture(Arc::clone(&sink)), sink)
    }

    /// Reports a failure. Logged at error level and forwarded to the
    /// configured channel without blocking the caller.
    pub fn report(&self, message: &str) {
        log::error!("{message}");
        self.forward(message);
    }

    /// Sends an informational push, e.g. the daily menu message.
    pub fn send(&self, message: &str) {
        log::info!("{message}");
        self.forward(message);
    }

    fn forward(&self, message: &str) {
        match self {
            Self::Log => {}
            Self::Telegram {
                endpoint,
                chat_id,
                client,
            } => {
                let client = client.clone();
                let endpoint = endpoint.clone();
                let chat_id = chat_id.clone();
                let text = message.to_owned();
                tokio::spawn(async move {
                    if let Err(e) = send_telegram(&client, &endpoint, &chat_id, &text).await {
                        log::warn!("Telegram delivery failed: {e}");
                    }
                });
            }
            #[cfg(test)]
            Self::Capture(sink) => sink.lock().unwrap().push(message.to_owned()),
        }
    }
}

async fn send_telegram(
    client: &Client,
    endpoint: &str,
    chat_id: &str,
    text: &str,
) -> Result<(), reqwest::Error> {
    client
        .post(endpoint)
        .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

/// Push body for a day: header and date lines, then one bulleted dish per
/// line, a rest-day notice, or an unavailable notice.
#[must_use]
pub fn format_menu_message(date: NaiveDate, entry: &MenuEntry) -> String {
    let mut message = format!(
        "🏫 성신여대 운정교내식당\n📅 {}\n",
        kst::format_date_ko(date)
    );
    match entry {
        MenuEntry::Items(items) => {
            for item in items {
                message.push('\n');
                message.push_str("- ");
                message.push_str(item);
            }
        }
        MenuEntry::Closed => message.push_str("\n오늘은 쉽니다 (주말 또는 공휴일)"),
        MenuEntry::Absent => message.push_str("\n⚠️ 오늘의 메뉴 정보를 가져올 수 없습니다."),
    }
    message
}
