//! Long-polling Telegram front end.
//!
//! Every search runs in its own task with its own cancellation token, so a slow
//! site in one chat never delays replies in another.

use crate::config::BotConfig;
use crate::crawlers::{Fetcher, Walker};
use crate::results::PageResult;
use crate::session::{Action, ChatId, Sessions, render};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

pub type BotError = Box<dyn Error + Send + Sync>;

/// Runs the bot until Ctrl-C is received
pub async fn run<F>(config: &BotConfig, walker: Walker<F>) -> Result<(), BotError>
where
    F: Fetcher + 'static,
{
    let token = config.resolve_token()?;
    let api = BotApi::new(config, &token)?;
    let walker = Arc::new(walker);
    let mut sessions = Sessions::new();
    let mut offset: i64 = 0;

    ::log::info!("Telegram bot started, listening for updates");

    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                ::log::info!("Shutting down Telegram bot");
                return Ok(());
            }
            updates = api.get_updates(offset) => updates,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                ::log::warn!("getUpdates failed: {}; retrying in 5s", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            offset = update.update_id + 1;

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text else {
                continue;
            };
            let chat_id = message.chat.id;
            ::log::debug!("Message from chat {}", chat_id);

            match sessions.handle(chat_id, &text) {
                Action::Reply(reply) => api.send_logged(chat_id, &reply).await,
                Action::Search { request, cancel } => {
                    let api = api.clone();
                    let walker = Arc::clone(&walker);
                    let task = tokio::spawn(async move {
                        let result = walker.search_with_cancel(&request, &cancel).await;
                        // The /cancel handler has already answered
                        if matches!(result, PageResult::Cancelled { .. }) {
                            return;
                        }
                        let reply = render(request.search_term(), &result);
                        api.send_logged(chat_id, &reply).await;
                    });
                    sessions.track(chat_id, task);
                }
            }
        }
    }
}

/// Thin client for the two Bot API methods the bot needs
#[derive(Clone)]
struct BotApi {
    client: Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl BotApi {
    fn new(config: &BotConfig, token: &str) -> Result<Self, reqwest::Error> {
        // The HTTP timeout must outlast the long poll
        let client = Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", config.api_base.trim_end_matches('/'), token),
            poll_timeout_secs: config.poll_timeout_secs,
        })
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<TelegramUpdate>, BotError> {
        let url = format!("{}/getUpdates", self.base_url);
        let response = self
            .client
            .get(url)
            .query(&[
                ("timeout", self.poll_timeout_secs.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let payload: TelegramResponse<Vec<TelegramUpdate>> = response.json().await?;
        payload.into_result("getUpdates")
    }

    async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<(), BotError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = SendMessageRequest {
            chat_id,
            text,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let payload: TelegramResponse<serde_json::Value> = response.json().await?;
        payload.into_result("sendMessage").map(|_| ())
    }

    async fn send_logged(&self, chat_id: ChatId, text: &str) {
        if let Err(e) = self.send_message(chat_id, text).await {
            ::log::error!("sendMessage to chat {} failed: {}", chat_id, e);
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T: Default> TelegramResponse<T> {
    fn into_result(self, method: &str) -> Result<T, BotError> {
        if !self.ok {
            let description = self
                .description
                .unwrap_or_else(|| format!("telegram {} failed", method));
            return Err(description.into());
        }
        Ok(self.result.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: ChatId,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: ChatId,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_updates() {
        let json = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"}, "text": "https://news.example.com/"}},
                {"update_id": 11, "message": {"message_id": 2, "chat": {"id": 42, "type": "private"}, "sticker": {}}},
                {"update_id": 12, "edited_message": {"message_id": 1, "chat": {"id": 42}}}
            ]
        }"#;
        let payload: TelegramResponse<Vec<TelegramUpdate>> = serde_json::from_str(json).unwrap();
        let updates = payload.into_result("getUpdates").unwrap();

        assert_eq!(updates.len(), 3);
        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, 42);
        assert_eq!(first.text.as_deref(), Some("https://news.example.com/"));
        assert!(updates[1].message.as_ref().unwrap().text.is_none());
        assert!(updates[2].message.is_none());
    }

    #[test]
    fn test_error_payload() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let payload: TelegramResponse<Vec<TelegramUpdate>> = serde_json::from_str(json).unwrap();
        let error = payload.into_result("getUpdates").unwrap_err();
        assert_eq!(error.to_string(), "Unauthorized");
    }

    #[test]
    fn test_send_message_body() {
        let body = SendMessageRequest {
            chat_id: 42,
            text: "Reached the last page. The word was not found.",
            disable_web_page_preview: true,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["chat_id"], 42);
        assert_eq!(value["disable_web_page_preview"], true);
    }

    #[test]
    fn test_base_url_includes_token() {
        let config = BotConfig {
            api_base: "https://api.telegram.org/".to_string(),
            ..BotConfig::default()
        };
        let api = BotApi::new(&config, "123:abc").unwrap();
        assert_eq!(api.base_url, "https://api.telegram.org/bot123:abc");
    }
}
