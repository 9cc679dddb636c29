//! Telegram Bot API via REST (no SDK dependency)

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::router::{BotRouter, Incoming};
use super::{ChatError, ChatId, ChatTransport, Keyboard, dispatch};

const API_BASE: &str = "https://api.telegram.org";
/// Long-poll wait passed to getUpdates
const POLL_TIMEOUT_SECS: u64 = 25;
const RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

impl Update {
    /// Map to a router event; updates we do not handle yield `None`
    pub fn into_incoming(self) -> Option<Incoming> {
        if let Some(query) = self.callback_query {
            let message = query.message?;
            return Some(Incoming::Callback {
                chat: message.chat.id,
                user: query.from.id,
                message_id: message.message_id,
                callback_id: query.id,
                data: query.data.unwrap_or_default(),
            });
        }

        let message = self.message?;
        let text = message.text?;
        let user = message.from.map(|u| u.id).unwrap_or(message.chat.id);
        let chat = message.chat.id;

        if let Some(command) = text.strip_prefix('/') {
            let (head, args) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
            // `/list@MyBot` in groups
            let name = head.split('@').next().unwrap_or(head).to_lowercase();
            return Some(Incoming::Command {
                chat,
                user,
                name,
                args: args.trim().to_string(),
            });
        }
        Some(Incoming::Text { chat, user, text })
    }
}

pub struct TelegramClient {
    http: reqwest::Client,
    token: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(http: reqwest::Client, token: impl Into<String>) -> Self {
        Self {
            http,
            token: token.into(),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<T, ChatError> {
        let url = format!("{API_BASE}/bot{}/{method}", self.token);
        let mut request = self.http.post(url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let resp: ApiResponse<T> = request.send().await?.json().await?;
        match (resp.ok, resp.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(ChatError::Api(
                resp.description
                    .unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }

    /// Long poll; the request timeout outlasts the server-side wait
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, ChatError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message", "callback_query"],
            }),
            Some(Duration::from_secs(POLL_TIMEOUT_SECS + 10)),
        )
        .await
    }

    /// Switch to polling and drop updates queued while we were down
    pub async fn delete_webhook(&self) -> Result<(), ChatError> {
        let _: bool = self
            .call("deleteWebhook", &json!({ "drop_pending_updates": true }), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChatError> {
        let mut body = json!({ "chat_id": chat, "text": text, "parse_mode": "HTML" });
        if let Some(keyboard) = keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|e| ChatError::Api(e.to_string()))?;
        }
        let _: Value = self.call("sendMessage", &body, None).await?;
        Ok(())
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChatError> {
        let mut body = json!({
            "chat_id": chat,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        });
        // Only inline keyboards can be attached to an edited message
        if let Some(keyboard @ Keyboard::Inline { .. }) = keyboard {
            body["reply_markup"] = serde_json::to_value(keyboard)
                .map_err(|e| ChatError::Api(e.to_string()))?;
        }
        let _: Value = self.call("editMessageText", &body, None).await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), ChatError> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", &body, None).await?;
        Ok(())
    }
}

/// Long-polling loop, one task per update
pub struct TelegramPoller {
    client: Arc<TelegramClient>,
    router: BotRouter,
    shutdown: CancellationToken,
}

impl TelegramPoller {
    pub fn new(client: Arc<TelegramClient>, router: BotRouter, shutdown: CancellationToken) -> Self {
        Self {
            client,
            router,
            shutdown,
        }
    }

    pub async fn run(self) {
        if let Err(e) = self.client.delete_webhook().await {
            tracing::warn!(error = %e, "deleteWebhook failed, polling anyway");
        }
        tracing::info!("Telegram poller started");

        let mut offset = 0;
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Telegram poller received shutdown signal");
                    return;
                }
                result = self.client.get_updates(offset) => match result {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            if let Some(incoming) = update.into_incoming() {
                                self.spawn_handler(incoming);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "getUpdates failed, retrying in {}s", RETRY_DELAY.as_secs());
                        tokio::select! {
                            _ = self.shutdown.cancelled() => return,
                            _ = tokio::time::sleep(RETRY_DELAY) => {}
                        }
                    }
                }
            }
        }
    }

    fn spawn_handler(&self, incoming: Incoming) {
        let router = self.router.clone();
        let client = self.client.clone();
        tokio::spawn(async move {
            let actions = router.handle(incoming).await;
            dispatch(client.as_ref(), actions).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<Incoming> {
        serde_json::from_str::<Update>(json).unwrap().into_incoming()
    }

    #[test]
    fn test_command_update() {
        let incoming = parse(
            r#"{"update_id":1,"message":{"message_id":3,"chat":{"id":-42},"from":{"id":7},"text":"/new@ResaBot 2026-10-20 19:30 4 Ada Lovelace"}}"#,
        );
        assert_eq!(
            incoming,
            Some(Incoming::Command {
                chat: -42,
                user: 7,
                name: "new".into(),
                args: "2026-10-20 19:30 4 Ada Lovelace".into(),
            })
        );
    }

    #[test]
    fn test_text_and_callback_updates() {
        assert_eq!(
            parse(r#"{"update_id":2,"message":{"message_id":3,"chat":{"id":5},"text":"Ada"}}"#),
            Some(Incoming::Text {
                chat: 5,
                user: 5,
                text: "Ada".into()
            })
        );
        assert_eq!(
            parse(
                r#"{"update_id":3,"callback_query":{"id":"cb1","from":{"id":7},"message":{"message_id":11,"chat":{"id":5}},"data":"party_4"}}"#
            ),
            Some(Incoming::Callback {
                chat: 5,
                user: 7,
                message_id: 11,
                callback_id: "cb1".into(),
                data: "party_4".into(),
            })
        );
    }

    #[test]
    fn test_ignored_updates() {
        assert!(parse(r#"{"update_id":4,"message":{"message_id":3,"chat":{"id":5}}}"#).is_none());
        assert!(parse(r#"{"update_id":5}"#).is_none());
    }

    #[test]
    fn test_client_debug_hides_token() {
        let client = TelegramClient::new(reqwest::Client::new(), "123:secret");
        assert!(!format!("{client:?}").contains("secret"));
    }
}
