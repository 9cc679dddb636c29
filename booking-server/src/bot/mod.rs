//! Telegram 聊天前端
//!
//! - **callback**: 按钮 payload 解析/生成
//! - **session**: 每用户预订对话状态机 + TTL
//! - **keyboard**: 主菜单、日期/时间/人数选择、到店与容量管理键盘
//! - **render**: 消息文本 (HTML parse mode)
//! - **router**: `Incoming` 事件 → `Outgoing` 动作
//! - **telegram**: Bot API 客户端与长轮询
//! - **notifier**: 员工群通知 (best-effort)

pub mod callback;
pub mod keyboard;
pub mod notifier;
pub mod render;
pub mod router;
pub mod session;
pub mod telegram;

pub use callback::CallbackAction;
pub use keyboard::{InlineButton, Keyboard, MenuItem};
pub use notifier::{ChatTransport, Notifier, dispatch};
pub use router::{BotRouter, Incoming, Outgoing};
pub use session::{SessionState, SessionStore};
pub use telegram::{TelegramClient, TelegramPoller};

use thiserror::Error;

/// Chat id (group or private chat)
pub type ChatId = i64;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error: {0}")]
    Api(String),
}
