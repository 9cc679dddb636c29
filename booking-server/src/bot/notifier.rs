//! Chat transport seam + staff notifications

use std::sync::Arc;

use async_trait::async_trait;

use super::router::Outgoing;
use super::{ChatError, ChatId, Keyboard};

#[async_trait]
pub trait ChatTransport: Send + Sync + std::fmt::Debug {
    async fn send_message(
        &self,
        chat: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChatError>;

    async fn edit_message(
        &self,
        chat: ChatId,
        message_id: i64,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), ChatError>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), ChatError>;
}

/// Deliver router output; failures are logged and skipped
pub async fn dispatch(transport: &dyn ChatTransport, actions: Vec<Outgoing>) {
    for action in actions {
        let result = match &action {
            Outgoing::Send {
                chat,
                text,
                keyboard,
            } => transport.send_message(*chat, text, keyboard.as_ref()).await,
            Outgoing::Edit {
                chat,
                message_id,
                text,
                keyboard,
            } => {
                transport
                    .edit_message(*chat, *message_id, text, keyboard.as_ref())
                    .await
            }
            Outgoing::Answer { callback_id, text } => {
                transport.answer_callback(callback_id, text.as_deref()).await
            }
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to deliver chat action");
        }
    }
}

/// Best-effort messages to the staff chat
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    transport: Option<Arc<dyn ChatTransport>>,
    staff_chat: Option<ChatId>,
}

impl Notifier {
    pub fn new(transport: Arc<dyn ChatTransport>, staff_chat: Option<ChatId>) -> Self {
        Self {
            transport: Some(transport),
            staff_chat,
        }
    }

    /// No chat configured: every notification is dropped
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn staff_chat(&self) -> Option<ChatId> {
        self.staff_chat
    }

    pub async fn notify(&self, text: &str) {
        let (Some(transport), Some(chat)) = (&self.transport, self.staff_chat) else {
            tracing::debug!("Staff notification skipped, no chat configured");
            return;
        };
        if let Err(e) = transport.send_message(chat, text, None).await {
            tracing::warn!(chat, error = %e, "Staff notification failed");
        }
    }
}
