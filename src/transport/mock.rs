use std::{
    collections::{HashMap, HashSet},
    path::Path,
    sync::{
        atomic::{AtomicI64, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use super::{EditContent, EditOutcome, Format, Keyboard, Transport};
use crate::{
    error::TransportError,
    models::{ChatId, MessageRef, UserId},
};

/// Everything the engine asked the transport to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Message {
        chat: ChatId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat: ChatId,
        caption: String,
    },
    Edit {
        message: MessageRef,
        content: EditContent,
    },
    Answer {
        action_id: String,
        text: Option<String>,
        alert: bool,
    },
}

/// In-memory transport recording all outgoing traffic
#[derive(Debug, Default)]
pub struct RecordingTransport {
    outgoing: Mutex<Vec<Outgoing>>,
    names: Mutex<HashMap<UserId, String>>,
    unreachable: Mutex<HashSet<ChatId>>,
    edit_delay: Mutex<Duration>,
    next_id: AtomicI64,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&self, user: UserId, name: &str) {
        self.names.lock().unwrap().insert(user, name.to_string());
    }

    /// Make every delivery to `chat` fail
    pub fn make_unreachable(&self, chat: ChatId) {
        self.unreachable.lock().unwrap().insert(chat);
    }

    /// Make every edit take `delay` before it is recorded
    pub fn set_edit_delay(&self, delay: Duration) {
        *self.edit_delay.lock().unwrap() = delay;
    }

    pub fn outgoing(&self) -> Vec<Outgoing> {
        self.outgoing.lock().unwrap().clone()
    }

    /// Texts of messages sent to `chat`, in order
    pub fn texts_to(&self, chat: ChatId) -> Vec<String> {
        self.outgoing()
            .into_iter()
            .filter_map(|o| match o {
                Outgoing::Message { chat: c, text, .. } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn any_text_contains(&self, chat: ChatId, needle: &str) -> bool {
        self.texts_to(chat).iter().any(|t| t.contains(needle))
    }

    pub fn answers(&self) -> Vec<(Option<String>, bool)> {
        self.outgoing()
            .into_iter()
            .filter_map(|o| match o {
                Outgoing::Answer { text, alert, .. } => Some((text, alert)),
                _ => None,
            })
            .collect()
    }

    /// Number of photos sent to `chat`
    pub fn photos_to(&self, chat: ChatId) -> usize {
        self.outgoing()
            .iter()
            .filter(|o| matches!(o, Outgoing::Photo { chat: c, .. } if *c == chat))
            .count()
    }

    pub fn edits(&self) -> Vec<(MessageRef, EditContent)> {
        self.outgoing()
            .into_iter()
            .filter_map(|o| match o {
                Outgoing::Edit { message, content } => Some((message, content)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.outgoing.lock().unwrap().clear();
    }

    fn check_reachable(&self, chat: ChatId) -> Result<(), TransportError> {
        if self.unreachable.lock().unwrap().contains(&chat) {
            return Err(TransportError::Unreachable(format!("chat {}", chat)));
        }
        Ok(())
    }

    fn record(&self, outgoing: Outgoing) {
        self.outgoing.lock().unwrap().push(outgoing);
    }

    fn next_ref(&self, chat: ChatId) -> MessageRef {
        MessageRef {
            chat,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_message(
        &self,
        target: ChatId,
        text: &str,
        _format: Format,
        actions: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.check_reachable(target)?;
        self.record(Outgoing::Message {
            chat: target,
            text: text.to_string(),
            keyboard: actions.cloned(),
        });
        Ok(self.next_ref(target))
    }

    async fn send_photo(
        &self,
        target: ChatId,
        _photo: &Path,
        caption: &str,
        _format: Format,
        _actions: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        self.check_reachable(target)?;
        self.record(Outgoing::Photo {
            chat: target,
            caption: caption.to_string(),
        });
        Ok(self.next_ref(target))
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        content: EditContent,
        _format: Format,
        _actions: Option<&Keyboard>,
    ) -> Result<EditOutcome, TransportError> {
        let delay = *self.edit_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.check_reachable(message.chat)?;
        self.record(Outgoing::Edit { message, content });
        Ok(EditOutcome::Edited)
    }

    async fn answer_action(
        &self,
        action_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), TransportError> {
        self.record(Outgoing::Answer {
            action_id: action_id.to_string(),
            text: text.map(str::to_string),
            alert,
        });
        Ok(())
    }

    async fn resolve_display_name(&self, user: UserId) -> Result<String, TransportError> {
        self.names
            .lock()
            .unwrap()
            .get(&user)
            .cloned()
            .ok_or_else(|| TransportError::Api("chat not found".to_string()))
    }
}
