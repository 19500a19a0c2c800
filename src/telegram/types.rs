use serde::{Deserialize, Serialize};

use crate::{
    bot::events::{Action, Command, InboundEvent},
    models::{ChatId, MessageRef, UserId},
    transport::Keyboard,
};

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
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
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

impl Message {
    pub fn reference(&self) -> MessageRef {
        MessageRef {
            chat: ChatId(self.chat.id),
            message_id: self.message_id,
        }
    }
}

impl Chat {
    /// `@`-less handle used in announcements
    pub fn display_name(&self) -> Option<String> {
        self.username.clone().or_else(|| self.first_name.clone())
    }
}

impl User {
    /// Handle when the user has one, first name otherwise
    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .unwrap_or_else(|| self.first_name.clone())
    }
}

impl Update {
    /// Convert to an engine event. Updates the bot does not act on (edits,
    /// messages from bots) yield `None`. Every button press yields an event,
    /// since each one has to be answered.
    pub fn into_event(self) -> Option<InboundEvent> {
        if let Some(query) = self.callback_query {
            let action = match query.data.as_deref().map(str::parse::<Action>) {
                Some(Ok(action)) => action,
                Some(Err(e)) => {
                    tracing::debug!("Ignoring callback {}: {}", query.id, e);
                    return Some(InboundEvent::Ignored { action_id: query.id });
                }
                None => return Some(InboundEvent::Ignored { action_id: query.id }),
            };
            let user = UserId(query.from.id);
            // Without the message, replies go to the presser's private chat
            let message = query.message.as_ref().map(Message::reference);
            return Some(InboundEvent::Action {
                action_id: query.id,
                chat: message.map(|m| m.chat).unwrap_or_else(|| user.into()),
                user,
                name: Some(query.from.display_name()),
                message,
                action,
            });
        }

        let message = self.message?;
        let from = message.from.filter(|user| !user.is_bot)?;
        let text = message.text?;
        let chat = ChatId(message.chat.id);
        let user = UserId(from.id);

        if text.starts_with('/') {
            return Command::parse(&text).map(|command| InboundEvent::Command {
                chat,
                user,
                command,
            });
        }
        Some(InboundEvent::Text { chat, user, text })
    }
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl From<&Keyboard> for InlineKeyboardMarkup {
    fn from(keyboard: &Keyboard) -> Self {
        Self {
            inline_keyboard: keyboard
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| InlineKeyboardButton {
                            text: button.label.clone(),
                            callback_data: button.action.tag(),
                        })
                        .collect()
                })
                .collect(),
        }
    }
}
