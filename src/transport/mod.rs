//! Outbound side of the chat platform.
//!
//! The game engine only talks to the chat through [`Transport`], so the
//! Telegram client and the in-memory test double are interchangeable.

#[cfg(test)]
pub mod mock;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    bot::events::Action,
    error::TransportError,
    models::{ChatId, MessageRef, UserId},
};

/// Text formatting requested for a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Plain,
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: Action,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Inline buttons attached to a message, row by row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    pub fn row(buttons: Vec<Button>) -> Self {
        Self {
            rows: vec![buttons],
        }
    }

    pub fn column(buttons: Vec<Button>) -> Self {
        Self {
            rows: buttons.into_iter().map(|b| vec![b]).collect(),
        }
    }

    pub fn single(label: impl Into<String>, action: Action) -> Self {
        Self::row(vec![Button::new(label, action)])
    }
}

/// Replacement content for an existing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditContent {
    Text(String),
    /// New caption for a photo message
    Caption(String),
    /// Swap the photo (and caption) of a message
    Photo { path: PathBuf, caption: String },
}

/// Result of a successful edit call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    Edited,
    /// The platform reported the content was identical; not an error
    Unchanged,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_message(
        &self,
        target: ChatId,
        text: &str,
        format: Format,
        actions: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    async fn send_photo(
        &self,
        target: ChatId,
        photo: &std::path::Path,
        caption: &str,
        format: Format,
        actions: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError>;

    async fn edit_message(
        &self,
        message: MessageRef,
        content: EditContent,
        format: Format,
        actions: Option<&Keyboard>,
    ) -> Result<EditOutcome, TransportError>;

    /// Acknowledge a button press, optionally with a toast or an alert
    async fn answer_action(
        &self,
        action_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), TransportError>;

    async fn resolve_display_name(&self, user: UserId) -> Result<String, TransportError>;
}

/// Best-effort display name, degrading to a numeric placeholder
pub async fn display_name(transport: &dyn Transport, user: UserId) -> String {
    match transport.resolve_display_name(user).await {
        Ok(name) => name,
        Err(e) => {
            tracing::debug!("Could not resolve name of user {}: {}", user, e);
            placeholder_name(user)
        }
    }
}

/// Name shown for a user whose name is unknown
pub fn placeholder_name(user: UserId) -> String {
    format!("Player {}", user)
}

/// Send and log failures instead of returning them
pub async fn notify(
    transport: &dyn Transport,
    target: ChatId,
    text: &str,
    actions: Option<&Keyboard>,
) -> Option<MessageRef> {
    match transport
        .send_message(target, text, Format::Markdown, actions)
        .await
    {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!("Failed to deliver message to chat {}: {}", target, e);
            None
        }
    }
}
