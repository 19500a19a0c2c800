use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

use super::types::{ApiResponse, Chat, InlineKeyboardMarkup, Message, Update};
use crate::{
    error::TransportError,
    models::{ChatId, MessageRef, UserId},
    transport::{EditContent, EditOutcome, Format, Keyboard, Transport},
};

const API_BASE: &str = "https://api.telegram.org";

/// Thin Telegram Bot API client
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(http: reqwest::Client, token: &str) -> Self {
        Self {
            http,
            base_url: format!("{}/bot{}", API_BASE, token),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &impl Serialize,
    ) -> Result<T, TransportError> {
        let mut body = serde_json::to_value(payload)
            .map_err(|e| TransportError::Api(format!("cannot encode {} payload: {}", method, e)))?;
        // Optional parameters are omitted rather than sent as null
        if let Value::Object(fields) = &mut body {
            fields.retain(|_, value| !value.is_null());
        }

        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .json(&body)
            .send()
            .await?;
        unwrap_response(method, response.json::<ApiResponse<T>>().await?)
    }

    async fn call_multipart<T: DeserializeOwned>(
        &self,
        method: &str,
        form: Form,
    ) -> Result<T, TransportError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base_url, method))
            .multipart(form)
            .send()
            .await?;
        unwrap_response(method, response.json::<ApiResponse<T>>().await?)
    }

    /// Long-poll for updates after `offset`
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TransportError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "setWebhook",
                &json!({ "url": url, "allowed_updates": ["message", "callback_query"] }),
            )
            .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<(), TransportError> {
        let _: bool = self.call("deleteWebhook", &json!({})).await?;
        Ok(())
    }
}

fn unwrap_response<T>(method: &str, response: ApiResponse<T>) -> Result<T, TransportError> {
    match (response.ok, response.result) {
        (true, Some(result)) => Ok(result),
        _ => {
            let description = response
                .description
                .unwrap_or_else(|| format!("{} returned no result", method));
            if is_unreachable(&description) {
                Err(TransportError::Unreachable(description))
            } else {
                Err(TransportError::Api(description))
            }
        }
    }
}

/// The recipient blocked the bot or never opened a private chat with it
fn is_unreachable(description: &str) -> bool {
    description.starts_with("Forbidden") || description.contains("chat not found")
}

fn is_not_modified(error: &TransportError) -> bool {
    matches!(error, TransportError::Api(description) if description.contains("message is not modified"))
}

fn parse_mode(format: Format) -> Option<&'static str> {
    match format {
        Format::Plain => None,
        Format::Markdown => Some("Markdown"),
    }
}

fn markup(actions: Option<&Keyboard>) -> Option<InlineKeyboardMarkup> {
    actions.map(InlineKeyboardMarkup::from)
}

/// Common multipart fields of photo uploads
fn photo_form(
    chat: ChatId,
    caption: &str,
    format: Format,
    actions: Option<&Keyboard>,
) -> Result<Form, TransportError> {
    let mut form = Form::new()
        .text("chat_id", chat.0.to_string())
        .text("caption", caption.to_string());
    if let Some(mode) = parse_mode(format) {
        form = form.text("parse_mode", mode);
    }
    if let Some(markup) = markup(actions) {
        let encoded = serde_json::to_string(&markup)
            .map_err(|e| TransportError::Api(format!("cannot encode keyboard: {}", e)))?;
        form = form.text("reply_markup", encoded);
    }
    Ok(form)
}

async fn photo_part(path: &Path) -> Result<Part, TransportError> {
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "photo.png".to_string());
    Ok(Part::bytes(bytes).file_name(file_name).mime_str("image/png")?)
}

#[async_trait]
impl Transport for TelegramClient {
    async fn send_message(
        &self,
        target: ChatId,
        text: &str,
        format: Format,
        actions: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let message: Message = self
            .call(
                "sendMessage",
                &json!({
                    "chat_id": target.0,
                    "text": text,
                    "parse_mode": parse_mode(format),
                    "reply_markup": markup(actions),
                }),
            )
            .await?;
        Ok(message.reference())
    }

    async fn send_photo(
        &self,
        target: ChatId,
        photo: &Path,
        caption: &str,
        format: Format,
        actions: Option<&Keyboard>,
    ) -> Result<MessageRef, TransportError> {
        let form = photo_form(target, caption, format, actions)?.part("photo", photo_part(photo).await?);
        let message: Message = self.call_multipart("sendPhoto", form).await?;
        Ok(message.reference())
    }

    async fn edit_message(
        &self,
        message: MessageRef,
        content: EditContent,
        format: Format,
        actions: Option<&Keyboard>,
    ) -> Result<EditOutcome, TransportError> {
        // Edits return the message, or `true` for inline messages
        let result: Result<Value, TransportError> = match content {
            EditContent::Text(text) => {
                self.call(
                    "editMessageText",
                    &json!({
                        "chat_id": message.chat.0,
                        "message_id": message.message_id,
                        "text": text,
                        "parse_mode": parse_mode(format),
                        "reply_markup": markup(actions),
                    }),
                )
                .await
            }
            EditContent::Caption(caption) => {
                self.call(
                    "editMessageCaption",
                    &json!({
                        "chat_id": message.chat.0,
                        "message_id": message.message_id,
                        "caption": caption,
                        "parse_mode": parse_mode(format),
                        "reply_markup": markup(actions),
                    }),
                )
                .await
            }
            EditContent::Photo { path, caption } => {
                let media = json!({
                    "type": "photo",
                    "media": "attach://photo",
                    "caption": caption,
                    "parse_mode": parse_mode(format),
                });
                let form = photo_form(message.chat, &caption, format, actions)?
                    .text("message_id", message.message_id.to_string())
                    .text("media", media.to_string())
                    .part("photo", photo_part(&path).await?);
                self.call_multipart("editMessageMedia", form).await
            }
        };

        match result {
            Ok(_) => Ok(EditOutcome::Edited),
            Err(e) if is_not_modified(&e) => Ok(EditOutcome::Unchanged),
            Err(e) => Err(e),
        }
    }

    async fn answer_action(
        &self,
        action_id: &str,
        text: Option<&str>,
        alert: bool,
    ) -> Result<(), TransportError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &json!({
                    "callback_query_id": action_id,
                    "text": text,
                    "show_alert": alert,
                }),
            )
            .await?;
        Ok(())
    }

    async fn resolve_display_name(&self, user: UserId) -> Result<String, TransportError> {
        let chat: Chat = self.call("getChat", &json!({ "chat_id": user.0 })).await?;
        chat.display_name()
            .ok_or_else(|| TransportError::Api(format!("user {} has no name", user)))
    }
}
