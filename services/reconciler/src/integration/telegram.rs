// Telegram Bot API client for prompts, notifications and order delivery

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

use super::Messenger;
use crate::error::{ReconcileError, Result};

pub struct TelegramMessenger {
    api_base: String,
    http_client: Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramMessenger {
    pub fn new(bot_token: &str) -> Self {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_base: format!("https://api.telegram.org/bot{}", bot_token),
            http_client,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn check(&self, response: reqwest::Response, method: &str) -> Result<()> {
        let status = response.status();
        let body: ApiResponse = response.json().await.map_err(|e| {
            ReconcileError::Messaging(format!("{} returned unreadable body: {}", method, e))
        })?;

        if body.ok {
            Ok(())
        } else {
            Err(ReconcileError::Messaging(format!(
                "{} failed ({}): {}",
                method,
                status,
                body.description.unwrap_or_else(|| "no description".to_string())
            )))
        }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let response = self
            .http_client
            .post(self.method_url("deleteMessage"))
            .json(&json!({ "chat_id": chat_id, "message_id": message_id }))
            .send()
            .await?;

        self.check(response, "deleteMessage").await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "Markdown",
            }))
            .send()
            .await?;

        self.check(response, "sendMessage").await
    }

    async fn send_document(&self, chat_id: i64, file_path: &Path) -> Result<()> {
        let payload = tokio::fs::read(file_path).await?;
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.txt".to_string());

        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", Part::bytes(payload).file_name(file_name));

        let response = self
            .http_client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;

        self.check(response, "sendDocument").await
    }
}
