// src/services/notifier.rs

//! Webhook notification sink.

use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::MessageFormat;
use crate::pipeline::rank::RunSummary;

/// Posts run summaries to a chat webhook.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    format: MessageFormat,
}

impl WebhookNotifier {
    pub fn new(client: Client, url: impl Into<String>, format: MessageFormat) -> Self {
        Self {
            client,
            url: url.into(),
            format,
        }
    }

    /// Message body for the configured format.
    pub fn payload(&self, summary: &RunSummary) -> Value {
        match self.format {
            MessageFormat::Text => text_payload(&summary.render_text()),
            MessageFormat::Card => card_payload(&summary.title(), &summary.render_markdown()),
        }
    }

    pub async fn send(&self, summary: &RunSummary) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload(summary))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::sink("webhook", format!("status {status}")));
        }

        // Chat webhooks answer 200 with a non-zero code on rejected messages.
        if let Ok(body) = response.json::<Value>().await {
            let code = body
                .get("code")
                .or_else(|| body.get("StatusCode"))
                .and_then(Value::as_i64)
                .unwrap_or(0);
            if code != 0 {
                let message = body
                    .get("msg")
                    .and_then(Value::as_str)
                    .unwrap_or("rejected");
                return Err(AppError::sink("webhook", format!("code {code}: {message}")));
            }
        }

        log::info!("Webhook notification delivered");
        Ok(())
    }
}

pub fn text_payload(text: &str) -> Value {
    json!({
        "msg_type": "text",
        "content": { "text": text }
    })
}

pub fn card_payload(title: &str, markdown: &str) -> Value {
    json!({
        "msg_type": "interactive",
        "card": {
            "config": { "wide_screen_mode": true },
            "header": {
                "template": "blue",
                "title": { "tag": "plain_text", "content": title }
            },
            "elements": [
                { "tag": "markdown", "content": markdown }
            ]
        }
    })
}
