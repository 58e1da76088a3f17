// src/notifier.rs
use crate::config::WebhookConfig;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Delivers lists of new subdomains somewhere a human will see them
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, destination: &str, items: &[String]) -> anyhow::Result<()>;
}

/// Posts Discord-compatible messages to a webhook URL
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    secret: Option<String>,
    timeout: Duration,
    max_message_len: usize,
}

#[derive(Serialize)]
pub struct WebhookPayload<'a> {
    pub content: &'a str,
}

impl WebhookNotifier {
    pub fn new(cfg: &WebhookConfig) -> Self {
        Self {
            client: Client::new(),
            secret: cfg.secret.clone(),
            timeout: Duration::from_secs(cfg.timeout_secs.unwrap_or(5)),
            max_message_len: cfg.max_message_len.max(1),
        }
    }

    async fn post_chunk(&self, destination: &str, chunk: &str) -> anyhow::Result<()> {
        let body = serde_json::to_vec(&WebhookPayload { content: chunk })?;

        let mut req = self
            .client
            .post(destination)
            .timeout(self.timeout)
            .body(body.clone())
            .header("Content-Type", "application/json");

        // Optional HMAC signature header
        if let Some(secret) = &self.secret {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| anyhow::anyhow!("HMAC init error: {:?}", e))?;
            mac.update(&body);
            let sig = mac.finalize().into_bytes();
            req = req.header("X-SubScout-Signature", hex::encode(sig));
        }

        let resp = req.send().await?;
        resp.error_for_status()?; // non-2xx -> error

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, destination: &str, items: &[String]) -> anyhow::Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let message = format_message(items);
        let chunks = chunk_message(&message, self.max_message_len);

        debug!("Sending {} webhook messages", chunks.len());

        for chunk in &chunks {
            self.post_chunk(destination, chunk).await?;
        }

        Ok(())
    }
}

/// Count header followed by one subdomain per line
pub fn format_message(items: &[String]) -> String {
    let noun = if items.len() == 1 { "subdomain" } else { "subdomains" };
    let mut message = format!("[sub-scout] {} new {} discovered:\n", items.len(), noun);
    message.push_str(&items.join("\n"));
    message
}

/// Split `message` into pieces of at most `max_len` characters, breaking at
/// line boundaries where possible.
pub fn chunk_message(message: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in message.lines() {
        let line_len = line.chars().count();

        // Lines that can never fit are hard-split on char boundaries
        if line_len > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(max_len) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }

        let needed = if current.is_empty() { line_len } else { line_len + 1 };
        if current_len + needed > max_len {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}
