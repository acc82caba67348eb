//! Reply generation via the conversational agent

use async_trait::async_trait;

use crate::{Error, Result};

/// Response from a chat-completions-style API
#[derive(serde::Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(serde::Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(serde::Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Produces a conversational reply to a speaker's utterance
#[async_trait]
pub trait ReplyAgent: Send + Sync {
    /// Ask the agent for a reply to `text`, spoken by `speaker`.
    ///
    /// `routing_key` scopes the conversation so the agent can keep separate
    /// history per voice channel.
    ///
    /// # Errors
    ///
    /// Returns error if reply generation fails
    async fn reply(&self, speaker: &str, text: &str, routing_key: &str) -> Result<String>;
}

/// Chat-completions HTTP reply client
pub struct HttpReplyAgent {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl HttpReplyAgent {
    /// Create a new reply client.
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(endpoint: String, api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("API key required for replies".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl ReplyAgent for HttpReplyAgent {
    async fn reply(&self, speaker: &str, text: &str, routing_key: &str) -> Result<String> {
        let request = serde_json::json!({
            "model": self.model,
            "user": routing_key,
            "messages": [
                {
                    "role": "system",
                    "content": "You are talking in a voice channel. Keep replies short and speakable.",
                },
                {
                    "role": "user",
                    "content": format!("{speaker}: {text}"),
                },
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "reply request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "reply API error");
            return Err(Error::Reply(format!("reply API error {status}: {body}")));
        }

        let result: CompletionResponse = response.json().await?;
        let reply = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Reply("reply API returned no choices".to_string()))?;

        tracing::info!(speaker, reply = %reply, "reply generated");
        Ok(reply)
    }
}
