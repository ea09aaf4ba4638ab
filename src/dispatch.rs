//! One-shot, non-streaming chat-completion calls.

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::error::CoachError;
use crate::lifecycle::PendingRequest;
use crate::providers::{first_reply_content, ChatCompletionRequest, WireMessage};

/// Issues exactly one POST per call to the configured endpoint.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    endpoint: String,
    api_token: String,
}

impl Dispatcher {
    pub fn new(config: &InferenceConfig) -> Result<Self, CoachError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        if config.api_token.is_empty() {
            warn!("no inference token configured; requests will be sent without credentials");
        }
        Ok(Self {
            client: builder.build()?,
            endpoint: config.endpoint.clone(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send `messages` to `model` and return `choices[0].message.content`.
    ///
    /// # Returns
    /// - `Ok(Some(text))` on a 2xx response carrying a reply.
    /// - `Ok(None)` on a 2xx JSON response without a reply field.
    /// - `Err(CoachError::Status)` on any non-2xx status, whatever the body.
    /// - `Err(CoachError::Transport)` on connection failure or a non-JSON body.
    pub async fn complete(
        &self,
        model: &str,
        messages: &[WireMessage],
    ) -> Result<Option<String>, CoachError> {
        let request = ChatCompletionRequest { model, stream: false, messages };
        debug!(model, messages = messages.len(), endpoint = %self.endpoint, "dispatching completion");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_token))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "inference request failed");
                CoachError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "inference endpoint returned an error status");
            return Err(CoachError::Status {
                status: status.as_u16(),
                url: self.endpoint.clone(),
            });
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            warn!(error = %e, "inference response was not JSON");
            CoachError::Transport(e)
        })?;
        let content = first_reply_content(&body);
        if content.is_none() {
            debug!("inference response carried no reply content");
        }
        Ok(content)
    }

    pub async fn send(&self, pending: &PendingRequest) -> Result<Option<String>, CoachError> {
        self.complete(&pending.model, &pending.messages).await
    }
}
