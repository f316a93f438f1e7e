use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use serde::Serialize;
use triage_agents::{ConversationTurn, RouterResponse};

/// The triage service as seen from the chat.
#[async_trait]
pub trait RouterApi: Send + Sync {
    async fn route(
        &self,
        message: &str,
        conversation: &[ConversationTurn],
    ) -> Result<RouterResponse>;
}

#[derive(Serialize)]
struct RouterRequest<'a> {
    message: &'a str,
    conversation: &'a [ConversationTurn],
}

pub struct HttpRouterApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRouterApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/agents/router", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl RouterApi for HttpRouterApi {
    async fn route(
        &self,
        message: &str,
        conversation: &[ConversationTurn],
    ) -> Result<RouterResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&RouterRequest {
                message,
                conversation,
            })
            .send()
            .await
            .context("Failed to reach the triage service")?;

        let status = response.status();
        ensure!(status.is_success(), "Failed to process message: {status}");

        response
            .json::<RouterResponse>()
            .await
            .context("Malformed router response")
    }
}
