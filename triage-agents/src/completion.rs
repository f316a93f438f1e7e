use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// A single prompt sent to the completion endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// System instruction, used as the model preamble
    pub instruction: String,
    /// User payload, already serialized as text
    pub payload: String,
}

impl CompletionRequest {
    pub fn new(instruction: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            payload: payload.into(),
        }
    }
}

/// The hosted text-completion endpoint the agents talk to.
///
/// Constructed once by the process entry point and shared by every agent.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    fn model_id(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[cfg(feature = "rig")]
pub use openrouter::OpenRouterCompletionModel;

#[cfg(feature = "rig")]
mod openrouter {
    use async_trait::async_trait;
    use rig::completion::Prompt;
    use rig::prelude::*;
    use rig::providers::openrouter;
    use tracing::debug;

    use super::{CompletionModel, CompletionRequest};
    use crate::error::{AgentError, Result};

    /// Completion model served through OpenRouter.
    pub struct OpenRouterCompletionModel {
        client: openrouter::Client,
        model: String,
    }

    impl OpenRouterCompletionModel {
        pub fn new(api_key: &str, model: impl Into<String>) -> Self {
            Self {
                client: openrouter::Client::new(api_key),
                model: model.into(),
            }
        }
    }

    #[async_trait]
    impl CompletionModel for OpenRouterCompletionModel {
        fn model_id(&self) -> &str {
            &self.model
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            debug!(
                model = %self.model,
                payload_length = request.payload.len(),
                "Sending completion request"
            );

            let agent = self
                .client
                .agent(&self.model)
                .preamble(&request.instruction)
                .build();

            agent
                .prompt(request.payload.clone())
                .await
                .map_err(|e| AgentError::Completion(e.to_string()))
        }
    }
}
