use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    completion::{CompletionModel, CompletionRequest},
    conversation::{ConversationTurn, Role},
    error::Result,
    extract::{extract_json, str_field},
};

/// Reply used when the model output cannot be decoded.
pub const FALLBACK_RESPONSE: &str = "Something went wrong. Please ask again.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub response_text: String,
    pub failed: bool,
}

fn focus(is_medical: bool, is_legal: bool) -> &'static str {
    if is_medical {
        "medical related help"
    } else if is_legal {
        "legal related help"
    } else {
        "general help"
    }
}

fn response_prompt(language: &str, is_medical: bool, is_legal: bool) -> String {
    format!(
        r#"You are a website chatbot. Your task is to respond to the message and determine the user need and return the response or ask for more details.
Always answer in {language} language. Please focus on the user need which is {focus}.
Always maintain context from the previous messages in the conversation.
Always answer in json format.
Example: {{"response": "Hello! How can I help you today?"}}"#,
        focus = focus(is_medical, is_legal)
    )
}

/// Writes the assistant's reply once the message has been classified.
pub struct ResponseAgent {
    model: Arc<dyn CompletionModel>,
}

impl ResponseAgent {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }

    /// `history` is expected to be truncated already. The current message is
    /// appended when it is not the last user turn of `history`.
    pub async fn respond(
        &self,
        message: &str,
        history: &[ConversationTurn],
        language: &str,
        is_medical: bool,
        is_legal: bool,
    ) -> Result<AgentResponse> {
        let instruction = response_prompt(language, is_medical, is_legal);

        let mut conversation = history.to_vec();
        let ends_with_message = history
            .last()
            .is_some_and(|turn| turn.role == Role::User && turn.content == message);
        if !ends_with_message {
            conversation.push(ConversationTurn::user(message));
        }

        let payload = serde_json::to_string(&json!({
            "system": instruction,
            "conversation": conversation,
        }))?;

        let raw = self
            .model
            .complete(&CompletionRequest::new(instruction, payload))
            .await?;
        debug!(agent = "response", raw = %raw, "Raw response output");

        let reply = extract_json(&raw, Value::Null);
        let result = match str_field(&reply, "response") {
            Some(text) => AgentResponse {
                response_text: text.to_string(),
                failed: false,
            },
            None => AgentResponse {
                response_text: FALLBACK_RESPONSE.to_string(),
                failed: true,
            },
        };

        info!(
            agent = "response",
            failed = result.failed,
            response_length = result.response_text.len(),
            "Response decoded"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    #[test]
    fn test_focus_prefers_medical() {
        assert_eq!(focus(true, true), "medical related help");
        assert_eq!(focus(false, true), "legal related help");
        assert_eq!(focus(false, false), "general help");
    }

    #[tokio::test]
    async fn test_prompt_uses_language_and_focus() {
        let model = Arc::new(
            ScriptedModel::new().reply("website chatbot", r#"{"response": "Je peux vous aider."}"#),
        );
        let agent = ResponseAgent::new(model.clone());

        let result = agent
            .respond("J'ai un litige", &[], "French", false, true)
            .await
            .unwrap();
        assert_eq!(result.response_text, "Je peux vous aider.");
        assert!(!result.failed);

        let request = &model.requests()[0];
        assert!(request.instruction.contains("Always answer in French language"));
        assert!(request.instruction.contains("legal related help"));
    }

    #[tokio::test]
    async fn test_current_message_appended_once() {
        let model = Arc::new(ScriptedModel::new().reply("website chatbot", r#"{"response": "ok"}"#));
        let agent = ResponseAgent::new(model.clone());

        let history = vec![
            ConversationTurn::assistant("Hi! How can I help you today?"),
            ConversationTurn::user("hello"),
        ];
        agent.respond("hello", &history, "English", false, false).await.unwrap();
        agent.respond("next", &history, "English", false, false).await.unwrap();

        let requests = model.requests();
        let first: serde_json::Value = serde_json::from_str(&requests[0].payload).unwrap();
        let second: serde_json::Value = serde_json::from_str(&requests[1].payload).unwrap();
        assert_eq!(first["conversation"].as_array().unwrap().len(), 2);
        assert_eq!(second["conversation"].as_array().unwrap().len(), 3);
        assert_eq!(second["conversation"][2]["content"], "next");
    }

    #[tokio::test]
    async fn test_undecodable_reply_uses_apology() {
        let model = ScriptedModel::new().reply("website chatbot", "Sorry, I am not able to do JSON");
        let result = ResponseAgent::new(Arc::new(model))
            .respond("hi", &[], "English", false, false)
            .await
            .unwrap();

        assert_eq!(result.response_text, FALLBACK_RESPONSE);
        assert!(result.failed);
    }

    #[tokio::test]
    async fn test_extra_mistyped_fields_do_not_drop_response() {
        let model = ScriptedModel::new().reply(
            "website chatbot",
            r#"{"response": "Claro, le ayudo.", "confidence": "high", "failed": "no"}"#,
        );
        let result = ResponseAgent::new(Arc::new(model))
            .respond("hola", &[], "Spanish", false, false)
            .await
            .unwrap();

        assert_eq!(result.response_text, "Claro, le ayudo.");
        assert!(!result.failed);
    }

    #[tokio::test]
    async fn test_reply_without_response_field() {
        let model = ScriptedModel::new().reply("website chatbot", r#"{"answer": "wrong key"}"#);
        let result = ResponseAgent::new(Arc::new(model))
            .respond("hi", &[], "English", false, false)
            .await
            .unwrap();

        assert_eq!(result.response_text, FALLBACK_RESPONSE);
        assert!(result.failed);
    }
}
