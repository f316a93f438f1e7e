pub mod classify;
pub mod completion;
pub mod conversation;
pub mod error;
pub mod extract;
pub mod respond;
pub mod router;

// Re-export commonly used types
pub use classify::{
    Classification, ClassificationAgent, LanguageAgent, LanguageDetection, LegalAgent,
    LegalClassification, MedicalAgent, MedicalClassification,
};
#[cfg(feature = "rig")]
pub use completion::OpenRouterCompletionModel;
pub use completion::{CompletionModel, CompletionRequest};
pub use conversation::{
    Conversation, ConversationTurn, HISTORY_WINDOW, Message, MessageMetadata, MessageStatus, Role,
    Sender,
};
pub use error::{AgentError, Result};
pub use extract::extract_json;
pub use respond::{AgentResponse, ResponseAgent};
pub use router::{MessageRouter, RouterResponse};

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::{AgentError, CompletionModel, CompletionRequest, Result};

    enum Reply {
        Text(String),
        Fail,
    }

    /// Answers by the first key found in the request instruction.
    pub struct ScriptedModel {
        replies: Vec<(&'static str, Reply)>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedModel {
        pub fn new() -> Self {
            Self {
                replies: Vec::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn reply(mut self, key: &'static str, text: &str) -> Self {
            self.replies.push((key, Reply::Text(text.to_string())));
            self
        }

        pub fn fail(mut self, key: &'static str) -> Self {
            self.replies.push((key, Reply::Fail));
            self
        }

        pub fn requests(&self) -> Vec<CompletionRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionModel for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String> {
            self.requests.lock().unwrap().push(request.clone());
            match self
                .replies
                .iter()
                .find(|(key, _)| request.instruction.contains(key))
            {
                Some((_, Reply::Text(text))) => Ok(text.clone()),
                Some((_, Reply::Fail)) => Err(AgentError::Completion("connection reset".to_string())),
                None => Err(AgentError::Completion("no scripted reply".to_string())),
            }
        }
    }
}
