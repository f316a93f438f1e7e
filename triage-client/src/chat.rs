use consultation::ConsultationDraft;
use tracing::{debug, warn};
use triage_agents::{
    Conversation, ConversationTurn, HISTORY_WINDOW, Message, MessageMetadata, MessageStatus,
};

use crate::api::RouterApi;

pub const ERROR_REPLY: &str =
    "I'm sorry, but I encountered an error processing your message. Please try again later.";

/// One chat window: the message log plus the latest consultation offer.
pub struct ChatSession<A> {
    api: A,
    conversation: Conversation,
    offer: Option<ConsultationDraft>,
}

impl<A: RouterApi> ChatSession<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            conversation: Conversation::with_greeting(),
            offer: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Draft for the consultation offer, set by the last medical or legal reply.
    pub fn offer(&self) -> Option<&ConsultationDraft> {
        self.offer.as_ref()
    }

    /// Sends one user message and returns the bot reply. Blank input is ignored.
    pub async fn send(&mut self, input: &str) -> Option<&Message> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let mut history = self.conversation.recent_turns(HISTORY_WINDOW);
        history.push(ConversationTurn::user(text));

        let index = self.conversation.push(Message::user(text));
        self.conversation.advance_status(index, MessageStatus::Received);

        match self.api.route(text, &history).await {
            Ok(reply) => {
                let detected_language = if reply.detected_language.trim().is_empty() {
                    "English".to_string()
                } else {
                    reply.detected_language
                };
                debug!(
                    medical = reply.is_medical_request,
                    legal = reply.is_legal_request,
                    language = %detected_language,
                    "Router reply"
                );

                if reply.is_medical_request || reply.is_legal_request {
                    self.offer = Some(ConsultationDraft::for_topic(
                        reply.is_medical_request,
                        reply.is_legal_request,
                        detected_language.clone(),
                        text,
                    ));
                }

                let metadata = MessageMetadata {
                    is_medical_request: reply.is_medical_request,
                    is_legal_request: reply.is_legal_request,
                    detected_language,
                };
                self.conversation
                    .push(Message::bot(reply.response_text, Some(metadata)));
                self.conversation.advance_all(MessageStatus::Read);
            }
            Err(e) => {
                warn!(error = %e, "Error processing message");
                self.conversation.push(Message::bot(ERROR_REPLY, None));
            }
        }

        self.conversation.messages().last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use consultation::{ConsultationCategory, Urgency};
    use std::sync::Mutex;
    use triage_agents::{Role, RouterResponse};

    struct StubRouter {
        reply: Option<RouterResponse>,
        seen: Mutex<Vec<Vec<ConversationTurn>>>,
    }

    impl StubRouter {
        fn answering(reply: RouterResponse) -> Self {
            Self {
                reply: Some(reply),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn offline() -> Self {
            Self {
                reply: None,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RouterApi for StubRouter {
        async fn route(
            &self,
            _message: &str,
            conversation: &[ConversationTurn],
        ) -> Result<RouterResponse> {
            self.seen.lock().unwrap().push(conversation.to_vec());
            self.reply
                .clone()
                .ok_or_else(|| anyhow!("Failed to process message: 500 Internal Server Error"))
        }
    }

    fn reply(text: &str, language: &str, medical: bool, legal: bool) -> RouterResponse {
        RouterResponse {
            response_text: text.to_string(),
            detected_language: language.to_string(),
            is_medical_request: medical,
            is_legal_request: legal,
        }
    }

    #[tokio::test]
    async fn test_medical_reply_sets_offer() {
        let router = StubRouter::answering(reply("Llame a emergencias.", "Spanish", true, false));
        let mut chat = ChatSession::new(router);

        let bot = chat.send("Me duele el pecho").await.unwrap();
        assert_eq!(bot.text, "Llame a emergencias.");
        assert!(bot.metadata.as_ref().unwrap().is_medical_request);

        let draft = chat.offer().unwrap();
        assert_eq!(draft.category, ConsultationCategory::Medical);
        assert_eq!(draft.language, "Spanish");
        assert_eq!(draft.urgency, Urgency::Medium);
        assert_eq!(draft.summary, "Me duele el pecho");

        let user = &chat.conversation().messages()[1];
        assert_eq!(user.status, Some(MessageStatus::Read));
    }

    #[tokio::test]
    async fn test_history_window_includes_current_message() {
        let router = StubRouter::answering(reply("Sure.", "English", false, false));
        let mut chat = ChatSession::new(router);
        for i in 0..4 {
            chat.send(&format!("question {i}")).await;
        }

        let seen = chat.api.seen.lock().unwrap();
        let last = seen.last().unwrap();
        assert_eq!(last.len(), HISTORY_WINDOW + 1);
        assert_eq!(last[0], ConversationTurn::assistant("Sure."));
        assert_eq!(last.last().unwrap().role, Role::User);
        assert_eq!(last.last().unwrap().content, "question 3");
        assert!(chat.offer().is_none());
    }

    #[tokio::test]
    async fn test_router_failure_shows_apology() {
        let router = StubRouter::offline();
        let mut chat = ChatSession::new(router);

        let bot = chat.send("hello").await.unwrap();
        assert_eq!(bot.text, ERROR_REPLY);
        assert!(bot.metadata.is_none());

        let user = &chat.conversation().messages()[1];
        assert_eq!(user.status, Some(MessageStatus::Received));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let router = StubRouter::offline();
        let mut chat = ChatSession::new(router);
        assert!(chat.send("   ").await.is_none());
        assert_eq!(chat.conversation().len(), 1);
        assert!(chat.api.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_language_defaults_to_english() {
        let router = StubRouter::answering(reply("Consult a lawyer.", "", false, true));
        let mut chat = ChatSession::new(router);
        chat.send("My landlord kept my deposit").await;

        let draft = chat.offer().unwrap();
        assert_eq!(draft.category, ConsultationCategory::Legal);
        assert_eq!(draft.language, "English");
    }
}
