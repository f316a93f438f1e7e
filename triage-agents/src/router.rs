use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::{
    classify::{LanguageAgent, LegalAgent, MedicalAgent},
    completion::CompletionModel,
    conversation::ConversationTurn,
    error::Result,
    respond::ResponseAgent,
};

/// Merged result of one chat turn, as returned by `POST /agents/router`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterResponse {
    pub response_text: String,
    pub detected_language: String,
    pub is_medical_request: bool,
    pub is_legal_request: bool,
}

/// Runs the three classifiers and then the response agent for each message.
pub struct MessageRouter {
    language: LanguageAgent,
    medical: MedicalAgent,
    legal: LegalAgent,
    responder: ResponseAgent,
}

impl MessageRouter {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self {
            language: LanguageAgent::new(model.clone()),
            medical: MedicalAgent::new(model.clone()),
            legal: LegalAgent::new(model.clone()),
            responder: ResponseAgent::new(model),
        }
    }

    /// Routes one user message.
    ///
    /// The classifiers do not depend on each other and run concurrently.
    /// A classifier that could not decode its reply contributes its default
    /// and the turn carries on; a failed completion call fails the turn.
    /// Input is not screened here; the chat client drops blank messages.
    pub async fn route(
        &self,
        message: &str,
        conversation: &[ConversationTurn],
    ) -> Result<RouterResponse> {
        let turn_id = Uuid::new_v4();
        let span = info_span!("route", turn_id = %turn_id);

        async move {
            info!(
                message_length = message.len(),
                history_length = conversation.len(),
                "Routing message"
            );

            let (language, medical, legal) = tokio::try_join!(
                self.language.classify(message),
                self.medical.classify(message),
                self.legal.classify(message),
            )?;

            let reply = self
                .responder
                .respond(
                    message,
                    conversation,
                    &language.detected_language,
                    medical.is_medical_request,
                    legal.is_legal_request,
                )
                .await?;

            info!(
                detected_language = %language.detected_language,
                is_medical_request = medical.is_medical_request,
                is_legal_request = legal.is_legal_request,
                degraded = language.failed || medical.failed || legal.failed || reply.failed,
                "Message routed"
            );

            Ok(RouterResponse {
                response_text: reply.response_text,
                detected_language: language.detected_language,
                is_medical_request: medical.is_medical_request,
                is_legal_request: legal.is_legal_request,
            })
        }
        .instrument(span)
        .await
    }
}
