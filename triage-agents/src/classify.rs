use serde::Serialize;
use serde_json::{Value, json};
use std::{fmt::Debug, marker::PhantomData, sync::Arc};
use tracing::{debug, info};

use crate::{
    completion::{CompletionModel, CompletionRequest},
    error::Result,
    extract::{bool_field, extract_json, f64_field, str_field},
};

const LANGUAGE_PROMPT: &str = r#"You are a language detection agent. Your task is to detect the language of the message and give the result in json format.
Example: {"isEnglish": true, "detectedLanguage": "English", "confidence": 1}"#;

const MEDICAL_PROMPT: &str = r#"You are a medical agent. Your task is to determine if the message is related to medical topics or not and give the result in json format.
Example: {"isMedicalRequest": true}"#;

const LEGAL_PROMPT: &str = r#"You are a legal agent. Your task is to determine if the message is related to legal topics or not and give the result in json format.
Example: {"isLegalRequest": true}"#;

/// A typed answer to one classification question.
///
/// [`Classification::from_reply`] reads each field on its own, so a partial
/// or partly mistyped reply still yields a complete value.
/// [`Classification::failed`] is what callers get when nothing usable came
/// back.
pub trait Classification: Serialize + Debug + Send + Sync + 'static {
    /// Name used in logs
    const AGENT: &'static str;
    /// Fixed instruction with the expected JSON shape
    const INSTRUCTION: &'static str;

    fn from_reply(reply: &Value) -> Self;

    fn failed() -> Self;
}

const DEFAULT_LANGUAGE: &str = "English";
const DEFAULT_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageDetection {
    pub is_english: bool,
    pub detected_language: String,
    pub confidence: f64,
    pub failed: bool,
}

impl Classification for LanguageDetection {
    const AGENT: &'static str = "language";
    const INSTRUCTION: &'static str = LANGUAGE_PROMPT;

    fn from_reply(reply: &Value) -> Self {
        Self {
            is_english: bool_field(reply, "isEnglish").unwrap_or(true),
            detected_language: str_field(reply, "detectedLanguage")
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
            confidence: f64_field(reply, "confidence").unwrap_or(DEFAULT_CONFIDENCE),
            failed: false,
        }
    }

    fn failed() -> Self {
        Self {
            is_english: true,
            detected_language: DEFAULT_LANGUAGE.to_string(),
            confidence: DEFAULT_CONFIDENCE,
            failed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalClassification {
    pub is_medical_request: bool,
    pub failed: bool,
}

impl Classification for MedicalClassification {
    const AGENT: &'static str = "medical";
    const INSTRUCTION: &'static str = MEDICAL_PROMPT;

    fn from_reply(reply: &Value) -> Self {
        Self {
            is_medical_request: bool_field(reply, "isMedicalRequest").unwrap_or(false),
            failed: false,
        }
    }

    fn failed() -> Self {
        Self {
            is_medical_request: false,
            failed: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegalClassification {
    pub is_legal_request: bool,
    pub failed: bool,
}

impl Classification for LegalClassification {
    const AGENT: &'static str = "legal";
    const INSTRUCTION: &'static str = LEGAL_PROMPT;

    fn from_reply(reply: &Value) -> Self {
        Self {
            is_legal_request: bool_field(reply, "isLegalRequest").unwrap_or(false),
            failed: false,
        }
    }

    fn failed() -> Self {
        Self {
            is_legal_request: false,
            failed: true,
        }
    }
}

/// Asks the completion endpoint one classification question about a message.
pub struct ClassificationAgent<C> {
    model: Arc<dyn CompletionModel>,
    _answer: PhantomData<fn() -> C>,
}

pub type LanguageAgent = ClassificationAgent<LanguageDetection>;
pub type MedicalAgent = ClassificationAgent<MedicalClassification>;
pub type LegalAgent = ClassificationAgent<LegalClassification>;

impl<C: Classification> ClassificationAgent<C> {
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self {
            model,
            _answer: PhantomData,
        }
    }

    /// Classifies `message`. A reply without a JSON object becomes
    /// `C::failed()`; only a transport failure of the completion call is
    /// returned as an error.
    pub async fn classify(&self, message: &str) -> Result<C> {
        let payload = serde_json::to_string(&json!({
            "system": C::INSTRUCTION,
            "currentMessage": message,
        }))?;
        let request = CompletionRequest::new(C::INSTRUCTION, payload);

        let raw = self.model.complete(&request).await?;
        debug!(agent = C::AGENT, raw = %raw, "Raw classification output");

        let result = match extract_json(&raw, Value::Null) {
            reply @ Value::Object(_) => C::from_reply(&reply),
            _ => C::failed(),
        };
        info!(agent = C::AGENT, result = ?result, "Classification decoded");

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;

    #[tokio::test]
    async fn test_language_agent_decodes_reply() {
        let model = ScriptedModel::new().reply(
            "language detection",
            r#"{"isEnglish": false, "detectedLanguage": "Spanish", "confidence": 0.97}"#,
        );
        let agent = LanguageAgent::new(Arc::new(model));

        let result = agent.classify("Hola, ¿cómo estás?").await.unwrap();
        assert_eq!(result.detected_language, "Spanish");
        assert!(!result.is_english);
        assert!(!result.failed);
    }

    #[tokio::test]
    async fn test_malformed_reply_yields_failed_default() {
        let model = Arc::new(
            ScriptedModel::new()
                .reply("language detection", "I think it's French?")
                .reply("medical agent", "yes, definitely medical")
                .reply("legal agent", "{not json}"),
        );

        let language = LanguageAgent::new(model.clone()).classify("x").await.unwrap();
        assert_eq!(language, LanguageDetection::failed());

        let medical = MedicalAgent::new(model.clone()).classify("x").await.unwrap();
        assert!(medical.failed);
        assert!(!medical.is_medical_request);

        let legal = LegalAgent::new(model).classify("x").await.unwrap();
        assert!(legal.failed);
        assert!(!legal.is_legal_request);
    }

    #[tokio::test]
    async fn test_partial_reply_fills_defaults() {
        let model = ScriptedModel::new().reply("language detection", r#"{"isEnglish": true}"#);
        let result = LanguageAgent::new(Arc::new(model)).classify("hi").await.unwrap();

        assert_eq!(result.detected_language, "English");
        assert_eq!(result.confidence, 1.0);
        assert!(!result.failed);
    }

    #[tokio::test]
    async fn test_payload_carries_instruction_and_message() {
        let model = Arc::new(ScriptedModel::new().reply("medical agent", r#"{"isMedicalRequest": true}"#));
        let agent = MedicalAgent::new(model.clone());

        assert!(agent.classify("my knee hurts").await.unwrap().is_medical_request);

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        let payload: serde_json::Value = serde_json::from_str(&requests[0].payload).unwrap();
        assert_eq!(payload["currentMessage"], "my knee hurts");
        assert_eq!(payload["system"], MEDICAL_PROMPT);
        assert_eq!(requests[0].instruction, MEDICAL_PROMPT);
    }

    #[tokio::test]
    async fn test_mistyped_confidence_keeps_language() {
        for confidence in [r#""high""#, "null"] {
            let reply = format!(
                r#"{{"isEnglish": false, "detectedLanguage": "Spanish", "confidence": {confidence}}}"#
            );
            let model = ScriptedModel::new().reply("language detection", &reply);
            let result = LanguageAgent::new(Arc::new(model))
                .classify("Estoy teniendo dolor en el pecho")
                .await
                .unwrap();

            assert_eq!(result.detected_language, "Spanish");
            assert!(!result.is_english);
            assert_eq!(result.confidence, 1.0);
            assert!(!result.failed);
        }
    }

    #[tokio::test]
    async fn test_quoted_flag_is_read() {
        let model = ScriptedModel::new().reply("medical agent", r#"{"isMedicalRequest": "true"}"#);
        let result = MedicalAgent::new(Arc::new(model)).classify("my knee hurts").await.unwrap();

        assert!(result.is_medical_request);
        assert!(!result.failed);
    }

    #[tokio::test]
    async fn test_non_object_reply_is_failed() {
        let model = ScriptedModel::new().reply("legal agent", "true");
        let result = LegalAgent::new(Arc::new(model)).classify("contract").await.unwrap();
        assert_eq!(result, LegalClassification::failed());
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let model = ScriptedModel::new().fail("legal agent");
        let result = LegalAgent::new(Arc::new(model)).classify("contract dispute").await;
        assert!(result.is_err());
    }
}
