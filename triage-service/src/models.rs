use serde::{Deserialize, Serialize};
use triage_agents::ConversationTurn;

#[derive(Debug, Serialize, Deserialize)]
pub struct RouterRequest {
    pub message: String,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
}
