//! Per-turn entry point: resolves the session, drives the receptionist, and
//! hands medical questions to the clinical agent within the same turn.

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::agents::{ClinicalAgent, ReceptionistAgent};
use crate::audit::AuditLog;
use crate::error::Result;
use crate::models::{ChatResponse, ChatTurn, Role};
use crate::session::SessionStore;

pub struct Orchestrator {
    sessions: Arc<SessionStore>,
    receptionist: ReceptionistAgent,
    clinical: ClinicalAgent,
    audit: Arc<dyn AuditLog>,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<SessionStore>,
        receptionist: ReceptionistAgent,
        clinical: ClinicalAgent,
        audit: Arc<dyn AuditLog>,
    ) -> Self {
        Self {
            sessions,
            receptionist,
            clinical,
            audit,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles one chat turn. Recoverable conditions (unknown patient,
    /// ambiguous name, empty retrieval, empty web search) resolve into reply
    /// text; only collaborator failures propagate, leaving the turn with just
    /// the user's own message persisted.
    pub async fn handle_chat(
        &self,
        session_id: Option<&str>,
        message: &str,
        patient_name: Option<&str>,
    ) -> Result<ChatResponse> {
        let (sid, handle) = self.sessions.get_or_create(session_id);
        // Lock held for the whole turn: appends for one session never
        // interleave.
        let mut state = handle.lock().await;

        state.history.push(ChatTurn {
            role: Role::User,
            content: message.to_string(),
            timestamp: Utc::now(),
        });

        let reply = self
            .receptionist
            .handle(&mut state, message, patient_name)
            .await?;

        if reply.handoff {
            let clinical = self.clinical.handle(message).await?;
            state.history.push(ChatTurn {
                role: Role::Assistant,
                content: clinical.answer.clone(),
                timestamp: Utc::now(),
            });
            self.audit.agent_event(json!({
                "type": "handoff",
                "from": "receptionist",
                "to": "clinical",
                "reason": "medical_query",
            }));
            info!(session_id = %sid, "turn answered by clinical agent");
            return Ok(ChatResponse {
                session_id: sid,
                response: clinical.answer,
                agent: "clinical".to_string(),
                handoff: Some("receptionist->clinical".to_string()),
                citations: clinical.citations,
            });
        }

        state.history.push(ChatTurn {
            role: Role::Assistant,
            content: reply.message.clone(),
            timestamp: Utc::now(),
        });
        info!(session_id = %sid, "turn answered by receptionist");
        Ok(ChatResponse {
            session_id: sid,
            response: reply.message,
            agent: "receptionist".to_string(),
            handoff: None,
            citations: Vec::new(),
        })
    }
}
