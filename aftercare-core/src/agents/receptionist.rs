//! Identity and routing agent.
//!
//! Runs a one-way state machine per session: unidentified until a directory
//! lookup finds exactly one patient, identified afterwards. Once identified,
//! medical-sounding messages are handed off to the clinical agent.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::audit::AuditLog;
use crate::error::Result;
use crate::models::ChatSessionState;
use crate::patients::PatientDirectory;

/// Messages containing any of these route to the clinical agent.
pub const MEDICAL_KEYWORDS: [&str; 11] = [
    "pain",
    "swelling",
    "shortness",
    "medication",
    "dose",
    "kidney",
    "urine",
    "bp",
    "diet",
    "potassium",
    "phosphorus",
];

#[derive(Debug, Clone)]
pub struct ReceptionistReply {
    pub message: String,
    pub handoff: bool,
}

impl ReceptionistReply {
    fn stay(message: String) -> Self {
        Self {
            message,
            handoff: false,
        }
    }
}

pub struct ReceptionistAgent {
    directory: Arc<dyn PatientDirectory>,
    audit: Arc<dyn AuditLog>,
}

impl ReceptionistAgent {
    pub fn new(directory: Arc<dyn PatientDirectory>, audit: Arc<dyn AuditLog>) -> Self {
        Self { directory, audit }
    }

    pub async fn handle(
        &self,
        state: &mut ChatSessionState,
        message: &str,
        patient_name: Option<&str>,
    ) -> Result<ReceptionistReply> {
        if state.patient_report.is_none() {
            return self.identify(state, patient_name).await;
        }

        let lowered = message.to_lowercase();
        if MEDICAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
            info!(session_id = %state.session_id, "routing message to clinical agent");
            return Ok(ReceptionistReply {
                message: "Routing to clinical agent for a detailed response.".to_string(),
                handoff: true,
            });
        }

        Ok(ReceptionistReply::stay(
            "I can help with scheduling, updating info, or passing your medical questions to our clinical AI."
                .to_string(),
        ))
    }

    async fn identify(
        &self,
        state: &mut ChatSessionState,
        patient_name: Option<&str>,
    ) -> Result<ReceptionistReply> {
        let Some(name) = patient_name.filter(|n| !n.trim().is_empty()) else {
            return Ok(ReceptionistReply::stay(
                "Hello! I'm your post-discharge assistant. May I have your full name to pull your report?"
                    .to_string(),
            ));
        };

        let mut matches = self.directory.lookup_by_name(name).await?;

        if matches.is_empty() {
            self.audit.agent_event(json!({
                "type": "patient_lookup",
                "result": "not_found",
                "query": name,
            }));
            return Ok(ReceptionistReply::stay(format!(
                "I couldn't find a patient matching '{name}'. Could you recheck the spelling?"
            )));
        }

        if matches.len() > 1 {
            let names: BTreeSet<&str> = matches.iter().map(|m| m.patient_name.as_str()).collect();
            let names = names.into_iter().collect::<Vec<_>>().join(", ");
            self.audit.agent_event(json!({
                "type": "patient_lookup",
                "result": "multiple",
                "query": name,
                "candidates": names,
            }));
            return Ok(ReceptionistReply::stay(format!(
                "I found multiple matches: {names}. Please confirm your full name."
            )));
        }

        let report = matches.remove(0);
        self.audit.agent_event(json!({
            "type": "patient_lookup",
            "result": "success",
            "patient_name": report.patient_name,
        }));
        let summary = format!(
            "Thanks, {}. Your primary diagnosis is {}. Follow-up: {}.\nHave you been able to take your medications as prescribed? Any new symptoms?",
            report.patient_name,
            report.diagnosis,
            report.follow_up_instructions.join("; "),
        );
        state.patient_report = Some(report);
        Ok(ReceptionistReply::stay(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NullAuditLog;
    use crate::models::PatientReport;
    use async_trait::async_trait;

    struct FixedDirectory {
        reports: Vec<PatientReport>,
    }

    #[async_trait]
    impl PatientDirectory for FixedDirectory {
        async fn lookup_by_name(&self, name: &str) -> Result<Vec<PatientReport>> {
            let needle = name.trim().to_lowercase();
            Ok(self
                .reports
                .iter()
                .filter(|r| r.patient_name.to_lowercase().contains(&needle))
                .cloned()
                .collect())
        }
    }

    fn report(name: &str) -> PatientReport {
        PatientReport {
            patient_name: name.to_string(),
            discharge_date: "2026-08-01".to_string(),
            diagnosis: "Nephrotic Syndrome".to_string(),
            medications: vec!["Diuretic".to_string()],
            dietary_restrictions: vec!["Low sodium".to_string()],
            follow_up_instructions: vec![
                "Check BMP in 1 week".to_string(),
                "Monitor blood pressure daily".to_string(),
            ],
            warning_signs: vec!["Chest pain".to_string()],
            discharge_instructions: vec!["Record daily weight".to_string()],
        }
    }

    fn agent(reports: Vec<PatientReport>) -> ReceptionistAgent {
        ReceptionistAgent::new(
            Arc::new(FixedDirectory { reports }),
            Arc::new(NullAuditLog),
        )
    }

    #[tokio::test]
    async fn asks_for_name_when_none_given() {
        let agent = agent(vec![report("Jordan Lee")]);
        let mut state = ChatSessionState::new("s1".to_string());
        let reply = agent.handle(&mut state, "Hi", None).await.unwrap();
        assert!(!reply.handoff);
        assert!(reply.message.contains("full name"));
        assert!(state.patient_report.is_none());
    }

    #[tokio::test]
    async fn unique_match_binds_report_and_summarizes() {
        let agent = agent(vec![report("Jordan Lee"), report("Morgan Miller")]);
        let mut state = ChatSessionState::new("s1".to_string());
        let reply = agent
            .handle(&mut state, "hello", Some("Jordan Lee"))
            .await
            .unwrap();
        assert!(!reply.handoff);
        assert!(reply.message.contains("Nephrotic Syndrome"));
        assert!(reply
            .message
            .contains("Check BMP in 1 week; Monitor blood pressure daily"));
        assert_eq!(
            state.patient_report.as_ref().map(|r| r.patient_name.as_str()),
            Some("Jordan Lee")
        );
    }

    #[tokio::test]
    async fn ambiguous_match_lists_sorted_names() {
        let agent = agent(vec![report("Taylor Smith"), report("Avery Taylor")]);
        let mut state = ChatSessionState::new("s1".to_string());
        let reply = agent
            .handle(&mut state, "hello", Some("taylor"))
            .await
            .unwrap();
        assert!(!reply.handoff);
        assert!(reply
            .message
            .contains("Avery Taylor, Taylor Smith"));
        assert!(state.patient_report.is_none());
    }

    #[tokio::test]
    async fn no_match_replies_not_found() {
        let agent = agent(vec![report("Jordan Lee")]);
        let mut state = ChatSessionState::new("s1".to_string());
        let reply = agent
            .handle(&mut state, "hello", Some("Zelda"))
            .await
            .unwrap();
        assert!(!reply.handoff);
        assert!(reply.message.contains("couldn't find"));
        assert!(state.patient_report.is_none());
    }

    #[tokio::test]
    async fn identified_medical_message_hands_off() {
        let agent = agent(vec![report("Jordan Lee")]);
        let mut state = ChatSessionState::new("s1".to_string());
        agent
            .handle(&mut state, "hello", Some("Jordan Lee"))
            .await
            .unwrap();

        let reply = agent
            .handle(&mut state, "I have Swelling in my legs", None)
            .await
            .unwrap();
        assert!(reply.handoff);

        let reply = agent
            .handle(&mut state, "can you reschedule my visit?", None)
            .await
            .unwrap();
        assert!(!reply.handoff);
        assert!(reply.message.contains("scheduling"));
    }
}
