use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One page of extracted reference text, as produced by the PDF extraction
/// step upstream of the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    #[serde(rename = "page")]
    pub number: u32,
    pub text: String,
}

/// Bounded span of reference text with page/section provenance.
///
/// Serialized form doubles as the chunk-source record consumed when the
/// vector index is populated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub file: String,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub text: String,
}

/// Provenance carried alongside each indexed chunk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

/// A single nearest-neighbor hit, ordered ascending by distance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMeta,
    pub distance: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientReport {
    pub patient_name: String,
    pub discharge_date: String,
    pub diagnosis: String,
    pub medications: Vec<String>,
    pub dietary_restrictions: Vec<String>,
    pub follow_up_instructions: Vec<String>,
    pub warning_signs: Vec<String>,
    pub discharge_instructions: Vec<String>,
}

/// Per-session conversation state: bound identity plus ordered turn history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSessionState {
    pub session_id: String,
    #[serde(default)]
    pub patient_report: Option<PatientReport>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

impl ChatSessionState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            patient_report: None,
            history: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
    #[serde(default)]
    pub patient_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    pub agent: String,
    pub handoff: Option<String>,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientLookupResponse {
    pub status: String,
    pub matches: Vec<PatientReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagQueryRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagQueryResponse {
    pub answer: String,
    pub citations: Vec<Citation>,
    pub retrieved_chunks: Vec<RetrievedChunk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchRequest {
    pub query: String,
    #[serde(default)]
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebSearchResponse {
    pub results: Vec<WebSearchResult>,
}
