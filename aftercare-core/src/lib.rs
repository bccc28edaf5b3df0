//! Core of the post-discharge patient assistant: offline chunking of
//! reference text, retrieval with citations, and the two-role conversational
//! pipeline (receptionist identity/routing, clinical answering) over
//! per-session state.

pub mod agents;
pub mod audit;
pub mod chunker;
pub mod citations;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod patients;
pub mod retriever;
pub mod session;
pub mod vector_index;
pub mod web_search;

pub use agents::{ClinicalAgent, ClinicalAnswer, ReceptionistAgent, ReceptionistReply};
pub use audit::{AuditLog, FileAuditLog, NullAuditLog};
pub use chunker::{chunk_pages, ChunkerConfig};
pub use config::Settings;
pub use error::{AssistError, Result};
pub use models::{
    ChatRequest, ChatResponse, ChatSessionState, ChatTurn, Chunk, ChunkMeta, Citation, Page,
    PatientReport, RetrievedChunk, Role,
};
pub use orchestrator::Orchestrator;
pub use patients::{JsonPatientDirectory, PatientDirectory};
pub use retriever::Retriever;
pub use session::SessionStore;
pub use vector_index::{Embedder, FastembedEmbedder, InMemoryVectorIndex, VectorIndex};
pub use web_search::{DuckDuckGoSearch, WebSearch};
