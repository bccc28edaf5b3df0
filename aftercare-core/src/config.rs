use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings, read from environment variables with defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,

    /// Chunk source consumed when the vector index is empty.
    pub chunks_path: PathBuf,
    pub patient_reports_path: PathBuf,
    pub min_patient_records: usize,

    pub agent_audit_log_path: PathBuf,
    pub error_log_path: PathBuf,

    pub num_retrieval_results: usize,
    pub min_chunk_words: usize,
    pub max_chunk_words: usize,

    pub web_search_results: usize,

    pub session_ttl: Duration,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            app_name: env_or("APP_NAME", "Medical AI Assistant"),
            chunks_path: env_or("PDF_CHUNKS_PATH", "embeddings/chunks.json").into(),
            patient_reports_path: env_or(
                "PATIENT_REPORTS_PATH",
                "patient_data/patient_reports.json",
            )
            .into(),
            min_patient_records: env_or_usize("MIN_PATIENT_RECORDS", 25),
            agent_audit_log_path: env_or("AGENT_AUDIT_LOG_PATH", "logs/agent_audit.json").into(),
            error_log_path: env_or("ERROR_LOG_PATH", "logs/error.log").into(),
            num_retrieval_results: env_or_usize("NUM_RETRIEVAL_RESULTS", 4),
            min_chunk_words: env_or_usize("MIN_CHUNK_WORDS", 300),
            max_chunk_words: env_or_usize("MAX_CHUNK_WORDS", 500),
            web_search_results: env_or_usize("WEB_SEARCH_RESULTS", 5),
            session_ttl: Duration::from_secs(env_or_usize("SESSION_TTL_SECONDS", 60 * 60 * 6) as u64),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}
