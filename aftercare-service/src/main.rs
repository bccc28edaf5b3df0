use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, Level};

use aftercare_core::models::{
    ChatRequest, ChatResponse, PatientLookupResponse, RagQueryRequest, RagQueryResponse,
    WebSearchRequest, WebSearchResponse,
};
use aftercare_core::{
    citations, AuditLog, ClinicalAgent, DuckDuckGoSearch, FastembedEmbedder, FileAuditLog,
    InMemoryVectorIndex, JsonPatientDirectory, Orchestrator, PatientDirectory, ReceptionistAgent,
    Retriever, SessionStore, Settings, WebSearch,
};

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
    retriever: Arc<Retriever>,
    web: Arc<dyn WebSearch>,
    directory: Arc<JsonPatientDirectory>,
    audit: Arc<FileAuditLog>,
    app_name: String,
    web_search_results: usize,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(state: &AppState, context: &str, e: impl std::fmt::Display) -> ApiError {
    error!("{context}: {e}");
    state.audit.error(context, json!({ "error": e.to_string() }));
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal error".to_string(),
        }),
    )
}

async fn health(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    // Touch the patient db so seeding happens eagerly.
    state
        .directory
        .load_reports()
        .await
        .map_err(|e| internal_error(&state, "health check failed", e))?;
    Ok(Json(json!({ "status": "ok", "app": state.app_name })))
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    name: String,
}

async fn patients_lookup(
    Query(params): Query<LookupParams>,
    State(state): State<AppState>,
) -> Result<Json<PatientLookupResponse>, ApiError> {
    let matches = state
        .directory
        .lookup_by_name(&params.name)
        .await
        .map_err(|e| internal_error(&state, "patients_lookup failed", e))?;

    let response = if matches.is_empty() {
        PatientLookupResponse {
            status: "not_found".to_string(),
            matches,
            message: Some("No patient found".to_string()),
        }
    } else if matches.len() > 1 {
        PatientLookupResponse {
            status: "multiple".to_string(),
            matches,
            message: Some("Multiple matches".to_string()),
        }
    } else {
        PatientLookupResponse {
            status: "ok".to_string(),
            matches,
            message: None,
        }
    };
    Ok(Json(response))
}

async fn rag_query(
    State(state): State<AppState>,
    Json(body): Json<RagQueryRequest>,
) -> Result<Json<RagQueryResponse>, ApiError> {
    let retrieved = state
        .retriever
        .retrieve(&body.query, body.top_k)
        .await
        .map_err(|e| internal_error(&state, "rag_query failed", e))?;

    if retrieved.is_empty() {
        return Ok(Json(RagQueryResponse {
            answer: "No relevant context found.".to_string(),
            citations: Vec::new(),
            retrieved_chunks: Vec::new(),
        }));
    }

    let cites: Vec<_> = retrieved.iter().map(citations::citation_for).collect();
    let context = retrieved
        .iter()
        .take(3)
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let inline = citations::inline_citations(&cites);
    Ok(Json(RagQueryResponse {
        answer: format!("From reference {inline}:\n{context}"),
        citations: cites,
        retrieved_chunks: retrieved,
    }))
}

async fn search_web(
    State(state): State<AppState>,
    Json(body): Json<WebSearchRequest>,
) -> Result<Json<WebSearchResponse>, ApiError> {
    let max = body.max_results.unwrap_or(state.web_search_results);
    let results = state
        .web
        .search(&body.query, max)
        .await
        .map_err(|e| internal_error(&state, "search_web failed", e))?;
    Ok(Json(WebSearchResponse { results }))
}

async fn chat_session(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let response = state
        .orchestrator
        .handle_chat(
            body.session_id.as_deref(),
            &body.message,
            body.patient_name.as_deref(),
        )
        .await
        .map_err(|e| internal_error(&state, "chat_session failed", e))?;
    Ok(Json(response))
}

async fn agent_logs(State(state): State<AppState>) -> String {
    tokio::fs::read_to_string(state.audit.audit_path())
        .await
        .unwrap_or_default()
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/patients/lookup", get(patients_lookup))
        .route("/rag/query", post(rag_query))
        .route("/search/web", post(search_web))
        .route("/chat/session", post(chat_session))
        .route("/logs/agent", get(agent_logs))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .compact()
        .init();

    let settings = Settings::from_env();
    info!(app = %settings.app_name, "starting assistant service");

    let audit = Arc::new(FileAuditLog::new(
        settings.agent_audit_log_path.clone(),
        settings.error_log_path.clone(),
    ));
    let directory = Arc::new(JsonPatientDirectory::new(
        settings.patient_reports_path.clone(),
        settings.min_patient_records,
    ));
    let index = Arc::new(InMemoryVectorIndex::new(Arc::new(FastembedEmbedder)));
    let retriever = Arc::new(Retriever::new(
        index,
        settings.chunks_path.clone(),
        settings.num_retrieval_results,
    ));
    let web: Arc<dyn WebSearch> = Arc::new(DuckDuckGoSearch::new()?);

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(SessionStore::new(settings.session_ttl)),
        ReceptionistAgent::new(directory.clone(), audit.clone()),
        ClinicalAgent::new(
            retriever.clone(),
            web.clone(),
            audit.clone(),
            settings.web_search_results,
        ),
        audit.clone(),
    ));

    let state = AppState {
        orchestrator,
        retriever,
        web,
        directory,
        audit,
        app_name: settings.app_name.clone(),
        web_search_results: settings.web_search_results,
    };

    let app = build_router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("server running on http://0.0.0.0:{port}");
    info!("endpoints: GET /health, GET /patients/lookup, POST /rag/query, POST /search/web, POST /chat/session, GET /logs/agent");

    axum::serve(listener, app).await?;
    Ok(())
}
