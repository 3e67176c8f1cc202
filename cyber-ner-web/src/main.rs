//! Servidor Axum com API HTTP e WebSocket para o NER de cibersegurança

mod config;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use cyber_ner_core::{
    build_lexicon_model, CancelToken, Lexicon, NerError, NerPipeline, PipelineEvent,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc as async_mpsc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

/// Estado compartilhado da aplicação.
///
/// `pipeline` é `None` quando o modelo não pôde ser carregado; o servidor sobe
/// mesmo assim e responde 500 nas análises.
struct AppState {
    pipeline: Option<Arc<NerPipeline>>,
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    ner_loaded: bool,
}

/// Cancela a análise em andamento quando o handler é descartado
/// (cliente desconectou antes da resposta).
struct CancelOnDrop(CancelToken);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::load()?;
    let state = Arc::new(AppState {
        pipeline: load_pipeline(&config).map(Arc::new),
    });

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("🚀 Servidor NER iniciado em http://{}", config.bind);
    info!("  POST /api/ner/analyze  GET /api/health  GET /ws");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

/// Monta o pipeline a partir do léxico embutido (+ léxico extra, se configurado).
fn load_pipeline(config: &ServerConfig) -> Option<NerPipeline> {
    let build = || -> cyber_ner_core::Result<NerPipeline> {
        let mut lexicon = Lexicon::builtin();
        if let Some(path) = &config.lexicon_path {
            lexicon.extend(Lexicon::from_file(path)?);
            info!(path = %path.display(), "léxico extra carregado");
        }
        let model = build_lexicon_model(&lexicon)?;
        NerPipeline::new(model, config.pipeline.clone())
    };
    match build() {
        Ok(pipeline) => {
            info!(
                max_len = config.pipeline.max_len,
                stride = config.pipeline.stride,
                "modelo NER carregado"
            );
            Some(pipeline)
        }
        Err(err) => {
            error!("falha ao carregar o modelo NER: {}", err);
            None
        }
    }
}

fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/ner/analyze", post(analyze_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn error_response(err: &NerError) -> Response {
    let status = match err {
        NerError::EmptyInput => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        ner_loaded: state.pipeline.is_some(),
    })
}

/// Análise NER via HTTP POST (sem streaming)
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<AnalyzeRequest>>,
) -> Response {
    let Some(pipeline) = state.pipeline.clone() else {
        return error_response(&NerError::ModelUnavailable);
    };
    let text = payload.map(|Json(req)| req.text).unwrap_or_default();
    if text.is_empty() {
        return error_response(&NerError::EmptyInput);
    }

    let cancel = CancelToken::new();
    let _guard = CancelOnDrop(cancel.clone());
    let start = Instant::now();
    let chars = text.len();

    // pipeline é síncrono e pesado: roda fora do runtime
    let result = tokio::task::spawn_blocking(move || pipeline.analyze_with_cancel(&text, &cancel)).await;

    match result {
        Ok(Ok(analysis)) => {
            info!(
                chars,
                entities = analysis.entity_count,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "análise concluída"
            );
            Json(analysis).into_response()
        }
        Ok(Err(err)) => {
            warn!("análise falhou: {}", err);
            error_response(&err)
        }
        Err(join_err) => error_response(&NerError::inference(join_err.to_string())),
    }
}

/// Upgrade HTTP → WebSocket
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Texto recebido pelo WebSocket: JSON `{"text": ...}` ou texto puro.
fn ws_text(message: &str) -> String {
    match serde_json::from_str::<AnalyzeRequest>(message) {
        Ok(req) => req.text,
        Err(_) => message.to_string(),
    }
}

/// Recebe textos e devolve os eventos do pipeline conforme são produzidos.
async fn handle_websocket(mut socket: WebSocket, state: Arc<AppState>) {
    info!("WebSocket conectado");

    while let Some(Ok(msg)) = socket.recv().await {
        let raw = match msg {
            Message::Text(raw) => raw,
            Message::Close(_) => break,
            _ => continue,
        };

        let text = ws_text(&raw);
        if text.trim().is_empty() {
            continue;
        }

        let Some(pipeline) = state.pipeline.clone() else {
            let event = PipelineEvent::Error {
                message: NerError::ModelUnavailable.to_string(),
            };
            if send_event(&mut socket, &event).await.is_err() {
                break;
            }
            continue;
        };

        info!("Analisando via WebSocket: {} chars", text.len());

        let cancel = CancelToken::new();
        let _guard = CancelOnDrop(cancel.clone());
        let mut rx_async = spawn_analysis(pipeline, text, cancel);

        while let Some(event) = rx_async.recv().await {
            if send_event(&mut socket, &event).await.is_err() {
                // cliente desconectou: o guard cancela o pipeline
                return;
            }
        }
    }

    info!("WebSocket desconectado");
}

/// Roda a análise em thread bloqueante e entrega os eventos num canal tokio.
///
/// Ponte std::mpsc (pipeline) → tokio mpsc (socket). O canal fecha depois do
/// evento final (`Done` ou `Error`).
fn spawn_analysis(
    pipeline: Arc<NerPipeline>,
    text: String,
    cancel: CancelToken,
) -> async_mpsc::UnboundedReceiver<PipelineEvent> {
    let (tx_std, rx_std) = std::sync::mpsc::channel::<PipelineEvent>();
    let (tx_async, rx_async) = async_mpsc::unbounded_channel::<PipelineEvent>();

    tokio::task::spawn_blocking(move || {
        pipeline.analyze_streaming(&text, &cancel, tx_std);
    });
    tokio::task::spawn_blocking(move || {
        for event in rx_std {
            if tx_async.send(event).is_err() {
                break;
            }
        }
    });
    rx_async
}

async fn send_event(socket: &mut WebSocket, event: &PipelineEvent) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => socket.send(Message::Text(json.into())).await,
        Err(err) => {
            warn!("falha ao serializar evento: {}", err);
            Ok(())
        }
    }
}
