use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::editor::document::Document;
use crate::editor::reducer::Mutation;
use crate::editor::session::{
    DocumentEvent, DragRequest, EditorSession, ScopedDragState, Snapshot,
};
use crate::editor::templates::{self, Template, TEMPLATES};
use crate::editor::views::{FormView, PreviewView};
use crate::errors::AppError;
use crate::persistence::autosave::SaveStatus;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default = "default_template")]
    pub template_id: String,
    #[serde(default = "default_title")]
    pub title: String,
}

fn default_template() -> String {
    "classic".to_string()
}

fn default_title() -> String {
    "Untitled resume".to_string()
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub document: Arc<Document>,
    pub revision: u64,
    pub save_status: SaveStatus,
}

#[derive(Serialize)]
pub struct MutationResponse {
    pub applied: bool,
    pub revision: u64,
    pub document: Arc<Document>,
}

#[derive(Serialize)]
pub struct DragResponse {
    pub state: ScopedDragState,
    pub applied: bool,
    pub revision: u64,
}

#[derive(Serialize)]
pub struct SaveResponse {
    pub revision: u64,
    pub save_status: SaveStatus,
    /// Object key of the exported preview, when snapshot export is enabled.
    pub snapshot_key: Option<String>,
}

async fn open_session(state: &AppState, id: Uuid) -> Result<Arc<EditorSession>, AppError> {
    Ok(state.sessions.open(id).await?)
}

fn document_response(session: &EditorSession, snapshot: Snapshot) -> DocumentResponse {
    DocumentResponse {
        document: snapshot.document,
        revision: snapshot.revision,
        save_status: session.save_status(),
    }
}

/// GET /api/v1/templates
pub async fn handle_list_templates() -> Json<&'static [Template]> {
    Json(&TEMPLATES[..])
}

/// POST /api/v1/documents
pub async fn handle_create_document(
    State(state): State<AppState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>), AppError> {
    let template = templates::find(&req.template_id)
        .ok_or_else(|| AppError::Validation(format!("Unknown template '{}'", req.template_id)))?;
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }

    let session = state.sessions.create(template.instantiate(title)).await?;
    info!("Created document {} from template {}", session.id(), template.id);

    let snapshot = session.snapshot().await;
    Ok((
        StatusCode::CREATED,
        Json(document_response(&session, snapshot)),
    ))
}

/// GET /api/v1/documents/:id
pub async fn handle_get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DocumentResponse>, AppError> {
    let session = open_session(&state, id).await?;
    let snapshot = session.snapshot().await;
    Ok(Json(document_response(&session, snapshot)))
}

/// DELETE /api/v1/documents/:id
pub async fn handle_delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    // 404 for documents that never existed or are already deleted
    open_session(&state, id).await?;
    state.sessions.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/documents/:id/mutations
/// Unknown section/entry ids and unknown fields are accepted and leave the
/// document unchanged (`applied: false`).
pub async fn handle_apply_mutation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mutation): Json<Mutation>,
) -> Result<Json<MutationResponse>, AppError> {
    let session = open_session(&state, id).await?;
    let (snapshot, applied) = session.apply(&mutation).await;
    Ok(Json(MutationResponse {
        applied,
        revision: snapshot.revision,
        document: snapshot.document,
    }))
}

/// POST /api/v1/documents/:id/drag
pub async fn handle_drag_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DragRequest>,
) -> Result<Json<DragResponse>, AppError> {
    let session = open_session(&state, id).await?;
    let outcome = session.drag(request).await;
    Ok(Json(DragResponse {
        state: outcome.state,
        applied: outcome.applied,
        revision: outcome.snapshot.revision,
    }))
}

/// GET /api/v1/documents/:id/views/form
pub async fn handle_form_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FormView>, AppError> {
    let session = open_session(&state, id).await?;
    Ok(Json(session.form_view().await))
}

/// GET /api/v1/documents/:id/views/preview
pub async fn handle_preview_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PreviewView>, AppError> {
    let session = open_session(&state, id).await?;
    Ok(Json(session.preview_view().await))
}

/// GET /api/v1/documents/:id/save-status
pub async fn handle_save_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveStatus>, AppError> {
    let session = open_session(&state, id).await?;
    Ok(Json(session.save_status()))
}

/// POST /api/v1/documents/:id/save
/// Writes the current state immediately, then exports a preview snapshot if S3
/// is configured. A failed export is reported after the document was saved.
pub async fn handle_save(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaveResponse>, AppError> {
    let session = open_session(&state, id).await?;
    let snapshot = session.save_now().await?;

    let snapshot_key = match &state.snapshots {
        Some(exporter) => {
            let preview = PreviewView::project(&snapshot.document, snapshot.revision);
            Some(exporter.export(&preview).await?)
        }
        None => None,
    };

    Ok(Json(SaveResponse {
        revision: snapshot.revision,
        save_status: session.save_status(),
        snapshot_key,
    }))
}

/// GET /api/v1/documents/:id/events - SSE stream of document events
pub async fn handle_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let session = open_session(&state, id).await?;
    debug!("New SSE client connected to document {id}");

    let stream = BroadcastStream::new(session.subscribe()).filter_map(|result| async move {
        match result {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => Some(Ok(Event::default().event(event_name(&event)).data(json))),
                Err(e) => {
                    warn!("Failed to serialize document event: {e}");
                    None
                }
            },
            Err(e) => {
                // lagged receiver; the client refetches on the next `replaced`
                warn!("SSE stream error: {e:?}");
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

fn event_name(event: &DocumentEvent) -> &'static str {
    match event {
        DocumentEvent::Replaced { .. } => "replaced",
        DocumentEvent::SaveStatus { .. } => "save_status",
        DocumentEvent::Closed => "closed",
    }
}
