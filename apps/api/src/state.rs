use crate::config::Config;
use crate::editor::session::SessionRegistry;
use crate::persistence::snapshots::SnapshotExporter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Open editing sessions; owns the document store.
    pub sessions: SessionRegistry,
    /// Markdown preview export on explicit save. `None` when S3 is not configured.
    pub snapshots: Option<SnapshotExporter>,
    pub config: Config,
}
