//! Editing session — the single writer of one open document.
//!
//! The session holds the current `Arc<Document>` and replaces it wholesale on
//! every applied mutation, bumping a revision counter and broadcasting a
//! `DocumentEvent`. Views are projected on demand from the current snapshot and
//! never cached, so form and preview cannot drift apart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::editor::document::{Document, EntryId, SectionId};
use crate::editor::drag::{DragEvent, DragMachine, DragState, DEFAULT_ACTIVATION_DISTANCE};
use crate::editor::reducer::{self, Mutation};
use crate::editor::views::{FormView, PreviewView};
use crate::persistence::autosave::{Autosaver, SaveStatus, DEFAULT_QUIET_PERIOD};
use crate::persistence::{DocumentStore, LoadError, PersistError};

const EVENT_CAPACITY: usize = 64;

/// Default time a session may sit unused before it is evicted.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// State-replacement notifications for subscribers (SSE clients, tests).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DocumentEvent {
    Replaced { revision: u64 },
    SaveStatus { status: SaveStatus },
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub quiet_period: Duration,
    pub activation_distance: f64,
    pub idle_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// A consistent view of the document at one revision.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Arc<Document>,
    pub revision: u64,
}

/// A drag event addressed to one draggable list.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum DragRequest {
    Sections {
        event: DragEvent<SectionId>,
    },
    Entries {
        section: SectionId,
        event: DragEvent<EntryId>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScopedDragState {
    Sections(DragState<SectionId>),
    Entries(DragState<EntryId>),
}

#[derive(Debug, Clone)]
pub struct DragOutcome {
    pub state: ScopedDragState,
    /// True when the event completed a drop that changed the document.
    pub applied: bool,
    pub snapshot: Snapshot,
}

struct SessionState {
    document: Arc<Document>,
    revision: u64,
    section_drag: DragMachine<SectionId>,
    entry_drags: HashMap<SectionId, DragMachine<EntryId>>,
}

pub struct EditorSession {
    id: Uuid,
    state: RwLock<SessionState>,
    events: broadcast::Sender<DocumentEvent>,
    autosaver: Autosaver,
    activation_distance: f64,
    opened_at: Instant,
    /// Milliseconds after `opened_at` of the last access.
    last_active_ms: AtomicU64,
}

impl EditorSession {
    /// Opens a session over a document whose durable copy is already up to date.
    pub fn open(
        document: Document,
        store: Arc<dyn DocumentStore>,
        settings: SessionSettings,
    ) -> Arc<Self> {
        let document = Arc::new(document);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let autosaver = Autosaver::spawn(store, settings.quiet_period, document.clone());

        // Forward save-status changes as document events.
        let mut status_rx = autosaver.subscribe();
        let status_events = events.clone();
        tokio::spawn(async move {
            while status_rx.changed().await.is_ok() {
                let status = status_rx.borrow_and_update().clone();
                let _ = status_events.send(DocumentEvent::SaveStatus { status });
            }
        });

        info!("Opened editing session for document {}", document.id);
        Arc::new(Self {
            id: document.id,
            state: RwLock::new(SessionState {
                document,
                revision: 0,
                section_drag: DragMachine::new(settings.activation_distance),
                entry_drags: HashMap::new(),
            }),
            events,
            autosaver,
            activation_distance: settings.activation_distance,
            opened_at: Instant::now(),
            last_active_ms: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn touch(&self) {
        let elapsed = self.opened_at.elapsed().as_millis() as u64;
        self.last_active_ms.store(elapsed, Ordering::Relaxed);
    }

    /// Time since the session was last read or edited.
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_active_ms.load(Ordering::Relaxed));
        self.opened_at.elapsed().saturating_sub(last)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.touch();
        let state = self.state.read().await;
        Snapshot {
            document: state.document.clone(),
            revision: state.revision,
        }
    }

    /// Applies a mutation against the current document. A no-op leaves the
    /// revision untouched and schedules no save.
    pub async fn apply(&self, mutation: &Mutation) -> (Snapshot, bool) {
        self.touch();
        let mut state = self.state.write().await;
        let applied = self.apply_locked(&mut state, mutation);
        let snapshot = Snapshot {
            document: state.document.clone(),
            revision: state.revision,
        };
        (snapshot, applied)
    }

    /// Feeds a drag event to the list's state machine; a completed drop is
    /// applied against the document current at that moment.
    pub async fn drag(&self, request: DragRequest) -> DragOutcome {
        self.touch();
        let mut state = self.state.write().await;

        let (drag_state, mutation) = match request {
            DragRequest::Sections { event } => {
                let intent = state.section_drag.handle(event);
                (
                    ScopedDragState::Sections(state.section_drag.state().clone()),
                    intent.map(|i| i.into_mutation()),
                )
            }
            DragRequest::Entries { section, event } => {
                if !section.is_list() {
                    warn!(%section, "drag event for a section without entries ignored");
                    (ScopedDragState::Entries(DragState::Idle), None)
                } else {
                    let activation = self.activation_distance;
                    let machine = state
                        .entry_drags
                        .entry(section)
                        .or_insert_with(|| DragMachine::new(activation));
                    let intent = machine.handle(event);
                    (
                        ScopedDragState::Entries(machine.state().clone()),
                        intent.map(|i| i.into_mutation(section)),
                    )
                }
            }
        };

        let applied = match mutation {
            Some(mutation) => self.apply_locked(&mut state, &mutation),
            None => false,
        };

        DragOutcome {
            state: drag_state,
            applied,
            snapshot: Snapshot {
                document: state.document.clone(),
                revision: state.revision,
            },
        }
    }

    pub async fn form_view(&self) -> FormView {
        let snapshot = self.snapshot().await;
        FormView::project(&snapshot.document, snapshot.revision)
    }

    pub async fn preview_view(&self) -> PreviewView {
        let snapshot = self.snapshot().await;
        PreviewView::project(&snapshot.document, snapshot.revision)
    }

    pub fn save_status(&self) -> SaveStatus {
        self.autosaver.status()
    }

    /// Explicit save: writes the current document immediately. Mutations wait
    /// for the write, so the returned snapshot is exactly what was saved.
    pub async fn save_now(&self) -> Result<Snapshot, PersistError> {
        self.touch();
        let state = self.state.read().await;
        self.autosaver.flush().await?;
        Ok(Snapshot {
            document: state.document.clone(),
            revision: state.revision,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.events.subscribe()
    }

    fn close(&self, discard: bool) {
        if discard {
            self.autosaver.discard();
        }
        let _ = self.events.send(DocumentEvent::Closed);
    }

    /// Idle with no live event subscribers.
    fn is_evictable(&self, idle_timeout: Duration) -> bool {
        self.events.receiver_count() == 0 && self.idle_for() >= idle_timeout
    }

    fn apply_locked(&self, state: &mut SessionState, mutation: &Mutation) -> bool {
        let Some(next) = reducer::apply(&state.document, mutation) else {
            debug!(document_id = %self.id, ?mutation, "mutation left document unchanged");
            return false;
        };

        // A removed entry can no longer be a drag source or target.
        if let Mutation::RemoveEntry { section, entry_id } = mutation {
            if let Some(machine) = state.entry_drags.get_mut(section) {
                machine.handle(DragEvent::TargetRemoved {
                    key: entry_id.clone(),
                });
            }
        }

        state.document = Arc::new(next);
        state.revision += 1;
        self.autosaver.notify(state.document.clone());
        let _ = self.events.send(DocumentEvent::Replaced {
            revision: state.revision,
        });
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SessionRegistry
// ────────────────────────────────────────────────────────────────────────────

/// Open sessions by document id. At most one session per document.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<Uuid, Arc<EditorSession>>>>,
    store: Arc<dyn DocumentStore>,
    settings: SessionSettings,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>, settings: SessionSettings) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            store,
            settings,
        }
    }

    /// Persists a new document and opens a session over it.
    pub async fn create(&self, document: Document) -> Result<Arc<EditorSession>, PersistError> {
        self.store.save(document.id, &document).await?;
        let session = EditorSession::open(document, self.store.clone(), self.settings);
        self.sessions
            .lock()
            .await
            .insert(session.id(), session.clone());
        Ok(session)
    }

    /// Returns the open session, loading the document if needed. The load runs
    /// outside the registry lock; if two callers race, the first insert wins.
    pub async fn open(&self, id: Uuid) -> Result<Arc<EditorSession>, LoadError> {
        if let Some(session) = self.sessions.lock().await.get(&id) {
            return Ok(session.clone());
        }

        let document = self.store.load(id).await?;

        let session = self
            .sessions
            .lock()
            .await
            .entry(id)
            .or_insert_with(|| EditorSession::open(document, self.store.clone(), self.settings))
            .clone();
        Ok(session)
    }

    /// Deletes the document and drops its session without saving pending changes.
    pub async fn delete(&self, id: Uuid) -> Result<(), PersistError> {
        if let Some(session) = self.sessions.lock().await.remove(&id) {
            session.close(true);
        }
        self.store.delete(id).await
    }

    pub async fn open_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Closes sessions that have been idle for the configured timeout and are
    /// not held by any request or event subscriber. Pending changes are saved
    /// first; a session touched while saving stays open. Returns the number of
    /// evicted sessions.
    pub async fn evict_idle(&self) -> usize {
        let timeout = self.settings.idle_timeout;
        let candidates: Vec<Arc<EditorSession>> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|session| Arc::strong_count(session) == 1 && session.is_evictable(timeout))
            .cloned()
            .collect();

        let mut evicted = 0;
        for session in candidates {
            if let Err(e) = session.autosaver.flush().await {
                warn!("Saving idle session {} failed, keeping it open: {e}", session.id());
                continue;
            }

            let mut sessions = self.sessions.lock().await;
            // registry entry + this clone
            if Arc::strong_count(&session) == 2 && session.is_evictable(timeout) {
                sessions.remove(&session.id());
                session.close(false);
                evicted += 1;
                debug!("Evicted idle session for document {}", session.id());
            }
        }
        if evicted > 0 {
            info!("Evicted {evicted} idle editing session(s)");
        }
        evicted
    }

    /// Runs `evict_idle` periodically for the life of the process.
    pub fn spawn_eviction(&self, every: Duration) {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                registry.evict_idle().await;
            }
        });
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::document::EntryFields;
    use crate::editor::drag::{Candidate, Point, Rect};
    use crate::editor::templates;
    use crate::persistence::MemoryDocumentStore;
    use async_trait::async_trait;

    /// Memory store whose saves and loads take `delay`.
    struct SlowStore {
        inner: MemoryDocumentStore,
        delay: Duration,
    }

    #[async_trait]
    impl DocumentStore for SlowStore {
        async fn save(&self, id: Uuid, document: &Document) -> Result<(), PersistError> {
            tokio::time::sleep(self.delay).await;
            self.inner.save(id, document).await
        }

        async fn load(&self, id: Uuid) -> Result<Document, LoadError> {
            tokio::time::sleep(self.delay).await;
            self.inner.load(id).await
        }

        async fn delete(&self, id: Uuid) -> Result<(), PersistError> {
            self.inner.delete(id).await
        }
    }

    fn slow_registry(delay: Duration) -> (Arc<SlowStore>, SessionRegistry) {
        let store = Arc::new(SlowStore {
            inner: MemoryDocumentStore::new(),
            delay,
        });
        let registry = SessionRegistry::new(store.clone(), SessionSettings::default());
        (store, registry)
    }

    /// Autosave effectively disabled, one-minute idle timeout.
    fn evicting_registry() -> (Arc<MemoryDocumentStore>, SessionRegistry) {
        let store = Arc::new(MemoryDocumentStore::new());
        let settings = SessionSettings {
            quiet_period: Duration::from_secs(3600),
            idle_timeout: Duration::from_secs(60),
            ..SessionSettings::default()
        };
        (store.clone(), SessionRegistry::new(store, settings))
    }

    fn registry() -> (Arc<MemoryDocumentStore>, SessionRegistry) {
        let store = Arc::new(MemoryDocumentStore::new());
        let registry = SessionRegistry::new(store.clone(), SessionSettings::default());
        (store, registry)
    }

    fn point(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    fn row(key: SectionId, index: usize) -> Candidate<SectionId> {
        Candidate {
            key,
            rect: Rect {
                x: 0.0,
                y: index as f64 * 50.0,
                width: 300.0,
                height: 50.0,
            },
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_bumps_revision_and_broadcasts() {
        let (_, registry) = registry();
        let session = registry
            .create(templates::find("classic").unwrap().instantiate("CV"))
            .await
            .unwrap();
        let mut events = session.subscribe();

        let (snapshot, applied) = session
            .apply(&Mutation::SetSummary {
                text: "Hello".to_string(),
            })
            .await;
        assert!(applied);
        assert_eq!(snapshot.revision, 1);
        assert_eq!(events.recv().await.unwrap(), DocumentEvent::Replaced { revision: 1 });

        // no-op keeps revision and identity
        let (again, applied) = session
            .apply(&Mutation::SetSummary {
                text: "Hello".to_string(),
            })
            .await;
        assert!(!applied);
        assert_eq!(again.revision, 1);
        assert!(Arc::ptr_eq(&again.document, &snapshot.document));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutations_are_autosaved_once() {
        let (store, registry) = registry();
        let session = registry
            .create(Document::new("CV", "classic"))
            .await
            .unwrap();

        let (snapshot, _) = session
            .apply(&Mutation::AddEntry {
                section: SectionId::Experience,
                fields: EntryFields::new(),
            })
            .await;
        let entry_id = snapshot.document.entries(SectionId::Experience)[0].id.clone();
        for value in ["R", "Ru", "Rust engineer"] {
            session
                .apply(&Mutation::UpdateEntryField {
                    section: SectionId::Experience,
                    entry_id: entry_id.clone(),
                    field: "job_title".to_string(),
                    value: value.to_string(),
                })
                .await;
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        assert_eq!(session.save_status(), SaveStatus::Pending);

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(session.save_status(), SaveStatus::Saved);

        let stored = store.load(session.id()).await.unwrap();
        let entry = &stored.entries(SectionId::Experience)[0];
        assert_eq!(entry.id, entry_id);
        assert_eq!(entry.field("job_title"), "Rust engineer");
    }

    #[tokio::test(start_paused = true)]
    async fn test_section_drag_reorders_document() {
        let (_, registry) = registry();
        let session = registry
            .create(Document::new("CV", "classic"))
            .await
            .unwrap();
        let order = session.snapshot().await.document.order.order.clone();
        let candidates: Vec<_> = order
            .iter()
            .enumerate()
            .map(|(i, s)| row(*s, i))
            .collect();

        // pick up the 4th section (education, y=175) and drop it on the first
        let events = [
            DragEvent::PointerDown {
                key: order[3],
                at: point(10.0, 175.0),
            },
            DragEvent::PointerMove {
                at: point(10.0, 20.0),
                candidates: candidates.clone(),
            },
        ];
        for event in events {
            let outcome = session.drag(DragRequest::Sections { event }).await;
            assert!(!outcome.applied);
        }
        let outcome = session
            .drag(DragRequest::Sections {
                event: DragEvent::PointerUp,
            })
            .await;
        assert!(outcome.applied);
        assert_eq!(outcome.state, ScopedDragState::Sections(DragState::Idle));
        assert_eq!(outcome.snapshot.document.order.order[0], order[3]);
        assert_eq!(outcome.snapshot.document.order.order[1], order[0]);

        let form = session.form_view().await;
        assert_eq!(form.sections[0].section, order[3]);
        assert_eq!(form.revision, outcome.snapshot.revision);
    }

    #[tokio::test(start_paused = true)]
    async fn test_removing_drag_target_mid_drag_prevents_drop() {
        let (_, registry) = registry();
        let mut doc = Document::new("CV", "classic");
        for _ in 0..2 {
            doc = reducer::add_entry(&doc, SectionId::Projects, EntryFields::new()).unwrap();
        }
        let ids: Vec<EntryId> = doc
            .entries(SectionId::Projects)
            .iter()
            .map(|e| e.id.clone())
            .collect();
        let session = registry.create(doc).await.unwrap();

        let candidates: Vec<Candidate<EntryId>> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| Candidate {
                key: id.clone(),
                rect: Rect {
                    x: 0.0,
                    y: i as f64 * 50.0,
                    width: 300.0,
                    height: 50.0,
                },
            })
            .collect();

        for event in [
            DragEvent::PointerDown {
                key: ids[0].clone(),
                at: point(10.0, 25.0),
            },
            DragEvent::PointerMove {
                at: point(10.0, 80.0),
                candidates,
            },
        ] {
            session
                .drag(DragRequest::Entries {
                    section: SectionId::Projects,
                    event,
                })
                .await;
        }

        session
            .apply(&Mutation::RemoveEntry {
                section: SectionId::Projects,
                entry_id: ids[1].clone(),
            })
            .await;

        let outcome = session
            .drag(DragRequest::Entries {
                section: SectionId::Projects,
                event: DragEvent::PointerUp,
            })
            .await;
        assert!(!outcome.applied);
        assert_eq!(outcome.snapshot.document.entries(SectionId::Projects).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_reuses_open_session_and_deletes() {
        let (store, registry) = registry();
        let session = registry
            .create(Document::new("CV", "classic"))
            .await
            .unwrap();
        let id = session.id();

        let again = registry.open(id).await.unwrap();
        assert!(Arc::ptr_eq(&session, &again));
        assert_eq!(registry.open_count().await, 1);

        session
            .apply(&Mutation::Rename {
                title: "Renamed".to_string(),
            })
            .await;
        registry.delete(id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3000)).await;

        assert_eq!(registry.open_count().await, 0);
        assert!(matches!(registry.open(id).await, Err(LoadError::NotFound(_))));
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_unknown_document_fails() {
        let (_, registry) = registry();
        assert!(matches!(
            registry.open(Uuid::new_v4()).await,
            Err(LoadError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_save_reports_status() {
        let (store, registry) = registry();
        let session = registry
            .create(Document::new("CV", "classic"))
            .await
            .unwrap();
        session
            .apply(&Mutation::SetSummary {
                text: "Saved now".to_string(),
            })
            .await;

        let snapshot = session.save_now().await.unwrap();
        assert_eq!(snapshot.revision, 1);
        assert_eq!(session.save_status(), SaveStatus::Saved);
        assert_eq!(store.load(session.id()).await.unwrap().summary, "Saved now");
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_now_returns_the_state_it_wrote() {
        let (store, registry) = slow_registry(Duration::from_millis(100));
        let session = registry
            .create(Document::new("CV", "classic"))
            .await
            .unwrap();
        session
            .apply(&Mutation::SetSummary {
                text: "first".to_string(),
            })
            .await;

        let (saved, (after, applied)) = tokio::join!(session.save_now(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session
                .apply(&Mutation::SetSummary {
                    text: "second".to_string(),
                })
                .await
        });
        let saved = saved.unwrap();

        assert!(applied);
        assert_eq!(saved.revision, 1);
        assert_eq!(saved.document.summary, "first");
        assert_eq!(after.revision, 2);
        assert_eq!(store.inner.load(session.id()).await.unwrap().summary, "first");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_does_not_block_open_sessions() {
        let (store, registry) = slow_registry(Duration::from_secs(1));
        let open = registry
            .create(Document::new("Open", "classic"))
            .await
            .unwrap();
        let stored = Document::new("Stored", "classic");
        store.inner.save(stored.id, &stored).await.unwrap();

        let loading = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.open(stored.id).await })
        };
        tokio::task::yield_now().await;

        let again = tokio::time::timeout(Duration::from_millis(10), registry.open(open.id()))
            .await
            .expect("open session returned while another document was loading")
            .unwrap();
        assert!(Arc::ptr_eq(&open, &again));

        let loaded = loading.await.unwrap().unwrap();
        assert_eq!(loaded.snapshot().await.document.title, "Stored");
        assert_eq!(registry.open_count().await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_evicted_session_saves_pending_edit() {
        let (store, registry) = evicting_registry();
        let session = registry
            .create(Document::new("CV", "classic"))
            .await
            .unwrap();
        let id = session.id();
        session
            .apply(&Mutation::SetSummary {
                text: "unsaved".to_string(),
            })
            .await;
        assert_eq!(session.save_status(), SaveStatus::Pending);
        drop(session);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(registry.evict_idle().await, 1);
        assert_eq!(registry.open_count().await, 0);
        assert_eq!(store.load(id).await.unwrap().summary, "unsaved");

        // reopening starts a fresh session from the durable copy
        let reopened = registry.open(id).await.unwrap();
        let snapshot = reopened.snapshot().await;
        assert_eq!(snapshot.revision, 0);
        assert_eq!(snapshot.document.summary, "unsaved");
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_sessions_are_not_evicted() {
        let (_, registry) = evicting_registry();
        let held = registry
            .create(Document::new("Held", "classic"))
            .await
            .unwrap();
        let watched = registry
            .create(Document::new("Watched", "classic"))
            .await
            .unwrap();
        let recent = registry
            .create(Document::new("Recent", "classic"))
            .await
            .unwrap();
        let recent_id = recent.id();
        let _events = watched.subscribe();
        drop(watched);
        drop(recent);

        tokio::time::sleep(Duration::from_secs(50)).await;
        registry.open(recent_id).await.unwrap().snapshot().await;
        tokio::time::sleep(Duration::from_secs(20)).await;

        assert_eq!(registry.evict_idle().await, 0);
        assert_eq!(registry.open_count().await, 3);
        assert!(held.idle_for() >= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_background_eviction_runs_periodically() {
        let (_, registry) = evicting_registry();
        registry
            .create(Document::new("CV", "classic"))
            .await
            .unwrap();
        registry.spawn_eviction(Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(registry.open_count().await, 0);
    }
}
