//! Drag interaction state machine, one per draggable list.
//!
//! # States
//! - `Idle`
//! - `Pressed` — handle held but the pointer has not yet travelled past the
//!   activation distance. Still idle from the user's point of view; a release
//!   here is a plain click.
//! - `Dragging` — source picked up, not over any candidate.
//! - `DropPending` — source picked up, hovering the candidate whose midpoint is
//!   nearest the pointer.
//!
//! The machine only holds keys. The resulting [`DropIntent`] is applied to
//! whatever document is current at drop time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::editor::document::{EntryId, SectionId};
use crate::editor::reducer::Mutation;

/// Default activation distance in CSS pixels.
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn midpoint(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

/// A droppable element as currently laid out on screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate<K> {
    pub key: K,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DragEvent<K> {
    PointerDown { key: K, at: Point },
    PointerMove {
        at: Point,
        #[serde(default = "Vec::new")]
        candidates: Vec<Candidate<K>>,
    },
    PointerUp,
    Cancel,
    /// A list element disappeared while a drag was in progress.
    TargetRemoved { key: K },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DragState<K> {
    Idle,
    Pressed { key: K, origin: Point },
    Dragging { source: K },
    DropPending { source: K, target: K },
}

/// A completed drop: move `source` to `target`'s position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DropIntent<K> {
    pub source: K,
    pub target: K,
}

impl DropIntent<SectionId> {
    pub fn into_mutation(self) -> Mutation {
        Mutation::ReorderSections {
            source: self.source,
            target: self.target,
        }
    }
}

impl DropIntent<EntryId> {
    pub fn into_mutation(self, section: SectionId) -> Mutation {
        Mutation::ReorderEntries {
            section,
            source_id: self.source,
            target_id: self.target,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DragMachine<K> {
    state: DragState<K>,
    activation_distance: f64,
}

impl<K: Clone + PartialEq + std::fmt::Debug> DragMachine<K> {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            state: DragState::Idle,
            activation_distance,
        }
    }

    pub fn state(&self) -> &DragState<K> {
        &self.state
    }

    /// Advances the machine. Returns a drop intent only on a release over a
    /// candidate other than the source.
    pub fn handle(&mut self, event: DragEvent<K>) -> Option<DropIntent<K>> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);

        let (next, intent) = match (state, event) {
            (DragState::Idle, DragEvent::PointerDown { key, at }) => {
                (DragState::Pressed { key, origin: at }, None)
            }

            (DragState::Pressed { key, origin }, DragEvent::PointerMove { at, candidates }) => {
                if origin.distance(&at) > self.activation_distance {
                    debug!(source = ?key, "drag activated");
                    (hover(key, at, &candidates), None)
                } else {
                    (DragState::Pressed { key, origin }, None)
                }
            }

            (
                DragState::Dragging { source } | DragState::DropPending { source, .. },
                DragEvent::PointerMove { at, candidates },
            ) => (hover(source, at, &candidates), None),

            (DragState::DropPending { source, target }, DragEvent::PointerUp) => {
                if source == target {
                    (DragState::Idle, None)
                } else {
                    debug!(?source, ?target, "drop");
                    (DragState::Idle, Some(DropIntent { source, target }))
                }
            }

            (_, DragEvent::PointerUp | DragEvent::Cancel) => (DragState::Idle, None),

            (DragState::Pressed { key, .. }, DragEvent::TargetRemoved { key: removed })
                if key == removed =>
            {
                (DragState::Idle, None)
            }

            (
                DragState::Dragging { source } | DragState::DropPending { source, .. },
                DragEvent::TargetRemoved { key: removed },
            ) if source == removed => {
                debug!(?source, "drag source removed, cancelling");
                (DragState::Idle, None)
            }

            (DragState::DropPending { source, target }, DragEvent::TargetRemoved { key: removed })
                if target == removed =>
            {
                (DragState::Dragging { source }, None)
            }

            // Everything else leaves the state as it was (e.g. a second
            // pointer-down during a drag, or a move while idle).
            (state, _) => (state, None),
        };

        self.state = next;
        intent
    }
}

impl<K: Clone + PartialEq + std::fmt::Debug> Default for DragMachine<K> {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

/// Closest-midpoint collision: the candidate whose centre is nearest `at`.
fn closest_candidate<'a, K>(at: Point, candidates: &'a [Candidate<K>]) -> Option<&'a K> {
    candidates
        .iter()
        .map(|c| (c.rect.midpoint().distance(&at), &c.key))
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key)
}

fn hover<K: Clone>(source: K, at: Point, candidates: &[Candidate<K>]) -> DragState<K> {
    match closest_candidate(at, candidates) {
        Some(target) => DragState::DropPending {
            source,
            target: target.clone(),
        },
        None => DragState::Dragging { source },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
