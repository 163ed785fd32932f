//! Ordered Collection Model — the single reorder primitive shared by the section
//! list and every entry list.
//!
//! Semantics are array-move, not swap: the source element is removed from its
//! old index and re-inserted at the target's original index. Every other element
//! keeps its relative order.

use std::sync::Arc;

use crate::editor::document::{Entry, EntryId, SectionId};

/// An element that can be addressed by a stable key inside an ordered list.
pub trait Keyed {
    type Key: PartialEq + std::fmt::Debug;

    fn key(&self) -> &Self::Key;
}

impl Keyed for SectionId {
    type Key = SectionId;

    fn key(&self) -> &SectionId {
        self
    }
}

impl Keyed for Arc<Entry> {
    type Key = EntryId;

    fn key(&self) -> &EntryId {
        &self.id
    }
}

/// Returns the index of `key` in `items` (first occurrence).
pub fn position_of<T: Keyed>(items: &[T], key: &T::Key) -> Option<usize> {
    items.iter().position(|item| item.key() == key)
}

/// Moves `source` to the position currently held by `target`.
///
/// Returns `None` when nothing would change: `source == target`, either key is
/// absent (e.g. a drag released over empty space), or the list has fewer than
/// two elements. Callers keep their original value in that case.
pub fn reorder<T: Keyed + Clone>(items: &[T], source: &T::Key, target: &T::Key) -> Option<Vec<T>> {
    if items.len() < 2 || source == target {
        return None;
    }

    let from = position_of(items, source)?;
    let to = position_of(items, target)?;

    let mut moved = items.to_vec();
    let element = moved.remove(from);
    moved.insert(to, element);
    Some(moved)
}

/// Moves `key` by `delta` positions (negative = towards the front), clamped to
/// the list bounds. This is the keyboard-sensor variant of a drag.
pub fn shift<T: Keyed + Clone>(items: &[T], key: &T::Key, delta: isize) -> Option<Vec<T>> {
    let from = position_of(items, key)?;
    let last = items.len().checked_sub(1)? as isize;
    let to = (from as isize).saturating_add(delta).clamp(0, last) as usize;
    if to == from {
        return None;
    }
    reorder(items, key, items[to].key())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
