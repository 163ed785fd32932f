//! Document/Order State management.
//!
//! Every operation is a pure function from the current document to a new one.
//! `None` means the instruction changed nothing (self-reorder, unknown section or
//! entry, value already set) and the caller keeps its current value, so a
//! replaced document always signals a real change.
//!
//! Unknown identifiers are ignored rather than rejected. They are logged at
//! `warn` so that a client sending stale ids shows up in the logs.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::editor::document::{
    CustomizationPatch, Document, Entry, EntryFields, EntryId, SectionId,
};
use crate::editor::ordering;

/// One editing instruction, as sent by the form, the preview or a drag drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    AddEntry {
        section: SectionId,
        #[serde(default)]
        fields: EntryFields,
    },
    UpdateEntryField {
        section: SectionId,
        entry_id: EntryId,
        field: String,
        value: String,
    },
    RemoveEntry {
        section: SectionId,
        entry_id: EntryId,
    },
    ReorderEntries {
        section: SectionId,
        source_id: EntryId,
        target_id: EntryId,
    },
    ShiftEntry {
        section: SectionId,
        entry_id: EntryId,
        delta: isize,
    },
    ReorderSections {
        source: SectionId,
        target: SectionId,
    },
    SetSectionVisibility {
        section: SectionId,
        visible: bool,
    },
    UpdateCustomization {
        patch: CustomizationPatch,
    },
    UpdatePersonalField {
        field: String,
        value: String,
    },
    SetSummary {
        text: String,
    },
    Rename {
        title: String,
    },
}

/// Applies a mutation. Returns `None` when the document would be unchanged.
pub fn apply(doc: &Document, mutation: &Mutation) -> Option<Document> {
    match mutation {
        Mutation::AddEntry { section, fields } => add_entry(doc, *section, fields.clone()),
        Mutation::UpdateEntryField {
            section,
            entry_id,
            field,
            value,
        } => update_entry_field(doc, *section, entry_id, field, value),
        Mutation::RemoveEntry { section, entry_id } => remove_entry(doc, *section, entry_id),
        Mutation::ReorderEntries {
            section,
            source_id,
            target_id,
        } => reorder_entries(doc, *section, source_id, target_id),
        Mutation::ShiftEntry {
            section,
            entry_id,
            delta,
        } => shift_entry(doc, *section, entry_id, *delta),
        Mutation::ReorderSections { source, target } => reorder_sections(doc, *source, *target),
        Mutation::SetSectionVisibility { section, visible } => {
            set_section_visibility(doc, *section, *visible)
        }
        Mutation::UpdateCustomization { patch } => update_customization(doc, patch),
        Mutation::UpdatePersonalField { field, value } => update_personal_field(doc, field, value),
        Mutation::SetSummary { text } => set_summary(doc, text),
        Mutation::Rename { title } => rename(doc, title),
    }
}

/// Like [`apply`], but always yields a document: the original one on a no-op.
pub fn apply_or_keep(doc: &Document, mutation: &Mutation) -> Document {
    apply(doc, mutation).unwrap_or_else(|| doc.clone())
}

// ────────────────────────────────────────────────────────────────────────────
// Entry operations
// ────────────────────────────────────────────────────────────────────────────

/// Appends an entry with a freshly generated id.
pub fn add_entry(doc: &Document, section: SectionId, fields: EntryFields) -> Option<Document> {
    if !section.is_list() {
        warn!(%section, "add_entry on a singleton section ignored");
        return None;
    }
    let entry = Arc::new(Entry::new(section, fields));
    debug!(%section, entry_id = %entry.id, "entry added");

    let mut list = doc.entries(section).to_vec();
    list.push(entry);
    Some(with_entries(doc, section, list))
}

/// Replaces one field of one entry. Every other entry keeps its `Arc`.
pub fn update_entry_field(
    doc: &Document,
    section: SectionId,
    entry_id: &EntryId,
    field: &str,
    value: &str,
) -> Option<Document> {
    if !section.has_field(field) {
        warn!(%section, field, "update of unknown entry field ignored");
        return None;
    }
    let entries = doc.entries(section);
    let Some(index) = ordering::position_of(entries, entry_id) else {
        warn!(%section, %entry_id, "update of unknown entry ignored");
        return None;
    };
    if entries[index].field(field) == value {
        return None;
    }

    let mut updated = Entry::clone(&entries[index]);
    updated.fields.insert(field.to_string(), value.to_string());

    let mut list = entries.to_vec();
    list[index] = Arc::new(updated);
    Some(with_entries(doc, section, list))
}

/// Removes an entry. Removing an absent entry is a no-op, which makes this idempotent.
pub fn remove_entry(doc: &Document, section: SectionId, entry_id: &EntryId) -> Option<Document> {
    let entries = doc.entries(section);
    let index = ordering::position_of(entries, entry_id)?;

    let mut list = entries.to_vec();
    list.remove(index);
    debug!(%section, %entry_id, "entry removed");
    Some(with_entries(doc, section, list))
}

pub fn reorder_entries(
    doc: &Document,
    section: SectionId,
    source_id: &EntryId,
    target_id: &EntryId,
) -> Option<Document> {
    let entries = doc.entries(section);
    if source_id != target_id
        && (ordering::position_of(entries, source_id).is_none()
            || ordering::position_of(entries, target_id).is_none())
    {
        warn!(%section, %source_id, %target_id, "reorder with unknown entry ignored");
        return None;
    }
    let list = ordering::reorder(entries, source_id, target_id)?;
    Some(with_entries(doc, section, list))
}

pub fn shift_entry(
    doc: &Document,
    section: SectionId,
    entry_id: &EntryId,
    delta: isize,
) -> Option<Document> {
    let list = ordering::shift(doc.entries(section), entry_id, delta)?;
    Some(with_entries(doc, section, list))
}

// ────────────────────────────────────────────────────────────────────────────
// Section operations
// ────────────────────────────────────────────────────────────────────────────

pub fn reorder_sections(doc: &Document, source: SectionId, target: SectionId) -> Option<Document> {
    let order = ordering::reorder(&doc.order.order, &source, &target)?;
    let mut next = touched(doc);
    next.order.order = order;
    Some(next)
}

/// Sets a section's visibility. Order is left as is.
pub fn set_section_visibility(
    doc: &Document,
    section: SectionId,
    visible: bool,
) -> Option<Document> {
    if doc.order.is_visible(section) == visible && doc.order.visibility.contains_key(&section) {
        return None;
    }
    let mut next = touched(doc);
    next.order.visibility.insert(section, visible);
    Some(next)
}

// ────────────────────────────────────────────────────────────────────────────
// Singleton edits & customization
// ────────────────────────────────────────────────────────────────────────────

pub fn update_customization(doc: &Document, patch: &CustomizationPatch) -> Option<Document> {
    let merged = doc.customization.merged(patch);
    if merged == doc.customization {
        return None;
    }
    let mut next = touched(doc);
    next.customization = merged;
    Some(next)
}

pub fn update_personal_field(doc: &Document, field: &str, value: &str) -> Option<Document> {
    match doc.personal.field(field) {
        None => {
            warn!(field, "update of unknown personal field ignored");
            None
        }
        Some(current) if current == value => None,
        Some(_) => {
            let mut personal = doc.personal.as_ref().clone();
            if let Some(slot) = personal.field_mut(field) {
                *slot = value.to_string();
            }
            let mut next = touched(doc);
            next.personal = Arc::new(personal);
            Some(next)
        }
    }
}

pub fn set_summary(doc: &Document, text: &str) -> Option<Document> {
    if doc.summary == text {
        return None;
    }
    let mut next = touched(doc);
    next.summary = text.to_string();
    Some(next)
}

pub fn rename(doc: &Document, title: &str) -> Option<Document> {
    let title = title.trim();
    if title.is_empty() || doc.title == title {
        return None;
    }
    let mut next = touched(doc);
    next.title = title.to_string();
    Some(next)
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

/// Shallow copy with a fresh `updated_at`. Content `Arc`s are shared.
fn touched(doc: &Document) -> Document {
    let mut next = doc.clone();
    next.updated_at = Utc::now();
    next
}

fn with_entries(doc: &Document, section: SectionId, list: Vec<Arc<Entry>>) -> Document {
    let mut next = touched(doc);
    next.sections.insert(section, Arc::new(list));
    next
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
