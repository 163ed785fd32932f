//! Dual-view projections. Neither view owns state: both are recomputed from one
//! `Document` snapshot, keyed by the same `EntryId`s, and stamped with the
//! revision they were projected from.

use serde::Serialize;
use uuid::Uuid;

use crate::editor::document::{
    Customization, Document, Entry, EntryId, LayoutVariant, PersonalInfo, SectionId,
};

// ────────────────────────────────────────────────────────────────────────────
// Form view
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormEntry {
    pub id: EntryId,
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormBody {
    Personal { fields: Vec<FormField> },
    Summary { text: String },
    Entries { entries: Vec<FormEntry> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSection {
    pub section: SectionId,
    pub title: String,
    pub visible: bool,
    pub body: FormBody,
}

/// Editable projection: every section in order, hidden ones included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormView {
    pub document_id: Uuid,
    pub revision: u64,
    pub title: String,
    pub sections: Vec<FormSection>,
}

impl FormView {
    pub fn project(doc: &Document, revision: u64) -> Self {
        let sections = doc
            .order
            .order
            .iter()
            .map(|&section| FormSection {
                section,
                title: section.title().to_string(),
                visible: doc.order.is_visible(section),
                body: form_body(doc, section),
            })
            .collect();

        FormView {
            document_id: doc.id,
            revision,
            title: doc.title.clone(),
            sections,
        }
    }

    pub fn section(&self, section: SectionId) -> Option<&FormSection> {
        self.sections.iter().find(|s| s.section == section)
    }

    /// Entry ids of a list section, in form order.
    pub fn entry_order(&self, section: SectionId) -> Vec<&EntryId> {
        match self.section(section).map(|s| &s.body) {
            Some(FormBody::Entries { entries }) => entries.iter().map(|e| &e.id).collect(),
            _ => Vec::new(),
        }
    }
}

fn form_body(doc: &Document, section: SectionId) -> FormBody {
    match section {
        SectionId::Personal => FormBody::Personal {
            fields: PersonalInfo::FIELDS
                .iter()
                .map(|name| FormField {
                    name: name.to_string(),
                    label: humanize(name),
                    value: doc.personal.field(name).unwrap_or_default().to_string(),
                })
                .collect(),
        },
        SectionId::Summary => FormBody::Summary {
            text: doc.summary.clone(),
        },
        _ => FormBody::Entries {
            entries: doc
                .entries(section)
                .iter()
                .map(|entry| FormEntry {
                    id: entry.id.clone(),
                    fields: section
                        .entry_fields()
                        .iter()
                        .map(|name| FormField {
                            name: name.to_string(),
                            label: humanize(name),
                            value: entry.field(name).to_string(),
                        })
                        .collect(),
                })
                .collect(),
        },
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Preview view
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewItem {
    pub id: EntryId,
    pub heading: String,
    pub subheading: Option<String>,
    pub dates: Option<String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PreviewBody {
    Header {
        name: String,
        headline: Option<String>,
        contact: Vec<String>,
    },
    Text {
        text: String,
    },
    Items {
        items: Vec<PreviewItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewBlock {
    pub section: SectionId,
    pub title: String,
    pub body: PreviewBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Main,
    Side,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewColumn {
    pub role: ColumnRole,
    pub blocks: Vec<PreviewBlock>,
}

/// Styled read-only projection: visible, non-empty sections only, composed into
/// columns according to the layout variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewView {
    pub document_id: Uuid,
    pub revision: u64,
    pub title: String,
    pub customization: Customization,
    pub columns: Vec<PreviewColumn>,
}

/// Sections moved to the side column by multi-column layouts.
const SIDE_SECTIONS: [SectionId; 2] = [SectionId::Skills, SectionId::Certificates];

impl PreviewView {
    pub fn project(doc: &Document, revision: u64) -> Self {
        let blocks: Vec<PreviewBlock> = doc
            .order
            .order
            .iter()
            .filter(|&&section| doc.order.is_visible(section))
            .filter_map(|&section| preview_block(doc, section))
            .collect();

        PreviewView {
            document_id: doc.id,
            revision,
            title: doc.title.clone(),
            customization: doc.customization.clone(),
            columns: compose(blocks, doc.customization.layout),
        }
    }

    pub fn blocks(&self) -> impl Iterator<Item = &PreviewBlock> {
        self.columns.iter().flat_map(|c| c.blocks.iter())
    }

    pub fn block(&self, section: SectionId) -> Option<&PreviewBlock> {
        self.blocks().find(|b| b.section == section)
    }

    /// Entry ids of a rendered list section, or `None` if it is not rendered.
    pub fn entry_order(&self, section: SectionId) -> Option<Vec<&EntryId>> {
        match self.block(section).map(|b| &b.body) {
            Some(PreviewBody::Items { items }) => Some(items.iter().map(|i| &i.id).collect()),
            _ => None,
        }
    }

    /// Renders the preview as Markdown, column by column.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        for block in self.blocks() {
            match &block.body {
                PreviewBody::Header {
                    name,
                    headline,
                    contact,
                } => {
                    md.push_str(&format!("# {name}\n\n"));
                    if let Some(headline) = headline {
                        md.push_str(&format!("*{headline}*\n\n"));
                    }
                    if !contact.is_empty() {
                        md.push_str(&format!("{}\n\n", contact.join(" | ")));
                    }
                }
                PreviewBody::Text { text } => {
                    md.push_str(&format!("## {}\n\n{text}\n\n", block.title));
                }
                PreviewBody::Items { items } => {
                    md.push_str(&format!("## {}\n\n", block.title));
                    for item in items {
                        md.push_str(&format!("### {}", item.heading));
                        if let Some(sub) = &item.subheading {
                            md.push_str(&format!(" — {sub}"));
                        }
                        md.push('\n');
                        if let Some(dates) = &item.dates {
                            md.push_str(&format!("_{dates}_\n"));
                        }
                        if let Some(body) = &item.body {
                            md.push_str(&format!("\n{body}\n"));
                        }
                        md.push('\n');
                    }
                }
            }
        }
        md
    }
}

fn preview_block(doc: &Document, section: SectionId) -> Option<PreviewBlock> {
    let body = match section {
        SectionId::Personal => {
            let p = &doc.personal;
            if PersonalInfo::FIELDS
                .iter()
                .all(|f| p.field(f).unwrap_or_default().trim().is_empty())
            {
                return None;
            }
            PreviewBody::Header {
                name: p.full_name.clone(),
                headline: non_empty(&p.headline),
                contact: [&p.email, &p.phone, &p.location, &p.website]
                    .into_iter()
                    .filter(|v| !v.trim().is_empty())
                    .cloned()
                    .collect(),
            }
        }
        SectionId::Summary => PreviewBody::Text {
            text: non_empty(&doc.summary)?,
        },
        _ => {
            let entries = doc.entries(section);
            if entries.is_empty() {
                return None;
            }
            PreviewBody::Items {
                items: entries.iter().map(|e| preview_item(section, e)).collect(),
            }
        }
    };

    Some(PreviewBlock {
        section,
        title: section.title().to_string(),
        body,
    })
}

fn preview_item(section: SectionId, entry: &Entry) -> PreviewItem {
    let (heading, sub_fields): (&str, &[&str]) = match section {
        SectionId::Experience => ("job_title", &["company", "location"][..]),
        SectionId::Education => ("degree", &["institution", "location"][..]),
        SectionId::Skills => ("name", &["level"][..]),
        SectionId::Projects => ("name", &["role", "url"][..]),
        SectionId::Certificates => ("name", &["issuer"][..]),
        SectionId::Activities => ("title", &["organization"][..]),
        SectionId::Personal | SectionId::Summary => ("", &[] as &[&str]),
    };

    let subheading: Vec<&str> = sub_fields
        .iter()
        .map(|f| entry.field(f).trim())
        .filter(|v| !v.is_empty())
        .collect();

    let dates = if section == SectionId::Certificates {
        non_empty(entry.field("date"))
    } else {
        date_range(entry.field("start_date"), entry.field("end_date"))
    };

    PreviewItem {
        id: entry.id.clone(),
        heading: entry.field(heading).to_string(),
        subheading: (!subheading.is_empty()).then(|| subheading.join(" · ")),
        dates,
        body: non_empty(entry.field("description")),
    }
}

/// Splits blocks into columns. The personal header always opens the main column;
/// a layout that would leave one column empty collapses to a single column.
fn compose(blocks: Vec<PreviewBlock>, layout: LayoutVariant) -> Vec<PreviewColumn> {
    if layout == LayoutVariant::SingleColumn {
        return vec![PreviewColumn {
            role: ColumnRole::Main,
            blocks,
        }];
    }

    let (side, main): (Vec<_>, Vec<_>) = blocks
        .into_iter()
        .partition(|b| SIDE_SECTIONS.contains(&b.section));

    if side.is_empty() || main.is_empty() {
        let mut blocks = main;
        blocks.extend(side);
        return vec![PreviewColumn {
            role: ColumnRole::Main,
            blocks,
        }];
    }

    let main = PreviewColumn {
        role: ColumnRole::Main,
        blocks: main,
    };
    let side = PreviewColumn {
        role: ColumnRole::Side,
        blocks: side,
    };
    match layout {
        LayoutVariant::SidebarLeft => vec![side, main],
        _ => vec![main, side],
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn date_range(start: &str, end: &str) -> Option<String> {
    match (start.trim(), end.trim()) {
        ("", "") => None,
        (start, "") => Some(format!("{start} – Present")),
        ("", end) => Some(end.to_string()),
        (start, end) => Some(format!("{start} – {end}")),
    }
}

/// `job_title` → `Job Title`
fn humanize(name: &str) -> String {
    name.split('_')
        .map(|w| {
            let mut c = w.chars();
            match c.next() {
                None => String::new(),
                Some(f) => f.to_uppercase().to_string() + c.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::document::{CustomizationPatch, EntryFields};
    use crate::editor::reducer::{self, Mutation};

    fn fields(pairs: &[(&str, &str)]) -> EntryFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn make_doc() -> Document {
        let mut doc = Document::new("CV", "classic");
        doc = reducer::update_personal_field(&doc, "full_name", "Ada Lovelace").unwrap();
        doc = reducer::update_personal_field(&doc, "email", "ada@example.com").unwrap();
        doc = reducer::set_summary(&doc, "Analyst.").unwrap();
        doc = reducer::add_entry(
            &doc,
            SectionId::Experience,
            fields(&[
                ("job_title", "Engineer"),
                ("company", "Engines Ltd"),
                ("start_date", "1842"),
            ]),
        )
        .unwrap();
        doc = reducer::add_entry(
            &doc,
            SectionId::Experience,
            fields(&[("job_title", "Translator"), ("company", "Menabrea")]),
        )
        .unwrap();
        doc = reducer::add_entry(&doc, SectionId::Skills, fields(&[("name", "Mathematics")]))
            .unwrap();
        doc
    }

    /// Both projections agree on entry order and on the values they show.
    fn assert_consistent(doc: &Document) {
        let form = FormView::project(doc, 7);
        let preview = PreviewView::project(doc, 7);
        assert_eq!(form.revision, preview.revision);

        for section in SectionId::LISTS {
            let form_order = form.entry_order(section);
            match preview.entry_order(section) {
                Some(preview_order) => assert_eq!(form_order, preview_order),
                None => assert!(!doc.order.is_visible(section) || form_order.is_empty()),
            }
        }

        if let Some(PreviewBody::Items { items }) = preview.block(SectionId::Experience).map(|b| &b.body) {
            let Some(FormBody::Entries { entries }) =
                form.section(SectionId::Experience).map(|s| &s.body)
            else {
                panic!("form is missing experience");
            };
            for (item, entry) in items.iter().zip(entries) {
                let title = entry.fields.iter().find(|f| f.name == "job_title").unwrap();
                assert_eq!(item.heading, title.value);
            }
        }
    }

    #[test]
    fn test_form_lists_every_section_in_order() {
        let doc = make_doc();
        let form = FormView::project(&doc, 1);
        let order: Vec<_> = form.sections.iter().map(|s| s.section).collect();
        assert_eq!(order, doc.order.order);
        let experience = form.section(SectionId::Experience).unwrap();
        let FormBody::Entries { entries } = &experience.body else {
            panic!("experience should be an entry list");
        };
        assert_eq!(entries[0].fields[0].label, "Job Title");
        assert_eq!(entries[0].fields[0].value, "Engineer");
    }

    #[test]
    fn test_preview_skips_hidden_and_empty_sections() {
        let doc = make_doc();
        let doc = reducer::set_section_visibility(&doc, SectionId::Summary, false).unwrap();
        let preview = PreviewView::project(&doc, 1);

        assert!(preview.block(SectionId::Summary).is_none());
        assert!(preview.block(SectionId::Education).is_none());
        assert!(preview.block(SectionId::Experience).is_some());

        // the form still shows the hidden section
        let form = FormView::project(&doc, 1);
        assert!(!form.section(SectionId::Summary).unwrap().visible);
    }

    #[test]
    fn test_views_agree_after_every_mutation() {
        let doc = make_doc();
        assert_consistent(&doc);

        let ids: Vec<EntryId> = doc
            .entries(SectionId::Experience)
            .iter()
            .map(|e| e.id.clone())
            .collect();

        let mutations = [
            Mutation::ReorderEntries {
                section: SectionId::Experience,
                source_id: ids[0].clone(),
                target_id: ids[1].clone(),
            },
            Mutation::UpdateEntryField {
                section: SectionId::Experience,
                entry_id: ids[1].clone(),
                field: "job_title".to_string(),
                value: "Chief Engineer".to_string(),
            },
            Mutation::ReorderSections {
                source: SectionId::Skills,
                target: SectionId::Personal,
            },
            Mutation::SetSectionVisibility {
                section: SectionId::Skills,
                visible: false,
            },
            Mutation::RemoveEntry {
                section: SectionId::Experience,
                entry_id: ids[0].clone(),
            },
        ];

        let mut current = doc;
        for mutation in &mutations {
            current = reducer::apply_or_keep(&current, mutation);
            assert_consistent(&current);
        }
        assert_eq!(
            PreviewView::project(&current, 0).entry_order(SectionId::Experience),
            Some(vec![&ids[1]])
        );
    }

    #[test]
    fn test_preview_item_formatting() {
        let doc = make_doc();
        let preview = PreviewView::project(&doc, 1);
        let Some(PreviewBody::Items { items }) =
            preview.block(SectionId::Experience).map(|b| &b.body)
        else {
            panic!("experience block missing");
        };
        assert_eq!(items[0].subheading.as_deref(), Some("Engines Ltd"));
        assert_eq!(items[0].dates.as_deref(), Some("1842 – Present"));
        assert_eq!(items[1].dates, None);
    }

    #[test]
    fn test_two_column_layout_moves_skills_to_side() {
        let doc = make_doc();
        let doc = reducer::update_customization(
            &doc,
            &CustomizationPatch {
                layout: Some(LayoutVariant::SidebarLeft),
                ..Default::default()
            },
        )
        .unwrap();
        let preview = PreviewView::project(&doc, 1);
        assert_eq!(preview.columns.len(), 2);
        assert_eq!(preview.columns[0].role, ColumnRole::Side);
        assert_eq!(preview.columns[0].blocks[0].section, SectionId::Skills);
        assert_eq!(preview.columns[1].blocks[0].section, SectionId::Personal);
    }

    #[test]
    fn test_two_column_without_side_sections_collapses() {
        let doc = Document::new("Empty", "modern");
        let doc = reducer::set_summary(&doc, "Hello").unwrap();
        let doc = reducer::update_customization(
            &doc,
            &CustomizationPatch {
                layout: Some(LayoutVariant::TwoColumn),
                ..Default::default()
            },
        )
        .unwrap();
        let preview = PreviewView::project(&doc, 1);
        assert_eq!(preview.columns.len(), 1);
        assert_eq!(preview.columns[0].role, ColumnRole::Main);
    }

    #[test]
    fn test_markdown_rendering() {
        let preview = PreviewView::project(&make_doc(), 1);
        let md = preview.to_markdown();
        assert!(md.starts_with("# Ada Lovelace\n"));
        assert!(md.contains("ada@example.com"));
        assert!(md.contains("## Experience"));
        assert!(md.contains("### Engineer — Engines Ltd"));
        assert!(md.find("Engineer").unwrap() < md.find("Translator").unwrap());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("job_title"), "Job Title");
        assert_eq!(humanize("url"), "Url");
    }
}
