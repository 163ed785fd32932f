//! Built-in template catalogue. Templates only seed new documents; editing a
//! document never reads its template again.

use std::sync::Arc;

use serde::Serialize;

use crate::editor::document::{
    Customization, Document, Entry, EntryFields, LayoutVariant, OrderState, SectionId,
};

#[derive(Debug, Serialize)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub font_family: &'static str,
    pub accent_color: &'static str,
    pub layout: LayoutVariant,
    pub order: &'static [SectionId],
    pub hidden: &'static [SectionId],
    /// List sections that start with one blank entry.
    pub seeded: &'static [SectionId],
}

pub static TEMPLATES: [Template; 3] = [
    Template {
        id: "classic",
        name: "Classic",
        description: "Single column, experience first",
        font_family: "Georgia",
        accent_color: "#1f2937",
        layout: LayoutVariant::SingleColumn,
        order: &[
            SectionId::Personal,
            SectionId::Summary,
            SectionId::Experience,
            SectionId::Education,
            SectionId::Skills,
            SectionId::Projects,
            SectionId::Certificates,
            SectionId::Activities,
        ],
        hidden: &[SectionId::Activities],
        seeded: &[SectionId::Experience, SectionId::Education],
    },
    Template {
        id: "modern",
        name: "Modern",
        description: "Two columns with skills and certificates in the side column",
        font_family: "Inter",
        accent_color: "#2563eb",
        layout: LayoutVariant::TwoColumn,
        order: &[
            SectionId::Personal,
            SectionId::Summary,
            SectionId::Experience,
            SectionId::Projects,
            SectionId::Skills,
            SectionId::Certificates,
            SectionId::Education,
            SectionId::Activities,
        ],
        hidden: &[],
        seeded: &[SectionId::Experience, SectionId::Skills],
    },
    Template {
        id: "compact",
        name: "Compact",
        description: "Left sidebar, education first, for early-career resumes",
        font_family: "Roboto",
        accent_color: "#059669",
        layout: LayoutVariant::SidebarLeft,
        order: &[
            SectionId::Personal,
            SectionId::Education,
            SectionId::Projects,
            SectionId::Experience,
            SectionId::Skills,
            SectionId::Activities,
            SectionId::Certificates,
            SectionId::Summary,
        ],
        hidden: &[SectionId::Summary],
        seeded: &[SectionId::Education, SectionId::Projects],
    },
];

pub fn find(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|t| t.id == id)
}

impl Template {
    /// Creates a new document seeded with this template's defaults.
    pub fn instantiate(&self, title: &str) -> Document {
        let mut doc = Document::new(title, self.id);

        doc.order = OrderState {
            order: self.order.to_vec(),
            visibility: SectionId::ALL
                .into_iter()
                .map(|s| (s, !self.hidden.contains(&s)))
                .collect(),
        }
        .normalized();

        doc.customization = Customization {
            font_family: self.font_family.to_string(),
            accent_color: self.accent_color.to_string(),
            layout: self.layout,
            ..Customization::default()
        };

        for &section in self.seeded {
            let entry = Arc::new(Entry::new(section, EntryFields::new()));
            doc.sections.insert(section, Arc::new(vec![entry]));
        }
        doc
    }
}
