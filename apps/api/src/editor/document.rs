use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Sections
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionId {
    Personal,
    Summary,
    Experience,
    Education,
    Skills,
    Projects,
    Certificates,
    Activities,
}

impl SectionId {
    /// Canonical order, also the fallback order for repaired documents.
    pub const ALL: [SectionId; 8] = [
        SectionId::Personal,
        SectionId::Summary,
        SectionId::Experience,
        SectionId::Education,
        SectionId::Skills,
        SectionId::Projects,
        SectionId::Certificates,
        SectionId::Activities,
    ];

    pub const LISTS: [SectionId; 6] = [
        SectionId::Experience,
        SectionId::Education,
        SectionId::Skills,
        SectionId::Projects,
        SectionId::Certificates,
        SectionId::Activities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Personal => "personal",
            SectionId::Summary => "summary",
            SectionId::Experience => "experience",
            SectionId::Education => "education",
            SectionId::Skills => "skills",
            SectionId::Projects => "projects",
            SectionId::Certificates => "certificates",
            SectionId::Activities => "activities",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            SectionId::Personal => "Personal Information",
            SectionId::Summary => "Summary",
            SectionId::Experience => "Experience",
            SectionId::Education => "Education",
            SectionId::Skills => "Skills",
            SectionId::Projects => "Projects",
            SectionId::Certificates => "Certificates",
            SectionId::Activities => "Activities",
        }
    }

    /// True for sections holding an ordered sequence of entries.
    pub fn is_list(&self) -> bool {
        !matches!(self, SectionId::Personal | SectionId::Summary)
    }

    /// Field schema of entries in this section. Empty for singleton sections.
    pub fn entry_fields(&self) -> &'static [&'static str] {
        match self {
            SectionId::Personal | SectionId::Summary => &[],
            SectionId::Experience => &[
                "job_title",
                "company",
                "location",
                "start_date",
                "end_date",
                "description",
            ],
            SectionId::Education => &[
                "degree",
                "institution",
                "location",
                "start_date",
                "end_date",
                "description",
            ],
            SectionId::Skills => &["name", "level"],
            SectionId::Projects => &[
                "name",
                "role",
                "url",
                "start_date",
                "end_date",
                "description",
            ],
            SectionId::Certificates => &["name", "issuer", "date", "url"],
            SectionId::Activities => &[
                "title",
                "organization",
                "start_date",
                "end_date",
                "description",
            ],
        }
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.entry_fields().contains(&field)
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("unknown section '{s}'"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Entries
// ────────────────────────────────────────────────────────────────────────────

/// Stable entry identifier. Assigned once at creation, never derived from position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    pub fn generate() -> Self {
        EntryId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        EntryId(s.to_string())
    }
}

pub type EntryFields = BTreeMap<String, String>;

/// One item of a list section (one job, one degree, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    #[serde(default)]
    pub fields: EntryFields,
}

impl Entry {
    /// Builds an entry with a fresh id, keeping only fields in the section schema.
    pub fn new(section: SectionId, fields: EntryFields) -> Self {
        let fields = fields
            .into_iter()
            .filter(|(name, _)| section.has_field(name))
            .collect();
        Entry {
            id: EntryId::generate(),
            fields,
        }
    }

    /// Field value, empty when unset.
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }
}

pub type EntryList = Arc<Vec<Arc<Entry>>>;

// ────────────────────────────────────────────────────────────────────────────
// Personal info
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub headline: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub website: String,
}

impl PersonalInfo {
    pub const FIELDS: [&'static str; 6] = [
        "full_name",
        "headline",
        "email",
        "phone",
        "location",
        "website",
    ];

    pub fn field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "full_name" => &self.full_name,
            "headline" => &self.headline,
            "email" => &self.email,
            "phone" => &self.phone,
            "location" => &self.location,
            "website" => &self.website,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "full_name" => Some(&mut self.full_name),
            "headline" => Some(&mut self.headline),
            "email" => Some(&mut self.email),
            "phone" => Some(&mut self.phone),
            "location" => Some(&mut self.location),
            "website" => Some(&mut self.website),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Order state
// ────────────────────────────────────────────────────────────────────────────

/// Section rendering order plus per-section visibility, independent of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderState {
    pub order: Vec<SectionId>,
    pub visibility: BTreeMap<SectionId, bool>,
}

impl Default for OrderState {
    fn default() -> Self {
        OrderState {
            order: SectionId::ALL.to_vec(),
            visibility: SectionId::ALL.into_iter().map(|s| (s, true)).collect(),
        }
    }
}

impl OrderState {
    pub fn is_visible(&self, section: SectionId) -> bool {
        self.visibility.get(&section).copied().unwrap_or(true)
    }

    /// Repairs an order state so that `order` is a permutation of every section
    /// and `visibility` covers every section. Duplicates keep their first position;
    /// missing sections are appended in canonical order and default to visible.
    pub fn normalized(&self) -> OrderState {
        let mut order: Vec<SectionId> = Vec::with_capacity(SectionId::ALL.len());
        for section in self.order.iter().chain(SectionId::ALL.iter()) {
            if !order.contains(section) {
                order.push(*section);
            }
        }
        let visibility = SectionId::ALL
            .into_iter()
            .map(|s| (s, self.is_visible(s)))
            .collect();
        OrderState { order, visibility }
    }

    pub fn is_well_formed(&self) -> bool {
        self.order.len() == SectionId::ALL.len()
            && SectionId::ALL
                .iter()
                .all(|s| self.order.contains(s) && self.visibility.contains_key(s))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Customization
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutVariant {
    SingleColumn,
    TwoColumn,
    SidebarLeft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customization {
    pub font_family: String,
    pub font_size_pt: f32,
    pub line_spacing: f32,
    pub section_spacing: f32,
    pub primary_color: String,
    pub accent_color: String,
    pub layout: LayoutVariant,
}

impl Default for Customization {
    fn default() -> Self {
        Customization {
            font_family: "Inter".to_string(),
            font_size_pt: 11.0,
            line_spacing: 1.15,
            section_spacing: 12.0,
            primary_color: "#1f2937".to_string(),
            accent_color: "#2563eb".to_string(),
            layout: LayoutVariant::SingleColumn,
        }
    }
}

/// Partial customization update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomizationPatch {
    pub font_family: Option<String>,
    pub font_size_pt: Option<f32>,
    pub line_spacing: Option<f32>,
    pub section_spacing: Option<f32>,
    pub primary_color: Option<String>,
    pub accent_color: Option<String>,
    pub layout: Option<LayoutVariant>,
}

impl Customization {
    /// Shallow merge of `patch` over `self`.
    pub fn merged(&self, patch: &CustomizationPatch) -> Customization {
        Customization {
            font_family: patch
                .font_family
                .clone()
                .unwrap_or_else(|| self.font_family.clone()),
            font_size_pt: patch.font_size_pt.unwrap_or(self.font_size_pt),
            line_spacing: patch.line_spacing.unwrap_or(self.line_spacing),
            section_spacing: patch.section_spacing.unwrap_or(self.section_spacing),
            primary_color: patch
                .primary_color
                .clone()
                .unwrap_or_else(|| self.primary_color.clone()),
            accent_color: patch
                .accent_color
                .clone()
                .unwrap_or_else(|| self.accent_color.clone()),
            layout: patch.layout.unwrap_or(self.layout),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Document
// ────────────────────────────────────────────────────────────────────────────

/// The aggregate editable resume: content, order state and customization.
///
/// Content is held behind `Arc`s so that a mutation shares every untouched
/// section and entry with the previous value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub template_id: String,
    #[serde(default)]
    pub personal: Arc<PersonalInfo>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub sections: BTreeMap<SectionId, EntryList>,
    #[serde(default)]
    pub order: OrderState,
    #[serde(default)]
    pub customization: Customization,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(title: impl Into<String>, template_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Document {
            id: Uuid::new_v4(),
            title: title.into(),
            template_id: template_id.into(),
            personal: Arc::new(PersonalInfo::default()),
            summary: String::new(),
            sections: SectionId::LISTS
                .into_iter()
                .map(|s| (s, Arc::new(Vec::new())))
                .collect(),
            order: OrderState::default(),
            customization: Customization::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Entries of a list section, in order. Empty for singleton sections.
    pub fn entries(&self, section: SectionId) -> &[Arc<Entry>] {
        self.sections
            .get(&section)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    pub fn entry(&self, section: SectionId, id: &EntryId) -> Option<&Arc<Entry>> {
        self.entries(section).iter().find(|e| &e.id == id)
    }

    /// Repairs a deserialized document: order state made well formed, every list
    /// section present, singleton keys dropped from the entry map.
    pub fn normalized(mut self) -> Self {
        if !self.order.is_well_formed() {
            self.order = self.order.normalized();
        }
        self.sections.retain(|section, _| section.is_list());
        for section in SectionId::LISTS {
            self.sections
                .entry(section)
                .or_insert_with(|| Arc::new(Vec::new()));
        }
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
