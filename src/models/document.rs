use super::class::{RawClassRecord, RawSectionRecord};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Kind of record stored in the searchable indices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    #[default]
    Class,
    Employee,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Class => "class",
            RecordType::Employee => "employee",
        }
    }
}

/// One scrape batch: every class and section for one or more terms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermDump {
    #[serde(default)]
    pub classes: Vec<RawClassRecord>,

    #[serde(default)]
    pub sections: Vec<RawSectionRecord>,
}

impl TermDump {
    pub fn new(classes: Vec<RawClassRecord>, sections: Vec<RawSectionRecord>) -> Self {
        Self { classes, sections }
    }

    /// Read a term dump from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            AppError::Serialization(format!("Invalid term dump {}: {}", path.display(), e))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.sections.is_empty()
    }
}

/// The unit written to the class index: a class and its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassDocument {
    pub class: RawClassRecord,

    /// Ordered by CRN once the builder has run
    pub sections: Vec<RawSectionRecord>,

    #[serde(rename = "type", default)]
    pub record_type: RecordType,
}

impl ClassDocument {
    pub fn new(mut class: RawClassRecord) -> Self {
        class.code = Some(class.course_code());
        Self {
            class,
            sections: Vec::new(),
            record_type: RecordType::Class,
        }
    }

    /// Order sections by CRN so repeated rebuilds produce identical documents
    pub fn sort_sections(&mut self) {
        if self.sections.len() > 1 {
            self.sections.sort_by(|a, b| a.crn.cmp(&b.crn));
        }
    }
}

/// All class documents for one term at one institution, keyed by class hash.
#[derive(Debug, Clone, PartialEq)]
pub struct TermGroup {
    pub host: String,
    pub term_id: String,
    pub classes: BTreeMap<String, ClassDocument>,
}

impl TermGroup {
    pub fn new(host: impl Into<String>, term_id: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            term_id: term_id.into(),
            classes: BTreeMap::new(),
        }
    }

    pub fn section_count(&self) -> usize {
        self.classes.values().map(|doc| doc.sections.len()).sum()
    }
}
