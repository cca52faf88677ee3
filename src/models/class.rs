use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One offering of a course in one term at one institution, as scraped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClassRecord {
    /// Institution host (e.g. "neu.edu")
    pub host: String,

    /// Term identifier (e.g. "202110")
    pub term_id: String,

    /// Subject code (e.g. "CS")
    pub subject: String,

    /// Class number within the subject (e.g. "2500")
    pub class_id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Attribute tags such as distribution-requirement codes
    #[serde(default)]
    pub class_attributes: Vec<String>,

    /// CRNs of every section of this class
    #[serde(default)]
    pub crns: Vec<String>,

    /// `subject + classId`; filled in by the index builder, never scraped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Remaining scraped attributes, carried through to the index untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawClassRecord {
    pub fn new(
        host: impl Into<String>,
        term_id: impl Into<String>,
        subject: impl Into<String>,
        class_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            term_id: term_id.into(),
            subject: subject.into(),
            class_id: class_id.into(),
            name: String::new(),
            class_attributes: Vec::new(),
            crns: Vec::new(),
            code: None,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<impl Into<String>>) -> Self {
        self.class_attributes = attributes.into_iter().map(|a| a.into()).collect();
        self
    }

    /// Course code shown to users, e.g. "CS2500"
    pub fn course_code(&self) -> String {
        format!("{}{}", self.subject, self.class_id)
    }
}

/// One meeting/section of a class, scraped independently of its class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSectionRecord {
    pub host: String,
    pub term_id: String,
    pub subject: String,
    pub class_id: String,

    /// Unique course registration number
    pub crn: String,

    /// Professor names
    #[serde(default)]
    pub profs: Vec<String>,

    #[serde(default)]
    pub online: bool,

    /// Section type (e.g. "Lecture", "Lab")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats_capacity: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats_remaining: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_capacity: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_remaining: Option<i64>,

    /// Source page the section was scraped from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawSectionRecord {
    pub fn new(
        host: impl Into<String>,
        term_id: impl Into<String>,
        subject: impl Into<String>,
        class_id: impl Into<String>,
        crn: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            term_id: term_id.into(),
            subject: subject.into(),
            class_id: class_id.into(),
            crn: crn.into(),
            profs: Vec::new(),
            online: false,
            class_type: None,
            seats_capacity: None,
            seats_remaining: None,
            wait_capacity: None,
            wait_remaining: None,
            url: None,
            extra: Map::new(),
        }
    }

    pub fn with_profs(mut self, profs: Vec<impl Into<String>>) -> Self {
        self.profs = profs.into_iter().map(|p| p.into()).collect();
        self
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.online = online;
        self
    }

    pub fn with_class_type(mut self, class_type: impl Into<String>) -> Self {
        self.class_type = Some(class_type.into());
        self
    }
}
