//! Deterministic document keys.
//!
//! Terms, classes and sections are addressed by slash-joined identifying
//! attributes. Each segment is percent-escaped for `/` and `%` so distinct
//! attribute tuples can never collide.

use crate::models::{RawClassRecord, RawSectionRecord};

fn escape(segment: &str) -> String {
    segment.replace('%', "%25").replace('/', "%2F")
}

fn join(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| escape(s))
        .collect::<Vec<_>>()
        .join("/")
}

/// Key for a term at an institution, e.g. `neu.edu/202110`
pub fn term_hash(host: &str, term_id: &str) -> String {
    join(&[host, term_id])
}

/// Key for a class within a term, e.g. `neu.edu/202110/CS/2500`
pub fn class_hash(host: &str, term_id: &str, subject: &str, class_id: &str) -> String {
    join(&[host, term_id, subject, class_id])
}

/// Key for a section, e.g. `neu.edu/202110/CS/2500/10461`
pub fn section_hash(
    host: &str,
    term_id: &str,
    subject: &str,
    class_id: &str,
    crn: &str,
) -> String {
    join(&[host, term_id, subject, class_id, crn])
}

/// Records that can be addressed by term and class
pub trait Keyed {
    fn term_hash(&self) -> String;
    fn class_hash(&self) -> String;
}

impl Keyed for RawClassRecord {
    fn term_hash(&self) -> String {
        term_hash(&self.host, &self.term_id)
    }

    fn class_hash(&self) -> String {
        class_hash(&self.host, &self.term_id, &self.subject, &self.class_id)
    }
}

impl Keyed for RawSectionRecord {
    fn term_hash(&self) -> String {
        term_hash(&self.host, &self.term_id)
    }

    // The parent class's key, not the section's own
    fn class_hash(&self) -> String {
        class_hash(&self.host, &self.term_id, &self.subject, &self.class_id)
    }
}

impl RawSectionRecord {
    pub fn section_hash(&self) -> String {
        section_hash(
            &self.host,
            &self.term_id,
            &self.subject,
            &self.class_id,
            &self.crn,
        )
    }
}
