use super::error::IndexError;
use super::mapping::class_index_mapping;
use crate::keys::Keyed;
use crate::metrics::{DOCUMENTS_INDEXED_TOTAL, ORPHANED_SECTIONS_TOTAL, REBUILDS_TOTAL};
use crate::models::{ClassDocument, TermDump, TermGroup};
use crate::store::{BulkOperation, DocumentStore, StoreError};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Class documents grouped by term hash
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedDump {
    pub groups: BTreeMap<String, TermGroup>,

    /// Sections dropped because their term or class was not in the dump
    pub orphaned_sections: usize,
}

impl GroupedDump {
    pub fn document_count(&self) -> usize {
        self.groups.values().map(|g| g.classes.len()).sum()
    }
}

/// Outcome of a successful rebuild
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildReport {
    pub term_groups: usize,
    pub documents: usize,
    pub orphaned_sections: usize,
    pub completed_at: DateTime<Utc>,
}

/// Rebuilds the class index from a scrape batch
pub struct IndexBuilder {
    store: Arc<dyn DocumentStore>,
    index_name: String,
}

impl IndexBuilder {
    pub fn new(store: Arc<dyn DocumentStore>, index_name: impl Into<String>) -> Self {
        Self {
            store,
            index_name: index_name.into(),
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Join classes and sections into per-term class documents.
    ///
    /// Classes are keyed first; sections then attach to the class sharing
    /// their class hash. A section whose term or class is missing is logged
    /// and dropped. Sections are ordered by CRN within each class.
    pub fn group_term_dump(dump: TermDump) -> GroupedDump {
        let mut groups: BTreeMap<String, TermGroup> = BTreeMap::new();

        for class in dump.classes {
            let term_hash = class.term_hash();
            let class_hash = class.class_hash();

            groups
                .entry(term_hash)
                .or_insert_with(|| TermGroup::new(class.host.clone(), class.term_id.clone()))
                .classes
                .insert(class_hash, ClassDocument::new(class));
        }

        let mut orphaned_sections = 0;
        for section in dump.sections {
            let term_hash = section.term_hash();
            let class_hash = section.class_hash();

            let Some(group) = groups.get_mut(&term_hash) else {
                error!(
                    term_hash = %term_hash,
                    class_hash = %class_hash,
                    crn = %section.crn,
                    "Section references a term with no classes in this dump"
                );
                orphaned_sections += 1;
                continue;
            };

            let Some(document) = group.classes.get_mut(&class_hash) else {
                error!(
                    class_hash = %class_hash,
                    crn = %section.crn,
                    url = section.url.as_deref().unwrap_or(""),
                    "Section references a class that does not exist in this dump"
                );
                orphaned_sections += 1;
                continue;
            };

            document.sections.push(section);
        }

        for group in groups.values_mut() {
            for document in group.classes.values_mut() {
                document.sort_sections();
            }
        }

        GroupedDump {
            groups,
            orphaned_sections,
        }
    }

    /// Create/overwrite actions for every class document of one term
    pub fn bulk_operations(group: &TermGroup) -> Result<Vec<BulkOperation>, IndexError> {
        group
            .classes
            .iter()
            .map(|(class_hash, document)| {
                let body = serde_json::to_value(document).map_err(|e| IndexError::Serialization {
                    class_hash: class_hash.clone(),
                    reason: e.to_string(),
                })?;
                Ok(BulkOperation::new(class_hash.clone(), body))
            })
            .collect()
    }

    /// Replace the class index with exactly the contents of `dump`.
    ///
    /// The index is deleted and recreated before any document is written;
    /// a creation failure aborts the rebuild. Term groups are then written
    /// concurrently and every write is awaited before a failure is reported,
    /// so a failed rebuild can leave the index partially filled.
    pub async fn rebuild(&self, dump: TermDump) -> Result<RebuildReport, IndexError> {
        info!(
            index = %self.index_name,
            classes = dump.classes.len(),
            sections = dump.sections.len(),
            "Starting class index rebuild"
        );

        let grouped = Self::group_term_dump(dump);
        if grouped.orphaned_sections > 0 {
            ORPHANED_SECTIONS_TOTAL.inc_by(grouped.orphaned_sections as f64);
        }

        let batches = grouped
            .groups
            .iter()
            .map(|(term_hash, group)| Ok((term_hash.as_str(), Self::bulk_operations(group)?)))
            .collect::<Result<Vec<_>, IndexError>>()?;

        if let Err(e) = self.recreate_index().await {
            REBUILDS_TOTAL.with_label_values(&["schema_failure"]).inc();
            return Err(e);
        }

        let total = batches.len();
        let results = join_all(
            batches
                .into_iter()
                .map(|(term_hash, operations)| self.write_term_group(term_hash, operations)),
        )
        .await;

        let mut documents = 0;
        let mut failures: Vec<StoreError> = Vec::new();
        for result in results {
            match result {
                Ok(written) => documents += written,
                Err(e) => failures.push(e),
            }
        }
        DOCUMENTS_INDEXED_TOTAL.inc_by(documents as f64);

        let failed = failures.len();
        if let Some(source) = failures.into_iter().next() {
            REBUILDS_TOTAL.with_label_values(&["partial_write"]).inc();
            error!(
                index = %self.index_name,
                failed_groups = failed,
                total_groups = total,
                "Class index rebuild left the index partially written"
            );
            return Err(IndexError::PartialWrite {
                failed,
                total,
                source,
            });
        }

        REBUILDS_TOTAL.with_label_values(&["success"]).inc();
        info!(
            index = %self.index_name,
            term_groups = total,
            documents,
            orphaned_sections = grouped.orphaned_sections,
            "Class index rebuild complete"
        );

        Ok(RebuildReport {
            term_groups: total,
            documents,
            orphaned_sections: grouped.orphaned_sections,
            completed_at: Utc::now(),
        })
    }

    /// Delete then create the index; only creation failures are fatal
    async fn recreate_index(&self) -> Result<(), IndexError> {
        if let Err(e) = self.store.delete_index(&self.index_name).await {
            warn!(index = %self.index_name, error = %e, "Failed to delete class index, continuing");
        }

        self.store
            .create_index(&self.index_name, &class_index_mapping())
            .await
            .map_err(|source| {
                error!(index = %self.index_name, error = %source, "Failed to create class index");
                IndexError::Schema {
                    index: self.index_name.clone(),
                    source,
                }
            })?;

        debug!(index = %self.index_name, "Class index recreated");
        Ok(())
    }

    async fn write_term_group(
        &self,
        term_hash: &str,
        operations: Vec<BulkOperation>,
    ) -> Result<usize, StoreError> {
        match self.store.bulk_write(&self.index_name, operations).await {
            Ok(written) => {
                info!(term_hash = %term_hash, documents = written, "Indexed term");
                Ok(written)
            }
            Err(e) => {
                error!(term_hash = %term_hash, error = %e, "Bulk write failed for term");
                Err(e)
            }
        }
    }
}
