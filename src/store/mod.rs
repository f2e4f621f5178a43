//! Record storage.

mod key;
mod record_repo;

use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use minicbor::{Decode, Encode};
use thiserror::Error;

pub(crate) use self::key::RecordKey;
pub(crate) use self::record_repo::RecordRepo;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum RecordError {
    #[error("{bundle_id} has no attribute named {name}")]
    UnknownAttribute { bundle_id: String, name: String },
}

/// A record that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordHandle {
    bundle_id: String,
    known: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
}

impl RecordHandle {
    pub(crate) fn new(
        bundle_id: impl Into<String>,
        known: impl IntoIterator<Item = String>,
    ) -> RecordHandle {
        RecordHandle {
            bundle_id: bundle_id.into(),
            known: known.into_iter().collect(),
            attributes: BTreeMap::new(),
        }
    }
    pub(crate) fn bundle_id(&self) -> &str {
        &self.bundle_id
    }
    pub(crate) fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
    /// Setting an attribute twice keeps the last value.
    pub(crate) fn set_attribute(&mut self, name: &str, value: String) -> Result<(), RecordError> {
        self.check_known(name)?;
        self.attributes.insert(name.to_owned(), value);
        Ok(())
    }
    pub(crate) fn clear_attribute(&mut self, name: &str) -> Result<(), RecordError> {
        self.check_known(name)?;
        self.attributes.remove(name);
        Ok(())
    }
    fn check_known(&self, name: &str) -> Result<(), RecordError> {
        if !self.known.contains(name) {
            return Err(RecordError::UnknownAttribute {
                bundle_id: self.bundle_id.clone(),
                name: name.to_owned(),
            });
        }
        Ok(())
    }
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub(crate) struct Record {
    #[n(0)]
    pub(crate) bundle_id: String,
    #[n(1)]
    pub(crate) attributes: BTreeMap<String, String>,
    #[n(2)]
    pub(crate) created: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SavedRecord {
    pub(crate) id: String,
    pub(crate) url: String,
}

pub(crate) trait RecordStore: Send + Sync {
    fn create_record(&self, bundle_id: &str, known_attributes: Vec<String>) -> RecordHandle {
        RecordHandle::new(bundle_id, known_attributes)
    }
    /// Assign an identifier and persist the record.
    fn save(&self, record: RecordHandle) -> Result<SavedRecord>;
    fn find_one(&self, id: &str) -> Result<Option<Record>>;
    /// Canonical URL of a record.
    fn location(&self, id: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::{RecordError, RecordHandle};

    #[test]
    fn set_known_attributes() {
        let mut record = RecordHandle::new(
            "fedora_resource.rdf_source",
            ["name".to_owned(), "description".to_owned()],
        );
        assert_eq!(record.set_attribute("name", "first".to_owned()), Ok(()));
        assert_eq!(record.set_attribute("name", "second".to_owned()), Ok(()));
        assert_eq!(record.attributes().get("name").map(String::as_str), Some("second"));
        assert_eq!(record.attributes().len(), 1);

        assert_eq!(record.clear_attribute("name"), Ok(()));
        assert!(record.attributes().is_empty());
        assert_eq!(record.clear_attribute("description"), Ok(()));
    }

    #[test]
    fn reject_unknown_attributes() {
        let mut record = RecordHandle::new("fedora_resource.rdf_source", ["name".to_owned()]);
        assert_eq!(
            record.set_attribute("title", "value".to_owned()),
            Err(RecordError::UnknownAttribute {
                bundle_id: "fedora_resource.rdf_source".to_owned(),
                name: "title".to_owned(),
            })
        );
        assert!(record.clear_attribute("title").is_err());
        assert!(record.attributes().is_empty());
    }
}
