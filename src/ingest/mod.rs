//! Resolves the properties of an incoming JSON-LD document to bundle
//! attributes and persists them as a new record.

mod value;

use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{ContextProvider, FieldSource, bundle_id};
use crate::json_ld::TYPE;
use crate::mapping::{MappingUnavailable, Strategy, load_attribute_mappings};
use crate::store::{RecordError, RecordStore, SavedRecord};

pub(crate) use self::value::extract_scalar;

#[derive(Debug, Error)]
pub(crate) enum CreationError {
    #[error(transparent)]
    MappingUnavailable(#[from] MappingUnavailable),
    #[error("document is not a JSON object")]
    InvalidDocument,
    #[error("unable to load the context of {bundle_id}")]
    Context {
        bundle_id: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed value object for {property}")]
    Resolution { property: String },
    #[error(transparent)]
    Record(#[from] RecordError),
    #[error("unable to save record")]
    Storage(#[source] anyhow::Error),
}

/// What to do when a bundle has no RDF mapping registered.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(crate) enum MissingMappingPolicy {
    /// Nothing is created and the caller is told the mapping is not set.
    #[default]
    Soft,
    /// The request fails like any other creation failure.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Outcome {
    Created(SavedRecord),
    /// The bundle has no mapped attribute; no record was created.
    NothingToMap,
}

#[derive(Clone)]
pub(crate) struct Ingestor {
    contexts: Arc<dyn ContextProvider>,
    fields: Arc<dyn FieldSource>,
    store: Arc<dyn RecordStore>,
    strategy: Strategy,
    missing_mapping: MissingMappingPolicy,
}

impl Ingestor {
    pub(crate) fn new(
        contexts: Arc<dyn ContextProvider>,
        fields: Arc<dyn FieldSource>,
        store: Arc<dyn RecordStore>,
        strategy: Strategy,
        missing_mapping: MissingMappingPolicy,
    ) -> Ingestor {
        Ingestor {
            contexts,
            fields,
            store,
            strategy,
            missing_mapping,
        }
    }

    /// Builds the mapping of the bundle, applies every resolvable property
    /// of `document` to a new record and saves it.
    ///
    /// Blocking. Nothing is persisted unless every resolved property
    /// carries a well formed value.
    pub(crate) fn create_record(
        &self,
        record_type: &str,
        bundle: &str,
        document: &JsonValue,
    ) -> Result<Outcome, CreationError> {
        let bundle_id = bundle_id(record_type, bundle);
        let mapping = match load_attribute_mappings(self.fields.as_ref(), record_type, bundle) {
            Ok(mapping) => mapping,
            Err(err) if self.missing_mapping == MissingMappingPolicy::Soft => {
                warn!(target: "ingest", %bundle_id, "{err}");
                return Ok(Outcome::NothingToMap);
            }
            Err(err) => return Err(err.into()),
        };
        if mapping.is_empty() {
            debug!(target: "ingest", %bundle_id, "no mapped attributes");
            return Ok(Outcome::NothingToMap);
        }
        let Some(properties) = document.as_object() else {
            return Err(CreationError::InvalidDocument);
        };

        let resolver = self
            .load_context(&bundle_id)
            .and_then(|context| self.strategy.build(&mapping, &context))
            .map_err(|source| CreationError::Context {
                bundle_id: bundle_id.clone(),
                source,
            })?;

        let mut record = self
            .store
            .create_record(&bundle_id, self.fields.field_names(record_type, bundle));
        for (property, value) in properties {
            if property == TYPE.as_str() {
                continue;
            }
            let Some(attribute) = resolver.resolve(property) else {
                debug!(target: "ingest", %bundle_id, %property, "dropping unmapped property");
                continue;
            };
            match extract_scalar(property, value)? {
                Some(scalar) => record.set_attribute(attribute, scalar)?,
                None => record.clear_attribute(attribute)?,
            }
        }

        let saved = self.store.save(record).map_err(CreationError::Storage)?;
        info!(target: "ingest", %bundle_id, id = %saved.id, "created record");
        Ok(Outcome::Created(saved))
    }

    fn load_context(&self, bundle_id: &str) -> anyhow::Result<JsonValue> {
        let text = self.contexts.get_context(bundle_id)?;
        serde_json::from_str(&text).context("context is not valid JSON")
    }
}
