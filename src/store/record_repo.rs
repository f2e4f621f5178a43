use anyhow::{Context, Result};
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use jiff::Timestamp;
use tracing::debug;

use super::{Record, RecordHandle, RecordKey, RecordStore, SavedRecord};

#[derive(Clone)]
pub(crate) struct RecordRepo {
    keyspace: Keyspace,
    records: PartitionHandle,
    base_url: String,
    record_type: String,
}

impl RecordRepo {
    pub(crate) fn new(keyspace: Keyspace, base_url: &str, record_type: &str) -> Result<RecordRepo> {
        let records = keyspace.open_partition("records", PartitionCreateOptions::default())?;
        Ok(RecordRepo {
            keyspace,
            records,
            base_url: base_url.trim_end_matches('/').to_owned(),
            record_type: record_type.to_owned(),
        })
    }
}

impl RecordStore for RecordRepo {
    fn save(&self, record: RecordHandle) -> Result<SavedRecord> {
        let key = RecordKey::new();
        let record = Record {
            bundle_id: record.bundle_id().to_owned(),
            attributes: record.attributes().clone(),
            created: Timestamp::now().to_string(),
        };
        let bytes = minicbor::to_vec(&record).context("unable to encode record")?;
        self.records.insert(key, bytes)?;
        self.keyspace.persist(PersistMode::SyncAll)?;

        let id = key.to_string();
        debug!(target: "store", %id, bundle_id = %record.bundle_id, "saved record");
        Ok(SavedRecord {
            url: self.location(&id),
            id,
        })
    }

    fn find_one(&self, id: &str) -> Result<Option<Record>> {
        let Ok(key) = id.parse::<RecordKey>() else {
            return Ok(None);
        };
        if let Some(bytes) = self.records.get(key)? {
            let record = minicbor::decode(&bytes).context("unable to decode record")?;
            return Ok(Some(record));
        }
        Ok(None)
    }

    fn location(&self, id: &str) -> String {
        format!("{}/{}/{id}", self.base_url, self.record_type)
    }
}
