use std::fmt::Display;
use std::str::FromStr;

use fjall::UserKey;
use thiserror::Error;
use uuid::Uuid;

/// Record ids are only ever spelled in the 32 hex digit simple form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid record id {0:?}")]
pub(crate) struct InvalidRecordId(String);

/// Time ordered record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordKey(Uuid);

impl RecordKey {
    pub(crate) fn new() -> RecordKey {
        RecordKey(Uuid::now_v7())
    }
}

impl From<RecordKey> for UserKey {
    fn from(value: RecordKey) -> Self {
        UserKey::new(value.0.as_bytes())
    }
}

impl AsRef<[u8]> for RecordKey {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.as_simple().fmt(f)
    }
}

impl FromStr for RecordKey {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 32 {
            return Err(InvalidRecordId(s.to_owned()));
        }
        Uuid::try_parse(s)
            .map(RecordKey)
            .map_err(|_| InvalidRecordId(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::RecordKey;

    #[test]
    fn display_then_parse() {
        let key = RecordKey::new();
        let id = key.to_string();
        assert_eq!(id.len(), 32);
        assert_eq!(id.parse::<RecordKey>().ok(), Some(key));
        assert!("not-a-key".parse::<RecordKey>().is_err());
    }

    #[test]
    fn only_the_simple_form_is_an_id() {
        assert!("0192f0c3b7a47c0e8a1b2c3d4e5f6a7b".parse::<RecordKey>().is_ok());
        assert!(
            "0192f0c3-b7a4-7c0e-8a1b-2c3d4e5f6a7b"
                .parse::<RecordKey>()
                .is_err()
        );
        assert!("{0192f0c3b7a47c0e8a1b2c3d4e5f6a7b}".parse::<RecordKey>().is_err());
    }
}
