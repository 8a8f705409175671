//! The three credential maps and their JSON file format.
//!
//! On disk the set is a JSON object:
//!
//! ```json
//! {
//!   "master": ["4821", "7730"],
//!   "temp_codes": { "5555": 1767225600.0 },
//!   "one_time_codes": { "612944": 1 }
//! }
//! ```
//!
//! `temp_codes` values are absolute expiry instants in Unix seconds. Older
//! files may carry `master` as a single string or as an (empty) object, and
//! may omit any of the keys. Entries that are not valid codes, expiry values
//! out of range and one-time counts below one are dropped on load.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use smartlock_core::AccessCode;
use tracing::warn;

use crate::error::StorageResult;

/// Permanent, temporary and one-time credentials.
///
/// A code is unique within each map but may appear in several.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    pub(crate) permanent: BTreeSet<AccessCode>,
    pub(crate) temporary: BTreeMap<AccessCode, DateTime<Utc>>,
    pub(crate) one_time: BTreeMap<AccessCode, u32>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permanent(&self) -> &BTreeSet<AccessCode> {
        &self.permanent
    }

    pub fn temporary(&self) -> &BTreeMap<AccessCode, DateTime<Utc>> {
        &self.temporary
    }

    pub fn one_time(&self) -> &BTreeMap<AccessCode, u32> {
        &self.one_time
    }

    pub fn is_empty(&self) -> bool {
        self.permanent.is_empty() && self.temporary.is_empty() && self.one_time.is_empty()
    }

    /// Parse the JSON file format.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the bytes are not a JSON
    /// object of the expected shape.
    pub fn from_json(bytes: &[u8]) -> StorageResult<Self> {
        let stored: StoredCredentials = serde_json::from_slice(bytes)?;
        Ok(stored.into())
    }

    /// Serialize to the JSON file format.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if serialization fails.
    pub fn to_json(&self) -> StorageResult<Vec<u8>> {
        Ok(serde_json::to_vec(&StoredCredentials::from(self))?)
    }
}

/// Wire shape of the credential file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(default)]
    master: MasterCodes,
    #[serde(default)]
    temp_codes: BTreeMap<String, f64>,
    #[serde(default)]
    one_time_codes: BTreeMap<String, i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum MasterCodes {
    List(Vec<String>),
    Single(String),
    #[serde(skip_serializing)]
    Keyed(BTreeMap<String, IgnoredAny>),
}

impl Default for MasterCodes {
    fn default() -> Self {
        MasterCodes::List(Vec::new())
    }
}

impl MasterCodes {
    fn into_codes(self) -> Vec<String> {
        match self {
            MasterCodes::List(codes) => codes,
            MasterCodes::Single(code) => vec![code],
            MasterCodes::Keyed(map) => map.into_keys().collect(),
        }
    }
}

fn parse_code(raw: &str) -> Option<AccessCode> {
    match AccessCode::new(raw) {
        Ok(code) => Some(code),
        Err(e) => {
            warn!(error = %e, "Skipping invalid code in credential file");
            None
        }
    }
}

fn expiry_from_unix(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

fn expiry_to_unix(expiry: &DateTime<Utc>) -> f64 {
    expiry.timestamp_millis() as f64 / 1000.0
}

impl From<StoredCredentials> for CredentialSet {
    fn from(stored: StoredCredentials) -> Self {
        let permanent = stored
            .master
            .into_codes()
            .iter()
            .filter_map(|raw| parse_code(raw))
            .collect();

        let temporary = stored
            .temp_codes
            .iter()
            .filter_map(|(raw, secs)| Some((parse_code(raw)?, expiry_from_unix(*secs)?)))
            .collect();

        let one_time = stored
            .one_time_codes
            .iter()
            .filter(|(_, uses)| **uses > 0)
            .filter_map(|(raw, uses)| {
                Some((parse_code(raw)?, u32::try_from(*uses).unwrap_or(u32::MAX)))
            })
            .collect();

        Self {
            permanent,
            temporary,
            one_time,
        }
    }
}

impl From<&CredentialSet> for StoredCredentials {
    fn from(set: &CredentialSet) -> Self {
        Self {
            master: MasterCodes::List(
                set.permanent
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect(),
            ),
            temp_codes: set
                .temporary
                .iter()
                .map(|(c, expiry)| (c.as_str().to_string(), expiry_to_unix(expiry)))
                .collect(),
            one_time_codes: set
                .one_time
                .iter()
                .map(|(c, uses)| (c.as_str().to_string(), i64::from(*uses)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn code(s: &str) -> AccessCode {
        AccessCode::new(s).unwrap()
    }

    #[test]
    fn test_json_roundtrip() {
        let mut set = CredentialSet::new();
        set.permanent.insert(code("4821"));
        set.temporary
            .insert(code("5555"), Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        set.one_time.insert(code("612944"), 2);

        let parsed = CredentialSet::from_json(&set.to_json().unwrap()).unwrap();
        assert_eq!(parsed, set);
    }

    #[test]
    fn test_file_layout() {
        let mut set = CredentialSet::new();
        set.permanent.insert(code("4821"));
        set.temporary
            .insert(code("5555"), DateTime::from_timestamp(1_767_225_600, 0).unwrap());
        set.one_time.insert(code("612944"), 1);

        let value: serde_json::Value = serde_json::from_slice(&set.to_json().unwrap()).unwrap();
        assert_eq!(value["master"], serde_json::json!(["4821"]));
        assert_eq!(value["temp_codes"]["5555"], serde_json::json!(1_767_225_600.0));
        assert_eq!(value["one_time_codes"]["612944"], serde_json::json!(1));
    }

    #[rstest]
    #[case(r#"{"master": "4821"}"#)]
    #[case(r#"{"master": ["4821"]}"#)]
    #[case(r#"{"master": {"4821": true}, "temp_codes": {}, "one_time_codes": {}}"#)]
    fn test_master_legacy_shapes(#[case] json: &str) {
        let set = CredentialSet::from_json(json.as_bytes()).unwrap();
        assert_eq!(set.permanent().len(), 1);
        assert!(set.permanent().contains("4821"));
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let set = CredentialSet::from_json(b"{}").unwrap();
        assert!(set.is_empty());

        let set = CredentialSet::from_json(br#"{"master": {}}"#).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_integer_expiry_accepted() {
        let set = CredentialSet::from_json(br#"{"temp_codes": {"5555": 1767225600}}"#).unwrap();
        assert_eq!(
            set.temporary().get("5555"),
            Some(&DateTime::from_timestamp(1_767_225_600, 0).unwrap())
        );
    }

    #[test]
    fn test_bad_entries_dropped() {
        let json = br#"{
            "master": ["4821", "", "has space"],
            "one_time_codes": {"111111": 0, "222222": -3, "333333": 1}
        }"#;
        let set = CredentialSet::from_json(json).unwrap();

        assert_eq!(set.permanent().len(), 1);
        assert_eq!(set.one_time().len(), 1);
        assert_eq!(set.one_time().get("333333"), Some(&1));
    }

    #[test]
    fn test_not_an_object_is_error() {
        assert!(CredentialSet::from_json(b"[1, 2, 3]").is_err());
        assert!(CredentialSet::from_json(b"garbage").is_err());
    }
}
