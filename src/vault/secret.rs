//! Secret, SecretVersion and SecretsFile: the persisted data model.
//!
//! Field names follow the on-disk JSON document (camelCase), e.g.
//!
//! ```json
//! {
//!   "appVersion": "1.0.0",
//!   "appUser": "alice",
//!   "lastUpdated": "2024-05-01T10:00:00Z",
//!   "secrets": [
//!     {
//!       "secretName": "db",
//!       "type": "key_value",
//!       "currentVersion": 2,
//!       "versions": [
//!         { "secretValueEnc": "...", "version": 1, "updatedAt": "..." },
//!         { "secretValueEnc": "...", "version": 2, "updatedAt": "..." }
//!       ]
//!     }
//!   ]
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{LockboxError, Result};

/// What kind of value a secret holds.  Informational only: every type is
/// encrypted the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SecretType {
    #[default]
    KeyValue,
    Json,
    Other,
}

impl SecretType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyValue => "key_value",
            Self::Json => "json",
            Self::Other => "other",
        }
    }

    /// Lenient conversion used when reading documents: anything that is
    /// not a known tag (including the empty string) is `Other`.
    fn from_tag(tag: &str) -> Self {
        match tag {
            "key_value" => Self::KeyValue,
            "json" => Self::Json,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parsing for user input.
impl FromStr for SecretType {
    type Err = LockboxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "key_value" | "kv" => Ok(Self::KeyValue),
            "json" => Ok(Self::Json),
            "other" => Ok(Self::Other),
            other => Err(LockboxError::Validation(format!(
                "unknown secret type '{other}' (expected key_value, json or other)"
            ))),
        }
    }
}

impl Serialize for SecretType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SecretType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// One immutable encrypted snapshot of a secret's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretVersion {
    /// Base64 token produced by the crypto engine.
    #[serde(rename = "secretValueEnc")]
    pub encrypted_value: String,

    /// 1-based, gap-free version number.
    pub version: u32,

    pub updated_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
}

/// A named secret with its full version chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    pub secret_name: String,

    #[serde(rename = "type", default)]
    pub secret_type: SecretType,

    /// Version number treated as the visible value.
    pub current_version: u32,

    /// Append-only, in creation order.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub versions: Vec<SecretVersion>,
}

impl Secret {
    /// Start a new secret at version 1.
    pub fn new(name: &str, secret_type: SecretType, first: SecretVersion) -> Self {
        Self {
            secret_name: name.to_string(),
            secret_type,
            current_version: first.version,
            versions: vec![first],
        }
    }

    /// The version `current_version` points at, if present.
    pub fn current(&self) -> Option<&SecretVersion> {
        self.version(self.current_version)
    }

    /// Look up a specific version number.
    pub fn version(&self, number: u32) -> Option<&SecretVersion> {
        self.versions.iter().find(|v| v.version == number)
    }

    /// Highest version number in the chain (0 for an empty chain).
    pub fn latest_version_number(&self) -> u32 {
        self.versions.iter().map(|v| v.version).max().unwrap_or(0)
    }

    /// All versions, newest first.
    pub fn versions_sorted(&self) -> Vec<SecretVersion> {
        let mut versions = self.versions.clone();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        versions
    }

    /// Timestamp of the most recently written version.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.versions.iter().map(|v| v.updated_at).max()
    }
}

/// The single persisted document holding every secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsFile {
    pub app_version: String,

    pub app_user: String,

    /// Refreshed by the store on every write.  Absent only for a
    /// document that has never been written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(deserialize_with = "null_as_empty")]
    pub secrets: Vec<Secret>,
}

impl SecretsFile {
    /// An empty document for the given application metadata.
    pub fn empty(app_version: &str, app_user: &str) -> Self {
        Self {
            app_version: app_version.to_string(),
            app_user: app_user.to_string(),
            last_updated: None,
            secrets: Vec::new(),
        }
    }

    pub fn find(&self, name: &str) -> Option<&Secret> {
        self.secrets.iter().find(|s| s.secret_name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Secret> {
        self.secrets.iter_mut().find(|s| s.secret_name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Remove a secret by name.  Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.secrets.len();
        self.secrets.retain(|s| s.secret_name != name);
        self.secrets.len() != before
    }

    /// Sum of version counts across all secrets.
    pub fn total_versions(&self) -> usize {
        self.secrets.iter().map(|s| s.versions.len()).sum()
    }
}

/// Read a JSON `null` list as empty.  Older writers emit `null` for a
/// list that was never populated.
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(n: u32) -> SecretVersion {
        SecretVersion {
            encrypted_value: format!("enc-{n}"),
            version: n,
            updated_at: Utc::now(),
            updated_by: None,
        }
    }

    #[test]
    fn serializes_with_document_field_names() {
        let secret = Secret::new("db", SecretType::Json, version(1));
        let json = serde_json::to_value(&secret).unwrap();

        assert_eq!(json["secretName"], "db");
        assert_eq!(json["type"], "json");
        assert_eq!(json["currentVersion"], 1);
        assert_eq!(json["versions"][0]["secretValueEnc"], "enc-1");
        assert!(json["versions"][0].get("updatedBy").is_none());
    }

    #[test]
    fn null_lists_read_as_empty() {
        let raw = r#"{"appVersion":"1.0.0","appUser":"alice","secrets":null}"#;
        let file: SecretsFile = serde_json::from_str(raw).unwrap();
        assert!(file.secrets.is_empty());

        let raw = r#"{"secretName":"a","currentVersion":1,"versions":null}"#;
        let secret: Secret = serde_json::from_str(raw).unwrap();
        assert!(secret.versions.is_empty());
    }

    #[test]
    fn unknown_type_reads_as_other_and_missing_type_as_key_value() {
        let raw = r#"{"secretName":"a","type":"","currentVersion":1,"versions":[]}"#;
        let secret: Secret = serde_json::from_str(raw).unwrap();
        assert_eq!(secret.secret_type, SecretType::Other);

        let raw = r#"{"secretName":"a","currentVersion":1,"versions":[]}"#;
        let secret: Secret = serde_json::from_str(raw).unwrap();
        assert_eq!(secret.secret_type, SecretType::KeyValue);
    }

    #[test]
    fn from_str_is_strict() {
        assert_eq!("json".parse::<SecretType>().unwrap(), SecretType::Json);
        assert!("JSON".parse::<SecretType>().is_err());
    }

    #[test]
    fn current_follows_pointer_not_position() {
        let mut secret = Secret::new("a", SecretType::KeyValue, version(1));
        secret.versions.push(version(2));
        secret.versions.push(version(3));
        secret.current_version = 2;

        assert_eq!(secret.current().unwrap().encrypted_value, "enc-2");
        assert_eq!(secret.latest_version_number(), 3);

        secret.current_version = 9;
        assert!(secret.current().is_none());
    }

    #[test]
    fn versions_sorted_is_newest_first() {
        let mut secret = Secret::new("a", SecretType::KeyValue, version(1));
        secret.versions.push(version(2));
        let sorted: Vec<u32> = secret.versions_sorted().iter().map(|v| v.version).collect();
        assert_eq!(sorted, vec![2, 1]);
    }

    #[test]
    fn remove_reports_whether_anything_changed() {
        let mut file = SecretsFile::empty("1.0.0", "me");
        file.secrets.push(Secret::new("a", SecretType::KeyValue, version(1)));

        assert!(!file.remove("missing"));
        assert!(file.remove("a"));
        assert!(file.secrets.is_empty());
    }
}
