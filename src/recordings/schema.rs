//! Recording metadata schema
//!
//! One ledger entry per stored clip. Serialized as camelCase JSON so the
//! persisted ledger stays readable by the mobile frontend.

use crate::utils::AppResult;
use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields assigned by the store; caller values for these are discarded
pub const SYSTEM_FIELDS: [&str; 4] = ["id", "filename", "uri", "createdAt"];

/// Caller-supplied metadata, merged over the defaults at save time
pub type MetadataFields = Map<String, Value>;

/// Metadata for a single stored recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingMetadata {
    /// Unique id, the only lookup key
    pub id: String,

    /// Blob file name, `recording_<id>.<ext>`
    pub filename: String,

    /// Absolute path of the stored blob
    pub uri: String,

    pub created_at: DateTime<Utc>,

    #[serde(default, deserialize_with = "number_or_zero")]
    pub duration: f64,

    /// Blob size in bytes as reported by the caller
    #[serde(default, deserialize_with = "number_or_zero")]
    pub size: f64,

    /// Result of a later analysis pass, `null` until set
    #[serde(default)]
    pub analysis_result: Option<Value>,

    /// Any other caller-supplied fields, kept verbatim
    #[serde(flatten)]
    pub extra: MetadataFields,
}

/// Any JSON number; `null` reads as 0
fn number_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or_default())
}

impl RecordingMetadata {
    /// Build a record from defaults, caller fields, then the system-assigned fields.
    pub fn build(
        id: &str,
        filename: &str,
        uri: &str,
        created_at: DateTime<Utc>,
        fields: Option<MetadataFields>,
    ) -> AppResult<Self> {
        let mut merged = Map::new();
        merged.insert("duration".to_string(), Value::from(0));
        merged.insert("size".to_string(), Value::from(0));
        merged.insert("analysisResult".to_string(), Value::Null);

        if let Some(fields) = fields {
            merged.extend(fields);
        }

        merged.insert("id".to_string(), Value::from(id));
        merged.insert("filename".to_string(), Value::from(filename));
        merged.insert("uri".to_string(), Value::from(uri));
        merged.insert(
            "createdAt".to_string(),
            serde_json::to_value(created_at)?,
        );

        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// Shallow-merge `patch` over this record. Fields not named in the patch
    /// are kept; system-assigned fields are never overwritten.
    pub fn apply_patch(&mut self, patch: &MetadataFields) -> AppResult<()> {
        let Value::Object(mut current) = serde_json::to_value(&*self)? else {
            return Err(serde_json::Error::custom("recording did not serialize to an object").into());
        };

        for (key, value) in patch {
            if SYSTEM_FIELDS.contains(&key.as_str()) {
                tracing::warn!("Ignoring update to system field '{}' on {}", key, self.id);
                continue;
            }
            current.insert(key.clone(), value.clone());
        }

        *self = serde_json::from_value(Value::Object(current))?;
        Ok(())
    }
}
