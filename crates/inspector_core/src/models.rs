use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatasetRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_file_name: String,
    #[serde(default)]
    pub thumbnail_path: Option<String>,
}

/// A file record carrying the fields of its owning dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedFile {
    pub file: FileRecord,
    pub dataset_id: String,
    pub dataset_name: String,
    pub owner: String,
    pub url: String,
    /// Base64 dataset thumbnail, shared by every file of the dataset.
    pub thumbnail_data: Arc<str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub grant_type: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailureBody {
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub fault: Option<String>,
}

impl FailureBody {
    pub fn is_failure(&self) -> bool {
        self.result.as_deref() == Some("fail")
    }

    pub fn message(&self) -> String {
        self.fault
            .clone()
            .unwrap_or_else(|| "service reported result=fail".to_string())
    }
}
