use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{BuildLensError, Result};

/// Name of the build history file inside a repository directory.
pub const DATA_FILE_NAME: &str = "repo-data-travis.json";

/// A build record exactly as it appears in the data file.
///
/// Fields are kept as raw JSON so that the transform can tell a missing key
/// apart from an explicit `null` and decide how strict to be per field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawBuildRecord {
    #[serde(default, deserialize_with = "present")]
    pub started_at: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub finished_at: Option<Value>,

    #[serde(default, deserialize_with = "present")]
    pub duration: Option<Value>,
}

// `None` only when the key is absent; an explicit `null` becomes `Some(Value::Null)`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Read and parse the build history stored at `path`.
pub fn load_records(path: &Path) -> Result<Vec<RawBuildRecord>> {
    let contents = fs::read_to_string(path)?;
    let records = parse_records(&contents)?;

    debug!("Loaded {} build records from {}", records.len(), path.display());

    Ok(records)
}

pub fn parse_records(contents: &str) -> Result<Vec<RawBuildRecord>> {
    let document: Value = serde_json::from_str(contents)
        .map_err(|e| BuildLensError::data_format(format!("not valid JSON: {e}")))?;

    let Value::Array(items) = document else {
        return Err(BuildLensError::data_format(
            "expected a JSON array of build records",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(BuildLensError::data_format(format!(
                    "record {index} is not a JSON object"
                )));
            }
            serde_json::from_value(item).map_err(|e| {
                BuildLensError::data_format(format!("record {index} could not be read: {e}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_parse_records_reads_all_fields() {
        let records = parse_records(
            r#"[{"started_at": "2020-01-01T00:00:00Z", "finished_at": "2020-01-01T00:05:00Z", "duration": 300}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].started_at, Some(json!("2020-01-01T00:00:00Z")));
        assert_eq!(records[0].finished_at, Some(json!("2020-01-01T00:05:00Z")));
        assert_eq!(records[0].duration, Some(json!(300)));
    }

    #[test]
    fn test_parse_records_distinguishes_null_from_missing() {
        let records = parse_records(r#"[{"started_at": null, "finished_at": "2020-01-01"}]"#).unwrap();

        assert_eq!(records[0].started_at, Some(Value::Null));
        assert_eq!(records[0].duration, None);
    }

    #[test]
    fn test_parse_records_ignores_unknown_fields() {
        let records = parse_records(
            r#"[{"build_id": 42, "status": "passed", "jobs": [1, 2], "finished_at": "2020-01-01", "duration": 1}]"#,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].duration, Some(json!(1)));
    }

    #[test]
    fn test_parse_records_accepts_empty_array() {
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_records_rejects_invalid_json() {
        let err = parse_records("[{\"finished_at\": ").unwrap_err();
        assert!(matches!(err, BuildLensError::DataFormat(_)));
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        let err = parse_records(r#"{"builds": []}"#).unwrap_err();
        assert!(matches!(err, BuildLensError::DataFormat(_)));
    }

    #[test]
    fn test_parse_records_rejects_non_object_items() {
        let err = parse_records(r#"[{"finished_at": "2020-01-01"}, 7]"#).unwrap_err();

        match err {
            BuildLensError::DataFormat(message) => assert!(message.contains("record 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_records_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[\n  {{\"finished_at\": \"2020-01-01T00:10:00Z\",\n   \"duration\": 600}}\n]"
        )
        .unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_load_records_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join(DATA_FILE_NAME)).unwrap_err();

        assert!(matches!(err, BuildLensError::Io(_)));
    }
}
