//! Static lookup tables used to enrich scene context.
//!
//! Both tables are plain JSON objects loaded once at startup and never
//! modified afterwards:
//!
//! ```text
//! names.json   {"アンナ": "Анна", ...}
//! kag_db.json  {"[chara name=anna]": {"description": "...", "gender": "..."}, ...}
//! ```

use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Mapping from Japanese name tokens to their Russian renderings.
///
/// Entries keep the order they have in the source file.
#[derive(Debug, Clone, Default)]
pub struct NameDictionary {
    names: Vec<(String, String)>,
}

impl NameDictionary {
    /// Load the dictionary from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let raw: serde_json::Map<String, serde_json::Value> = read_json(path)?;

        raw.into_iter()
            .map(|(original, value)| match value {
                serde_json::Value::String(russian) => Ok((original, russian)),
                _ => Err(LookupError::InvalidEntry {
                    path: path.display().to_string(),
                    key: original,
                }),
            })
            .collect()
    }

    /// Entries whose source name occurs literally in `line`, in file order.
    pub fn relevant_to<'a>(&'a self, line: &str) -> Vec<(&'a str, &'a str)> {
        self.names
            .iter()
            .filter(|(original, _)| line.contains(original.as_str()))
            .map(|(original, russian)| (original.as_str(), russian.as_str()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for NameDictionary {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Who is presumed to be speaking after a given script line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerRecord {
    pub description: String,
    pub gender: String,
}

/// Mapping from an exact (trimmed) script line to the speaker it introduces.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeakerDatabase {
    speakers: HashMap<String, SpeakerRecord>,
}

impl SpeakerDatabase {
    /// Load the database from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        read_json(path)
    }

    /// Look up the speaker introduced by `previous_line`.
    pub fn lookup(&self, previous_line: &str) -> Option<&SpeakerRecord> {
        self.speakers.get(previous_line)
    }

    pub fn len(&self) -> usize {
        self.speakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.speakers.is_empty()
    }
}

impl FromIterator<(String, SpeakerRecord)> for SpeakerDatabase {
    fn from_iter<I: IntoIterator<Item = (String, SpeakerRecord)>>(iter: I) -> Self {
        Self {
            speakers: iter.into_iter().collect(),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LookupError> {
    let content = std::fs::read_to_string(path).map_err(|source| LookupError::ReadError {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| LookupError::ParseError {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_relevant_names() {
        let names: NameDictionary = [
            ("アンナ".to_string(), "Анна".to_string()),
            ("太郎".to_string(), "Таро".to_string()),
        ]
        .into_iter()
        .collect();

        let found = names.relevant_to("アンナは毎あさ七時に起きます。");
        assert_eq!(found, vec![("アンナ", "Анна")]);
        assert!(names.relevant_to("......").is_empty());
    }

    #[test]
    fn test_load_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.json");
        std::fs::write(&path, r#"{"花子": "Ханако", "田中": "Танака"}"#).unwrap();

        let names = NameDictionary::load(&path).unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.relevant_to("田中さん"), vec![("田中", "Танака")]);
    }

    #[test]
    fn test_names_keep_file_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.json");
        std::fs::write(&path, r#"{"太郎": "Таро", "アンナ": "Анна", "花子": "Ханако"}"#).unwrap();

        let names = NameDictionary::load(&path).unwrap();
        assert_eq!(
            names.relevant_to("花子とアンナと太郎"),
            vec![("太郎", "Таро"), ("アンナ", "Анна"), ("花子", "Ханако")]
        );
    }

    #[test]
    fn test_non_string_name_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.json");
        std::fs::write(&path, r#"{"太郎": 1}"#).unwrap();

        let result = NameDictionary::load(&path);
        assert!(matches!(result, Err(LookupError::InvalidEntry { key, .. }) if key == "太郎"));
    }

    #[test]
    fn test_load_speakers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kag_db.json");
        std::fs::write(
            &path,
            r#"{"[anna]": {"description": "Анна, старшая сестра", "gender": "женский"}}"#,
        )
        .unwrap();

        let speakers = SpeakerDatabase::load(&path).unwrap();
        let record = speakers.lookup("[anna]").unwrap();
        assert_eq!(record.gender, "женский");
        assert!(speakers.lookup("[anna] ").is_none());
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = NameDictionary::load(&dir.path().join("missing.json"));
        assert!(matches!(result, Err(LookupError::ReadError { .. })));
    }

    #[test]
    fn test_malformed_speaker_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kag_db.json");
        std::fs::write(&path, r#"{"[anna]": {"description": "no gender"}}"#).unwrap();

        let result = SpeakerDatabase::load(&path);
        assert!(matches!(result, Err(LookupError::ParseError { .. })));
    }
}
