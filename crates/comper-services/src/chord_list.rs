//! Chord-list documents: JSON arrays of titled chord parts

use std::path::Path;

use comper_core::{ChordChange, ChordPart, Key};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChordListError {
    #[error("Failed to read chord list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid chord list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One change as stored in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordListChange {
    pub chord_name: String,
    pub start_time: f64,
    pub duration: f64,
}

/// One part as stored in the document. The key stays textual so a single
/// bad entry does not reject the whole list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordListEntry {
    pub title: String,
    pub key: String,
    pub change: Vec<ChordListChange>,
    pub length: f64,
}

impl ChordListEntry {
    pub fn to_part(&self) -> comper_core::Result<ChordPart> {
        let key = Key::parse(&self.key)?;
        let mut part = ChordPart::new(self.title.clone(), key, self.length);
        part.changes = self
            .change
            .iter()
            .map(|c| ChordChange::new(c.chord_name.clone(), c.start_time, c.duration))
            .collect();
        if !part.is_well_formed() {
            tracing::warn!("Chord list part '{}' has overlapping or overflowing changes", part.title);
        }
        Ok(part)
    }
}

impl From<&ChordPart> for ChordListEntry {
    fn from(part: &ChordPart) -> Self {
        Self {
            title: part.title.clone(),
            key: part.key.to_string(),
            change: part
                .changes
                .iter()
                .map(|c| ChordListChange {
                    chord_name: c.chord.clone(),
                    start_time: c.start,
                    duration: c.duration,
                })
                .collect(),
            length: part.length,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChordList {
    pub entries: Vec<ChordListEntry>,
}

impl ChordList {
    pub fn from_json(json: &str) -> Result<Self, ChordListError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ChordListError> {
        let json = std::fs::read_to_string(path)?;
        let list = Self::from_json(&json)?;
        tracing::info!("Loaded {} parts from {}", list.entries.len(), path.display());
        Ok(list)
    }

    pub fn to_json(&self) -> Result<String, ChordListError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ChordListError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.title.as_str())
    }

    pub fn push(&mut self, part: &ChordPart) {
        self.entries.push(ChordListEntry::from(part));
    }

    /// First part whose title contains `title`.
    ///
    /// Missing or unreadable parts are logged and yield `None`.
    pub fn find(&self, title: &str) -> Option<ChordPart> {
        let Some(entry) = self.entries.iter().find(|e| e.title.contains(title)) else {
            tracing::warn!("No part found with title '{}'", title);
            return None;
        };
        match entry.to_part() {
            Ok(part) => Some(part),
            Err(e) => {
                tracing::warn!("Skipping part '{}': {}", entry.title, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"[
      {
        "title": "Blue Tune | Someone | Part 1",
        "key": "F",
        "change": [
          { "chord_name": "F7", "start_time": 0, "duration": 4 },
          { "chord_name": "Bb7", "start_time": 4, "duration": 4 }
        ],
        "length": 8
      },
      {
        "title": "Blue Tune | Someone | Part 2",
        "key": "Dm",
        "change": [{ "chord_name": "Em7b5", "start_time": 0, "duration": 2 }],
        "length": 4
      },
      {
        "title": "Broken",
        "key": "H",
        "change": [],
        "length": 4
      }
    ]"#;

    #[test]
    fn test_find_first_match() {
        let list = ChordList::from_json(DOC).unwrap();
        assert_eq!(list.entries.len(), 3);
        let part = list.find("Blue Tune").unwrap();
        assert_eq!(part.title, "Blue Tune | Someone | Part 1");
        assert_eq!(part.key.to_string(), "F");
        assert_eq!(part.symbols().collect::<Vec<_>>(), vec!["F7", "Bb7"]);
        assert_eq!(part.length, 8.0);

        let minor = list.find("Part 2").unwrap();
        assert!(minor.key.minor);
    }

    #[test]
    fn test_find_missing_or_bad_key() {
        let list = ChordList::from_json(DOC).unwrap();
        assert!(list.find("Nothing like it").is_none());
        assert!(list.find("Broken").is_none());
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            ChordList::from_json("{\"title\": 1}"),
            Err(ChordListError::Parse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chords.json");
        let mut part = ChordPart::new("Saved", Key::parse("G").unwrap(), 4.0);
        part.changes.push(ChordChange::new("G", 0.0, 4.0));

        let mut list = ChordList::default();
        list.push(&part);
        list.save(&path).unwrap();

        let loaded = ChordList::load(&path).unwrap();
        assert_eq!(loaded.titles().collect::<Vec<_>>(), vec!["Saved"]);
        assert_eq!(loaded.find("Saved").unwrap(), part);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ChordList::load(&dir.path().join("absent.json")),
            Err(ChordListError::Io(_))
        ));
    }
}
