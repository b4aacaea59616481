use serde::{Deserialize, Serialize};

/// Canonical corpus document, keyed by its external identifier (a DOI).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperRecord {
    pub authors: Vec<String>,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(rename = "_time")]
    pub timestamp: i64,
    #[serde(rename = "_id")]
    pub id: String,
}

/// Projection of a record kept in the timeline store for chronological scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(rename = "_time")]
    pub timestamp: i64,
    #[serde(rename = "_id")]
    pub id: String,
}

impl From<&PaperRecord> for TimelineEntry {
    fn from(record: &PaperRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            id: record.id.clone(),
        }
    }
}

impl PaperRecord {
    pub fn joined_authors(&self, sep: &str) -> String {
        self.authors.join(sep)
    }
}

/// A single record shaped for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperView {
    pub weight: f64,
    pub id: String,
    pub title: String,
    pub authors: String,
    pub time: String,
    pub summary: String,
}

impl PaperView {
    pub fn from_record(record: &PaperRecord, weight: f64) -> Self {
        Self {
            weight,
            id: record.id.clone(),
            title: record.title.clone(),
            authors: record.joined_authors(", "),
            time: record.timestamp.to_string(),
            summary: record.summary.clone(),
        }
    }

    /// Used when the timeline knows an id the corpus does not (a partially
    /// applied upsert); only the id and time are known.
    pub fn from_timeline(entry: &TimelineEntry, weight: f64) -> Self {
        Self {
            weight,
            id: entry.id.clone(),
            title: String::new(),
            authors: String::new(),
            time: entry.timestamp.to_string(),
            summary: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PaperRecord {
        PaperRecord {
            authors: vec!["Ada Lovelace".to_string(), "Charles Babbage".to_string()],
            title: "Notes on the Analytical Engine".to_string(),
            summary: String::new(),
            timestamp: 1843,
            id: "10.1000/engine".to_string(),
        }
    }

    #[test]
    fn corpus_document_uses_underscore_field_names() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert_eq!(json["_id"], "10.1000/engine");
        assert_eq!(json["_time"], 1843);
        assert_eq!(json["summary"], "");
    }

    #[test]
    fn view_joins_authors_with_comma() {
        let view = PaperView::from_record(&sample(), 20.0);
        assert_eq!(view.authors, "Ada Lovelace, Charles Babbage");
        assert_eq!(view.time, "1843");
    }
}
