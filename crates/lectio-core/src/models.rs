//! Data models for Lectio
//!
//! Defines the catalog entity (`Reading`), the conjunctive search filter
//! value object, favorites collections, and aggregate statistics.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// The closed set of reading types in the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadingType {
    Gospel,
    FirstReading,
    Psalm,
    SecondReading,
    Responsorial,
}

impl ReadingType {
    /// All reading types, in catalog order
    pub const ALL: [ReadingType; 5] = [
        ReadingType::Gospel,
        ReadingType::FirstReading,
        ReadingType::Psalm,
        ReadingType::SecondReading,
        ReadingType::Responsorial,
    ];

    /// The wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingType::Gospel => "gospel",
            ReadingType::FirstReading => "first-reading",
            ReadingType::Psalm => "psalm",
            ReadingType::SecondReading => "second-reading",
            ReadingType::Responsorial => "responsorial",
        }
    }

    /// Parse from the wire/database representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gospel" => Some(ReadingType::Gospel),
            "first-reading" => Some(ReadingType::FirstReading),
            "psalm" => Some(ReadingType::Psalm),
            "second-reading" => Some(ReadingType::SecondReading),
            "responsorial" => Some(ReadingType::Responsorial),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReadingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A catalog reading
///
/// `is_favorite` is denormalized; the store keeps it consistent with the
/// favorites side table on every toggle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Globally unique identifier
    pub id: String,
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
    /// Display title
    pub title: String,
    /// Full text content
    pub content: String,
    /// Reading type
    #[serde(rename = "type")]
    pub reading_type: ReadingType,
    /// Citation string
    pub reference: String,
    /// Difficulty, 1 (easiest) to 5
    pub difficulty: u8,
    /// Two-letter language code
    pub language: String,
    /// Word count of the content
    pub word_count: u32,
    /// Favorite flag (must equal membership in the favorites index)
    #[serde(default)]
    pub is_favorite: bool,
    /// Created timestamp, epoch milliseconds
    pub created_at: i64,
    /// Updated timestamp, epoch milliseconds
    pub updated_at: i64,
}

impl Reading {
    /// Create a new reading with generated id and current timestamps
    pub fn new(
        date: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        reading_type: ReadingType,
    ) -> Self {
        let content = content.into();
        let word_count = content.split_whitespace().count() as u32;
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            date: date.into(),
            title: title.into(),
            content,
            reading_type,
            reference: String::new(),
            difficulty: 1,
            language: "en".to_string(),
            word_count,
            is_favorite: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a reading with a specific id (for loading or import)
    pub fn with_id(
        id: impl Into<String>,
        date: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        reading_type: ReadingType,
    ) -> Self {
        let mut reading = Self::new(date, title, content, reading_type);
        reading.id = id.into();
        reading
    }

    /// Bump the updated timestamp
    pub fn touch(&mut self) {
        self.updated_at = now_millis();
    }
}

/// Conjunctive search filters
///
/// Every set field narrows the result set; an empty filter matches the whole
/// catalog. Not persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    /// Free-text query matched against title OR content (case-insensitive)
    pub query: Option<String>,
    /// Inclusive difficulty range (min, max)
    pub difficulty: Option<(u8, u8)>,
    /// Two-letter language code
    pub language: Option<String>,
    /// Reading type
    pub reading_type: Option<ReadingType>,
    /// Restrict to favorites
    #[serde(default)]
    pub favorites_only: bool,
    /// Inclusive date lower bound, `YYYY-MM-DD`
    pub date_from: Option<String>,
    /// Inclusive date upper bound, `YYYY-MM-DD`
    pub date_to: Option<String>,
    /// Maximum rows to return
    pub limit: Option<u32>,
    /// Rows to skip
    pub offset: Option<u32>,
}

impl SearchFilters {
    /// Deterministic cache key from the semantic filter tuple
    pub fn cache_key(&self) -> String {
        format!(
            "q={}|d={}|lang={}|type={}|fav={}|from={}|to={}|limit={}|offset={}",
            self.query.as_deref().unwrap_or(""),
            self.difficulty
                .map(|(lo, hi)| format!("{}-{}", lo, hi))
                .unwrap_or_default(),
            self.language.as_deref().unwrap_or(""),
            self.reading_type.map(|t| t.as_str()).unwrap_or(""),
            if self.favorites_only { "1" } else { "0" },
            self.date_from.as_deref().unwrap_or(""),
            self.date_to.as_deref().unwrap_or(""),
            self.limit.map(|l| l.to_string()).unwrap_or_default(),
            self.offset.map(|o| o.to_string()).unwrap_or_default(),
        )
    }
}

/// A named, ordered collection of favorite readings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesCollection {
    /// Collection identifier (`default` for the built-in collection)
    pub id: String,
    /// Display name
    pub name: String,
    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered member reading ids, no duplicates
    pub reading_ids: Vec<String>,
    /// Created timestamp, epoch milliseconds
    pub created_at: i64,
    /// Updated timestamp, epoch milliseconds
    pub updated_at: i64,
}

impl FavoritesCollection {
    /// Create a new collection with a generated id
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        let now = now_millis();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description,
            reading_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a reading id if not already a member; returns true if added
    pub fn add_reading(&mut self, reading_id: &str) -> bool {
        if self.reading_ids.iter().any(|id| id == reading_id) {
            return false;
        }
        self.reading_ids.push(reading_id.to_string());
        self.updated_at = now_millis();
        true
    }

    /// Remove a reading id; returns true if it was a member
    pub fn remove_reading(&mut self, reading_id: &str) -> bool {
        if let Some(pos) = self.reading_ids.iter().position(|id| id == reading_id) {
            self.reading_ids.remove(pos);
            self.updated_at = now_millis();
            true
        } else {
            false
        }
    }
}

/// Aggregate catalog statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentStats {
    /// Total readings in the catalog
    pub total_readings: i64,
    /// Total favorited readings
    pub total_favorites: i64,
    /// Distinct language codes present
    pub languages: Vec<String>,
    /// Earliest reading date, if any
    pub earliest_date: Option<String>,
    /// Latest reading date, if any
    pub latest_date: Option<String>,
    /// Mean difficulty across the catalog (0 when empty)
    pub average_difficulty: f64,
}

/// One row of persisted search history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    /// Row id
    pub id: i64,
    /// The query as entered
    pub query: String,
    /// Recorded timestamp, epoch milliseconds
    pub created_at: i64,
    /// Number of results the search produced
    pub results_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_new() {
        let reading = Reading::new("2026-01-04", "Prologue", "In the beginning", ReadingType::Gospel);
        assert_eq!(reading.date, "2026-01-04");
        assert_eq!(reading.title, "Prologue");
        assert_eq!(reading.word_count, 3);
        assert!(!reading.is_favorite);
        assert_eq!(reading.created_at, reading.updated_at);
    }

    #[test]
    fn test_reading_with_id() {
        let reading = Reading::with_id("r1", "2026-01-04", "Title", "body", ReadingType::Psalm);
        assert_eq!(reading.id, "r1");
        assert_eq!(reading.reading_type, ReadingType::Psalm);
    }

    #[test]
    fn test_reading_type_round_trip() {
        for ty in ReadingType::ALL {
            assert_eq!(ReadingType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(ReadingType::parse("homily"), None);
    }

    #[test]
    fn test_reading_type_serde() {
        let json = serde_json::to_string(&ReadingType::FirstReading).unwrap();
        assert_eq!(json, "\"first-reading\"");
        let parsed: ReadingType = serde_json::from_str("\"second-reading\"").unwrap();
        assert_eq!(parsed, ReadingType::SecondReading);
    }

    #[test]
    fn test_reading_serialization_shape() {
        let reading = Reading::with_id("r1", "2026-01-04", "Title", "body text", ReadingType::Gospel);
        let value = serde_json::to_value(&reading).unwrap();
        assert_eq!(value["type"], "gospel");
        assert!(value.get("wordCount").is_some());
        assert!(value.get("isFavorite").is_some());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_filter_cache_key_deterministic() {
        let filters = SearchFilters {
            query: Some("shepherd".to_string()),
            difficulty: Some((2, 4)),
            favorites_only: true,
            ..Default::default()
        };
        assert_eq!(filters.cache_key(), filters.cache_key());
        assert_ne!(filters.cache_key(), SearchFilters::default().cache_key());
    }

    #[test]
    fn test_collection_membership() {
        let mut collection = FavoritesCollection::new("Advent", None);
        assert!(collection.add_reading("r1"));
        assert!(!collection.add_reading("r1"));
        assert_eq!(collection.reading_ids, vec!["r1"]);

        assert!(collection.remove_reading("r1"));
        assert!(!collection.remove_reading("r1"));
        assert!(collection.reading_ids.is_empty());
    }
}
