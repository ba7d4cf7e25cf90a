//! Catalog validation
//!
//! Validation results are data, not errors: callers get a structured report
//! of field-level problems and decide what to do with it. The reading type
//! itself is a closed enum, so type membership is enforced at
//! deserialization and never re-checked here.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::Reading;

/// Minimum accepted title length
pub const MIN_TITLE_LEN: usize = 3;

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    /// Field the problem applies to
    pub field: String,
    /// Human-readable description
    pub message: String,
}

impl ValidationIssue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Per-record validation outcome
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Id of the validated reading (may be empty if the record lacks one)
    pub reading_id: String,
    /// Problems that make the record invalid
    pub errors: Vec<ValidationIssue>,
    /// Problems worth surfacing but not disqualifying
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when no errors were recorded (warnings do not disqualify)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Aggregate outcome of validating a batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValidationReport {
    pub total: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// `valid_count / total * 100`, or 0 for an empty batch
    pub success_rate: f64,
    /// Reports for the records that failed validation
    pub failures: Vec<ValidationReport>,
}

/// A whole-catalog consistency problem
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum IntegrityIssue {
    /// A reading row with an empty id
    MissingId { title: String },
    /// A favorites entry pointing at no known reading
    OrphanedFavorite { reading_id: String },
    /// A reading with an empty citation reference
    EmptyReference { reading_id: String },
    /// A reading missing one or more of date/title/content
    CorruptedRecord {
        reading_id: String,
        missing_fields: Vec<String>,
    },
}

/// Outcome of an integrity scan
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    /// Integrity holds iff no issues were found
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Field-level, batch, and whole-catalog validation
#[derive(Debug, Default)]
pub struct ValidationService;

impl ValidationService {
    pub fn new() -> Self {
        Self
    }

    // ==================== Per-Record Validation ====================

    /// Validate a single reading, returning errors and warnings as data
    pub fn validate_reading(&self, reading: &Reading) -> ValidationReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if reading.id.trim().is_empty() {
            errors.push(ValidationIssue::new("id", "Id is required"));
        }

        if reading.date.trim().is_empty() {
            errors.push(ValidationIssue::new("date", "Date is required"));
        } else if !is_valid_date(&reading.date) {
            errors.push(ValidationIssue::new(
                "date",
                format!("Date '{}' is not a valid YYYY-MM-DD date", reading.date),
            ));
        }

        if reading.title.trim().is_empty() {
            errors.push(ValidationIssue::new("title", "Title is required"));
        } else if reading.title.trim().chars().count() < MIN_TITLE_LEN {
            errors.push(ValidationIssue::new(
                "title",
                format!("Title must be at least {} characters", MIN_TITLE_LEN),
            ));
        }

        if reading.content.trim().is_empty() {
            errors.push(ValidationIssue::new("content", "Content is required"));
        }

        if !(1..=5).contains(&reading.difficulty) {
            errors.push(ValidationIssue::new(
                "difficulty",
                format!("Difficulty {} is outside 1-5", reading.difficulty),
            ));
        }

        if reading.language.len() != 2 || !reading.language.chars().all(|c| c.is_ascii_alphabetic())
        {
            warnings.push(ValidationIssue::new(
                "language",
                format!("Language '{}' is not a two-letter code", reading.language),
            ));
        }

        if reading.word_count == 0 && !reading.content.trim().is_empty() {
            warnings.push(ValidationIssue::new(
                "wordCount",
                "Word count is zero for non-empty content",
            ));
        }

        if reading.created_at <= 0 || reading.updated_at <= 0 {
            errors.push(ValidationIssue::new(
                "timestamps",
                "Created/updated timestamps must be positive",
            ));
        }

        ValidationReport {
            reading_id: reading.id.clone(),
            errors,
            warnings,
        }
    }

    /// Validate a batch, aggregating into a summary with success rate
    pub fn validate_batch(&self, readings: &[Reading]) -> BatchValidationReport {
        let reports: Vec<ValidationReport> =
            readings.iter().map(|r| self.validate_reading(r)).collect();

        let total = reports.len();
        let valid_count = reports.iter().filter(|r| r.is_valid()).count();
        let success_rate = if total == 0 {
            0.0
        } else {
            valid_count as f64 / total as f64 * 100.0
        };

        BatchValidationReport {
            total,
            valid_count,
            invalid_count: total - valid_count,
            success_rate,
            failures: reports.into_iter().filter(|r| !r.is_valid()).collect(),
        }
    }

    // ==================== Integrity Scan ====================

    /// Scan the catalog for cross-record consistency problems
    ///
    /// Issues are reported, never auto-repaired.
    pub fn check_integrity(&self, readings: &[Reading], favorite_ids: &[String]) -> IntegrityReport {
        let mut issues = Vec::new();

        for reading in readings {
            if reading.id.trim().is_empty() {
                issues.push(IntegrityIssue::MissingId {
                    title: reading.title.clone(),
                });
                continue;
            }

            let mut missing = Vec::new();
            if reading.date.trim().is_empty() {
                missing.push("date".to_string());
            }
            if reading.title.trim().is_empty() {
                missing.push("title".to_string());
            }
            if reading.content.trim().is_empty() {
                missing.push("content".to_string());
            }
            if !missing.is_empty() {
                issues.push(IntegrityIssue::CorruptedRecord {
                    reading_id: reading.id.clone(),
                    missing_fields: missing,
                });
            }

            if reading.reference.trim().is_empty() {
                issues.push(IntegrityIssue::EmptyReference {
                    reading_id: reading.id.clone(),
                });
            }
        }

        for favorite_id in favorite_ids {
            if !readings.iter().any(|r| &r.id == favorite_id) {
                issues.push(IntegrityIssue::OrphanedFavorite {
                    reading_id: favorite_id.clone(),
                });
            }
        }

        IntegrityReport { issues }
    }
}

/// Shape check (`YYYY-MM-DD`) plus calendar validity
fn is_valid_date(date: &str) -> bool {
    let bytes = date.as_bytes();
    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return false;
    }
    let digits_ok = bytes
        .iter()
        .enumerate()
        .all(|(i, b)| matches!(i, 4 | 7) || b.is_ascii_digit());
    digits_ok && NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReadingType;

    fn valid_reading() -> Reading {
        let mut reading = Reading::with_id(
            "r1",
            "2026-01-04",
            "The Prologue",
            "In the beginning was the Word",
            ReadingType::Gospel,
        );
        reading.reference = "John 1:1-18".to_string();
        reading.difficulty = 3;
        reading
    }

    #[test]
    fn test_valid_reading_passes() {
        let report = ValidationService::new().validate_reading(&valid_reading());
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let mut reading = valid_reading();
        reading.id = "".to_string();
        reading.title = "".to_string();
        reading.content = "  ".to_string();

        let report = ValidationService::new().validate_reading(&reading);
        assert!(!report.is_valid());
        let fields: Vec<&str> = report.errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"id"));
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"content"));
    }

    #[test]
    fn test_date_format_and_calendar_validity() {
        let service = ValidationService::new();

        for bad in ["2026/01/04", "04-01-2026", "2026-13-01", "2026-02-30", "abcd-ef-gh"] {
            let mut reading = valid_reading();
            reading.date = bad.to_string();
            let report = service.validate_reading(&reading);
            assert!(!report.is_valid(), "expected '{}' to be rejected", bad);
        }

        let mut reading = valid_reading();
        reading.date = "2024-02-29".to_string(); // leap day
        assert!(service.validate_reading(&reading).is_valid());
    }

    #[test]
    fn test_title_minimum_length() {
        let mut reading = valid_reading();
        reading.title = "Ps".to_string();
        let report = ValidationService::new().validate_reading(&reading);
        assert!(report.errors.iter().any(|e| e.field == "title"));
    }

    #[test]
    fn test_difficulty_range() {
        let service = ValidationService::new();
        for bad in [0u8, 6] {
            let mut reading = valid_reading();
            reading.difficulty = bad;
            assert!(!service.validate_reading(&reading).is_valid());
        }
    }

    #[test]
    fn test_language_is_warning_not_error() {
        let mut reading = valid_reading();
        reading.language = "english".to_string();
        let report = ValidationService::new().validate_reading(&reading);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.field == "language"));
    }

    #[test]
    fn test_batch_success_rate() {
        let service = ValidationService::new();
        let mut bad = valid_reading();
        bad.difficulty = 9;

        let report = service.validate_batch(&[valid_reading(), valid_reading(), valid_reading(), bad]);
        assert_eq!(report.total, 4);
        assert_eq!(report.valid_count, 3);
        assert_eq!(report.invalid_count, 1);
        assert_eq!(report.success_rate, 75.0);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_batch_empty_is_zero_rate() {
        let report = ValidationService::new().validate_batch(&[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.success_rate, 0.0);
    }

    #[test]
    fn test_integrity_detects_all_issue_kinds() {
        let service = ValidationService::new();

        let good = valid_reading();
        let mut no_id = valid_reading();
        no_id.id = "".to_string();
        let mut no_reference = valid_reading();
        no_reference.id = "r2".to_string();
        no_reference.reference = "".to_string();
        let mut corrupted = valid_reading();
        corrupted.id = "r3".to_string();
        corrupted.date = "".to_string();
        corrupted.content = "".to_string();

        let favorites = vec!["r1".to_string(), "ghost".to_string()];
        let report =
            service.check_integrity(&[good, no_id, no_reference, corrupted], &favorites);

        assert!(!report.is_valid());
        assert!(report
            .issues
            .contains(&IntegrityIssue::MissingId { title: "The Prologue".to_string() }));
        assert!(report
            .issues
            .contains(&IntegrityIssue::OrphanedFavorite { reading_id: "ghost".to_string() }));
        assert!(report
            .issues
            .contains(&IntegrityIssue::EmptyReference { reading_id: "r2".to_string() }));
        assert!(report.issues.iter().any(|i| matches!(
            i,
            IntegrityIssue::CorruptedRecord { reading_id, missing_fields }
                if reading_id == "r3"
                    && missing_fields.contains(&"date".to_string())
                    && missing_fields.contains(&"content".to_string())
        )));
    }

    #[test]
    fn test_integrity_clean_catalog() {
        let report = ValidationService::new().check_integrity(&[valid_reading()], &["r1".to_string()]);
        assert!(report.is_valid());
    }
}
