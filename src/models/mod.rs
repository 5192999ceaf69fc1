use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// ============================================================================
// Course Configuration Models
// ============================================================================

/// Configuration for one PrairieLearn course instance.
#[derive(Debug, Clone)]
pub struct CourseConfig {
    /// Short identifier (e.g., "cpsc221")
    pub course_id: String,
    /// Display name used for the Notion "Course" select
    pub course_name: String,
    /// PrairieLearn assessments page URL
    pub assessments_url: String,
}

// ============================================================================
// Notion API Models
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct QueryDatabaseResponse {
    pub results: Vec<NotionPage>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// A page in the Notion database. Property values are schema-dependent, so
/// they stay as raw JSON and are picked apart by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct NotionPage {
    pub id: String,
    pub properties: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotionDatabase {
    pub properties: serde_json::Value,
}

/// One option of a Notion select property. Notion rejects schema updates that
/// carry fields beyond id/name/color, so this is the full round-trip shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectOption {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

// ============================================================================
// Internal Models for Processing
// ============================================================================

/// One row of a popover's graduated-credit sub-table.
#[derive(Debug, Clone)]
pub struct DeadlineTier {
    pub credit: Option<u32>,
    pub unlock_at: Option<DateTime<Tz>>,
    pub due_at: Option<DateTime<Tz>>,
}

/// A scraped assignment, normalized to the institutional timezone.
#[derive(Debug, Clone)]
pub struct AssignmentRecord {
    pub course_name: String,
    /// Section-prefixed name, e.g. "Project 1 - HW1". Unique within one
    /// scrape of a course; used as the upsert key in Notion.
    pub assignment_name: String,
    /// Name of the assessment group the row belongs to
    pub project: String,
    pub due: Option<DateTime<Tz>>,
    /// Earliest known unlock date, used for the reminder field
    pub reminder: Option<DateTime<Tz>>,
}

/// An assignment already present in the Notion database.
#[derive(Debug, Clone)]
pub struct ExistingAssignment {
    pub page_id: String,
    /// Due date as stored in Notion ("YYYY-MM-DD"), if any
    pub due: Option<String>,
}
