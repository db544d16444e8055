//! Boundary adapter for exported backend records.
//!
//! The hosted backend names fields with a `_c` suffix and links records
//! through reference fields that arrive as a raw id, a numeric string, or an
//! embedded `{ "Id": .. }` object. Everything here resolves those shapes to
//! the plain entities in [`crate::models`] before any grade or due-date code
//! sees them.

use std::path::Path;

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Deserialize;

use crate::due::sort_by_due_date;
use crate::error::GradeError;
use crate::grades;
use crate::models::{AssignmentDue, Course, CourseGrade, GradeCategory, GradedItem};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn resolve(&self) -> anyhow::Result<i64> {
        match self {
            RawId::Number(id) => Ok(*id),
            RawId::Text(text) => text
                .trim()
                .parse()
                .with_context(|| format!("reference '{text}' is not a numeric id")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RecordRef {
    Linked {
        #[serde(rename = "Id")]
        id: RawId,
    },
    Raw(RawId),
}

impl RecordRef {
    fn resolve(&self) -> anyhow::Result<i64> {
        match self {
            RecordRef::Linked { id } | RecordRef::Raw(id) => id.resolve(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum DueValue {
    Millis(i64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct CourseRecord {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(default)]
    name_c: Option<String>,
    #[serde(default)]
    course_code_c: Option<String>,
    credits_c: u32,
}

#[derive(Debug, Deserialize)]
struct GradeRecord {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    course_id_c: RecordRef,
    category_c: String,
    #[serde(default)]
    title_c: Option<String>,
    score_c: f64,
    max_score_c: f64,
    #[serde(default)]
    weight_c: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CategoryRecord {
    #[serde(rename = "Id")]
    id: i64,
    name_c: String,
    weight_c: f64,
    course_id_c: RecordRef,
}

#[derive(Debug, Deserialize)]
struct AssignmentRecord {
    #[serde(rename = "Id")]
    id: i64,
    #[serde(rename = "Name", default)]
    name: Option<String>,
    #[serde(default)]
    title_c: Option<String>,
    due_date_c: DueValue,
    #[serde(default)]
    status_c: Option<String>,
    #[serde(default)]
    priority_c: Option<String>,
    course_id_c: RecordRef,
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    courses: Vec<CourseRecord>,
    #[serde(default)]
    grades: Vec<GradeRecord>,
    #[serde(default)]
    categories: Vec<CategoryRecord>,
    #[serde(default)]
    assignments: Vec<AssignmentRecord>,
}

/// Epoch millis from a backend due date: epoch millis, RFC 3339, or a bare
/// `YYYY-MM-DD` taken as midnight in `tz`.
pub fn parse_due_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> anyhow::Result<i64> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return Ok(millis);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.timestamp_millis());
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unparsable due date '{raw}'"))?;
    let midnight = date.and_hms_opt(0, 0, 0).context("invalid midnight")?;
    match tz.from_local_datetime(&midnight).earliest() {
        Some(local) => Ok(local.timestamp_millis()),
        None => bail!("due date '{raw}' does not exist in the configured calendar"),
    }
}

fn non_empty(values: [Option<String>; 2]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub courses: Vec<Course>,
    pub items: Vec<GradedItem>,
    pub categories: Vec<GradeCategory>,
    pub assignments: Vec<AssignmentDue>,
}

impl Snapshot {
    pub fn load<Tz: TimeZone>(path: &Path, tz: &Tz) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?;
        Self::from_json(&content, tz)
            .with_context(|| format!("failed to parse snapshot {}", path.display()))
    }

    pub fn from_json<Tz: TimeZone>(content: &str, tz: &Tz) -> anyhow::Result<Self> {
        let file: SnapshotFile = serde_json::from_str(content)?;
        let mut snapshot = Snapshot::default();

        for record in file.courses {
            snapshot.courses.push(Course {
                id: record.id,
                name: non_empty([record.name_c, record.name])
                    .unwrap_or_else(|| format!("Course {}", record.id)),
                code: record.course_code_c.unwrap_or_default(),
                credits: record.credits_c,
            });
        }

        for record in file.grades {
            snapshot.items.push(GradedItem {
                id: record.id,
                course_id: record
                    .course_id_c
                    .resolve()
                    .with_context(|| format!("grade {}", record.id))?,
                category_name: record.category_c,
                title: non_empty([record.title_c, record.name]).unwrap_or_default(),
                score: record.score_c,
                max_score: record.max_score_c,
                weight_override: record.weight_c,
            });
        }

        for record in file.categories {
            snapshot.categories.push(GradeCategory {
                id: record.id,
                course_id: record
                    .course_id_c
                    .resolve()
                    .with_context(|| format!("category {}", record.id))?,
                name: record.name_c,
                weight: record.weight_c,
            });
        }

        for record in file.assignments {
            let due_timestamp = match &record.due_date_c {
                DueValue::Millis(millis) => *millis,
                DueValue::Text(text) => parse_due_date(text, tz)
                    .with_context(|| format!("assignment {}", record.id))?,
            };
            snapshot.assignments.push(AssignmentDue {
                id: record.id,
                course_id: record
                    .course_id_c
                    .resolve()
                    .with_context(|| format!("assignment {}", record.id))?,
                title: non_empty([record.title_c, record.name]).unwrap_or_default(),
                due_timestamp,
                status: record.status_c.unwrap_or_else(|| "pending".to_string()),
                priority: record.priority_c.unwrap_or_else(|| "medium".to_string()),
            });
        }

        Ok(snapshot)
    }

    pub fn course(&self, course_id: i64) -> Option<&Course> {
        self.courses.iter().find(|course| course.id == course_id)
    }

    pub fn course_items(&self, course_id: i64) -> Vec<GradedItem> {
        self.items
            .iter()
            .filter(|item| item.course_id == course_id)
            .cloned()
            .collect()
    }

    pub fn course_categories(&self, course_id: i64) -> Vec<GradeCategory> {
        self.categories
            .iter()
            .filter(|category| category.course_id == course_id)
            .cloned()
            .collect()
    }

    pub fn course_grade(&self, course_id: i64) -> Result<f64, GradeError> {
        grades::calculate_course_grade(
            &self.course_items(course_id),
            &self.course_categories(course_id),
        )
    }

    /// Every course's percentage with its credits, in course order.
    pub fn course_grades(&self) -> Result<Vec<CourseGrade>, GradeError> {
        self.courses
            .iter()
            .map(|course| {
                let credit = course.credit();
                Ok(CourseGrade {
                    grade: self.course_grade(credit.course_id)?,
                    credits: credit.credits,
                })
            })
            .collect()
    }

    pub fn gpa(&self) -> Result<f64, GradeError> {
        grades::calculate_gpa(&self.course_grades()?)
    }

    /// Assignments for one course, or all of them, minus completed ones
    /// unless asked for.
    pub fn assignments_for(&self, course_id: Option<i64>, include_completed: bool) -> Vec<AssignmentDue> {
        self.assignments
            .iter()
            .filter(|a| course_id.map_or(true, |id| a.course_id == id))
            .filter(|a| include_completed || !a.is_completed())
            .cloned()
            .collect()
    }

    /// The next `limit` open assignments by due date.
    pub fn upcoming(&self, limit: usize) -> Vec<AssignmentDue> {
        let mut upcoming = sort_by_due_date(&self.assignments_for(None, false));
        upcoming.truncate(limit);
        upcoming
    }
}

/// Reads graded items from a CSV export with camelCase headers:
/// `id,courseId,category,title,score,maxScore,weight`.
pub fn import_grades_csv(csv_path: &Path) -> anyhow::Result<Vec<GradedItem>> {
    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct CsvRow {
        id: i64,
        course_id: i64,
        category: String,
        #[serde(default)]
        title: String,
        score: f64,
        max_score: f64,
        #[serde(default)]
        weight: Option<f64>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut items = Vec::new();

    for (line, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row = result.with_context(|| format!("bad grade row {}", line + 1))?;
        items.push(GradedItem {
            id: row.id,
            course_id: row.course_id,
            category_name: row.category,
            title: row.title,
            score: row.score,
            max_score: row.max_score,
            weight_override: row.weight,
        });
    }

    Ok(items)
}
