use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub code: String,
    pub credits: u32,
}

impl Course {
    pub fn credit(&self) -> CourseCredit {
        CourseCredit {
            course_id: self.id,
            credits: self.credits,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradedItem {
    pub id: i64,
    pub course_id: i64,
    pub category_name: String,
    pub title: String,
    pub score: f64,
    pub max_score: f64,
    /// Carried through from the record; aggregation weights by category only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_override: Option<f64>,
}

impl GradedItem {
    /// Score as a percentage of `max_score`. Callers validate `max_score > 0`.
    pub fn percentage(&self) -> f64 {
        (self.score / self.max_score) * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeCategory {
    pub id: i64,
    pub course_id: i64,
    pub name: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseCredit {
    pub course_id: i64,
    pub credits: u32,
}

/// One course's overall percentage paired with its credit load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourseGrade {
    pub grade: f64,
    pub credits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDue {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub due_timestamp: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub priority: String,
}

impl AssignmentDue {
    pub fn is_completed(&self) -> bool {
        self.status.eq_ignore_ascii_case("completed")
    }
}

/// Anything the due-date classifier can order and bucket.
pub trait HasDueDate {
    fn due_timestamp(&self) -> i64;
}

impl HasDueDate for AssignmentDue {
    fn due_timestamp(&self) -> i64 {
        self.due_timestamp
    }
}

impl<T: HasDueDate + ?Sized> HasDueDate for &T {
    fn due_timestamp(&self) -> i64 {
        (**self).due_timestamp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DueStatus {
    Overdue,
    Today,
    Tomorrow,
    ThisWeek,
    Future,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "overdue",
            DueStatus::Today => "today",
            DueStatus::Tomorrow => "tomorrow",
            DueStatus::ThisWeek => "thisWeek",
            DueStatus::Future => "future",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "Overdue",
            DueStatus::Today => "Due Today",
            DueStatus::Tomorrow => "Due Tomorrow",
            DueStatus::ThisWeek => "This Week",
            DueStatus::Future => "Upcoming",
        }
    }

    /// Display token used by the badge renderer.
    pub fn color(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "error",
            DueStatus::Today | DueStatus::Tomorrow => "warning",
            DueStatus::ThisWeek => "info",
            DueStatus::Future => "gray",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DueDateStatus {
    pub status: DueStatus,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<DueStatus> for DueDateStatus {
    fn from(status: DueStatus) -> Self {
        Self {
            status,
            label: status.label(),
            color: status.color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueDateGroups<T> {
    pub overdue: Vec<T>,
    pub today: Vec<T>,
    pub tomorrow: Vec<T>,
    pub this_week: Vec<T>,
    pub later: Vec<T>,
}

impl<T> Default for DueDateGroups<T> {
    fn default() -> Self {
        Self {
            overdue: Vec::new(),
            today: Vec::new(),
            tomorrow: Vec::new(),
            this_week: Vec::new(),
            later: Vec::new(),
        }
    }
}

impl<T> DueDateGroups<T> {
    pub fn len(&self) -> usize {
        self.overdue.len()
            + self.today.len()
            + self.tomorrow.len()
            + self.this_week.len()
            + self.later.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Buckets in display order, paired with their heading.
    pub fn sections(&self) -> [(&'static str, &[T]); 5] {
        [
            ("Overdue", self.overdue.as_slice()),
            ("Today", self.today.as_slice()),
            ("Tomorrow", self.tomorrow.as_slice()),
            ("This Week", self.this_week.as_slice()),
            ("Later", self.later.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub name: String,
    pub weight: f64,
    pub item_count: usize,
    pub average: Option<f64>,
}
