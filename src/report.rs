use std::fmt::Write;

use chrono::{DateTime, TimeZone, Weekday};

use crate::due::{self, DATE_FORMAT};
use crate::grades;
use crate::models::{AssignmentDue, CategorySummary, CourseGrade};
use crate::records::Snapshot;

#[derive(Debug, Clone)]
pub struct CourseStanding {
    pub course_id: i64,
    pub name: String,
    pub credits: u32,
    pub grade: f64,
    pub letter: &'static str,
    pub categories: Vec<CategorySummary>,
}

pub fn course_standings(snapshot: &Snapshot) -> anyhow::Result<Vec<CourseStanding>> {
    let mut standings = Vec::with_capacity(snapshot.courses.len());

    for course in &snapshot.courses {
        let items = snapshot.course_items(course.id);
        let categories = snapshot.course_categories(course.id);
        let breakdown = grades::category_breakdown(&items, &categories)?;
        let grade = grades::grade_from_breakdown(&breakdown);
        standings.push(CourseStanding {
            course_id: course.id,
            name: course.name.clone(),
            credits: course.credits,
            grade,
            letter: grades::letter_grade(grade)?,
            categories: breakdown,
        });
    }

    Ok(standings)
}

/// Credit-weighted GPA over already computed standings.
pub fn standings_gpa(standings: &[CourseStanding]) -> anyhow::Result<f64> {
    let course_grades: Vec<CourseGrade> = standings
        .iter()
        .map(|s| CourseGrade {
            grade: s.grade,
            credits: s.credits,
        })
        .collect();
    Ok(grades::calculate_gpa(&course_grades)?)
}

pub fn standing_line(standing: &CourseStanding) -> String {
    format!(
        "{} ({} credits): {:.1}% {}",
        standing.name, standing.credits, standing.grade, standing.letter
    )
}

pub fn category_line(category: &CategorySummary) -> String {
    match category.average {
        Some(average) => format!(
            "- {} ({:.0}%): {:.1}% across {} items",
            category.name,
            category.weight * 100.0,
            average,
            category.item_count
        ),
        None => format!(
            "- {} ({:.0}%): no grades yet",
            category.name,
            category.weight * 100.0
        ),
    }
}

fn assignment_line<Tz: TimeZone>(
    snapshot: &Snapshot,
    assignment: &AssignmentDue,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> anyhow::Result<String> {
    let course = snapshot
        .course(assignment.course_id)
        .map(|c| c.name.as_str())
        .unwrap_or("unknown course");
    let when = due::relative_date(assignment.due_timestamp, now, week_start)?;
    let date = due::format_date(assignment.due_timestamp, &now.timezone(), DATE_FORMAT)?;
    Ok(format!(
        "- {} ({}, {} priority) {} [{}]",
        assignment.title, course, assignment.priority, when, date
    ))
}

pub fn build_report<Tz: TimeZone>(
    snapshot: &Snapshot,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> anyhow::Result<String> {
    let standings = course_standings(snapshot)?;
    let gpa = standings_gpa(&standings)?;
    let generated = due::format_date_time(now.timestamp_millis(), &now.timezone())?;

    let mut output = String::new();

    let _ = writeln!(output, "# Academic Dashboard");
    let _ = writeln!(output, "Generated {generated}");
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");
    let _ = writeln!(output, "- Overall GPA: {gpa:.2}");
    let _ = writeln!(output, "- Courses: {}", snapshot.courses.len());
    let open = snapshot.assignments_for(None, false);
    let _ = writeln!(output, "- Open assignments: {}", open.len());
    let _ = writeln!(
        output,
        "- Completed assignments: {}",
        snapshot.assignments.len() - open.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Course Grades");

    if standings.is_empty() {
        let _ = writeln!(output, "No courses recorded yet.");
    } else {
        for standing in &standings {
            let _ = writeln!(output, "- {}", standing_line(standing));
            for category in &standing.categories {
                let _ = writeln!(output, "  {}", category_line(category));
            }
        }
    }

    let groups = due::group_by_due_date(&due::sort_by_due_date(&open), now)?;
    let _ = writeln!(output);
    let _ = writeln!(output, "## Assignments");

    if groups.is_empty() {
        let _ = writeln!(output, "No open assignments.");
    } else {
        for (heading, bucket) in groups.sections() {
            if bucket.is_empty() {
                continue;
            }
            let _ = writeln!(output, "### {heading}");
            for assignment in bucket {
                let _ = writeln!(output, "{}", assignment_line(snapshot, assignment, now, week_start)?);
            }
        }
    }

    Ok(output)
}
