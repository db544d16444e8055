use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{GradeError, Result};
use crate::models::{CategorySummary, CourseGrade, GradeCategory, GradedItem};

/// Percentage floor, GPA points and letter, highest step first.
const GRADE_LADDER: [(f64, f64, &str); 10] = [
    (93.0, 4.0, "A"),
    (90.0, 3.7, "A-"),
    (87.0, 3.3, "B+"),
    (83.0, 3.0, "B"),
    (80.0, 2.7, "B-"),
    (77.0, 2.3, "C+"),
    (73.0, 2.0, "C"),
    (70.0, 1.7, "C-"),
    (67.0, 1.3, "D+"),
    (65.0, 1.0, "D"),
];

fn ladder_step(percentage: f64) -> Result<Option<(f64, &'static str)>> {
    if !percentage.is_finite() {
        return Err(GradeError::InvalidPercentage(percentage));
    }
    Ok(GRADE_LADDER
        .iter()
        .find(|(floor, _, _)| percentage >= *floor)
        .map(|(_, points, letter)| (*points, *letter)))
}

/// Maps a course percentage onto the 0.0-4.0 scale.
pub fn gpa_points(percentage: f64) -> Result<f64> {
    Ok(ladder_step(percentage)?.map_or(0.0, |(points, _)| points))
}

/// Maps a course percentage onto a letter grade.
///
/// | Range  | Letter |
/// |--------|--------|
/// | >= 93  | A      |
/// | >= 90  | A-     |
/// | >= 87  | B+     |
/// | >= 83  | B      |
/// | >= 80  | B-     |
/// | >= 77  | C+     |
/// | >= 73  | C      |
/// | >= 70  | C-     |
/// | >= 67  | D+     |
/// | >= 65  | D      |
/// | < 65   | F      |
pub fn letter_grade(percentage: f64) -> Result<&'static str> {
    Ok(ladder_step(percentage)?.map_or("F", |(_, letter)| letter))
}

pub fn validate_item(item: &GradedItem) -> Result<()> {
    if !item.score.is_finite() || item.score < 0.0 {
        return Err(GradeError::InvalidScore {
            item_id: item.id,
            score: item.score,
        });
    }
    if !item.max_score.is_finite() || item.max_score <= 0.0 {
        return Err(GradeError::InvalidMaxScore {
            item_id: item.id,
            max_score: item.max_score,
        });
    }
    Ok(())
}

pub fn validate_category(category: &GradeCategory) -> Result<()> {
    if !category.weight.is_finite() || !(0.0..=1.0).contains(&category.weight) {
        return Err(GradeError::InvalidWeight {
            category: category.name.clone(),
            weight: category.weight,
        });
    }
    Ok(())
}

struct CategoryBucket<'a> {
    name: &'a str,
    weight: f64,
    items: Vec<&'a GradedItem>,
}

impl CategoryBucket<'_> {
    fn average(&self) -> Option<f64> {
        if self.items.is_empty() {
            return None;
        }
        let total: f64 = self.items.iter().map(|item| item.percentage()).sum();
        Some(total / self.items.len() as f64)
    }
}

/// Buckets items by category name. A repeated category name keeps its first
/// position but takes the later weight; items naming no category are dropped.
fn bucket_items<'a>(
    items: &'a [GradedItem],
    categories: &'a [GradeCategory],
) -> Result<Vec<CategoryBucket<'a>>> {
    for item in items {
        validate_item(item)?;
    }

    let mut buckets: Vec<CategoryBucket<'a>> = Vec::with_capacity(categories.len());
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for category in categories {
        validate_category(category)?;
        match index.get(category.name.as_str()) {
            Some(&slot) => {
                warn!(
                    category = %category.name,
                    previous_weight = buckets[slot].weight,
                    weight = category.weight,
                    "duplicate category name overwrites earlier entry"
                );
                buckets[slot].weight = category.weight;
            }
            None => {
                index.insert(category.name.as_str(), buckets.len());
                buckets.push(CategoryBucket {
                    name: category.name.as_str(),
                    weight: category.weight,
                    items: Vec::new(),
                });
            }
        }
    }

    for item in items {
        match index.get(item.category_name.as_str()) {
            Some(&slot) => buckets[slot].items.push(item),
            None => warn!(
                item_id = item.id,
                course_id = item.course_id,
                category = %item.category_name,
                "graded item has no matching category; excluded from course grade"
            ),
        }
    }

    Ok(buckets)
}

/// Per-category weight, item count and average, in category order.
pub fn category_breakdown(
    items: &[GradedItem],
    categories: &[GradeCategory],
) -> Result<Vec<CategorySummary>> {
    Ok(bucket_items(items, categories)?
        .iter()
        .map(|bucket| CategorySummary {
            name: bucket.name.to_string(),
            weight: bucket.weight,
            item_count: bucket.items.len(),
            average: bucket.average(),
        })
        .collect())
}

/// Weighted percentage over the categories that hold at least one item.
/// Empty categories leave the weight denominator, so the remaining weights
/// renormalize. Extra credit counts toward the total, which is then capped
/// to [0, 100].
pub fn grade_from_breakdown(breakdown: &[CategorySummary]) -> f64 {
    let mut weighted_total = 0.0;
    let mut weight_total = 0.0;

    for category in breakdown {
        if let Some(average) = category.average {
            weighted_total += average * category.weight;
            weight_total += category.weight;
        }
    }

    if weight_total > 0.0 {
        (weighted_total / weight_total).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

pub fn calculate_course_grade(items: &[GradedItem], categories: &[GradeCategory]) -> Result<f64> {
    if items.is_empty() {
        return Ok(0.0);
    }

    let grade = grade_from_breakdown(&category_breakdown(items, categories)?);
    debug!(items = items.len(), grade, "computed course grade");
    Ok(grade)
}

/// Credit-weighted mean of GPA points across courses.
pub fn calculate_gpa(course_grades: &[CourseGrade]) -> Result<f64> {
    let mut total_points = 0.0;
    let mut total_credits: u64 = 0;

    for course in course_grades {
        total_points += gpa_points(course.grade)? * f64::from(course.credits);
        total_credits += u64::from(course.credits);
    }

    if total_credits == 0 {
        return Ok(0.0);
    }
    let gpa = total_points / total_credits as f64;
    debug!(courses = course_grades.len(), gpa, "computed gpa");
    Ok(gpa)
}
