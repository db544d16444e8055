use std::path::PathBuf;

use anyhow::Context;
use chrono::{Datelike, FixedOffset, NaiveDate, Weekday};
use clap::{Parser, Subcommand};
use tracing::info;

use studyflow_grades::config::{Settings, SNAPSHOT_VAR};
use studyflow_grades::records::{self, Snapshot};
use studyflow_grades::{due, grades, logging, report};

#[derive(Parser)]
#[command(name = "studyflow-grades")]
#[command(about = "Course grades, GPA and due-date summaries for StudyFlow exports", long_about = None)]
struct Cli {
    /// Calendar offset for day comparisons, e.g. +02:00
    #[arg(long, global = true)]
    utc_offset: Option<FixedOffset>,
    /// First day of the calendar week
    #[arg(long, global = true)]
    week_start: Option<Weekday>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show course percentages, letters and category averages
    Grades {
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long)]
        course: Option<i64>,
        /// Replace the snapshot's graded items with a CSV export
        #[arg(long)]
        grades_csv: Option<PathBuf>,
    },
    /// Show the credit-weighted GPA across all courses
    Gpa {
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Map a percentage to its letter grade and GPA points
    Letter {
        #[arg(allow_negative_numbers = true)]
        percentage: f64,
    },
    /// Group assignments by how soon they are due
    Due {
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long)]
        course: Option<i64>,
        #[arg(long, default_value_t = false)]
        include_completed: bool,
    },
    /// List assignments on each day of a month grid
    Calendar {
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Month to show as YYYY-MM; defaults to the current month
        #[arg(long, value_parser = parse_month)]
        month: Option<NaiveDate>,
    },
    /// Generate a markdown dashboard
    Report {
        #[arg(long)]
        snapshot: Option<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_month(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM, got '{raw}'"))
}

fn load_snapshot(path: Option<PathBuf>, settings: &Settings) -> anyhow::Result<Snapshot> {
    let path = path
        .or_else(|| settings.snapshot.clone())
        .with_context(|| format!("pass --snapshot or set {SNAPSHOT_VAR}"))?;
    let snapshot = Snapshot::load(&path, &settings.utc_offset)?;
    info!(
        path = %path.display(),
        courses = snapshot.courses.len(),
        grades = snapshot.items.len(),
        assignments = snapshot.assignments.len(),
        "loaded snapshot"
    );
    Ok(snapshot)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();
    let mut settings = Settings::from_env()?;
    if let Some(offset) = cli.utc_offset {
        settings.utc_offset = offset;
    }
    if let Some(week_start) = cli.week_start {
        settings.week_start = week_start;
    }

    match cli.command {
        Commands::Grades {
            snapshot,
            course,
            grades_csv,
        } => {
            let mut snapshot = load_snapshot(snapshot, &settings)?;
            if let Some(csv) = grades_csv {
                snapshot.items = records::import_grades_csv(&csv)?;
                info!(items = snapshot.items.len(), csv = %csv.display(), "replaced graded items");
            }

            let standings = report::course_standings(&snapshot)?;
            let selected: Vec<_> = standings
                .iter()
                .filter(|s| course.map_or(true, |id| s.course_id == id))
                .collect();

            if selected.is_empty() {
                println!("No courses found.");
                return Ok(());
            }

            for standing in selected {
                println!("{}", report::standing_line(standing));
                for category in &standing.categories {
                    println!("  {}", report::category_line(category));
                }
            }
        }
        Commands::Gpa { snapshot } => {
            let snapshot = load_snapshot(snapshot, &settings)?;
            let gpa = snapshot.gpa()?;
            println!("Overall GPA: {gpa:.2} across {} courses", snapshot.courses.len());
        }
        Commands::Letter { percentage } => {
            let letter = grades::letter_grade(percentage)?;
            let points = grades::gpa_points(percentage)?;
            println!("{percentage}% -> {letter} ({points:.1} points)");
        }
        Commands::Due {
            snapshot,
            course,
            include_completed,
        } => {
            let snapshot = load_snapshot(snapshot, &settings)?;
            let now = settings.now();
            let assignments = due::sort_by_due_date(&snapshot.assignments_for(course, include_completed));
            let groups = due::group_by_due_date(&assignments, &now)?;

            if groups.is_empty() {
                println!("No assignments found.");
                return Ok(());
            }

            for (heading, bucket) in groups.sections() {
                if bucket.is_empty() {
                    continue;
                }
                println!("{heading}:");
                for assignment in bucket {
                    let status = due::due_date_status(assignment.due_timestamp, &now)?;
                    let when = due::relative_date(assignment.due_timestamp, &now, settings.week_start)?;
                    println!(
                        "- {} [{}] {} ({} priority, {})",
                        assignment.title, status.label, when, assignment.priority, assignment.status
                    );
                }
            }
        }
        Commands::Calendar { snapshot, month } => {
            let snapshot = load_snapshot(snapshot, &settings)?;
            let now = settings.now();
            let month = month.unwrap_or_else(|| now.date_naive());
            let days = due::month_calendar(
                &snapshot.assignments,
                month.year(),
                month.month(),
                &settings.utc_offset,
                settings.week_start,
            )?;

            println!("{}", month.format("%B %Y"));
            let mut shown = 0usize;
            for (day, assignments) in &days {
                if assignments.is_empty() {
                    continue;
                }
                let marker = if *day == now.date_naive() { " (today)" } else { "" };
                println!("{}{marker}:", day.format("%a %b %d"));
                for assignment in assignments {
                    let course = snapshot
                        .course(assignment.course_id)
                        .map(|c| c.name.as_str())
                        .unwrap_or("unknown course");
                    println!("- {} ({}, {})", assignment.title, course, assignment.status);
                }
                shown += assignments.len();
            }
            if shown == 0 {
                println!("No assignments due in this month view.");
            }
        }
        Commands::Report { snapshot, out } => {
            let snapshot = load_snapshot(snapshot, &settings)?;
            let now = settings.now();
            let report = report::build_report(&snapshot, &now, settings.week_start)?;
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
